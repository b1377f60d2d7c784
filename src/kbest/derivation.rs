use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::forest::ScoreBreakdown;

use super::vertex::VertexId;

/// One unweighted way of building `head`: alternative `alternative` of the
/// head's hypothesis, with its non-terminal slots resolved to vertices.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Hyperarc {
    pub head: VertexId,
    pub alternative: usize,
    pub tail: Vec<VertexId>,
}

/// A hyperarc plus, for each tail position, the rank of the child
/// derivation it uses.
///
/// Equality and hashing cover the hyperarc and the back-pointers only; the
/// score is derived from them.
#[derive(Debug, Clone)]
pub struct Derivation {
    pub(crate) edge: Rc<Hyperarc>,
    pub(crate) back_pointers: Vec<usize>,
    pub(crate) breakdown: ScoreBreakdown,
    pub(crate) score: f32,
}

impl Derivation {
    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn breakdown(&self) -> &ScoreBreakdown {
        &self.breakdown
    }

    /// Rank selected in each child's k-best list, in tail order.
    pub fn back_pointers(&self) -> &[usize] {
        &self.back_pointers
    }

    /// Index of the alternative used at the head hypothesis.
    pub fn alternative(&self) -> usize {
        self.edge.alternative
    }

    pub fn arity(&self) -> usize {
        self.edge.tail.len()
    }
}

impl PartialEq for Derivation {
    fn eq(&self, other: &Self) -> bool {
        self.edge == other.edge && self.back_pointers == other.back_pointers
    }
}

impl Eq for Derivation {}

impl Hash for Derivation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.edge.hash(state);
        self.back_pointers.hash(state);
    }
}

/// Queue entry: higher score first, then earlier proposal first.
#[derive(Debug)]
pub(crate) struct Candidate {
    pub derivation: Rc<Derivation>,
    pub seq: u64,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.derivation
            .score
            .total_cmp(&other.derivation.score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BinaryHeap, HashSet};

    use super::*;

    fn derivation(alternative: usize, back_pointers: Vec<usize>, score: f32) -> Rc<Derivation> {
        Rc::new(Derivation {
            edge: Rc::new(Hyperarc {
                head: VertexId(0),
                alternative,
                tail: vec![VertexId(1); back_pointers.len()],
            }),
            back_pointers,
            breakdown: ScoreBreakdown::new(),
            score,
        })
    }

    #[test]
    fn test_identity_ignores_score() {
        let a = derivation(0, vec![1, 0], 5.0);
        let b = derivation(0, vec![1, 0], -3.0);
        let c = derivation(0, vec![0, 1], 5.0);
        let d = derivation(1, vec![1, 0], 5.0);

        let mut seen = HashSet::new();
        assert!(seen.insert(a));
        assert!(!seen.insert(b));
        assert!(seen.insert(c));
        assert!(seen.insert(d));
    }

    #[test]
    fn test_queue_orders_by_score_then_seq() {
        let mut heap = BinaryHeap::new();
        heap.push(Candidate {
            derivation: derivation(0, vec![], 1.0),
            seq: 0,
        });
        heap.push(Candidate {
            derivation: derivation(1, vec![], 5.0),
            seq: 2,
        });
        heap.push(Candidate {
            derivation: derivation(2, vec![], 5.0),
            seq: 1,
        });

        let order: Vec<usize> = std::iter::from_fn(|| heap.pop())
            .map(|c| c.derivation.alternative())
            .collect();
        assert_eq!(order, vec![2, 1, 0]);
    }
}
