use std::collections::HashMap;
use std::rc::Rc;

use tracing::trace;

use crate::forest::{Forest, NodeId, ScoreBreakdown};

use super::derivation::{Candidate, Derivation, Hyperarc};
use super::vertex::{Vertex, VertexId, VertexSource};

/// Lazy k-best search state for one extraction run.
///
/// Implements algorithm 3 of Huang & Chiang, "Better k-best parsing"
/// (IWPT 2005). Vertices are created on first touch and memoized per forest
/// node, so shared sub-hypotheses are searched once.
pub(crate) struct Extractor<'f> {
    forest: &'f Forest,
    pub(crate) vertices: Vec<Vertex>,
    vertex_map: HashMap<NodeId, VertexId>,
    /// Distinct top-level hypotheses behind the virtual root.
    root_tops: Vec<NodeId>,
    next_seq: u64,
}

impl<'f> Extractor<'f> {
    pub fn new(forest: &'f Forest) -> Self {
        Self {
            forest,
            vertices: Vec::new(),
            vertex_map: HashMap::new(),
            root_tops: Vec::new(),
            next_seq: 0,
        }
    }

    pub fn forest(&self) -> &'f Forest {
        self.forest
    }

    #[inline]
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.index()]
    }

    pub fn vertex_of(&self, node: NodeId) -> Option<VertexId> {
        self.vertex_map.get(&node).copied()
    }

    pub fn find_or_create_vertex(&mut self, node: NodeId) -> VertexId {
        if let Some(&id) = self.vertex_map.get(&node) {
            return id;
        }
        let id = self.push_vertex(VertexSource::Node(node));
        self.vertex_map.insert(node, id);
        id
    }

    /// Create the virtual root whose alternatives are the given top-level
    /// hypotheses, one unary hyperarc each. Repeated tops are ignored.
    pub fn create_root(&mut self, tops: &[NodeId]) -> VertexId {
        self.root_tops.clear();
        for &top in tops {
            if !self.root_tops.contains(&top) {
                self.root_tops.push(top);
            }
        }
        self.push_vertex(VertexSource::Root)
    }

    fn push_vertex(&mut self, source: VertexSource) -> VertexId {
        let id = VertexId(self.vertices.len() as u32);
        self.vertices.push(Vertex::new(source));
        id
    }

    /// The unweighted hyperarcs entering `v`, one per alternative, with tail
    /// hypotheses resolved to (possibly new, unsearched) vertices.
    fn create_edges(&mut self, v: VertexId) -> Vec<Rc<Hyperarc>> {
        match self.vertex(v).source {
            VertexSource::Root => {
                let tops = self.root_tops.clone();
                tops.into_iter()
                    .enumerate()
                    .map(|(i, top)| {
                        Rc::new(Hyperarc {
                            head: v,
                            alternative: i,
                            tail: vec![self.find_or_create_vertex(top)],
                        })
                    })
                    .collect()
            }
            VertexSource::Node(node) => {
                let forest = self.forest;
                forest
                    .node(node)
                    .alternatives
                    .iter()
                    .enumerate()
                    .map(|(i, alt)| {
                        let tail = alt
                            .tail()
                            .map(|child| self.find_or_create_vertex(child))
                            .collect();
                        Rc::new(Hyperarc {
                            head: v,
                            alternative: i,
                            tail,
                        })
                    })
                    .collect()
            }
        }
    }

    /// Seed `v`'s queue with the all-zero derivation of each hyperarc.
    ///
    /// A hyperarc with a child that has no derivation at all is dropped: the
    /// child starves it.
    fn get_candidates(&mut self, v: VertexId) {
        for edge in self.create_edges(v) {
            let starved = edge
                .tail
                .iter()
                .any(|&child| !self.lazy_kth_best(child, 1));
            if starved {
                trace!(vertex = v.0, alternative = edge.alternative, "starved hyperarc");
                continue;
            }
            let back_pointers = vec![0; edge.tail.len()];
            let d = self.compose(edge, back_pointers);
            self.offer(v, d);
        }
    }

    /// Ensure `v` has at least `k` confirmed derivations, if that many exist.
    /// Returns whether rank `k - 1` is now available.
    pub fn lazy_kth_best(&mut self, v: VertexId, k: usize) -> bool {
        if !self.vertices[v.index()].visited {
            self.vertices[v.index()].visited = true;
            self.get_candidates(v);
        }

        while self.vertices[v.index()].k_best.len() < k {
            // Neighbours of the last confirmed derivation are proposed only
            // once a further rank is actually requested.
            let vertex = &self.vertices[v.index()];
            if vertex.advanced < vertex.k_best.len() {
                let last = Rc::clone(&vertex.k_best[vertex.k_best.len() - 1]);
                self.vertices[v.index()].advanced = self.vertices[v.index()].k_best.len();
                self.lazy_next(v, &last);
            }

            let vertex = &mut self.vertices[v.index()];
            match vertex.candidates.pop() {
                Some(best) => vertex.k_best.push(best.derivation),
                None => break,
            }
        }
        self.vertices[v.index()].k_best.len() >= k
    }

    /// Propose every derivation one back-pointer step away from `d`.
    fn lazy_next(&mut self, v: VertexId, d: &Derivation) {
        for i in 0..d.edge.tail.len() {
            let child = d.edge.tail[i];
            let rank = d.back_pointers[i] + 1;
            if !self.lazy_kth_best(child, rank + 1) {
                continue; // child exhausted
            }
            let mut back_pointers = d.back_pointers.clone();
            back_pointers[i] = rank;
            let next = self.compose(Rc::clone(&d.edge), back_pointers);
            self.offer(v, next);
        }
    }

    /// Queue `d` at `v` unless it was proposed before.
    fn offer(&mut self, v: VertexId, d: Derivation) {
        let d = Rc::new(d);
        let vertex = &mut self.vertices[v.index()];
        if vertex.seen.insert(Rc::clone(&d)) {
            vertex.candidates.push(Candidate {
                derivation: d,
                seq: self.next_seq,
            });
            self.next_seq += 1;
        }
    }

    /// Build a derivation, scoring it as the hyperarc's local contribution
    /// plus the selected child derivations. Every back-pointer must already
    /// be a confirmed rank of its child.
    fn compose(&self, edge: Rc<Hyperarc>, back_pointers: Vec<usize>) -> Derivation {
        let (mut score, mut breakdown) = match self.vertex(edge.head).source {
            VertexSource::Node(node) => {
                let alt = &self.forest.node(node).alternatives[edge.alternative];
                (alt.score, alt.breakdown.clone())
            }
            VertexSource::Root => (0.0, ScoreBreakdown::new()),
        };
        for (&child, &rank) in edge.tail.iter().zip(&back_pointers) {
            let sub = &self.vertex(child).k_best[rank];
            score += sub.score;
            breakdown.plus_equals(&sub.breakdown);
        }
        Derivation {
            edge,
            back_pointers,
            breakdown,
            score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{chain_forest, sibling_forest};

    fn ranks(ex: &Extractor<'_>, v: VertexId) -> Vec<(f32, Vec<usize>)> {
        ex.vertex(v)
            .k_best
            .iter()
            .map(|d| (d.score, d.back_pointers.clone()))
            .collect()
    }

    #[test]
    fn test_vertices_are_memoized_per_node() {
        let (forest, _, _) = sibling_forest();
        let mut ex = Extractor::new(&forest);
        let top = forest.tops[0];
        let a = ex.find_or_create_vertex(top);
        let b = ex.find_or_create_vertex(top);
        assert_eq!(a, b);
        assert_eq!(ex.vertices.len(), 1);
    }

    #[test]
    fn test_create_edges_does_not_search_children() {
        let (forest, child) = chain_forest();
        let mut ex = Extractor::new(&forest);
        let v = ex.find_or_create_vertex(forest.tops[0]);
        let edges = ex.create_edges(v);

        assert_eq!(edges.len(), 1);
        let c = ex.vertex_of(child).unwrap();
        assert_eq!(edges[0].tail, vec![c]);
        assert!(!ex.vertex(c).visited);
        assert!(ex.vertex(c).k_best.is_empty());
    }

    #[test]
    fn test_lazy_kth_best_is_incremental() {
        let (forest, child) = chain_forest();
        let mut ex = Extractor::new(&forest);
        let v = ex.find_or_create_vertex(forest.tops[0]);

        assert!(ex.lazy_kth_best(v, 1));
        assert_eq!(ranks(&ex, v), vec![(11.0, vec![0])]);
        // Only the child's best was needed so far.
        let c = ex.vertex_of(child).unwrap();
        assert_eq!(ex.vertex(c).k_best.len(), 1);

        assert!(ex.lazy_kth_best(v, 3));
        assert_eq!(
            ranks(&ex, v),
            vec![(11.0, vec![0]), (8.0, vec![1]), (3.0, vec![2])]
        );
        assert!(!ex.lazy_kth_best(v, 4));
        assert_eq!(ex.vertex(v).k_best.len(), 3);
    }
}
