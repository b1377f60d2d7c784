use tracing::{debug, debug_span};

use super::{Forest, ForestError, NodeId, Slot};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

impl Forest {
    /// Check that the forest is a well-formed DAG whose every node can be built.
    ///
    /// Extraction does not require this: a node with no alternatives simply
    /// yields no derivations, starving every derivation that depends on it.
    /// Callers that would rather fail loudly validate first.
    pub fn validate(&self) -> Result<(), ForestError> {
        let _span = debug_span!("forest_validate", nodes = self.nodes.len()).entered();
        let len = self.nodes.len();

        for (index, &target) in self.tops.iter().enumerate() {
            if target.index() >= len {
                return Err(ForestError::DanglingTop { index, target });
            }
        }

        for (i, node) in self.nodes.iter().enumerate() {
            for (a, alt) in node.alternatives.iter().enumerate() {
                for (s, slot) in alt.slots.iter().enumerate() {
                    if let Slot::NonTerminal { node: target, .. } = slot {
                        if target.index() >= len {
                            return Err(ForestError::DanglingSlot {
                                node: NodeId(i as u32),
                                alternative: a,
                                slot: s,
                                target: *target,
                            });
                        }
                    }
                }
            }
        }

        if let Some(i) = self.nodes.iter().position(|n| n.alternatives.is_empty()) {
            return Err(ForestError::EmptyNode(NodeId(i as u32)));
        }

        self.check_acyclic()?;
        debug!("forest ok");
        Ok(())
    }

    /// Iterative three-colour DFS over child edges.
    fn check_acyclic(&self) -> Result<(), ForestError> {
        let mut marks = vec![Mark::Unvisited; self.nodes.len()];
        // (node, next child to visit)
        let mut stack: Vec<(NodeId, usize)> = Vec::new();

        for root in 0..self.nodes.len() {
            if marks[root] != Mark::Unvisited {
                continue;
            }
            marks[root] = Mark::InProgress;
            stack.push((NodeId(root as u32), 0));

            while let Some(top) = stack.last_mut() {
                let (node, cursor) = *top;
                top.1 += 1;
                let child = self
                    .node(node)
                    .alternatives
                    .iter()
                    .flat_map(|alt| alt.tail())
                    .nth(cursor);
                match child {
                    Some(c) => match marks[c.index()] {
                        Mark::InProgress => return Err(ForestError::Cycle(c)),
                        Mark::Done => {}
                        Mark::Unvisited => {
                            marks[c.index()] = Mark::InProgress;
                            stack.push((c, 0));
                        }
                    },
                    None => {
                        marks[node.index()] = Mark::Done;
                        stack.pop();
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::forest::{Alternative, ForestBuilder, ScoreBreakdown, Span};

    use super::*;

    fn two_level() -> (ForestBuilder, NodeId, NodeId) {
        let mut b = ForestBuilder::new();
        let child = b.add_node("X", Span::new(0, 1), -1.0);
        let top = b.add_node("S", Span::new(0, 1), -1.0);
        b.add_lexical(child, "house", -1.0);
        b.add_composition(top, &[child], 0.0);
        b.add_top(top);
        (b, child, top)
    }

    #[test]
    fn test_valid_forest() {
        let (b, _, _) = two_level();
        assert!(b.build().validate().is_ok());
    }

    #[test]
    fn test_empty_node_rejected() {
        let mut b = ForestBuilder::new();
        let child = b.add_node("X", Span::new(0, 1), -1.0);
        let top = b.add_node("S", Span::new(0, 1), -1.0);
        b.add_composition(top, &[child], 0.0);
        b.add_top(top);
        let err = b.build().validate().unwrap_err();
        assert!(matches!(err, ForestError::EmptyNode(n) if n == child));
    }

    #[test]
    fn test_dangling_slot_rejected() {
        let (b, _, top) = two_level();
        let mut forest = b.build();
        forest.nodes[top.index()].alternatives.push(Alternative {
            rule: None,
            score: 0.0,
            breakdown: ScoreBreakdown::new(),
            slots: vec![Slot::NonTerminal {
                node: NodeId(99),
                span: Span::new(0, 1),
            }],
        });
        let err = forest.validate().unwrap_err();
        assert!(matches!(
            err,
            ForestError::DanglingSlot {
                alternative: 1,
                slot: 0,
                ..
            }
        ));
        assert!(err.to_string().contains("#99"));
    }

    #[test]
    fn test_dangling_top_rejected() {
        let (b, _, _) = two_level();
        let mut forest = b.build();
        forest.tops.push(NodeId(42));
        assert!(matches!(
            forest.validate(),
            Err(ForestError::DanglingTop { index: 1, .. })
        ));
    }

    #[test]
    fn test_cycle_rejected() {
        let (b, child, top) = two_level();
        let mut forest = b.build();
        forest.nodes[child.index()].alternatives.push(Alternative {
            rule: None,
            score: 0.0,
            breakdown: ScoreBreakdown::new(),
            slots: vec![Slot::NonTerminal {
                node: top,
                span: Span::new(0, 1),
            }],
        });
        assert!(matches!(forest.validate(), Err(ForestError::Cycle(_))));
    }
}
