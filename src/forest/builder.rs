use super::{Alternative, Forest, Hypothesis, NodeId, ScoreBreakdown, Slot, Span};

/// Incremental construction of a `Forest`.
///
/// Children must be added before the alternatives that reference them,
/// which keeps forests built this way acyclic.
#[derive(Debug, Default)]
pub struct ForestBuilder {
    source: Option<String>,
    nodes: Vec<Hypothesis>,
    tops: Vec<NodeId>,
}

impl ForestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }

    /// Add a hypothesis with no alternatives yet.
    pub fn add_node(&mut self, label: &str, span: Span, score: f32) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Hypothesis {
            label: label.to_string(),
            span,
            score,
            breakdown: ScoreBreakdown::new(),
            alternatives: Vec::new(),
        });
        id
    }

    /// Add an alternative to `node`. Returns its index within the node.
    pub fn add_alternative(&mut self, node: NodeId, alternative: Alternative) -> usize {
        let alts = &mut self.nodes[node.index()].alternatives;
        alts.push(alternative);
        alts.len() - 1
    }

    /// Add a childless alternative producing `text` with local `score`.
    pub fn add_lexical(&mut self, node: NodeId, text: &str, score: f32) -> usize {
        let slots = text
            .split_whitespace()
            .map(|w| Slot::Terminal(w.to_string()))
            .collect();
        self.add_alternative(
            node,
            Alternative {
                rule: None,
                score,
                breakdown: ScoreBreakdown::new(),
                slots,
            },
        )
    }

    /// Add an alternative whose slots are the given children, in order.
    pub fn add_composition(&mut self, node: NodeId, children: &[NodeId], score: f32) -> usize {
        let slots = children
            .iter()
            .map(|&child| Slot::NonTerminal {
                node: child,
                span: self.nodes[child.index()].span,
            })
            .collect();
        self.add_alternative(
            node,
            Alternative {
                rule: None,
                score,
                breakdown: ScoreBreakdown::new(),
                slots,
            },
        )
    }

    pub fn set_breakdown(&mut self, node: NodeId, breakdown: ScoreBreakdown) {
        self.nodes[node.index()].breakdown = breakdown;
    }

    pub fn add_top(&mut self, node: NodeId) {
        self.tops.push(node);
    }

    /// Finish the forest. Tops are ordered by descending intrinsic score;
    /// equal scores keep insertion order.
    pub fn build(self) -> Forest {
        let mut tops = self.tops;
        let nodes = self.nodes;
        tops.sort_by(|a, b| nodes[b.index()].score.total_cmp(&nodes[a.index()].score));
        Forest {
            source: self.source,
            nodes,
            tops,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_sorts_tops_by_score() {
        let mut b = ForestBuilder::new().source("das haus");
        let low = b.add_node("S", Span::new(0, 2), -4.0);
        let high = b.add_node("S", Span::new(0, 2), -1.0);
        let tie = b.add_node("S", Span::new(0, 2), -4.0);
        b.add_top(low);
        b.add_top(high);
        b.add_top(tie);
        let forest = b.build();

        assert_eq!(forest.tops, vec![high, low, tie]);
        assert_eq!(forest.source.as_deref(), Some("das haus"));
    }

    #[test]
    fn test_add_composition_binds_child_spans() {
        let mut b = ForestBuilder::new();
        let left = b.add_node("X", Span::new(0, 1), -1.0);
        let right = b.add_node("X", Span::new(1, 3), -2.0);
        let parent = b.add_node("S", Span::new(0, 3), -3.0);
        b.add_composition(parent, &[left, right], 0.0);
        let forest = b.build();

        let alt = &forest.node(parent).alternatives[0];
        assert_eq!(alt.tail().collect::<Vec<_>>(), vec![left, right]);
        assert_eq!(
            alt.slots[1],
            Slot::NonTerminal {
                node: right,
                span: Span::new(1, 3)
            }
        );
    }

    #[test]
    fn test_add_lexical_splits_words() {
        let mut b = ForestBuilder::new();
        let n = b.add_node("X", Span::new(0, 1), -1.0);
        b.add_lexical(n, "the house", -1.0);
        let forest = b.build();

        let alt = &forest.node(n).alternatives[0];
        assert_eq!(alt.arity(), 0);
        assert_eq!(alt.slots.len(), 2);
    }
}
