#![cfg(test)]

use crate::forest::{Alternative, Forest, ForestBuilder, NodeId, ScoreBreakdown, Slot, Span};

/// One hypothesis with two childless alternatives scoring 5 and 3.
pub fn single_forest() -> Forest {
    let mut b = ForestBuilder::new();
    let v = b.add_node("S", Span::new(0, 1), 5.0);
    b.add_lexical(v, "five", 5.0);
    b.add_lexical(v, "three", 3.0);
    b.add_top(v);
    b.build()
}

/// `v -> c` with local score 1; `c` has childless alternatives 10, 7, 2.
pub fn chain_forest() -> (Forest, NodeId) {
    let mut b = ForestBuilder::new();
    let c = b.add_node("X", Span::new(0, 1), 10.0);
    b.add_lexical(c, "ten", 10.0);
    b.add_lexical(c, "seven", 7.0);
    b.add_lexical(c, "two", 2.0);
    let v = b.add_node("S", Span::new(0, 1), 11.0);
    b.add_composition(v, &[c], 1.0);
    b.add_top(v);
    (b.build(), c)
}

/// `top -> left right` with local score 0; both children score 4 or 1.
pub fn sibling_forest() -> (Forest, NodeId, NodeId) {
    let mut b = ForestBuilder::new();
    let left = b.add_node("X", Span::new(0, 1), 4.0);
    b.add_lexical(left, "l4", 4.0);
    b.add_lexical(left, "l1", 1.0);
    let right = b.add_node("X", Span::new(1, 2), 4.0);
    b.add_lexical(right, "r4", 4.0);
    b.add_lexical(right, "r1", 1.0);
    let top = b.add_node("S", Span::new(0, 2), 8.0);
    b.add_composition(top, &[left, right], 0.0);
    b.add_top(top);
    (b.build(), left, right)
}

fn lexical(text: &str, tm: f32, lm: f32) -> Alternative {
    let mut breakdown = ScoreBreakdown::new();
    if tm != 0.0 {
        breakdown.add("tm", tm);
    }
    if lm != 0.0 {
        breakdown.add("lm", lm);
    }
    Alternative {
        rule: None,
        score: tm + lm,
        breakdown,
        slots: text
            .split_whitespace()
            .map(|w| Slot::Terminal(w.to_string()))
            .collect(),
    }
}

/// A small "das haus" forest with a monotone and an inverted sentence-level
/// hypothesis and per-feature breakdowns.
///
/// Totals: the house -3.5, the home -4.0, that house -5.0, that home -5.5,
/// house the -5.75, home the -6.25, house that -7.25, home that -7.75.
pub fn translation_forest() -> Forest {
    let mut b = ForestBuilder::new().source("das haus");
    let das = b.add_node("X", Span::new(0, 1), -0.5);
    b.add_alternative(das, lexical("the", -0.5, 0.0));
    b.add_alternative(das, lexical("that", -2.0, 0.0));

    let haus = b.add_node("X", Span::new(1, 2), -1.0);
    b.add_alternative(haus, lexical("house", -0.5, -0.5));
    b.add_alternative(haus, lexical("home", -1.0, -0.5));

    let nt = |node: NodeId, span: Span| Slot::NonTerminal { node, span };

    let monotone = b.add_node("S", Span::new(0, 2), -3.5);
    b.add_alternative(
        monotone,
        Alternative {
            rule: Some("S -> X1 X2".to_string()),
            score: -2.0,
            breakdown: ScoreBreakdown::new().with("tm", -0.5).with("lm", -1.5),
            slots: vec![nt(das, Span::new(0, 1)), nt(haus, Span::new(1, 2))],
        },
    );

    let inverted = b.add_node("S", Span::new(0, 2), -5.75);
    b.add_alternative(
        inverted,
        Alternative {
            rule: Some("S -> X2 X1".to_string()),
            score: -4.25,
            breakdown: ScoreBreakdown::new().with("tm", -0.25).with("lm", -4.0),
            slots: vec![nt(haus, Span::new(1, 2)), nt(das, Span::new(0, 1))],
        },
    );

    b.add_top(inverted);
    b.add_top(monotone);
    b.build()
}
