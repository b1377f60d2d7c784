use super::super::*;
use crate::forest::{ForestBuilder, Span};
use crate::testutil::{chain_forest, sibling_forest, single_forest, translation_forest};

fn scores(list: &KBestList<'_>) -> Vec<f32> {
    list.iter().map(|e| e.score()).collect()
}

fn outputs(list: &KBestList<'_>) -> Vec<String> {
    list.iter().map(|e| e.output()).collect()
}

#[test]
fn test_single_vertex_two_alternatives() {
    let forest = single_forest();
    let list = extract(&forest, 2);
    assert_eq!(scores(&list), vec![5.0, 3.0]);
    assert_eq!(outputs(&list), vec!["five", "three"]);
}

#[test]
fn test_chain_back_pointers() {
    let (forest, _) = chain_forest();
    let list = extract(&forest, 3);

    assert_eq!(scores(&list), vec![11.0, 8.0, 3.0]);
    let bps: Vec<Vec<usize>> = list
        .iter()
        .map(|e| e.derivation().back_pointers().to_vec())
        .collect();
    assert_eq!(bps, vec![vec![0], vec![1], vec![2]]);
    assert_eq!(outputs(&list), vec!["ten", "seven", "two"]);
}

#[test]
fn test_siblings_advance_in_both_dimensions() {
    let (forest, _, _) = sibling_forest();
    let list = extract(&forest, 4);

    assert_eq!(scores(&list), vec![8.0, 5.0, 5.0, 2.0]);
    let bps: Vec<Vec<usize>> = list
        .iter()
        .map(|e| e.derivation().back_pointers().to_vec())
        .collect();
    // The tie keeps discovery order: the first tail position is advanced first.
    assert_eq!(bps, vec![vec![0, 0], vec![1, 0], vec![0, 1], vec![1, 1]]);
    assert_eq!(outputs(&list), vec!["l4 r4", "l1 r4", "l4 r1", "l1 r1"]);
}

#[test]
fn test_siblings_top_three_keeps_tie() {
    let (forest, _, _) = sibling_forest();
    let list = extract(&forest, 3);
    assert_eq!(scores(&list), vec![8.0, 5.0, 5.0]);
}

#[test]
fn test_fewer_derivations_than_requested() {
    let (forest, _, _) = sibling_forest();
    let list = extract(&forest, 100);
    assert_eq!(list.len(), 4);
}

#[test]
fn test_k_zero_and_no_tops() {
    let forest = single_forest();
    assert!(extract(&forest, 0).is_empty());
    assert!(extract_from(&forest, &[], 5).is_empty());
}

#[test]
fn test_multiple_tops_are_merged() {
    let forest = translation_forest();
    let list = extract(&forest, 8);
    assert_eq!(
        scores(&list),
        vec![-3.5, -4.0, -5.0, -5.5, -5.75, -6.25, -7.25, -7.75]
    );
    assert_eq!(
        outputs(&list),
        vec![
            "the house",
            "the home",
            "that house",
            "that home",
            "house the",
            "home the",
            "house that",
            "home that",
        ]
    );
}

#[test]
fn test_one_top_matches_many_tops_restricted() {
    let forest = translation_forest();
    let monotone = forest.tops[0];
    let only = extract_from(&forest, &[monotone], 4);
    let all = extract(&forest, 4);
    assert_eq!(outputs(&only), outputs(&all));
}

#[test]
fn test_repeated_top_is_not_duplicated() {
    let forest = single_forest();
    let top = forest.tops[0];
    let list = extract_from(&forest, &[top, top], 5);
    assert_eq!(scores(&list), vec![5.0, 3.0]);
}

#[test]
fn test_breakdown_accumulates_children() {
    let forest = translation_forest();
    let list = extract(&forest, 2);
    let best = list.get(0).unwrap();
    assert_eq!(best.breakdown().get("tm"), -1.5);
    assert_eq!(best.breakdown().get("lm"), -2.0);

    let second = list.get(1).unwrap();
    assert_eq!(second.output(), "the home");
    assert_eq!(second.breakdown().get("tm"), -2.0);
    assert_eq!(second.breakdown().get("lm"), -2.0);
}

#[test]
fn test_children_walk_sub_derivations() {
    let forest = translation_forest();
    let list = extract(&forest, 3);
    let third = list.get(2).unwrap();
    assert_eq!(third.output(), "that house");

    let children = third.children();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].output(), "that");
    assert_eq!(children[0].rank(), 1);
    assert_eq!(children[1].output(), "house");
    assert_eq!(children[1].rank(), 0);
}

#[test]
fn test_tree_rendering() {
    let forest = translation_forest();
    let list = extract(&forest, 5);
    assert_eq!(
        list.get(0).unwrap().tree(),
        "(S[S -> X1 X2] (X the) (X house))"
    );
    assert_eq!(
        list.get(4).unwrap().tree(),
        "(S[S -> X2 X1] (X house) (X the))"
    );
}

#[test]
fn test_shared_child_searched_once() {
    // Both tops reuse the same children, so only one vertex per node exists.
    let forest = translation_forest();
    let list = extract(&forest, 8);
    // root + 2 tops + 2 children
    assert_eq!(list.vertex_count(), 5);
    assert_eq!(list.discovered(forest.tops[0]).len(), 4);
}

#[test]
fn test_starved_alternative_is_skipped() {
    let mut b = ForestBuilder::new();
    let empty = b.add_node("X", Span::new(0, 1), 0.0);
    let leaf = b.add_node("X", Span::new(0, 1), 2.0);
    b.add_lexical(leaf, "leaf", 2.0);
    let top = b.add_node("S", Span::new(0, 1), 2.0);
    b.add_composition(top, &[empty], 10.0);
    b.add_composition(top, &[leaf], 0.0);
    b.add_top(top);
    let forest = b.build();

    let list = extract(&forest, 5);
    assert_eq!(outputs(&list), vec!["leaf"]);
    assert!(list.discovered(empty).is_empty());
}

#[test]
fn test_top_without_alternatives_yields_nothing() {
    let mut b = ForestBuilder::new();
    let top = b.add_node("S", Span::new(0, 1), 0.0);
    b.add_top(top);
    let forest = b.build();
    assert!(extract(&forest, 3).is_empty());
}

#[test]
fn test_distinct_collapses_equal_outputs() {
    let mut b = ForestBuilder::new();
    let v = b.add_node("S", Span::new(0, 1), 3.0);
    b.add_lexical(v, "same", 3.0);
    b.add_lexical(v, "same", 2.0);
    b.add_lexical(v, "other", 1.0);
    b.add_top(v);
    let forest = b.build();

    let plain = extract_with(
        &forest,
        &ExtractOptions {
            k: 3,
            distinct: false,
            oversample_factor: 1,
        },
    );
    assert_eq!(outputs(&plain), vec!["same", "same", "other"]);

    let distinct = extract_with(
        &forest,
        &ExtractOptions {
            k: 2,
            distinct: true,
            oversample_factor: 2,
        },
    );
    assert_eq!(outputs(&distinct), vec!["same", "other"]);
    assert_eq!(scores(&distinct), vec![3.0, 1.0]);
}

#[test]
fn test_default_options_follow_settings() {
    let options = ExtractOptions::default();
    assert!(options.k > 0);
    assert!(options.oversample_factor > 0);
    assert_eq!(ExtractOptions::with_k(7).k, 7);
}

#[test]
fn test_parallel_sentences_use_separate_state() {
    let forests = vec![translation_forest(), single_forest()];
    let results: Vec<Vec<String>> = std::thread::scope(|s| {
        let handles: Vec<_> = forests
            .iter()
            .map(|f| s.spawn(move || outputs(&extract(f, 2))))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(results[0], vec!["the house", "the home"]);
    assert_eq!(results[1], vec!["five", "three"]);
}
