use crate::support::{id, is_open, node, scenario_tree, visible};
use vtree::walker::{NestedNode, NestedTree};
use vtree::{Directives, FlatTree, Openness};

#[test]
fn open_close_reopen_with_force_closed_children() {
    let mut tree = FlatTree::new(scenario_tree());
    assert_eq!(visible(&tree), vec!["r", "a", "c", "d", "b"]);

    tree.set_open(&id("a"), Openness::SetOpen(false)).unwrap();
    assert_eq!(visible(&tree), vec!["r", "a", "b"]);
    assert!(!tree.is_shown(&id("c")));

    tree.set_open(
        &id("a"),
        Openness::with_subtree(true, |descendant, _owner| descendant.set_open(false)),
    )
    .unwrap();
    assert_eq!(visible(&tree), vec!["r", "a", "c", "d", "b"]);
    assert!(!is_open(&tree, "c"));
    assert!(!is_open(&tree, "d"));
    assert!(is_open(&tree, "a"));
}

#[test]
fn identical_recomputations_are_idempotent() {
    let mut tree = FlatTree::new(scenario_tree());
    tree.toggle(&id("a"));

    tree.recompute(Directives::refresh());
    let order = visible(&tree);
    let records: Vec<_> = tree.records().iter().cloned().collect();

    tree.recompute(Directives::refresh());
    assert_eq!(visible(&tree), order);
    assert!(tree.records().iter().eq(records.iter()));
}

#[test]
fn unknown_id_directive_changes_nothing() {
    let mut tree = FlatTree::new(scenario_tree());
    let order = visible(&tree);
    let records: Vec<_> = tree.records().iter().cloned().collect();

    assert!(tree.set_open(&id("ghost"), Openness::cascade(false)).is_none());
    let report = tree.recompute(Directives::new().set(id("ghost"), false));

    assert!(report.diagnostics.is_empty());
    assert_eq!(visible(&tree), order);
    assert!(tree.records().iter().eq(records.iter()));
}

#[test]
fn size_survives_toggles() {
    let mut tree = FlatTree::new(scenario_tree());
    assert_eq!(tree.resize(&id("c"), Some(42.0)), Some(2));

    tree.toggle(&id("a"));
    tree.toggle(&id("a"));
    tree.recompute(Directives::refresh());

    assert_eq!(tree.record(&id("c")).unwrap().size(), Some(42.0));
    assert_eq!(tree.view().size_at(2), Some(42.0));
}

#[test]
fn use_default_size_resets_measurements() {
    let walker = NestedTree::from_roots(vec![NestedNode::leaf(node("x", true).with_size(10.0))]);
    let mut tree = FlatTree::new(walker);
    tree.resize(&id("x"), Some(99.0));

    tree.recompute(Directives::refresh());
    assert_eq!(tree.view().size_at(0), Some(99.0));

    tree.recompute(Directives::refresh().use_default_size(true));
    assert_eq!(tree.view().size_at(0), Some(10.0));
}

#[test]
fn walker_changes_reorder_and_hide_without_losing_state() {
    let mut tree = FlatTree::new(scenario_tree());
    tree.resize(&id("b"), Some(7.0));

    // b moves before a, d is removed
    let reordered = NestedTree::from_roots(vec![NestedNode::with_children(
        node("r", true),
        vec![
            NestedNode::leaf(node("b", true)),
            NestedNode::with_children(node("a", true), vec![NestedNode::leaf(node("c", true))]),
        ],
    )]);
    tree.replace_walker(reordered, Directives::refresh());
    assert_eq!(visible(&tree), vec!["r", "b", "a", "c"]);
    assert!(!tree.is_shown(&id("d")));
    assert!(tree.record(&id("d")).is_some());

    tree.replace_walker(scenario_tree(), Directives::refresh());
    assert_eq!(visible(&tree), vec!["r", "a", "c", "d", "b"]);
    assert_eq!(tree.record(&id("b")).unwrap().size(), Some(7.0));
}

#[test]
fn default_openness_restores_descriptor_state() {
    let walker = NestedTree::from_roots(vec![NestedNode::with_children(
        node("r", true),
        vec![NestedNode::with_children(
            node("a", false),
            vec![NestedNode::leaf(node("c", true))],
        )],
    )]);
    let mut tree = FlatTree::new(walker);
    assert_eq!(visible(&tree), vec!["r", "a"]);

    tree.toggle(&id("a"));
    tree.toggle(&id("r"));
    assert_eq!(visible(&tree), vec!["r"]);

    tree.recompute(Directives::refresh().use_default_openness(true));
    assert_eq!(visible(&tree), vec!["r", "a"]);
    assert!(!is_open(&tree, "a"));
}

#[test]
fn evicted_records_lose_state() {
    let mut tree = FlatTree::new(scenario_tree());
    tree.resize(&id("c"), Some(3.0));
    tree.toggle(&id("a"));
    tree.recompute(Directives::new());

    assert_eq!(tree.evict_unreachable(), 2);
    assert!(tree.record(&id("c")).is_none());

    tree.toggle(&id("a"));
    assert_eq!(visible(&tree), vec!["r", "a", "c", "d", "b"]);
    assert_eq!(tree.record(&id("c")).unwrap().size(), None);
}

#[test]
fn eviction_rediscovers_children_behind_a_moved_first_child() {
    let before = NestedTree::from_roots(vec![NestedNode::with_children(
        node("r", true),
        vec![
            NestedNode::with_children(
                node("p", true),
                vec![NestedNode::leaf(node("x", true)), NestedNode::leaf(node("y", true))],
            ),
            NestedNode::leaf(node("q", true)),
        ],
    )]);
    let mut tree = FlatTree::new(before);
    tree.toggle(&id("p"));

    // x moves under q while p is closed, y is only reachable through p
    let after = NestedTree::from_roots(vec![NestedNode::with_children(
        node("r", true),
        vec![
            NestedNode::with_children(node("p", true), vec![NestedNode::leaf(node("y", true))]),
            NestedNode::with_children(node("q", true), vec![NestedNode::leaf(node("x", true))]),
        ],
    )]);
    tree.replace_walker(after, Directives::refresh());
    assert_eq!(visible(&tree), vec!["r", "p", "q", "x"]);
    assert_eq!(tree.evict_unreachable(), 1);

    let report = tree.toggle(&id("p")).unwrap();
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
    assert_eq!(visible(&tree), vec!["r", "p", "y", "q", "x"]);
}
