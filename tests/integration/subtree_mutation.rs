use crate::support::{id, is_open, scenario_tree, visible, wide_tree};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use vtree::{Directives, FlatTree, Openness, SubtreeMutator};

const FANOUT: usize = 317;

#[test]
fn collapse_and_expand_large_subtree() {
    let mut tree = FlatTree::new(wide_tree(FANOUT));
    let before = visible(&tree);
    assert!(before.len() > 100_000);

    tree.resize(&id("sibling/leaf"), Some(11.0));
    let sibling_before = tree.record(&id("sibling")).unwrap().clone();

    let report = tree.set_open(&id("big"), Openness::SetOpen(false)).unwrap();
    assert!(report.partial);
    assert_eq!(visible(&tree), vec!["root", "big", "sibling", "sibling/leaf"]);

    tree.set_open(&id("big"), Openness::SetOpen(true)).unwrap();
    assert_eq!(visible(&tree), before);
    assert_eq!(tree.record(&id("sibling")).unwrap(), &sibling_before);
    assert_eq!(tree.record(&id("sibling/leaf")).unwrap().size(), Some(11.0));
}

#[test]
fn subtree_callback_runs_once_per_descendant_and_spares_siblings() {
    let mut tree = FlatTree::new(wide_tree(40));
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    tree.set_open(
        &id("big"),
        Openness::with_subtree(false, move |descendant, owner| {
            assert_eq!(owner.id(), "big");
            counter.fetch_add(1, Ordering::Relaxed);
            descendant.set_open(false);
        }),
    )
    .unwrap();

    assert_eq!(calls.load(Ordering::Relaxed), 40 + 40 * 40);
    assert!(!is_open(&tree, "g0"));
    assert!(is_open(&tree, "sibling"));
    assert!(is_open(&tree, "root"));

    tree.toggle(&id("big"));
    let shown = visible(&tree);
    assert_eq!(shown.len(), 4 + 40);
    assert!(!shown.iter().any(|s| s.starts_with('g') && s.contains('/')));
}

#[test]
fn callback_reaches_descendants_hidden_by_a_closed_ancestor() {
    let mut tree = FlatTree::new(scenario_tree());
    tree.toggle(&id("a"));
    assert_eq!(visible(&tree), vec!["r", "a", "b"]);

    // c and d are hidden under a, yet still structural descendants of r
    tree.set_open(&id("r"), Openness::cascade(true)).unwrap();
    assert_eq!(visible(&tree), vec!["r", "a", "c", "d", "b"]);

    tree.set_open(&id("r"), Openness::cascade(false)).unwrap();
    assert_eq!(visible(&tree), vec!["r"]);
    for s in ["a", "b", "c", "d"] {
        assert!(!is_open(&tree, s), "{s} should be closed");
    }
}

#[test]
fn prepass_directives_apply_in_order() {
    let mut tree = FlatTree::new(scenario_tree());
    tree.recompute(
        Directives::new()
            .set(id("a"), Openness::cascade(false))
            .set(id("a"), true),
    );
    assert_eq!(visible(&tree), vec!["r", "a", "c", "d", "b"]);
    assert!(!is_open(&tree, "c"));
}

#[test]
fn mutator_is_usable_on_a_bare_store() {
    let mut tree = FlatTree::new(scenario_tree());
    let mut records = tree.records().clone();
    let report = SubtreeMutator::apply(&mut records, &id("r"), &Openness::cascade(false)).unwrap();
    assert_eq!(report.descendants_visited, 4);
    assert!(records.iter().all(|r| !r.is_open()));

    // the engine's own store is untouched
    assert!(tree.records().iter().all(|r| r.is_open()));
    assert!(tree.toggle(&id("r")).is_some());
}
