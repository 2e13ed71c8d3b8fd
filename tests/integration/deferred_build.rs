use crate::support::{id, node, scenario_tree, wide_tree};
use std::time::Duration;
use vtree::walker::{NestedNode, NestedTree};
use vtree::{BasicNode, BuildOutcome, BuildState, DeferredTree, Directives, Openness, SchedulerConfig};

fn config() -> SchedulerConfig {
    SchedulerConfig {
        placeholder: true,
        building_task_timeout_ms: 5,
        slice_budget: 8,
    }
}

fn ids(tree: &DeferredTree<BasicNode, NestedTree<BasicNode>>) -> Option<Vec<String>> {
    tree.with_view(|view| view.ids())
}

#[tokio::test]
async fn superseded_build_never_replaces_placeholder() {
    let tree = DeferredTree::new(scenario_tree(), config()).unwrap();
    let mut commits = tree.subscribe();

    let first = tree.request(Directives::refresh());
    let replacement = NestedTree::from_roots(vec![NestedNode::leaf(node("only", true))]);
    let second = tree.replace_walker(replacement, Directives::refresh());
    assert!(tree.is_placeholder_shown());
    assert_eq!(tree.build_state(), BuildState::Scheduled);

    tree.notify_idle();
    assert!(matches!(first.wait().await, BuildOutcome::Superseded { epoch: 1 }));
    let outcome = second.wait().await;
    assert!(outcome.is_committed());
    assert_eq!(outcome.epoch(), 2);

    commits.changed().await.unwrap();
    let snapshot = *commits.borrow();
    assert_eq!(snapshot.commit, 1);
    assert_eq!(snapshot.epoch, 2);
    assert!(!snapshot.placeholder);
    assert_eq!(ids(&tree), Some(vec![id("only")]));
}

#[tokio::test]
async fn superseded_directives_are_merged() {
    let tree = DeferredTree::new(scenario_tree(), config()).unwrap();
    tree.request(Directives::refresh()).wait().await;

    let first = tree.request(Directives::new().set(id("a"), false));
    let second = tree.request(Directives::new().set(id("b"), Openness::SetOpen(false)));
    assert!(!first.wait().await.is_committed());
    assert!(second.wait().await.is_committed());

    assert_eq!(ids(&tree), Some(vec![id("r"), id("a"), id("b")]));
    let state = tree.committed_state();
    assert!(!state.records().get(&id("a")).unwrap().is_open());
    assert!(!state.records().get(&id("b")).unwrap().is_open());
}

#[tokio::test]
async fn running_build_is_cancelled_between_slices() {
    let tree = DeferredTree::new(wide_tree(30), config()).unwrap();
    tree.request(Directives::refresh()).wait().await;

    let first = tree.request(Directives::refresh());
    tree.notify_idle();

    for _ in 0..1000 {
        if tree.build_state() == BuildState::Running {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(tree.build_state(), BuildState::Running);

    let second = tree.request(Directives::new().set(id("big"), false));
    assert!(matches!(first.wait().await, BuildOutcome::Superseded { .. }));

    match second.wait().await {
        BuildOutcome::Committed { report, .. } => {
            assert_eq!(report.visible, 4);
            assert!(report.diagnostics.is_empty());
        }
        other => panic!("expected commit, got {other:?}"),
    }
    assert_eq!(tree.snapshot().commit, 2);
}

#[tokio::test]
async fn toggles_apply_directly_once_settled() {
    let tree = DeferredTree::new(scenario_tree(), config()).unwrap();
    tree.request(Directives::refresh()).wait().await;
    let epoch = tree.snapshot().epoch;

    let outcome = tree.toggle(id("a")).wait().await;
    match outcome {
        BuildOutcome::Committed { report, .. } => assert!(report.partial),
        other => panic!("expected commit, got {other:?}"),
    }
    assert_eq!(tree.snapshot().epoch, epoch);
    assert_eq!(ids(&tree), Some(vec![id("r"), id("a"), id("b")]));

    tree.toggle(id("a")).wait().await;
    assert_eq!(ids(&tree), Some(vec![id("r"), id("a"), id("c"), id("d"), id("b")]));
}

#[tokio::test]
async fn toggles_compose_while_a_build_is_in_flight() {
    let tree = DeferredTree::new(scenario_tree(), config()).unwrap();
    tree.request(Directives::refresh()).wait().await;

    let refresh = tree.request(Directives::refresh());
    let close = tree.toggle(id("a"));
    let reopen = tree.toggle(id("a"));
    assert_eq!(tree.build_state(), BuildState::Scheduled);

    tree.notify_idle();
    assert!(!refresh.wait().await.is_committed());
    assert!(!close.wait().await.is_committed());
    assert!(reopen.wait().await.is_committed());
    assert_eq!(ids(&tree), Some(vec![id("r"), id("a"), id("c"), id("d"), id("b")]));
    assert!(tree.committed_state().records().get(&id("a")).unwrap().is_open());
}

#[tokio::test]
async fn idle_signal_does_not_carry_over_to_later_requests() {
    let tree = DeferredTree::new(
        scenario_tree(),
        SchedulerConfig {
            building_task_timeout_ms: 10_000,
            ..config()
        },
    )
    .unwrap();

    let first = tree.request(Directives::refresh());
    tree.notify_idle();
    tree.notify_idle();
    assert!(first.wait().await.is_committed());

    let second = tree.request(Directives::new().set(id("a"), false));
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(tree.build_state(), BuildState::Scheduled);
    assert_eq!(tree.snapshot().commit, 1);

    tree.notify_idle();
    let outcome = tokio::time::timeout(Duration::from_secs(5), second.wait())
        .await
        .unwrap();
    assert!(outcome.is_committed());
    assert_eq!(ids(&tree), Some(vec![id("r"), id("a"), id("b")]));
}

#[tokio::test]
async fn superseded_request_leaves_state_scheduled() {
    let tree = DeferredTree::new(
        scenario_tree(),
        SchedulerConfig {
            building_task_timeout_ms: 10_000,
            ..config()
        },
    )
    .unwrap();

    let first = tree.request(Directives::refresh());
    let second = tree.request(Directives::refresh());
    assert!(matches!(first.wait().await, BuildOutcome::Superseded { epoch: 1 }));
    assert_eq!(tree.build_state(), BuildState::Scheduled);

    tree.notify_idle();
    assert!(second.wait().await.is_committed());
    assert_eq!(tree.build_state(), BuildState::Committed);
}

#[tokio::test]
async fn build_starts_after_timeout_without_idle_signal() {
    let tree = DeferredTree::new(scenario_tree(), config()).unwrap();
    let handle = tree.request(Directives::refresh());
    let outcome = tokio::time::timeout(Duration::from_secs(5), handle.wait())
        .await
        .unwrap();
    assert!(outcome.is_committed());
    assert_eq!(tree.build_state(), BuildState::Committed);
}

#[test]
fn immediate_mode_needs_no_runtime() {
    let tree = DeferredTree::new(scenario_tree(), SchedulerConfig::immediate()).unwrap();
    assert!(!tree.is_placeholder_shown());
    tree.request(Directives::refresh());
    assert_eq!(ids(&tree).unwrap().len(), 5);
    tree.toggle(id("a"));
    assert_eq!(ids(&tree).unwrap(), vec![id("r"), id("a"), id("b")]);
}

#[test]
fn toggling_an_unknown_id_commits_nothing() {
    let tree = DeferredTree::new(scenario_tree(), SchedulerConfig::immediate()).unwrap();
    tree.request(Directives::refresh());
    let before = tree.snapshot();
    let mut commits = tree.subscribe();

    let outcome = tree.toggle(id("ghost"));
    assert_eq!(outcome.epoch(), before.epoch);
    assert_eq!(tree.snapshot().commit, before.commit);
    assert!(!commits.has_changed().unwrap());
    assert_eq!(ids(&tree).unwrap().len(), 5);
}
