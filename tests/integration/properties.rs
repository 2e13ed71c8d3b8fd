//! Invariant properties over random forests and random openness edits.

use proptest::prelude::*;
use proptest::sample::Index;
use std::collections::HashMap;
use vtree::walker::NestedTree;
use vtree::{BasicNode, Directives, FlatTree, Openness};

/// Shape of a random forest: node `i` is a root or a child of an earlier node.
#[derive(Debug, Clone)]
struct Shape {
    parent: Vec<Option<usize>>,
    open: Vec<bool>,
}

impl Shape {
    fn walker(&self) -> NestedTree<BasicNode> {
        let mut builder = NestedTree::builder();
        for (i, parent) in self.parent.iter().enumerate() {
            let data = BasicNode::new(i.to_string(), format!("n{i}"), self.open[i]);
            match parent {
                Some(p) => builder.child(*p, data),
                None => builder.root(data),
            };
        }
        builder.build()
    }

    fn children(&self) -> HashMap<Option<usize>, Vec<usize>> {
        let mut children: HashMap<Option<usize>, Vec<usize>> = HashMap::new();
        for (i, parent) in self.parent.iter().enumerate() {
            children.entry(*parent).or_default().push(i);
        }
        children
    }

    /// Pre-order of nodes reachable through open ancestors, per `is_open`.
    fn expected(&self, is_open: impl Fn(usize) -> bool) -> Vec<String> {
        let children = self.children();
        let mut out = Vec::new();
        let mut stack: Vec<usize> = children.get(&None).cloned().unwrap_or_default();
        stack.reverse();
        while let Some(n) = stack.pop() {
            out.push(n.to_string());
            if is_open(n) {
                if let Some(kids) = children.get(&Some(n)) {
                    stack.extend(kids.iter().rev());
                }
            }
        }
        out
    }

    fn ancestors(&self, mut n: usize) -> Vec<usize> {
        let mut out = Vec::new();
        while let Some(p) = self.parent[n] {
            out.push(p);
            n = p;
        }
        out
    }
}

fn shape() -> impl Strategy<Value = Shape> {
    prop::collection::vec((any::<Index>(), any::<bool>(), any::<bool>()), 1..48).prop_map(|nodes| {
        let parent = nodes
            .iter()
            .enumerate()
            .map(|(i, (idx, root, _))| (i > 0 && !root).then(|| idx.index(i)))
            .collect();
        let open = nodes.iter().map(|(_, _, open)| *open).collect();
        Shape { parent, open }
    })
}

#[derive(Debug, Clone)]
enum Edit {
    Toggle(Index),
    Cascade(Index, bool),
    Recompute { refresh: bool, defaults: bool },
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        4 => any::<Index>().prop_map(Edit::Toggle),
        1 => (any::<Index>(), any::<bool>()).prop_map(|(i, open)| Edit::Cascade(i, open)),
        1 => (any::<bool>(), any::<bool>())
            .prop_map(|(refresh, defaults)| Edit::Recompute { refresh, defaults }),
    ]
}

fn apply(tree: &mut FlatTree<BasicNode, NestedTree<BasicNode>>, len: usize, edit: &Edit) {
    match edit {
        Edit::Toggle(i) => {
            tree.toggle(&i.index(len).to_string());
        }
        Edit::Cascade(i, open) => {
            tree.set_open(&i.index(len).to_string(), Openness::cascade(*open));
        }
        Edit::Recompute { refresh, defaults } => {
            tree.recompute(
                Directives::new()
                    .refresh_nodes(*refresh)
                    .use_default_openness(*defaults),
            );
        }
    }
}

proptest! {
    #[test]
    fn order_matches_reference_flattening(shape in shape(), edits in prop::collection::vec(edit(), 0..24)) {
        let len = shape.parent.len();
        let mut tree = FlatTree::new(shape.walker());

        for edit in &edits {
            apply(&mut tree, len, edit);

            let is_open = |n: usize| tree.record(&n.to_string()).map(|r| r.is_open()).unwrap_or(false);
            let expected = shape.expected(is_open);
            prop_assert_eq!(tree.view().ids(), expected);

            for shown in tree.view().ids() {
                let n: usize = shown.parse().unwrap();
                for ancestor in shape.ancestors(n) {
                    prop_assert!(is_open(ancestor), "{} shown under closed {}", n, ancestor);
                }
                prop_assert!(tree.is_shown(&shown));
            }
        }
    }

    #[test]
    fn identical_recomputations_are_idempotent(shape in shape(), edits in prop::collection::vec(edit(), 0..12)) {
        let len = shape.parent.len();
        let mut tree = FlatTree::new(shape.walker());
        for edit in &edits {
            apply(&mut tree, len, edit);
        }

        let report = tree.recompute(Directives::refresh());
        prop_assert!(report.diagnostics.is_empty());
        let order = tree.view().ids();
        let records: Vec<_> = tree.records().iter().cloned().collect();

        tree.recompute(Directives::refresh());
        prop_assert_eq!(tree.view().ids(), order);
        prop_assert!(tree.records().iter().eq(records.iter()));
    }

    #[test]
    fn lightweight_passes_never_report_violations(shape in shape(), edits in prop::collection::vec(edit(), 0..12)) {
        let len = shape.parent.len();
        let mut tree = FlatTree::new(shape.walker());
        for edit in &edits {
            apply(&mut tree, len, edit);
            let report = tree.recompute(Directives::new());
            prop_assert!(report.diagnostics.is_empty());
        }
    }
}
