//! Shared tree builders and assertions.

use vtree::walker::{NestedNode, NestedTree};
use vtree::{BasicNode, FlatTree, NodeData, TreeWalker};

pub fn node(id: &str, open: bool) -> BasicNode {
    BasicNode::new(id, id, open)
}

pub fn id(s: &str) -> String {
    s.to_string()
}

/// r { a { c, d }, b }, everything open by default
pub fn scenario_tree() -> NestedTree<BasicNode> {
    NestedTree::from_roots(vec![NestedNode::with_children(
        node("r", true),
        vec![
            NestedNode::with_children(
                node("a", true),
                vec![NestedNode::leaf(node("c", true)), NestedNode::leaf(node("d", true))],
            ),
            NestedNode::leaf(node("b", true)),
        ],
    )])
}

/// A root with two branches: `big` holding `fanout * fanout` leaves under
/// `fanout` groups, and a small `sibling` branch.
pub fn wide_tree(fanout: usize) -> NestedTree<BasicNode> {
    let mut builder = NestedTree::builder();
    let root = builder.root(node("root", true));
    let big = builder.child(root, node("big", true));
    for g in 0..fanout {
        let group = builder.child(big, node(&format!("g{g}"), true));
        for l in 0..fanout {
            builder.child(group, node(&format!("g{g}/l{l}"), true));
        }
    }
    let sibling = builder.child(root, node("sibling", true));
    builder.child(sibling, node("sibling/leaf", true));
    builder.build()
}

pub fn visible<T, W>(tree: &FlatTree<T, W>) -> Vec<T::Id>
where
    T: NodeData,
    W: TreeWalker<T>,
{
    tree.view().ids()
}

pub fn is_open<W: TreeWalker<BasicNode>>(tree: &FlatTree<BasicNode, W>, s: &str) -> bool {
    tree.record(&id(s)).map(|r| r.is_open()).unwrap_or(false)
}
