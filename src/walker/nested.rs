//! In-memory forest with a stack-based walker.
//!
//! Nodes live in a shared arena so walks own everything they touch and can
//! be moved into background build tasks.

use super::{TreeWalker, Walk, Yield};
use crate::types::NodeData;
use std::sync::Arc;

#[derive(Debug)]
struct Entry<T> {
    data: T,
    children: Vec<usize>,
}

#[derive(Debug)]
struct Arena<T> {
    nodes: Vec<Entry<T>>,
    roots: Vec<usize>,
}

/// Recursive node description, convenient for small literal trees
#[derive(Debug, Clone)]
pub struct NestedNode<T> {
    pub data: T,
    pub children: Vec<NestedNode<T>>,
}

impl<T> NestedNode<T> {
    pub fn leaf(data: T) -> Self {
        Self {
            data,
            children: Vec::new(),
        }
    }

    pub fn with_children(data: T, children: Vec<NestedNode<T>>) -> Self {
        Self { data, children }
    }
}

/// Incremental builder addressing nodes by insertion index
#[derive(Debug)]
pub struct NestedTreeBuilder<T> {
    nodes: Vec<Entry<T>>,
    roots: Vec<usize>,
}

impl<T> Default for NestedTreeBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> NestedTreeBuilder<T> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            roots: Vec::new(),
        }
    }

    pub fn root(&mut self, data: T) -> usize {
        let idx = self.push(data);
        self.roots.push(idx);
        idx
    }

    /// Append `data` as the last child of the node at `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` was not returned by this builder.
    pub fn child(&mut self, parent: usize, data: T) -> usize {
        assert!(parent < self.nodes.len(), "unknown parent index {parent}");
        let idx = self.push(data);
        self.nodes[parent].children.push(idx);
        idx
    }

    pub fn build(self) -> NestedTree<T> {
        NestedTree {
            arena: Arc::new(Arena {
                nodes: self.nodes,
                roots: self.roots,
            }),
        }
    }

    fn push(&mut self, data: T) -> usize {
        self.nodes.push(Entry {
            data,
            children: Vec::new(),
        });
        self.nodes.len() - 1
    }
}

/// Immutable in-memory forest implementing [`TreeWalker`]
///
/// Cloning is cheap: clones share the arena.
#[derive(Debug)]
pub struct NestedTree<T> {
    arena: Arc<Arena<T>>,
}

impl<T> Clone for NestedTree<T> {
    fn clone(&self) -> Self {
        Self {
            arena: Arc::clone(&self.arena),
        }
    }
}

impl<T> NestedTree<T> {
    pub fn builder() -> NestedTreeBuilder<T> {
        NestedTreeBuilder::new()
    }

    /// Flatten recursive node descriptions into an arena-backed forest.
    pub fn from_roots(roots: Vec<NestedNode<T>>) -> Self {
        let mut builder = NestedTreeBuilder::new();
        // (parent, node) pairs; reversed so siblings keep their order
        let mut pending: Vec<(Option<usize>, NestedNode<T>)> =
            roots.into_iter().rev().map(|n| (None, n)).collect();
        while let Some((parent, node)) = pending.pop() {
            let idx = match parent {
                Some(p) => builder.child(p, node.data),
                None => builder.root(node.data),
            };
            pending.extend(node.children.into_iter().rev().map(|c| (Some(idx), c)));
        }
        builder.build()
    }

    pub fn len(&self) -> usize {
        self.arena.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.nodes.is_empty()
    }
}

/// Depth-first walk over a [`NestedTree`]
///
/// Pending nodes sit on an explicit stack; the children of the last yielded
/// node are pushed only once the engine answers that it is open.
#[derive(Debug)]
pub struct NestedWalk<T> {
    arena: Arc<Arena<T>>,
    refresh: bool,
    stack: Vec<(usize, u32)>,
    last: Option<(usize, u32)>,
}

impl<T: NodeData> Walk<T> for NestedWalk<T> {
    fn resume(&mut self, open: bool) -> Option<Yield<T>> {
        if let Some((idx, depth)) = self.last.take() {
            if open {
                let children = &self.arena.nodes[idx].children;
                self.stack
                    .extend(children.iter().rev().map(|&child| (child, depth + 1)));
            }
        }

        let (idx, depth) = self.stack.pop()?;
        self.last = Some((idx, depth));
        let data = &self.arena.nodes[idx].data;
        Some(if self.refresh {
            Yield::Full {
                node: data.clone(),
                depth,
            }
        } else {
            Yield::Id {
                id: data.id().clone(),
                depth,
            }
        })
    }
}

impl<T: NodeData> TreeWalker<T> for NestedTree<T> {
    type Walk = NestedWalk<T>;

    fn walk(&self, refresh: bool) -> NestedWalk<T> {
        NestedWalk {
            arena: Arc::clone(&self.arena),
            refresh,
            stack: self.arena.roots.iter().rev().map(|&r| (r, 0)).collect(),
            last: None,
        }
    }
}
