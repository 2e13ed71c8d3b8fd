//! Tree Walker Contract
//!
//! A tree walker is a pull-based, single-consumer producer. Every flattening
//! pass asks the walker for a fresh [`Walk`] and pumps it with
//! [`Walk::resume`], answering each yield with the openness of the node it
//! just produced. `true` means "descend into this node's children", `false`
//! means "skip them", whatever the walker itself believes about the node.
//!
//! Nodes must come out depth-first, pre-order, children in display order. Each
//! yield carries its nesting depth (roots are depth 0) so the engine can
//! rebuild parent and sibling links from the stream.

pub mod nested;

pub use nested::{NestedNode, NestedTree, NestedTreeBuilder, NestedWalk};

use crate::types::NodeData;

/// One item produced by a walk
#[derive(Debug, Clone, PartialEq)]
pub enum Yield<T: NodeData> {
    /// Full descriptor, produced on refresh pulls.
    Full { node: T, depth: u32 },
    /// Bare id, produced on lightweight pulls for nodes the engine already knows.
    Id { id: T::Id, depth: u32 },
}

impl<T: NodeData> Yield<T> {
    pub fn id(&self) -> &T::Id {
        match self {
            Yield::Full { node, .. } => node.id(),
            Yield::Id { id, .. } => id,
        }
    }

    pub fn depth(&self) -> u32 {
        match self {
            Yield::Full { depth, .. } | Yield::Id { depth, .. } => *depth,
        }
    }
}

/// A single in-progress walk over the tree
pub trait Walk<T: NodeData> {
    /// Resume the walk, reporting whether the previously yielded node is open.
    ///
    /// The first call receives `false`. Returns `None` once the walk is done.
    fn resume(&mut self, open: bool) -> Option<Yield<T>>;
}

/// Factory for walks. A new walk is started for every flattening pass.
pub trait TreeWalker<T: NodeData> {
    type Walk: Walk<T>;

    /// Start a walk from the root(s). `refresh` selects full descriptors over bare ids.
    fn walk(&self, refresh: bool) -> Self::Walk;
}

/// Tree walker built from a closure that starts walks
#[derive(Debug, Clone)]
pub struct FnWalker<F>(F);

/// Wrap a closure `Fn(refresh) -> impl Walk` as a [`TreeWalker`].
pub fn from_fn<F>(start: F) -> FnWalker<F> {
    FnWalker(start)
}

impl<T, F, K> TreeWalker<T> for FnWalker<F>
where
    T: NodeData,
    F: Fn(bool) -> K,
    K: Walk<T>,
{
    type Walk = K;

    fn walk(&self, refresh: bool) -> K {
        (self.0)(refresh)
    }
}

/// Walk driven by a `FnMut(open) -> Option<Yield>` closure
#[derive(Debug, Clone)]
pub struct WalkFn<F>(F);

pub fn walk_fn<F>(step: F) -> WalkFn<F> {
    WalkFn(step)
}

impl<T, F> Walk<T> for WalkFn<F>
where
    T: NodeData,
    F: FnMut(bool) -> Option<Yield<T>>,
{
    fn resume(&mut self, open: bool) -> Option<Yield<T>> {
        (self.0)(open)
    }
}
