//! Link traversal over the record store.
//!
//! Every hop is checked against the target's `parent` handle. Links of nodes
//! the latest walk did not descend into may be stale; a child that has since
//! moved under another parent ends the chain instead of leaking into a
//! foreign subtree.

use super::{Record, RecordStore, INVALID};
use crate::types::NodeData;

/// An iterator over the direct children of a record (or over the roots).
///
/// Created by [`RecordStore::children`] and [`RecordStore::roots`].
#[derive(Debug)]
pub struct Children<'a, T: NodeData> {
    store: &'a RecordStore<T>,
    parent: u32,
    current: u32,
}

impl<'a, T: NodeData> Children<'a, T> {
    pub(crate) fn new(store: &'a RecordStore<T>, parent: u32) -> Self {
        Self {
            store,
            parent,
            current: store.first_child[parent as usize],
        }
    }

    pub(crate) fn roots(store: &'a RecordStore<T>, first_root: u32) -> Self {
        Self {
            store,
            parent: INVALID,
            current: first_root,
        }
    }

    pub(crate) fn next_slot(&mut self) -> Option<u32> {
        if self.current == INVALID || self.store.parent[self.current as usize] != self.parent {
            self.current = INVALID;
            return None;
        }
        let slot = self.current;
        self.current = self.store.next_sibling[slot as usize];
        Some(slot)
    }
}

impl<'a, T: NodeData> Iterator for Children<'a, T> {
    type Item = &'a Record<T>;

    fn next(&mut self) -> Option<&'a Record<T>> {
        let store = self.store;
        self.next_slot().map(|slot| store.record(slot))
    }
}

/// Depth-first iterator over every structural descendant of a slot.
///
/// Yields slots, not records, so callers can mutate between steps by
/// re-borrowing the store. The starting slot itself is not yielded.
#[derive(Debug, Default)]
pub(crate) struct Descendants {
    stack: Vec<u32>,
}

impl Descendants {
    pub(crate) fn new<T: NodeData>(store: &RecordStore<T>, root: u32) -> Self {
        let mut walk = Self { stack: Vec::new() };
        walk.push_children(store, root);
        walk
    }

    pub(crate) fn next_slot<T: NodeData>(&mut self, store: &RecordStore<T>) -> Option<u32> {
        let slot = self.stack.pop()?;
        self.push_children(store, slot);
        Some(slot)
    }

    fn push_children<T: NodeData>(&mut self, store: &RecordStore<T>, slot: u32) {
        let start = self.stack.len();
        let mut children = Children::new(store, slot);
        while let Some(child) = children.next_slot() {
            self.stack.push(child);
        }
        // pop order = sibling order
        self.stack[start..].reverse();
    }
}

impl<T: NodeData> RecordStore<T> {
    /// Every structural descendant of `id` in depth-first pre-order.
    pub fn descendants(&self, id: &T::Id) -> Vec<&Record<T>> {
        let Some(slot) = self.slot(id) else {
            return Vec::new();
        };
        let mut walk = Descendants::new(self, slot);
        let mut found = Vec::new();
        while let Some(next) = walk.next_slot(self) {
            found.push(self.record(next));
        }
        found
    }
}
