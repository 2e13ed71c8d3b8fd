//! Subtree Mutator
//!
//! Applies an openness change to one record and, for
//! [`Openness::SetOpenWithSubtree`], runs the callback over every structural
//! descendant reachable through the store's links. Cost is linear in the
//! subtree; sibling subtrees and the walker are never touched. Reflecting the
//! change in Order is the caller's job, once, afterwards.

use crate::directive::Openness;
use crate::store::RecordStore;
use crate::types::NodeData;
use tracing::trace;

/// Outcome of one mutation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationReport {
    pub was_open: bool,
    pub is_open: bool,
    /// Descendants handed to the subtree callback.
    pub descendants_visited: usize,
}

/// Stateless applier of [`Openness`] directives
pub struct SubtreeMutator;

impl SubtreeMutator {
    /// Apply `openness` to the record for `id`. Unknown ids are a no-op (`None`).
    pub fn apply<T: NodeData>(
        store: &mut RecordStore<T>,
        id: &T::Id,
        openness: &Openness<T>,
    ) -> Option<MutationReport> {
        let slot = store.slot(id)?;
        Some(Self::apply_at(store, slot, openness))
    }

    pub(crate) fn apply_at<T: NodeData>(
        store: &mut RecordStore<T>,
        slot: u32,
        openness: &Openness<T>,
    ) -> MutationReport {
        let record = store.record_mut(slot);
        let was_open = record.is_open();
        record.set_open(openness.open());

        let mut visited = 0;
        if let Openness::SetOpenWithSubtree { callback, .. } = openness {
            let mut walk = store.descendants_at(slot);
            while let Some(descendant) = walk.next_slot(store) {
                let (descendant, owner) = store.record_pair(descendant, slot);
                callback(descendant, owner);
                visited += 1;
            }
        }

        trace!(
            slot,
            was_open,
            is_open = openness.open(),
            descendants = visited,
            "Applied openness directive"
        );

        MutationReport {
            was_open,
            is_open: openness.open(),
            descendants_visited: visited,
        }
    }
}
