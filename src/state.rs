//! Tree state: the record store together with the Order it produced.
//!
//! Every mutation of visible state goes through here so the two never drift
//! apart. Openness changes take the cheapest route that keeps Order exact:
//! splice, no-op, or a lightweight walk.

use crate::directive::{Directives, Openness};
use crate::flatten::{flatten, PassReport};
use crate::mutator::SubtreeMutator;
use crate::store::{Order, RecordStore};
use crate::types::NodeData;
use crate::walker::TreeWalker;
use std::time::Instant;
use tracing::debug;

/// Records plus the visible Order derived from them
#[derive(Debug, Clone)]
pub struct TreeState<T: NodeData> {
    pub(crate) records: RecordStore<T>,
    pub(crate) order: Order,
}

impl<T: NodeData> Default for TreeState<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: NodeData> TreeState<T> {
    pub fn new() -> Self {
        Self {
            records: RecordStore::new(),
            order: Order::new(),
        }
    }

    pub fn records(&self) -> &RecordStore<T> {
        &self.records
    }

    pub fn order(&self) -> &Order {
        &self.order
    }

    /// Run one complete flattening pass.
    pub fn run_pass<W>(&mut self, walker: &W, directives: Directives<T>) -> PassReport<T::Id>
    where
        W: TreeWalker<T> + ?Sized,
    {
        flatten(&mut self.records, &mut self.order, walker, directives)
    }

    /// Change one node's openness and bring Order up to date.
    ///
    /// Returns `None` for an unknown id, leaving everything untouched.
    pub fn set_open<W>(
        &mut self,
        walker: &W,
        id: &T::Id,
        openness: Openness<T>,
    ) -> Option<PassReport<T::Id>>
    where
        W: TreeWalker<T> + ?Sized,
    {
        let started = Instant::now();
        let slot = self.records.slot(id)?;
        let position = self.order.position(slot);
        let mutation = SubtreeMutator::apply_at(&mut self.records, slot, &openness);

        let Some(position) = position else {
            // Hidden: the change surfaces whenever an ancestor opens.
            return Some(self.partial_report(started));
        };

        if !mutation.is_open {
            if mutation.was_open {
                let removed = self.splice_out_descendants(position);
                debug!(slot, removed, "Collapsed node without walking");
            }
            return Some(self.partial_report(started));
        }

        let subtree_changed = matches!(openness, Openness::SetOpenWithSubtree { .. });
        if mutation.was_open && !subtree_changed {
            return Some(self.partial_report(started));
        }

        // Bare ids only work for records the store already holds.
        let refresh = self.records.exposes_undiscovered(slot);
        Some(self.run_pass(walker, Directives::new().refresh_nodes(refresh)))
    }

    /// Flip a node's openness.
    pub fn toggle<W>(&mut self, walker: &W, id: &T::Id) -> Option<PassReport<T::Id>>
    where
        W: TreeWalker<T> + ?Sized,
    {
        let open = self.records.get(id)?.is_open();
        self.set_open(walker, id, Openness::SetOpen(!open))
    }

    /// Set a record's size. Returns the Order index from which cached sizes
    /// are stale, or `None` when the record is unknown or not shown.
    pub fn resize(&mut self, id: &T::Id, size: Option<f64>) -> Option<usize> {
        let slot = self.records.slot(id)?;
        self.records.record_mut(slot).set_size(size);
        self.order.position(slot)
    }

    /// Drop every record the latest walk did not reach. Returns how many were dropped.
    pub fn evict_unreachable(&mut self) -> usize {
        let before = self.records.len();
        let records = &self.records;
        let seen: Vec<bool> = (0..before as u32).map(|slot| records.is_seen(slot)).collect();
        let remap = self.records.compact(|slot| seen[slot as usize]);
        self.order.remap(&remap, self.records.len());

        let evicted = before - self.records.len();
        debug!(evicted, kept = self.records.len(), "Evicted unreachable records");
        evicted
    }

    /// Remove the entries after `position` that sit deeper than it.
    fn splice_out_descendants(&mut self, position: usize) -> usize {
        let slots = self.order.slots();
        let depth = self.records.record(slots[position]).depth();
        let count = slots[position + 1..]
            .iter()
            .take_while(|&&slot| self.records.record(slot).depth() > depth)
            .count();
        self.order.remove_range(position + 1, count);
        count
    }

    fn partial_report(&self, started: Instant) -> PassReport<T::Id> {
        PassReport {
            visible: self.order.len(),
            partial: true,
            duration_ms: started.elapsed().as_millis() as u64,
            ..PassReport::default()
        }
    }
}
