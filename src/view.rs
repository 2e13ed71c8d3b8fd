//! Viewport surface
//!
//! [`FlatView`] is what a windowing component reads: length, index to record,
//! per-index size, id to index. [`Viewport`] is what the engine calls back
//! into for scroll requests and size invalidation.

use crate::state::TreeState;
use crate::store::Record;
use crate::types::{Align, NodeData};

/// Read-only view over the visible Order
pub struct FlatView<'a, T: NodeData> {
    state: &'a TreeState<T>,
}

impl<'a, T: NodeData> Clone for FlatView<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T: NodeData> Copy for FlatView<'a, T> {}

impl<'a, T: NodeData> FlatView<'a, T> {
    pub fn new(state: &'a TreeState<T>) -> Self {
        Self { state }
    }

    pub fn len(&self) -> usize {
        self.state.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.order.is_empty()
    }

    pub fn record_at(&self, index: usize) -> Option<&'a Record<T>> {
        let slot = self.state.order.slot_at(index)?;
        Some(self.state.records.record(slot))
    }

    pub fn id_at(&self, index: usize) -> Option<&'a T::Id> {
        self.record_at(index).map(Record::id)
    }

    /// Measured or default size of the row at `index`, if any.
    pub fn size_at(&self, index: usize) -> Option<f64> {
        self.record_at(index).and_then(Record::size)
    }

    /// Nesting depth of the row at `index`, for indentation.
    pub fn depth_at(&self, index: usize) -> Option<u32> {
        self.record_at(index).map(Record::depth)
    }

    pub fn position_of(&self, id: &T::Id) -> Option<usize> {
        let slot = self.state.records.slot(id)?;
        self.state.order.position(slot)
    }

    /// Visible records, top to bottom.
    pub fn iter(&self) -> impl Iterator<Item = &'a Record<T>> + 'a {
        let state = self.state;
        state
            .order
            .slots()
            .iter()
            .map(move |&slot| state.records.record(slot))
    }

    pub fn ids(&self) -> Vec<T::Id> {
        self.iter().map(|record| record.id().clone()).collect()
    }
}

/// Callbacks into the windowing component
pub trait Viewport {
    fn scroll_to_index(&mut self, index: usize, align: Align);

    /// Cached sizes at `index` and after are stale. `force` asks for an
    /// immediate re-layout instead of a lazy one.
    fn invalidate_sizes_from(&mut self, index: usize, force: bool);
}
