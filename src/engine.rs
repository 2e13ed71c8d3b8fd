//! Synchronous engine: one walker, one tree state, immediate recomputation.

use crate::directive::{Directives, Openness};
use crate::flatten::PassReport;
use crate::state::TreeState;
use crate::store::{Record, RecordStore};
use crate::types::{Align, NodeData};
use crate::view::{FlatView, Viewport};
use crate::walker::TreeWalker;
use tracing::{debug, info};

/// Flattened tree driven by a [`TreeWalker`]
pub struct FlatTree<T: NodeData, W> {
    walker: W,
    state: TreeState<T>,
}

impl<T, W> FlatTree<T, W>
where
    T: NodeData,
    W: TreeWalker<T>,
{
    /// Build the initial Order with a refresh pull.
    pub fn new(walker: W) -> Self {
        Self::with_directives(walker, Directives::refresh())
    }

    pub fn with_directives(walker: W, directives: Directives<T>) -> Self {
        let mut state = TreeState::new();
        let report = state.run_pass(&walker, directives);
        info!(visible = report.visible, records = state.records.len(), "Tree built");
        Self { walker, state }
    }

    /// Adopt an existing state, e.g. one committed by the deferred scheduler.
    pub fn from_state(walker: W, state: TreeState<T>) -> Self {
        Self { walker, state }
    }

    pub fn recompute(&mut self, directives: Directives<T>) -> PassReport<T::Id> {
        self.state.run_pass(&self.walker, directives)
    }

    /// Swap the walker and rebuild against it.
    pub fn replace_walker(&mut self, walker: W, directives: Directives<T>) -> PassReport<T::Id> {
        self.walker = walker;
        debug!("Walker replaced");
        self.recompute(directives)
    }

    pub fn set_open(&mut self, id: &T::Id, openness: Openness<T>) -> Option<PassReport<T::Id>> {
        self.state.set_open(&self.walker, id, openness)
    }

    pub fn toggle(&mut self, id: &T::Id) -> Option<PassReport<T::Id>> {
        self.state.toggle(&self.walker, id)
    }

    /// See [`TreeState::resize`].
    pub fn resize(&mut self, id: &T::Id, size: Option<f64>) -> Option<usize> {
        self.state.resize(id, size)
    }

    /// Resize and tell the viewport which cached sizes went stale.
    pub fn resize_in<V: Viewport + ?Sized>(
        &mut self,
        viewport: &mut V,
        id: &T::Id,
        size: Option<f64>,
        force: bool,
    ) -> Option<usize> {
        let index = self.state.resize(id, size)?;
        viewport.invalidate_sizes_from(index, force);
        Some(index)
    }

    /// Scroll the viewport to a visible id. Returns `false` if the id is not shown.
    pub fn scroll_to<V: Viewport + ?Sized>(&self, viewport: &mut V, id: &T::Id, align: Align) -> bool {
        match self.view().position_of(id) {
            Some(index) => {
                viewport.scroll_to_index(index, align);
                true
            }
            None => false,
        }
    }

    pub fn evict_unreachable(&mut self) -> usize {
        self.state.evict_unreachable()
    }

    pub fn view(&self) -> FlatView<'_, T> {
        FlatView::new(&self.state)
    }

    pub fn record(&self, id: &T::Id) -> Option<&Record<T>> {
        self.state.records.get(id)
    }

    pub fn is_shown(&self, id: &T::Id) -> bool {
        self.state.records.is_shown(id)
    }

    pub fn records(&self) -> &RecordStore<T> {
        &self.state.records
    }

    pub fn state(&self) -> &TreeState<T> {
        &self.state
    }

    pub fn walker(&self) -> &W {
        &self.walker
    }
}
