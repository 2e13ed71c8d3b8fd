//! Flattening Algorithm
//!
//! Pumps a [`Walk`], reconciles every yield against the [`RecordStore`], and
//! produces the new visible [`Order`]. A pass is resumable: [`FlattenPass::step`]
//! runs a bounded number of yields so the deferred scheduler can slice it.
//!
//! Walker contract violations never escape as panics or errors. The offending
//! yield is dropped from Order, answered with `false` so the walker does not
//! descend under it, and recorded as a [`Diagnostic`].

use crate::directive::{Directives, Openness};
use crate::mutator::SubtreeMutator;
use crate::store::{Order, RecordStore, INVALID};
use crate::types::NodeData;
use crate::walker::{TreeWalker, Walk, Yield};
use std::collections::HashSet;
use std::fmt::Debug;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, warn};

/// Walker contract violation observed during a pass
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic<Id: Debug> {
    #[error("lightweight yield for unknown id {id:?}")]
    UnknownId { id: Id },

    #[error("id {id:?} yielded more than once in one walk")]
    DuplicateId { id: Id },

    #[error("id {id:?} yielded at depth {depth} with only {open_levels} open levels above it")]
    MalformedDepth { id: Id, depth: u32, open_levels: u32 },
}

/// Summary of one recomputation
#[derive(Debug, Clone)]
pub struct PassReport<Id: Debug> {
    /// Length of the resulting Order.
    pub visible: usize,
    /// Yields received from the walker.
    pub yielded: usize,
    /// Records created for ids seen for the first time.
    pub created: usize,
    /// Existing records whose payload was replaced.
    pub refreshed: usize,
    /// True when Order was patched without walking.
    pub partial: bool,
    pub diagnostics: Vec<Diagnostic<Id>>,
    pub duration_ms: u64,
}

impl<Id: Debug> Default for PassReport<Id> {
    fn default() -> Self {
        Self {
            visible: 0,
            yielded: 0,
            created: 0,
            refreshed: 0,
            partial: false,
            diagnostics: Vec::new(),
            duration_ms: 0,
        }
    }
}

/// Whether a pass still has yields to consume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Pending,
    Done,
}

/// One in-flight flattening pass
pub struct FlattenPass<T: NodeData, K> {
    walk: K,
    use_default_openness: bool,
    use_default_size: bool,
    /// Slots explicitly set by this pass's directives; default resets skip them.
    pinned: HashSet<u32>,
    order: Vec<u32>,
    /// Open ancestors of the next yield, outermost first.
    stack: Vec<u32>,
    answer: bool,
    done: bool,
    report: PassReport<T::Id>,
    started: Instant,
}

impl<T: NodeData, K: Walk<T>> FlattenPass<T, K> {
    /// Apply pre-walk directives to `records` and start a walk.
    ///
    /// Openness changes must land before the walk: the walker never visits
    /// children of a closed node, so a directive that hides or reveals a
    /// subtree cannot be corrected afterwards.
    pub fn begin<W>(records: &mut RecordStore<T>, walker: &W, directives: Directives<T>) -> Self
    where
        W: TreeWalker<T, Walk = K> + ?Sized,
    {
        let started = Instant::now();
        let (pinned, undiscovered) = if directives.needs_prepass() {
            Self::apply_prepass(records, &directives)
        } else {
            (HashSet::new(), false)
        };
        let refresh = directives.refresh_nodes || undiscovered;
        if refresh && !directives.refresh_nodes {
            debug!("Directives open records never walked below, pulling full descriptors");
        }
        records.begin_pass();

        Self {
            walk: walker.walk(refresh),
            use_default_openness: directives.use_default_openness,
            use_default_size: directives.use_default_size,
            pinned,
            order: Vec::new(),
            stack: Vec::new(),
            answer: false,
            done: false,
            report: PassReport::default(),
            started,
        }
    }

    /// Apply openness directives to existing records.
    ///
    /// Returns the slots the directives pinned, and whether the walk has to
    /// pull full descriptors because it will descend into a record that no
    /// walk has descended into before.
    fn apply_prepass(
        records: &mut RecordStore<T>,
        directives: &Directives<T>,
    ) -> (HashSet<u32>, bool) {
        let mut undiscovered = false;
        if directives.use_default_openness {
            for slot in 0..records.len() as u32 {
                let open = records.record(slot).data().is_open_by_default();
                records.record_mut(slot).set_open(open);
                undiscovered |= open && !records.has_descended(slot);
            }
        }

        // the walk may still be upgraded to a refresh pull, so pin regardless
        let track = directives.use_default_openness;
        let mut pinned = HashSet::new();
        let mut touched = Vec::with_capacity(directives.openness.len());
        for (id, openness) in &directives.openness {
            let Some(slot) = records.slot(id) else {
                continue;
            };
            SubtreeMutator::apply_at(records, slot, openness);
            touched.push(slot);
            if track {
                pinned.insert(slot);
                if let Openness::SetOpenWithSubtree { .. } = openness {
                    let mut walk = records.descendants_at(slot);
                    while let Some(descendant) = walk.next_slot(records) {
                        pinned.insert(descendant);
                    }
                }
            }
        }
        if !undiscovered {
            undiscovered = touched
                .into_iter()
                .any(|slot| records.exposes_undiscovered(slot));
        }
        (pinned, undiscovered)
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Consume at most `budget` yields.
    pub fn step(&mut self, records: &mut RecordStore<T>, budget: usize) -> Progress {
        if self.done {
            return Progress::Done;
        }
        for _ in 0..budget.max(1) {
            let Some(item) = self.walk.resume(self.answer) else {
                self.done = true;
                return Progress::Done;
            };
            self.report.yielded += 1;
            self.answer = self.accept(records, item);
        }
        Progress::Pending
    }

    /// Reconcile one yield. Returns the answer for the walker.
    fn accept(&mut self, records: &mut RecordStore<T>, item: Yield<T>) -> bool {
        let depth = item.depth();
        if depth as usize > self.stack.len() {
            let open_levels = self.stack.len() as u32;
            return self.reject(Diagnostic::MalformedDepth {
                id: item.id().clone(),
                depth,
                open_levels,
            });
        }
        self.stack.truncate(depth as usize);

        let slot = match item {
            Yield::Id { id, .. } => match records.slot(&id) {
                Some(slot) if records.is_seen(slot) => {
                    return self.reject(Diagnostic::DuplicateId { id })
                }
                Some(slot) => slot,
                None => return self.reject(Diagnostic::UnknownId { id }),
            },
            Yield::Full { node, .. } => match records.slot(node.id()) {
                Some(slot) if records.is_seen(slot) => {
                    return self.reject(Diagnostic::DuplicateId {
                        id: node.id().clone(),
                    })
                }
                Some(slot) => {
                    let reset_openness =
                        self.use_default_openness && !self.pinned.contains(&slot);
                    records
                        .record_mut(slot)
                        .refresh(node, reset_openness, self.use_default_size);
                    self.report.refreshed += 1;
                    slot
                }
                None => {
                    self.report.created += 1;
                    records.insert(node)
                }
            },
        };

        let parent = self.stack.last().copied().unwrap_or(INVALID);
        records.visit(slot, parent, depth);
        self.order.push(slot);

        let open = records.record(slot).is_open();
        if open {
            records.begin_children(slot);
            self.stack.push(slot);
        }
        open
    }

    fn reject(&mut self, diagnostic: Diagnostic<T::Id>) -> bool {
        warn!(%diagnostic, "Tree walker contract violation, skipping yield");
        self.report.diagnostics.push(diagnostic);
        false
    }

    /// Drain the walk and install the new Order.
    pub fn finish(mut self, records: &mut RecordStore<T>, order: &mut Order) -> PassReport<T::Id> {
        while self.step(records, usize::MAX) == Progress::Pending {}

        order.replace(self.order, records.len());
        self.report.visible = order.len();
        self.report.duration_ms = self.started.elapsed().as_millis() as u64;

        debug!(
            pass = records.pass(),
            visible = self.report.visible,
            yielded = self.report.yielded,
            created = self.report.created,
            refreshed = self.report.refreshed,
            violations = self.report.diagnostics.len(),
            duration_ms = self.report.duration_ms,
            "Flattening pass completed"
        );

        self.report
    }
}

/// Run a whole pass synchronously.
pub fn flatten<T, W>(
    records: &mut RecordStore<T>,
    order: &mut Order,
    walker: &W,
    directives: Directives<T>,
) -> PassReport<T::Id>
where
    T: NodeData,
    W: TreeWalker<T> + ?Sized,
{
    FlattenPass::begin(records, walker, directives).finish(records, order)
}
