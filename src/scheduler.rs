//! Deferred Build Scheduler
//!
//! Runs flattening passes off the caller's path on a Tokio runtime. While a
//! placeholder is configured, the caller sees the placeholder until the first
//! pass commits; afterwards it sees the last committed Order until the next
//! one lands.
//!
//! Every request bumps an epoch. A running pass checks the epoch before each
//! slice and again under the state lock at commit, so a superseded pass can
//! never replace newer content. The directives of a superseded request are
//! folded into the one that replaced it.
//!
//! Idle signals are stamped with the epoch they were given for, so a signal
//! only releases requests that already existed when it was sent.

use crate::config::SchedulerConfig;
use crate::directive::{Directives, Openness};
use crate::error::TreeError;
use crate::flatten::{FlattenPass, PassReport, Progress};
use crate::state::TreeState;
use crate::types::NodeData;
use crate::view::FlatView;
use crate::walker::TreeWalker;
use parking_lot::Mutex;
use std::fmt::Debug;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{oneshot, watch};
use tokio::time::sleep;
use tracing::{debug, info, trace};

/// Lifecycle of the most recent request
///
/// A request replaced before it commits does not show up here: the newer
/// request is already `Scheduled`, and the abandoned one's [`BuildHandle`]
/// resolves to [`BuildOutcome::Superseded`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildState {
    #[default]
    Idle,
    Scheduled,
    Running,
    Committed,
}

/// How a request ended
#[derive(Debug, Clone)]
pub enum BuildOutcome<Id: Debug> {
    Committed { epoch: u64, report: PassReport<Id> },
    /// A newer request replaced this one before it committed.
    Superseded { epoch: u64 },
}

impl<Id: Debug> BuildOutcome<Id> {
    pub fn epoch(&self) -> u64 {
        match self {
            BuildOutcome::Committed { epoch, .. } | BuildOutcome::Superseded { epoch } => *epoch,
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, BuildOutcome::Committed { .. })
    }
}

/// Resolves once the request is committed or superseded
#[derive(Debug)]
pub struct BuildHandle<Id: Debug> {
    epoch: u64,
    rx: oneshot::Receiver<BuildOutcome<Id>>,
}

impl<Id: Debug> BuildHandle<Id> {
    fn resolved(outcome: BuildOutcome<Id>) -> Self {
        let (tx, rx) = oneshot::channel();
        let epoch = outcome.epoch();
        let _ = tx.send(outcome);
        Self { epoch, rx }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub async fn wait(self) -> BuildOutcome<Id> {
        // A dropped task never committed.
        self.rx
            .await
            .unwrap_or(BuildOutcome::Superseded { epoch: self.epoch })
    }
}

/// What the viewport currently shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewSnapshot {
    /// Epoch of the request that produced the committed state.
    pub epoch: u64,
    /// Number of commits so far.
    pub commit: u64,
    pub placeholder: bool,
    pub visible: usize,
}

struct Committed<T: NodeData, W> {
    walker: Arc<W>,
    state: TreeState<T>,
    build: BuildState,
    /// Merged directives of the request in flight, if any.
    pending: Option<Directives<T>>,
    placeholder: bool,
    commits: u64,
    epoch: u64,
}

impl<T: NodeData, W> Committed<T, W> {
    fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            epoch: self.epoch,
            commit: self.commits,
            placeholder: self.placeholder,
            visible: if self.placeholder {
                0
            } else {
                self.state.order.len()
            },
        }
    }
}

struct Shared<T: NodeData, W> {
    committed: Mutex<Committed<T, W>>,
    epoch: watch::Sender<u64>,
    /// Latest epoch the host declared itself idle for.
    idle: watch::Sender<u64>,
    view: watch::Sender<ViewSnapshot>,
}

impl<T: NodeData, W> Shared<T, W> {
    fn current_epoch(&self) -> u64 {
        *self.epoch.borrow()
    }
}

/// Flattened tree whose passes run in the background
pub struct DeferredTree<T: NodeData, W> {
    shared: Arc<Shared<T, W>>,
    runtime: Option<Handle>,
    config: SchedulerConfig,
}

impl<T, W> DeferredTree<T, W>
where
    T: NodeData + Send + Sync + 'static,
    T::Id: Send + Sync,
    W: TreeWalker<T> + Send + Sync + 'static,
    W::Walk: Send,
{
    /// Create an empty tree. Nothing is built until the first [`request`](Self::request).
    ///
    /// With a placeholder configured this must be called inside a Tokio
    /// runtime; the runtime handle is kept for spawning passes.
    pub fn new(walker: W, config: SchedulerConfig) -> Result<Self, TreeError> {
        let runtime = if config.placeholder {
            Some(Handle::try_current().map_err(|e| TreeError::RuntimeUnavailable(e.to_string()))?)
        } else {
            None
        };

        let committed = Committed {
            walker: Arc::new(walker),
            state: TreeState::new(),
            build: BuildState::Idle,
            pending: None,
            placeholder: config.placeholder,
            commits: 0,
            epoch: 0,
        };
        let snapshot = committed.snapshot();
        let (epoch, _) = watch::channel(0);
        let (idle, _) = watch::channel(0);
        let (view, _) = watch::channel(snapshot);

        Ok(Self {
            shared: Arc::new(Shared {
                committed: Mutex::new(committed),
                epoch,
                idle,
                view,
            }),
            runtime,
            config,
        })
    }

    /// Schedule a recomputation. Supersedes any request still in flight.
    pub fn request(&self, directives: Directives<T>) -> BuildHandle<T::Id> {
        self.submit(None, directives)
    }

    /// Swap the walker and schedule a rebuild against it.
    pub fn replace_walker(&self, walker: W, directives: Directives<T>) -> BuildHandle<T::Id> {
        self.submit(Some(walker), directives)
    }

    /// Change one node's openness.
    ///
    /// Applied to the committed state at once when nothing is in flight;
    /// otherwise folded into a new request so the in-flight pass cannot lose it.
    pub fn set_open(&self, id: T::Id, openness: Openness<T>) -> BuildHandle<T::Id> {
        {
            let mut guard = self.shared.committed.lock();
            if guard.pending.is_none() && !guard.placeholder {
                let committed = &mut *guard;
                let epoch = committed.epoch;
                let Some(report) = committed.state.set_open(&*committed.walker, &id, openness)
                else {
                    trace!(?id, "Unknown id, nothing to commit");
                    let report = PassReport {
                        visible: committed.state.order.len(),
                        partial: true,
                        ..PassReport::default()
                    };
                    return BuildHandle::resolved(BuildOutcome::Committed { epoch, report });
                };
                committed.commits += 1;
                self.shared.view.send_replace(committed.snapshot());
                return BuildHandle::resolved(BuildOutcome::Committed { epoch, report });
            }
        }
        self.request(Directives::new().set(id, openness))
    }

    /// Flip openness. Unknown ids are a no-op.
    ///
    /// While a request is in flight the flip is relative to the openness it
    /// will commit for `id`, so repeated toggles compose.
    pub fn toggle(&self, id: T::Id) -> BuildHandle<T::Id> {
        let open = {
            let guard = self.shared.committed.lock();
            guard
                .pending
                .as_ref()
                .and_then(|pending| pending.openness_of(&id))
                .or_else(|| guard.state.records.get(&id).map(|record| record.is_open()))
                .unwrap_or(false)
        };
        self.set_open(id, Openness::SetOpen(!open))
    }

    /// Signal that the host is idle. Requests already made start immediately;
    /// later requests wait for the next signal.
    pub fn notify_idle(&self) {
        let epoch = self.shared.current_epoch();
        self.shared.idle.send_replace(epoch);
    }

    pub fn build_state(&self) -> BuildState {
        self.shared.committed.lock().build
    }

    pub fn is_placeholder_shown(&self) -> bool {
        self.shared.committed.lock().placeholder
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        *self.shared.view.borrow()
    }

    /// Receiver that changes on every commit.
    pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot> {
        self.shared.view.subscribe()
    }

    /// Read the committed view. `None` while the placeholder is shown.
    pub fn with_view<R>(&self, f: impl FnOnce(FlatView<'_, T>) -> R) -> Option<R> {
        let guard = self.shared.committed.lock();
        if guard.placeholder {
            return None;
        }
        Some(f(FlatView::new(&guard.state)))
    }

    /// Copy of the committed state, e.g. to hand to a [`FlatTree`](crate::FlatTree).
    pub fn committed_state(&self) -> TreeState<T> {
        self.shared.committed.lock().state.clone()
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    fn submit(&self, walker: Option<W>, directives: Directives<T>) -> BuildHandle<T::Id> {
        let mut guard = self.shared.committed.lock();
        if let Some(walker) = walker {
            guard.walker = Arc::new(walker);
        }

        let Some(runtime) = self.runtime.as_ref() else {
            let committed = &mut *guard;
            let report = committed.state.run_pass(&*committed.walker, directives);
            committed.epoch += 1;
            committed.commits += 1;
            committed.build = BuildState::Committed;
            let epoch = committed.epoch;
            self.shared.epoch.send_replace(epoch);
            self.shared.view.send_replace(committed.snapshot());
            return BuildHandle::resolved(BuildOutcome::Committed { epoch, report });
        };

        let mut directives = directives;
        if let Some(older) = guard.pending.take() {
            trace!("Merging superseded request into new request");
            directives.absorb(older);
        }
        guard.pending = Some(directives.clone());
        guard.build = BuildState::Scheduled;

        let mut epoch = 0;
        self.shared.epoch.send_modify(|current| {
            *current += 1;
            epoch = *current;
        });
        let epoch_rx = self.shared.epoch.subscribe();
        let walker = Arc::clone(&guard.walker);
        drop(guard);

        debug!(epoch, "Scheduled deferred build");

        let (tx, rx) = oneshot::channel();
        let shared = Arc::clone(&self.shared);
        let config = self.config.clone();
        runtime.spawn(async move {
            let outcome = run_build(&shared, epoch, epoch_rx, &*walker, directives, &config).await;
            let _ = tx.send(outcome);
        });

        BuildHandle { epoch, rx }
    }
}

async fn run_build<T, W>(
    shared: &Shared<T, W>,
    epoch: u64,
    mut epoch_rx: watch::Receiver<u64>,
    walker: &W,
    directives: Directives<T>,
    config: &SchedulerConfig,
) -> BuildOutcome<T::Id>
where
    T: NodeData,
    W: TreeWalker<T>,
{
    let mut idle_rx = shared.idle.subscribe();
    tokio::select! {
        _ = idle_rx.wait_for(|&idle| idle >= epoch) => {
            trace!(epoch, "Idle signal received");
        }
        _ = sleep(config.building_task_timeout()) => {
            trace!(epoch, "Idle wait timed out, starting build");
        }
        _ = epoch_rx.changed() => {
            return superseded(shared, epoch);
        }
    }

    let mut working = {
        let mut guard = shared.committed.lock();
        if shared.current_epoch() != epoch {
            drop(guard);
            return superseded(shared, epoch);
        }
        guard.build = BuildState::Running;
        guard.state.clone()
    };

    let mut pass = FlattenPass::begin(&mut working.records, walker, directives);
    let mut slices = 0usize;
    loop {
        if shared.current_epoch() != epoch {
            return superseded(shared, epoch);
        }
        slices += 1;
        if pass.step(&mut working.records, config.slice_budget) == Progress::Done {
            break;
        }
        tokio::task::yield_now().await;
    }
    let report = pass.finish(&mut working.records, &mut working.order);

    let mut guard = shared.committed.lock();
    if shared.current_epoch() != epoch {
        drop(guard);
        return superseded(shared, epoch);
    }
    guard.state = working;
    guard.pending = None;
    guard.build = BuildState::Committed;
    guard.placeholder = false;
    guard.commits += 1;
    guard.epoch = epoch;
    shared.view.send_replace(guard.snapshot());
    drop(guard);

    info!(epoch, slices, visible = report.visible, "Deferred build committed");
    BuildOutcome::Committed { epoch, report }
}

fn superseded<T: NodeData, W, Id: Debug>(shared: &Shared<T, W>, epoch: u64) -> BuildOutcome<Id> {
    debug!(
        epoch,
        current = shared.current_epoch(),
        "Deferred build superseded"
    );
    BuildOutcome::Superseded { epoch }
}
