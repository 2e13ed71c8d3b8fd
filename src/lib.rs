//! vtree: Incremental Tree Flattening
//!
//! Keeps a flat, ordered view of the visible nodes of a large, lazily expanded
//! tree for virtualized rendering. Nodes are discovered by pumping a
//! resumable [`TreeWalker`]; per-node state (openness, size) lives in a
//! [`RecordStore`] that survives recomputation; subtree changes run over
//! structural links instead of re-walking. [`FlatTree`] recomputes inline,
//! [`DeferredTree`] in cancellable background slices.

pub mod config;
pub mod directive;
pub mod engine;
pub mod error;
pub mod flatten;
pub mod logging;
pub mod mutator;
pub mod scheduler;
pub mod state;
pub mod store;
pub mod tooling;
pub mod types;
pub mod view;
pub mod walker;

pub use crate::config::{ConfigLoader, LoggingConfig, SchedulerConfig, TreeConfig};
pub use directive::{Directives, Openness, SubtreeCallback};
pub use engine::FlatTree;
pub use error::TreeError;
pub use flatten::{Diagnostic, FlattenPass, PassReport, Progress};
pub use mutator::{MutationReport, SubtreeMutator};
pub use scheduler::{BuildHandle, BuildOutcome, BuildState, DeferredTree, ViewSnapshot};
pub use state::TreeState;
pub use store::{Order, Record, RecordStore, INVALID};
pub use types::{Align, BasicNode, NodeData};
pub use view::{FlatView, Viewport};
pub use walker::{from_fn, walk_fn, NestedTree, TreeWalker, Walk, Yield};
