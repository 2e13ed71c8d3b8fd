//! Update directives
//!
//! What a recomputation should change before and during the walk. Openness
//! changes are a tagged variant: a plain flag for the node, or a flag plus a
//! callback run over the node's whole structural subtree.

use crate::store::Record;
use crate::types::NodeData;
use std::fmt;
use std::sync::Arc;

/// Callback run for every structural descendant: `(descendant, owner)`.
pub type SubtreeCallback<T> = Arc<dyn Fn(&mut Record<T>, &Record<T>) + Send + Sync>;

/// Desired openness for one node
pub enum Openness<T: NodeData> {
    SetOpen(bool),
    SetOpenWithSubtree {
        open: bool,
        callback: SubtreeCallback<T>,
    },
}

impl<T: NodeData> Openness<T> {
    pub fn open(&self) -> bool {
        match self {
            Openness::SetOpen(open) | Openness::SetOpenWithSubtree { open, .. } => *open,
        }
    }

    /// Flag plus a callback applied to every descendant.
    pub fn with_subtree<F>(open: bool, callback: F) -> Self
    where
        F: Fn(&mut Record<T>, &Record<T>) + Send + Sync + 'static,
    {
        Openness::SetOpenWithSubtree {
            open,
            callback: Arc::new(callback),
        }
    }

    /// Set the node to `open` and force every descendant to the same state.
    pub fn cascade(open: bool) -> Self {
        Self::with_subtree(open, move |descendant, _owner| descendant.set_open(open))
    }
}

impl<T: NodeData> Clone for Openness<T> {
    fn clone(&self) -> Self {
        match self {
            Openness::SetOpen(open) => Openness::SetOpen(*open),
            Openness::SetOpenWithSubtree { open, callback } => Openness::SetOpenWithSubtree {
                open: *open,
                callback: Arc::clone(callback),
            },
        }
    }
}

impl<T: NodeData> fmt::Debug for Openness<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Openness::SetOpen(open) => f.debug_tuple("SetOpen").field(open).finish(),
            Openness::SetOpenWithSubtree { open, .. } => f
                .debug_struct("SetOpenWithSubtree")
                .field("open", open)
                .finish_non_exhaustive(),
        }
    }
}

impl<T: NodeData> From<bool> for Openness<T> {
    fn from(open: bool) -> Self {
        Openness::SetOpen(open)
    }
}

/// Recomputation request
pub struct Directives<T: NodeData> {
    /// Pull full descriptors instead of ids.
    pub refresh_nodes: bool,
    /// Reset every record's openness to its descriptor default.
    pub use_default_openness: bool,
    /// Reset every refreshed record's size to its descriptor default.
    pub use_default_size: bool,
    /// Applied in order; a later entry for the same id wins.
    pub openness: Vec<(T::Id, Openness<T>)>,
}

impl<T: NodeData> Default for Directives<T> {
    fn default() -> Self {
        Self {
            refresh_nodes: false,
            use_default_openness: false,
            use_default_size: false,
            openness: Vec::new(),
        }
    }
}

impl<T: NodeData> Clone for Directives<T> {
    fn clone(&self) -> Self {
        Self {
            refresh_nodes: self.refresh_nodes,
            use_default_openness: self.use_default_openness,
            use_default_size: self.use_default_size,
            openness: self.openness.clone(),
        }
    }
}

impl<T: NodeData> fmt::Debug for Directives<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Directives")
            .field("refresh_nodes", &self.refresh_nodes)
            .field("use_default_openness", &self.use_default_openness)
            .field("use_default_size", &self.use_default_size)
            .field("openness", &self.openness)
            .finish()
    }
}

impl<T: NodeData> Directives<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directives for a walker that may carry changed payloads.
    pub fn refresh() -> Self {
        Self {
            refresh_nodes: true,
            ..Self::default()
        }
    }

    pub fn refresh_nodes(mut self, refresh: bool) -> Self {
        self.refresh_nodes = refresh;
        self
    }

    pub fn use_default_openness(mut self, reset: bool) -> Self {
        self.use_default_openness = reset;
        self
    }

    pub fn use_default_size(mut self, reset: bool) -> Self {
        self.use_default_size = reset;
        self
    }

    pub fn set(mut self, id: T::Id, openness: impl Into<Openness<T>>) -> Self {
        self.openness.push((id, openness.into()));
        self
    }

    /// Openness this request sets for `id`, if any. The last entry wins.
    pub fn openness_of(&self, id: &T::Id) -> Option<bool> {
        self.openness
            .iter()
            .rev()
            .find(|(entry, _)| entry == id)
            .map(|(_, openness)| openness.open())
    }

    /// Whether existing records must be touched before the walk starts.
    pub fn needs_prepass(&self) -> bool {
        self.use_default_openness || !self.openness.is_empty()
    }

    /// Fold a superseded request into this one. Flags are OR-ed and the older
    /// openness entries run first so this request's entries still win.
    pub fn absorb(&mut self, older: Directives<T>) {
        self.refresh_nodes |= older.refresh_nodes;
        self.use_default_openness |= older.use_default_openness;
        self.use_default_size |= older.use_default_size;
        let newer = std::mem::replace(&mut self.openness, older.openness);
        self.openness.extend(newer);
    }
}
