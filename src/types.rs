//! Core types shared by the walker, the record store, and the view.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

/// Node descriptor produced by a tree walker on a refresh pull.
///
/// The id must stay unique across the whole tree for as long as the records
/// referencing it live. Reusing an id for a semantically different node makes
/// the engine hand the old record's state to the new node.
pub trait NodeData: Clone {
    type Id: Clone + Eq + Hash + Debug;

    fn id(&self) -> &Self::Id;

    /// Openness a freshly created record starts with.
    fn is_open_by_default(&self) -> bool;

    /// Initial extent for variable-size trees.
    fn default_size(&self) -> Option<f64> {
        None
    }
}

/// Ready-made descriptor for trees that only need a name per node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicNode {
    pub id: String,
    pub name: String,
    pub is_open_by_default: bool,
    #[serde(default)]
    pub default_size: Option<f64>,
}

impl BasicNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>, is_open_by_default: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_open_by_default,
            default_size: None,
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.default_size = Some(size);
        self
    }
}

impl NodeData for BasicNode {
    type Id = String;

    fn id(&self) -> &String {
        &self.id
    }

    fn is_open_by_default(&self) -> bool {
        self.is_open_by_default
    }

    fn default_size(&self) -> Option<f64> {
        self.default_size
    }
}

/// Where a scrolled-to row should land inside the viewport
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Auto,
    Smart,
    Center,
    End,
    Start,
}
