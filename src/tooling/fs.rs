//! Filesystem tree walker
//!
//! Lists one directory level at a time, only when the engine answers `true`
//! for that directory, so closed directories are never read.

use crate::types::NodeData;
use crate::walker::{TreeWalker, Walk, Yield};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// One file or directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FsNode {
    /// Full path, used as the node id.
    pub path: String,
    pub name: String,
    pub is_dir: bool,
    #[serde(skip)]
    open_by_default: bool,
}

impl NodeData for FsNode {
    type Id = String;

    fn id(&self) -> &String {
        &self.path
    }

    fn is_open_by_default(&self) -> bool {
        self.open_by_default
    }
}

/// Walks a directory tree, opening directories above `expand_depth` by default
#[derive(Debug, Clone)]
pub struct FsWalker {
    root: PathBuf,
    expand_depth: u32,
    show_hidden: bool,
}

impl FsWalker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            expand_depth: 1,
            show_hidden: false,
        }
    }

    /// Directories shallower than `depth` start open.
    pub fn expand_depth(mut self, depth: u32) -> Self {
        self.expand_depth = depth;
        self
    }

    pub fn show_hidden(mut self, show: bool) -> Self {
        self.show_hidden = show;
        self
    }

    fn node(&self, path: &Path, depth: u32) -> FsNode {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let is_dir = path.is_dir();
        FsNode {
            path: path.display().to_string(),
            name,
            is_dir,
            open_by_default: is_dir && depth < self.expand_depth,
        }
    }

    /// Immediate children of `dir`, sorted by file name.
    fn list(&self, dir: &Path) -> Vec<PathBuf> {
        WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "Skipping unreadable entry");
                    None
                }
            })
            .filter(|entry| self.show_hidden || !entry.file_name().to_string_lossy().starts_with('.'))
            .map(|entry| entry.into_path())
            .collect()
    }
}

impl TreeWalker<FsNode> for FsWalker {
    type Walk = FsWalk;

    fn walk(&self, refresh: bool) -> FsWalk {
        FsWalk {
            walker: self.clone(),
            refresh,
            pending: vec![(self.root.clone(), 0)],
            last: None,
        }
    }
}

/// In-progress filesystem walk
#[derive(Debug)]
pub struct FsWalk {
    walker: FsWalker,
    refresh: bool,
    /// Paths still to yield, next on top.
    pending: Vec<(PathBuf, u32)>,
    last: Option<(PathBuf, u32)>,
}

impl Walk<FsNode> for FsWalk {
    fn resume(&mut self, open: bool) -> Option<Yield<FsNode>> {
        if let Some((path, depth)) = self.last.take() {
            if open && path.is_dir() {
                let children = self.walker.list(&path);
                self.pending
                    .extend(children.into_iter().rev().map(|child| (child, depth + 1)));
            }
        }

        let (path, depth) = self.pending.pop()?;
        let item = if self.refresh {
            Yield::Full {
                node: self.walker.node(&path, depth),
                depth,
            }
        } else {
            Yield::Id {
                id: path.display().to_string(),
                depth,
            }
        };
        self.last = Some((path, depth));
        Some(item)
    }
}
