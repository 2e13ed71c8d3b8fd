//! Tooling
//!
//! The `vtree` command-line inspector: a filesystem walker, row formatting,
//! and argument handling. The binary itself is a thin wrapper.

pub mod cli;
pub mod format;
pub mod fs;

pub use cli::{Cli, CliContext, OutputFormat};
pub use fs::{FsNode, FsWalker};
