//! CLI Tooling
//!
//! `vtree` walks a directory lazily and prints the rows a virtualized tree
//! view would show, optionally after toggling some directories.

use super::format::{format_rows_json, format_rows_text, rows};
use super::fs::{FsNode, FsWalker};
use crate::config::{ConfigLoader, SchedulerConfig, TreeConfig};
use crate::directive::{Directives, Openness};
use crate::engine::FlatTree;
use crate::scheduler::{BuildOutcome, DeferredTree};
use crate::state::TreeState;
use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// vtree - print the visible rows of a lazily expanded directory tree
#[derive(Debug, Parser)]
#[command(name = "vtree")]
#[command(about = "Flatten a directory tree the way a virtualized tree view would")]
pub struct Cli {
    /// Root directory
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Directories shallower than this start open
    #[arg(long, default_value_t = 1)]
    pub expand_depth: u32,

    /// Toggle a directory (relative to the root); repeatable, applied in order
    #[arg(long = "toggle", value_name = "PATH")]
    pub toggles: Vec<PathBuf>,

    /// Close a directory and everything below it
    #[arg(long = "collapse", value_name = "PATH")]
    pub collapses: Vec<PathBuf>,

    /// Include dot files
    #[arg(long, short = 'a')]
    pub all: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Build in the background through the deferred scheduler
    #[arg(long)]
    pub deferred: bool,

    /// Drop records for nodes no longer reachable before printing
    #[arg(long)]
    pub evict: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Resolved configuration plus the parsed command line
pub struct CliContext {
    config: TreeConfig,
}

impl CliContext {
    pub fn new(config_path: Option<&Path>) -> anyhow::Result<Self> {
        let config = match config_path {
            Some(path) => ConfigLoader::load_from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ConfigLoader::load().context("loading configuration")?,
        };
        Ok(Self { config })
    }

    pub fn from_config(config: TreeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Apply `--log-*` overrides on top of the loaded logging settings.
    pub fn apply_log_overrides(&mut self, cli: &Cli) {
        let logging = &mut self.config.logging;
        if let Some(level) = &cli.log_level {
            logging.level = level.clone();
        }
        if let Some(format) = &cli.log_format {
            logging.format = format.clone();
        }
        if let Some(output) = &cli.log_output {
            logging.output = output.clone();
        }
        if cli.log_file.is_some() {
            logging.file = cli.log_file.clone();
        }
        if cli.no_color {
            logging.color = false;
        }
    }

    pub fn execute(&self, cli: &Cli) -> anyhow::Result<String> {
        if !cli.path.is_dir() {
            bail!("{} is not a directory", cli.path.display());
        }
        let walker = FsWalker::new(&cli.path)
            .expand_depth(cli.expand_depth)
            .show_hidden(cli.all);

        let mut tree = if cli.deferred {
            let state = self.build_deferred(cli, walker.clone())?;
            FlatTree::from_state(walker, state)
        } else {
            let mut tree = FlatTree::new(walker);
            for (id, openness) in edits(cli) {
                if tree.set_open(&id, openness).is_none() {
                    warn!(path = %id, "Not in the tree, ignoring");
                }
            }
            tree
        };

        if cli.evict {
            let evicted = tree.evict_unreachable();
            info!(evicted, "Evicted unreachable records");
        }

        let rows = rows(tree.view());
        match cli.format {
            OutputFormat::Text => Ok(format_rows_text(&rows, use_color(cli))),
            OutputFormat::Json => format_rows_json(&rows).context("serializing rows"),
        }
    }

    fn build_deferred(&self, cli: &Cli, walker: FsWalker) -> anyhow::Result<TreeState<FsNode>> {
        let runtime = tokio::runtime::Runtime::new().context("starting runtime")?;
        let config = SchedulerConfig {
            placeholder: true,
            ..self.config.scheduler.clone()
        };

        runtime.block_on(async {
            let tree = DeferredTree::new(walker, config)?;
            let initial = tree.request(Directives::refresh());
            tree.notify_idle();
            if let BuildOutcome::Superseded { epoch } = initial.wait().await {
                bail!("initial build {} was superseded", epoch);
            }

            let mut directives = Directives::new();
            for (id, openness) in edits(cli) {
                directives = directives.set(id, openness);
            }
            let handle = tree.request(directives.refresh_nodes(true));
            tree.notify_idle();
            let outcome = handle.wait().await;
            info!(epoch = outcome.epoch(), committed = outcome.is_committed(), "Edits applied");
            Ok::<_, anyhow::Error>(tree.committed_state())
        })
    }
}

/// Color unless `--no-color` is given or `NO_COLOR` is set.
fn use_color(cli: &Cli) -> bool {
    !cli.no_color && std::env::var_os("NO_COLOR").is_none()
}

/// `--toggle` and `--collapse` as openness directives, in command-line order per kind.
///
/// Toggles become explicit opens: the CLI has no prior state to flip.
fn edits(cli: &Cli) -> Vec<(String, Openness<FsNode>)> {
    let id = |relative: &PathBuf| cli.path.join(relative).display().to_string();
    cli.toggles
        .iter()
        .map(|p| (id(p), Openness::SetOpen(true)))
        .chain(cli.collapses.iter().map(|p| (id(p), Openness::cascade(false))))
        .collect()
}
