//! Configuration
//!
//! Scheduler tuning and logging settings, layered from defaults, an optional
//! TOML file, and `VTREE__`-prefixed environment variables.

mod facade;
pub mod sources;

pub use crate::logging::LoggingConfig;
pub use facade::ConfigLoader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Deferred build scheduler settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Show a placeholder and build in the background. When false, every
    /// request is computed inline.
    #[serde(default = "default_placeholder")]
    pub placeholder: bool,

    /// Longest wait for an idle signal before a scheduled pass starts anyway.
    #[serde(default = "default_building_task_timeout_ms")]
    pub building_task_timeout_ms: u64,

    /// Walker yields consumed per slice before yielding to other tasks.
    #[serde(default = "default_slice_budget")]
    pub slice_budget: usize,
}

fn default_placeholder() -> bool {
    true
}

fn default_building_task_timeout_ms() -> u64 {
    50
}

fn default_slice_budget() -> usize {
    1000
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            placeholder: default_placeholder(),
            building_task_timeout_ms: default_building_task_timeout_ms(),
            slice_budget: default_slice_budget(),
        }
    }
}

impl SchedulerConfig {
    /// Inline computation, no placeholder.
    pub fn immediate() -> Self {
        Self {
            placeholder: false,
            ..Self::default()
        }
    }

    pub fn building_task_timeout(&self) -> Duration {
        Duration::from_millis(self.building_task_timeout_ms)
    }
}
