//! ConfigLoader: composes sources and deserializes to TreeConfig.

use super::sources::{defaults, environment};
use super::TreeConfig;
use config::{ConfigError, File, FileFormat};
use std::path::Path;
use tracing::debug;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from defaults and environment.
    /// Precedence: defaults (lowest) -> environment (highest).
    pub fn load() -> Result<TreeConfig, ConfigError> {
        let builder = defaults::builder_with_defaults()?;
        let builder = environment::add_to_builder(builder)?;
        builder.build()?.try_deserialize()
    }

    /// Load from a TOML file with environment overlay.
    /// Precedence: defaults -> file -> environment.
    pub fn load_from_file(path: &Path) -> Result<TreeConfig, ConfigError> {
        debug!(path = %path.display(), "Loading configuration file");
        let builder = defaults::builder_with_defaults()?;
        let builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        let builder = environment::add_to_builder(builder)?;
        builder.build()?.try_deserialize()
    }

    /// Create default configuration.
    pub fn default() -> TreeConfig {
        TreeConfig::default()
    }
}
