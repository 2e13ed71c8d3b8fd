//! Built-in defaults, lowest precedence.

use crate::config::TreeConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Start a builder seeded with [`TreeConfig::default`].
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = Config::try_from(&TreeConfig::default())?;
    Ok(Config::builder().add_source(defaults))
}
