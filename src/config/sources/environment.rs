//! Environment variable source: VTREE__* prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Add environment variable overlay to builder.
/// `VTREE__SCHEDULER__SLICE_BUDGET=64` sets `scheduler.slice_budget`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(
        Environment::with_prefix("VTREE")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    ))
}
