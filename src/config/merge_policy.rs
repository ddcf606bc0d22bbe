//! Merge rules: defaults applied before any file or environment source.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("navigation.execution_delay_ms", 300)?
        .set_default("navigation.verbosity", "warning")?
        .set_default("navigation.auto_destination_mode", true)?
        .set_default("persistence.store_path", ".navigator/state")
}
