//! Config sources: application files and `NAVIGATOR_*` environment variables.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::{Environment, File};
use std::path::Path;
use tracing::debug;

/// Add application config files to builder.
/// Precedence: config/navigator.toml (base) then config/{NAVIGATOR_ENV}.toml (env-specific).
pub fn add_workspace_files(
    builder: ConfigBuilder<DefaultState>,
    root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let config_dir = root.join("config");
    let env_name = std::env::var("NAVIGATOR_ENV").unwrap_or_else(|_| "development".to_string());

    let mut builder = builder;

    let base_config_path = config_dir.join("navigator.toml");
    if base_config_path.exists() {
        builder = add_file(builder, &base_config_path)?;
    }

    let env_config_path = config_dir.join(format!("{}.toml", env_name));
    if env_config_path.exists() {
        builder = add_file(builder, &env_config_path)?;
    }

    Ok(builder)
}

/// Add one explicit file source.
pub fn add_file(
    builder: ConfigBuilder<DefaultState>,
    path: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let Some(path_str) = path.to_str() else {
        return Err(ConfigError::Message(format!(
            "Config path is not valid UTF-8: {}",
            path.display()
        )));
    };
    debug!(config_path = %path.display(), "Adding navigator config file");
    Ok(builder.add_source(File::with_name(path_str).required(true)))
}

/// Environment overrides, e.g. `NAVIGATOR_NAVIGATION__EXECUTION_DELAY_MS=500`.
pub fn add_environment(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("NAVIGATOR")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    )
}
