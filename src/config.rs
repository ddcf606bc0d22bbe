//! Configuration System
//!
//! Two layers: [`NavigationConfiguration`] is the runtime snapshot every state node carries
//! (copied from parent to child at first attach), while [`NavigatorConfig`] is what a host
//! application loads from files and environment to build that snapshot, its logging and its
//! restoration store.

use crate::error::NavigationError;
use crate::events::Verbosity;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod merge_policy;
mod sources;

/// Runtime configuration snapshot carried by each state node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationConfiguration {
    execution_delay: Duration,
    /// Minimum verbosity of navigation events this node reports
    pub verbosity: Verbosity,
    /// Allow pushing destinations whose type was never registered
    pub auto_destination_mode: bool,
    /// Enables state restoration for named scopes when set
    pub restoration_key: Option<String>,
}

impl NavigationConfiguration {
    pub const MIN_EXECUTION_DELAY: Duration = Duration::from_millis(300);
    pub const MAX_EXECUTION_DELAY: Duration = Duration::from_secs(5);

    pub fn new(
        execution_delay: Duration,
        verbosity: Verbosity,
        auto_destination_mode: bool,
        restoration_key: Option<String>,
    ) -> Self {
        Self {
            execution_delay: Self::clamp_delay(execution_delay),
            verbosity,
            auto_destination_mode,
            restoration_key,
        }
    }

    /// Delay between visible deep-linking steps, always within the allowed bounds.
    pub fn execution_delay(&self) -> Duration {
        self.execution_delay
    }

    pub fn with_execution_delay(mut self, delay: Duration) -> Self {
        self.execution_delay = Self::clamp_delay(delay);
        self
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_restoration_key(mut self, key: impl Into<String>) -> Self {
        self.restoration_key = Some(key.into());
        self
    }

    pub fn with_auto_destination_mode(mut self, enabled: bool) -> Self {
        self.auto_destination_mode = enabled;
        self
    }

    pub fn clamp_delay(delay: Duration) -> Duration {
        delay.clamp(Self::MIN_EXECUTION_DELAY, Self::MAX_EXECUTION_DELAY)
    }
}

impl Default for NavigationConfiguration {
    fn default() -> Self {
        Self::new(
            Self::MIN_EXECUTION_DELAY,
            Verbosity::default(),
            true,
            None,
        )
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NavigatorConfig {
    /// Navigation behavior settings
    #[serde(default)]
    pub navigation: NavigationSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// State restoration storage
    #[serde(default)]
    pub persistence: PersistenceSettings,
}

/// File-level navigation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationSettings {
    /// Delay between deep-linking steps in milliseconds (clamped to 300..=5000)
    #[serde(default = "default_execution_delay_ms")]
    pub execution_delay_ms: u64,

    #[serde(default)]
    pub verbosity: Verbosity,

    #[serde(default = "default_true")]
    pub auto_destination_mode: bool,

    #[serde(default)]
    pub restoration_key: Option<String>,
}

fn default_execution_delay_ms() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            execution_delay_ms: default_execution_delay_ms(),
            verbosity: Verbosity::default(),
            auto_destination_mode: default_true(),
            restoration_key: None,
        }
    }
}

impl NavigationSettings {
    pub fn to_configuration(&self) -> NavigationConfiguration {
        NavigationConfiguration::new(
            Duration::from_millis(self.execution_delay_ms),
            self.verbosity,
            self.auto_destination_mode,
            self.restoration_key.clone(),
        )
    }
}

/// Where restored navigation state is kept
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceSettings {
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".navigator/state")
}

impl Default for PersistenceSettings {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Navigation(String),
    Persistence(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Navigation(msg) => write!(f, "Navigation: {}", msg),
            ValidationError::Persistence(msg) => write!(f, "Persistence: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl NavigatorConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Some(key) = &self.navigation.restoration_key {
            if key.trim().is_empty() {
                errors.push(ValidationError::Navigation(
                    "Restoration key cannot be empty".to_string(),
                ));
            }
        }

        if self.persistence.store_path.as_os_str().is_empty() {
            errors.push(ValidationError::Persistence(
                "Store path cannot be empty".to_string(),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Runtime snapshot for a root navigator.
    pub fn navigation_configuration(&self) -> NavigationConfiguration {
        self.navigation.to_configuration()
    }
}

/// Loads [`NavigatorConfig`] from layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for an application rooted at `root`.
    ///
    /// Precedence (lowest to highest): defaults, `config/navigator.toml`,
    /// `config/{NAVIGATOR_ENV}.toml`, `NAVIGATOR_*` environment variables.
    pub fn load(root: &Path) -> Result<NavigatorConfig, NavigationError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = sources::add_workspace_files(builder, root)?;
        let builder = sources::add_environment(builder);
        Self::finish(builder)
    }

    /// Load configuration from one explicit file layered over the defaults.
    pub fn load_from_file(path: &Path) -> Result<NavigatorConfig, NavigationError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = sources::add_file(builder, path)?;
        Self::finish(builder)
    }

    fn finish(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<NavigatorConfig, NavigationError> {
        let config: NavigatorConfig = builder.build()?.try_deserialize()?;
        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            NavigationError::Config(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;
        Ok(config)
    }
}
