//! Error types for the navigation state tree and its action executor.

use crate::types::NodeId;
use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Unknown destination type: {0}")]
    UnknownDestinationType(String),
}

/// Errors surfaced by navigation operations
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("Attaching {child} to {parent} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },

    #[error("Navigation locked in subtree of {node}")]
    Locked { node: NodeId },

    #[error("Route expansion failed: {0}")]
    RouteExpansion(String),

    #[error("Checkpoint '{name}' expects payload {expected}, got {actual}")]
    CheckpointTypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Paused navigation was cancelled")]
    Cancelled,

    #[error("Navigation executor stopped before the batch completed")]
    ExecutorStopped,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for NavigationError {
    fn from(err: config::ConfigError) -> Self {
        NavigationError::Config(err.to_string())
    }
}

impl NavigationError {
    /// True for errors caused by a dismissal lock.
    pub fn is_locked(&self) -> bool {
        matches!(self, NavigationError::Locked { .. })
    }
}
