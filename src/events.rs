//! Navigation events and verbosity filtering.
//!
//! Nodes describe what they do as [`NavigationEvent`] values. An event is forwarded to
//! `tracing` only when its verbosity reaches the node's configured threshold.

use crate::types::{BatchId, NodeId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum severity a node reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Info,
    Warning,
    Error,
    None,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Warning
    }
}

impl std::str::FromStr for Verbosity {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "info" => Ok(Verbosity::Info),
            "warning" | "warn" => Ok(Verbosity::Warning),
            "error" => Ok(Verbosity::Error),
            "none" | "off" => Ok(Verbosity::None),
            other => Err(format!(
                "Invalid verbosity: {} (must be 'info', 'warning', 'error', or 'none')",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Configured,
    Attached(NodeId),
    Detached(NodeId),
    Dropped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationChange {
    Pushed(String),
    Popped(usize),
    Presented { slot: &'static str, destination: String },
    Dismissed(NodeId),
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckpointEvent {
    Established { name: String, depth: usize },
    Returned { name: String, depth: usize },
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutorEvent {
    Executing { batch: BatchId, action: String },
    Paused { batch: BatchId, retained: usize },
    Resumed { retained: usize },
    Cancelled { discarded: usize },
    Aborted { batch: BatchId, reason: String },
}

/// Something a navigation node wants to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationEvent {
    Lifecycle(LifecycleEvent),
    Navigation(NavigationChange),
    Checkpoint(CheckpointEvent),
    Executor(ExecutorEvent),
    Providing(String),
    Warning(String),
    Error(String),
}

impl NavigationEvent {
    pub fn verbosity(&self) -> Verbosity {
        match self {
            NavigationEvent::Checkpoint(CheckpointEvent::Unknown(_)) => Verbosity::Warning,
            NavigationEvent::Executor(ExecutorEvent::Aborted { .. }) => Verbosity::Error,
            NavigationEvent::Warning(_) => Verbosity::Warning,
            NavigationEvent::Error(_) => Verbosity::Error,
            _ => Verbosity::Info,
        }
    }

    /// Forward this event to `tracing` if it passes the given threshold.
    pub fn emit(&self, threshold: Verbosity, node_id: NodeId, node_name: Option<&str>) {
        let level = self.verbosity();
        if threshold == Verbosity::None || level < threshold {
            return;
        }
        let name = node_name.unwrap_or("-");
        match level {
            Verbosity::Info => {
                tracing::info!(node_id = %node_id, node_name = name, "{}", self)
            }
            Verbosity::Warning => {
                tracing::warn!(node_id = %node_id, node_name = name, "{}", self)
            }
            Verbosity::Error => {
                tracing::error!(node_id = %node_id, node_name = name, "{}", self)
            }
            Verbosity::None => {}
        }
    }
}

impl fmt::Display for NavigationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationEvent::Lifecycle(event) => match event {
                LifecycleEvent::Configured => write!(f, "lifecycle: configured"),
                LifecycleEvent::Attached(child) => write!(f, "lifecycle: attached {}", child),
                LifecycleEvent::Detached(child) => write!(f, "lifecycle: detached {}", child),
                LifecycleEvent::Dropped => write!(f, "lifecycle: dropped"),
            },
            NavigationEvent::Navigation(change) => match change {
                NavigationChange::Pushed(destination) => write!(f, "navigation: push {}", destination),
                NavigationChange::Popped(depth) => write!(f, "navigation: pop to {}", depth),
                NavigationChange::Presented { slot, destination } => {
                    write!(f, "navigation: present {} {}", slot, destination)
                }
                NavigationChange::Dismissed(node) => write!(f, "navigation: dismiss {}", node),
                NavigationChange::Reset => write!(f, "navigation: reset"),
            },
            NavigationEvent::Checkpoint(event) => match event {
                CheckpointEvent::Established { name, depth } => {
                    write!(f, "checkpoint: established {} at {}", name, depth)
                }
                CheckpointEvent::Returned { name, depth } => {
                    write!(f, "checkpoint: returned to {} at {}", name, depth)
                }
                CheckpointEvent::Unknown(name) => write!(f, "checkpoint: {} not found", name),
            },
            NavigationEvent::Executor(event) => match event {
                ExecutorEvent::Executing { batch, action } => {
                    write!(f, "executor: batch {} executing {}", batch.as_u64(), action)
                }
                ExecutorEvent::Paused { batch, retained } => write!(
                    f,
                    "executor: batch {} paused with {} actions retained",
                    batch.as_u64(),
                    retained
                ),
                ExecutorEvent::Resumed { retained } => {
                    write!(f, "executor: resumed {} actions", retained)
                }
                ExecutorEvent::Cancelled { discarded } => {
                    write!(f, "executor: cancelled {} paused actions", discarded)
                }
                ExecutorEvent::Aborted { batch, reason } => {
                    write!(f, "executor: batch {} aborted: {}", batch.as_u64(), reason)
                }
            },
            NavigationEvent::Providing(destination) => write!(f, "providing: {}", destination),
            NavigationEvent::Warning(message) => write!(f, "warning: {}", message),
            NavigationEvent::Error(message) => write!(f, "error: {}", message),
        }
    }
}
