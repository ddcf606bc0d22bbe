//! Navigator: Navigation State Tree and Action Executor
//!
//! Coordinates navigation state for an interactive application. Scopes (the root, pushed
//! stacks, presented sheets and covers) form a tree of [`state::StateNode`]s, each owning an
//! ordered path of destinations. Callers hold a [`navigator::Navigator`] bound to one scope;
//! every change it makes becomes a batch of [`action::Action`]s drained strictly in order by
//! the root's [`executor::ActionExecutor`], which can delay, pause and resume deep-link
//! sequences.

pub mod action;
pub mod checkpoint;
pub mod config;
pub mod destination;
pub mod error;
pub mod events;
pub mod executor;
pub mod gate;
pub mod logging;
pub mod navigator;
pub mod routes;
pub mod state;
pub mod store;
pub mod types;

pub use action::{Action, Resolution, SendValue};
pub use checkpoint::{Checkpoint, CheckpointValue};
pub use config::{NavigationConfiguration, NavigatorConfig};
pub use destination::{AnyDestination, Destination, NavigationMethod, RenderContext, Rendered};
pub use error::{NavigationError, StorageError};
pub use events::Verbosity;
pub use executor::{ActionExecutor, BatchTicket, ExecutorPhase};
pub use navigator::Navigator;
pub use state::{PresentationSlot, StateNode};
pub use types::{LockId, NodeId, Owner};
