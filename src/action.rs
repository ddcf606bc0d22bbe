//! Actions and how they resolve.

use crate::checkpoint::CheckpointValue;
use crate::destination::{AnyDestination, NavigationMethod};
use crate::navigator::Navigator;
use crate::routes::RouteToken;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// What the executor does after an action has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Immediately,
    /// Let the change settle for this long (clamped) before the next action starts
    After(Duration),
    /// Hold the rest of the batch until resumed or cancelled
    Pause,
    /// `After` the configured delay if the action changed the tree, else `Immediately`
    Auto,
}

/// Resolver run by [`Action::Custom`].
pub type CustomResolver = Arc<dyn Fn(&Navigator) -> Resolution + Send + Sync>;

/// One element of a [`Action::Send`] batch.
#[derive(Clone, Debug)]
pub enum SendValue {
    Destination(AnyDestination),
    Action(Action),
}

impl From<AnyDestination> for SendValue {
    fn from(destination: AnyDestination) -> Self {
        SendValue::Destination(destination)
    }
}

impl From<Action> for SendValue {
    fn from(action: Action) -> Self {
        SendValue::Action(action)
    }
}

impl SendValue {
    /// The action this value stands for: destinations navigate with their own method.
    pub fn into_action(self) -> Action {
        match self {
            SendValue::Destination(destination) => {
                let method = destination.method();
                Action::NavigateTo(destination, method)
            }
            SendValue::Action(action) => action,
        }
    }
}

#[derive(Clone)]
pub enum Action {
    Push(AnyDestination),
    NavigateTo(AnyDestination, NavigationMethod),
    Send(Vec<SendValue>),
    Pop,
    PopTo(usize),
    PopAll,
    PopAllIn(String),
    Dismiss,
    DismissAny,
    DismissPresented,
    Reset,
    PerformRoute(RouteToken),
    ReturnToCheckpoint {
        name: String,
        value: Option<CheckpointValue>,
    },
    Pause,
    /// Queued actions never run while a batch is paused, so this only logs a warning when
    /// executed. Use `Navigator::resume` to continue a paused batch.
    Resume,
    /// Like [`Action::Resume`], a logged no-op when executed. Use `Navigator::cancel_resume`.
    CancelResume,
    AuthenticationGate,
    Custom {
        name: String,
        resolver: CustomResolver,
    },
}

impl Action {
    pub fn custom(
        name: impl Into<String>,
        resolver: impl Fn(&Navigator) -> Resolution + Send + Sync + 'static,
    ) -> Self {
        Action::Custom {
            name: name.into(),
            resolver: Arc::new(resolver),
        }
    }

    pub fn return_to_checkpoint(name: impl Into<String>) -> Self {
        Action::ReturnToCheckpoint {
            name: name.into(),
            value: None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Action::Push(_) => "push",
            Action::NavigateTo(..) => "navigate_to",
            Action::Send(_) => "send",
            Action::Pop => "pop",
            Action::PopTo(_) => "pop_to",
            Action::PopAll => "pop_all",
            Action::PopAllIn(_) => "pop_all_in",
            Action::Dismiss => "dismiss",
            Action::DismissAny => "dismiss_any",
            Action::DismissPresented => "dismiss_presented",
            Action::Reset => "reset",
            Action::PerformRoute(_) => "perform_route",
            Action::ReturnToCheckpoint { .. } => "return_to_checkpoint",
            Action::Pause => "pause",
            Action::Resume => "resume",
            Action::CancelResume => "cancel_resume",
            Action::AuthenticationGate => "authentication_gate",
            Action::Custom { name, .. } => name,
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Push(destination) => write!(f, "Push({:?})", destination),
            Action::NavigateTo(destination, method) => {
                write!(f, "NavigateTo({:?}, {:?})", destination, method)
            }
            Action::Send(values) => f.debug_tuple("Send").field(values).finish(),
            Action::PopTo(index) => write!(f, "PopTo({})", index),
            Action::PopAllIn(name) => write!(f, "PopAllIn({})", name),
            Action::PerformRoute(token) => write!(f, "PerformRoute({:?})", token),
            Action::ReturnToCheckpoint { name, value } => {
                write!(f, "ReturnToCheckpoint({}, {:?})", name, value)
            }
            Action::Custom { name, .. } => write!(f, "Custom({})", name),
            other => f.write_str(other.name()),
        }
    }
}

impl From<AnyDestination> for Action {
    fn from(destination: AnyDestination) -> Self {
        Action::Push(destination)
    }
}
