//! How each action changes the tree.

use super::Applied;
use crate::action::{Action, Resolution, SendValue};
use crate::destination::{AnyDestination, NavigationMethod};
use crate::error::NavigationError;
use crate::events::{NavigationChange, NavigationEvent};
use crate::navigator::Navigator;
use crate::state::StateNode;
use std::sync::Arc;

pub(super) fn apply(node: &Arc<StateNode>, action: Action) -> Result<Applied, NavigationError> {
    match action {
        Action::Push(destination) => {
            node.push(destination.with_method(NavigationMethod::Push));
            Ok(Applied::auto(true))
        }
        Action::NavigateTo(destination, method) => navigate(node, destination, method),
        Action::Send(values) => Ok(Applied::expanded(
            values.into_iter().map(SendValue::into_action).collect(),
        )),
        Action::Pop => Ok(Applied::auto(node.pop())),
        Action::PopTo(index) => Ok(Applied::auto(node.pop_to(index))),
        Action::PopAll => Ok(Applied::auto(node.pop_all())),
        Action::PopAllIn(name) => match node.root_node().find_named(&name) {
            Some(scope) => Ok(Applied::auto(scope.pop_all())),
            None => {
                node.log(NavigationEvent::Warning(format!(
                    "no scope named '{}' to pop",
                    name
                )));
                Ok(Applied::auto(false))
            }
        },
        Action::Dismiss => match node.nearest_presented() {
            Some(presented) => {
                StateNode::ensure_unlocked([&presented])?;
                Ok(Applied::auto(presented.dismiss_self()))
            }
            None => {
                node.log(NavigationEvent::Warning(
                    "dismiss requested outside any presented scope".to_string(),
                ));
                Ok(Applied::auto(false))
            }
        },
        Action::DismissAny => {
            let root = node.root_node();
            StateNode::ensure_unlocked([&root])?;
            Ok(Applied::auto(root.dismiss_all_presented()))
        }
        Action::DismissPresented => {
            let presented = node.presented_children();
            StateNode::ensure_unlocked(presented.iter())?;
            Ok(Applied::auto(node.dismiss_presented_children()))
        }
        Action::Reset => {
            let root = node.root_node();
            StateNode::ensure_unlocked([&root])?;
            let mut changed = root.dismiss_all_presented();
            for scope in root.descendants() {
                changed |= scope.pop_all();
            }
            root.log(NavigationEvent::Navigation(NavigationChange::Reset));
            Ok(Applied::auto(changed))
        }
        Action::PerformRoute(token) => {
            let actions = node.services().routes.expand(&token)?;
            Ok(Applied::expanded(actions))
        }
        Action::ReturnToCheckpoint { name, value } => {
            Ok(Applied::auto(node.return_to_checkpoint(&name, value)?))
        }
        Action::Pause => Ok(Applied::resolved(Resolution::Pause)),
        Action::Resume | Action::CancelResume => {
            // Queued actions never run while a batch is paused.
            node.log(NavigationEvent::Warning(
                "nothing is paused; resume and cancel act through the navigator".to_string(),
            ));
            Ok(Applied::resolved(Resolution::Immediately))
        }
        Action::AuthenticationGate => Ok(Applied::resolved(authentication_gate(node))),
        Action::Custom { resolver, .. } => {
            let navigator = Navigator::from_node(Arc::clone(node));
            Ok(Applied::resolved(resolver(&navigator)))
        }
    }
}

fn navigate(
    node: &Arc<StateNode>,
    destination: AnyDestination,
    method: NavigationMethod,
) -> Result<Applied, NavigationError> {
    let Some(slot) = method.slot() else {
        node.push(destination.with_method(NavigationMethod::Push));
        return Ok(Applied::auto(true));
    };
    if let Some(previous) = node.presented_child(slot) {
        StateNode::ensure_unlocked([&previous])?;
    }
    node.present(slot, destination.with_method(method))?;
    Ok(Applied::auto(true))
}

fn authentication_gate(node: &Arc<StateNode>) -> Resolution {
    let authenticator = node.services().authenticator.read().clone();
    match authenticator {
        None => {
            node.log(NavigationEvent::Warning(
                "authentication gate without an authenticator".to_string(),
            ));
            Resolution::Immediately
        }
        Some(authenticator) if authenticator.is_authenticated() => Resolution::Immediately,
        Some(authenticator) => {
            authenticator.request_authentication();
            Resolution::Pause
        }
    }
}
