//! Sheet and cover presentation slots.

use super::{NodeInner, StateNode};
use crate::destination::AnyDestination;
use crate::error::NavigationError;
use crate::events::{NavigationChange, NavigationEvent};
use crate::types::Owner;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The two modal slots a node can fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresentationSlot {
    Sheet,
    Cover,
}

impl PresentationSlot {
    pub fn as_str(self) -> &'static str {
        match self {
            PresentationSlot::Sheet => "sheet",
            PresentationSlot::Cover => "cover",
        }
    }
}

/// Callback bound by whatever presented a node; invoking it tears the presentation down.
#[derive(Clone)]
pub struct DismissCapability(Arc<dyn Fn() + Send + Sync>);

impl DismissCapability {
    pub fn new(dismiss: impl Fn() + Send + Sync + 'static) -> Self {
        Self(Arc::new(dismiss))
    }

    pub fn invoke(&self) {
        (self.0)()
    }
}

impl fmt::Debug for DismissCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DismissCapability")
    }
}

impl NodeInner {
    pub(crate) fn slot_mut(&mut self, slot: PresentationSlot) -> &mut Option<AnyDestination> {
        match slot {
            PresentationSlot::Sheet => &mut self.sheet,
            PresentationSlot::Cover => &mut self.cover,
        }
    }
}

impl StateNode {
    pub fn sheet(&self) -> Option<AnyDestination> {
        self.inner.read().sheet.clone()
    }

    pub fn cover(&self) -> Option<AnyDestination> {
        self.inner.read().cover.clone()
    }

    /// The child scope mounted for an occupied slot.
    pub fn presented_child(&self, slot: PresentationSlot) -> Option<Arc<StateNode>> {
        let inner = self.inner.read();
        inner
            .presented
            .get(&slot)
            .and_then(|id| inner.children.get(id))
            .cloned()
    }

    /// Whoever presented this node left a dismiss capability on it.
    pub fn is_presented(&self) -> bool {
        self.inner.read().dismiss.is_some()
    }

    /// Some direct child is presented.
    pub fn is_presenting(&self) -> bool {
        self.children().iter().any(|child| child.is_presented())
    }

    /// Some descendant at any depth is presented.
    pub fn is_any_child_presenting(&self) -> bool {
        self.children()
            .iter()
            .any(|child| child.is_presented() || child.is_any_child_presenting())
    }

    pub fn presented_children(&self) -> Vec<Arc<StateNode>> {
        self.children()
            .into_iter()
            .filter(|child| child.is_presented())
            .collect()
    }

    /// Nearest presented node among this node and its ancestors.
    pub fn nearest_presented(self: &Arc<Self>) -> Option<Arc<StateNode>> {
        let mut current = Some(Arc::clone(self));
        while let Some(node) = current {
            if node.is_presented() {
                return Some(node);
            }
            current = node.parent();
        }
        None
    }

    /// Fill `slot` with `destination` and mount a child scope for it.
    ///
    /// An occupied slot is dismissed first. The returned child carries a dismiss capability
    /// that clears the slot and detaches it.
    pub(crate) fn present(
        self: &Arc<Self>,
        slot: PresentationSlot,
        destination: AnyDestination,
    ) -> Result<Arc<StateNode>, NavigationError> {
        if let Some(previous) = self.presented_child(slot) {
            previous.dismiss_self();
        }

        let owner = if destination.method().requires_navigation_stack() {
            Owner::Stack
        } else {
            Owner::Presenter
        };
        let description = format!("{:?}", destination);
        let child = StateNode::new(owner, None);
        let child_id = child.id();
        let parent = Arc::downgrade(self);
        let capability = DismissCapability::new(move || {
            if let Some(parent) = parent.upgrade() {
                parent.detach_id(child_id);
            }
        });

        *self.inner.write().slot_mut(slot) = Some(destination);
        self.attach(&child, Some(capability))?;
        self.inner.write().presented.insert(slot, child_id);

        self.log(NavigationEvent::Navigation(NavigationChange::Presented {
            slot: slot.as_str(),
            destination: description,
        }));
        Ok(child)
    }

    /// Invoke this node's dismiss capability. False if nothing presented it.
    pub(crate) fn dismiss_self(&self) -> bool {
        let capability = self.inner.read().dismiss.clone();
        match capability {
            Some(capability) => {
                capability.invoke();
                self.log(NavigationEvent::Navigation(NavigationChange::Dismissed(
                    self.id(),
                )));
                true
            }
            None => false,
        }
    }

    /// Dismiss every presented direct child.
    pub(crate) fn dismiss_presented_children(&self) -> bool {
        let mut changed = false;
        for child in self.presented_children() {
            changed |= child.dismiss_self();
        }
        changed
    }

    /// Dismiss every presented scope in this subtree, outermost first.
    pub(crate) fn dismiss_all_presented(&self) -> bool {
        let mut changed = false;
        for child in self.children() {
            if child.is_presented() {
                changed |= child.dismiss_self();
            } else {
                changed |= child.dismiss_all_presented();
            }
        }
        changed
    }
}
