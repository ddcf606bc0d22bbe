use super::StateNode;
use crate::error::NavigationError;
use crate::types::LockId;
use std::sync::Arc;

impl StateNode {
    pub fn add_lock(&self, id: LockId) {
        self.inner.write().locks.insert(id);
    }

    pub fn remove_lock(&self, id: LockId) {
        self.inner.write().locks.remove(&id);
    }

    pub fn holds_lock(&self, id: LockId) -> bool {
        self.inner.read().locks.contains(&id)
    }

    /// This node or any descendant holds an active lock.
    pub fn is_subtree_locked(&self) -> bool {
        if !self.inner.read().locks.is_empty() {
            return true;
        }
        self.children().iter().any(|child| child.is_subtree_locked())
    }

    /// Any node in this node's tree holds an active lock.
    pub fn is_navigation_locked(self: &Arc<Self>) -> bool {
        self.root_node().is_subtree_locked()
    }

    /// Fail with [`NavigationError::Locked`] if any of `nodes` has a locked subtree.
    pub(crate) fn ensure_unlocked<'a>(
        nodes: impl IntoIterator<Item = &'a Arc<StateNode>>,
    ) -> Result<(), NavigationError> {
        for node in nodes {
            if node.is_subtree_locked() {
                return Err(NavigationError::Locked { node: node.id() });
            }
        }
        Ok(())
    }
}
