//! Navigator Handle
//!
//! A cheap, cloneable binding to one scope of the navigation tree. Every mutating call is
//! turned into a batch of [`Action`]s and submitted to the root's executor, so ordering,
//! lock checks and the delay policy go through one code path. The returned futures resolve
//! once the batch has been applied.

use crate::action::{Action, SendValue};
use crate::checkpoint::{Checkpoint, CheckpointValue};
use crate::config::NavigationConfiguration;
use crate::destination::{AnyDestination, Destination, NavigationMethod, Rendered};
use crate::error::NavigationError;
use crate::executor::{ActionExecutor, BatchTicket};
use crate::gate::Authenticator;
use crate::routes::{RouteTable, RouteToken};
use crate::state::{PresentationSlot, StateNode};
use crate::store::{DestinationCodec, RestorationStore};
use crate::types::{LockId, NodeId, Owner};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub struct Navigator {
    node: Arc<StateNode>,
}

impl Navigator {
    /// Create the root scope of a new navigation tree.
    pub fn new(configuration: NavigationConfiguration) -> Self {
        Self {
            node: StateNode::root(configuration),
        }
    }

    pub fn from_node(node: Arc<StateNode>) -> Self {
        Self { node }
    }

    pub fn state(&self) -> &Arc<StateNode> {
        &self.node
    }

    pub fn id(&self) -> NodeId {
        self.node.id()
    }

    pub fn name(&self) -> Option<String> {
        self.node.name()
    }

    pub fn path(&self) -> Vec<AnyDestination> {
        self.node.path()
    }

    // MARK: tree

    pub fn parent(&self) -> Option<Navigator> {
        self.node.parent().map(Navigator::from_node)
    }

    pub fn root(&self) -> Navigator {
        Navigator::from_node(self.node.root_node())
    }

    /// Find a named scope anywhere in this navigator's tree.
    pub fn named(&self, name: &str) -> Option<Navigator> {
        self.node
            .root_node()
            .find_named(name)
            .map(Navigator::from_node)
    }

    /// Mount a child scope below this one.
    pub fn child(&self, owner: Owner, name: Option<&str>) -> Result<Navigator, NavigationError> {
        let child = StateNode::new(owner, name);
        self.node.attach(&child, None)?;
        Ok(Navigator::from_node(child))
    }

    /// Detach this scope from its parent.
    pub fn unmount(&self) {
        if let Some(parent) = self.node.parent() {
            parent.detach(&self.node);
        }
    }

    /// Handle on the scope mounted for a filled presentation slot.
    pub fn presented(&self, slot: PresentationSlot) -> Option<Navigator> {
        self.node.presented_child(slot).map(Navigator::from_node)
    }

    pub fn is_presented(&self) -> bool {
        self.node.is_presented()
    }

    pub fn is_presenting(&self) -> bool {
        self.node.is_presenting()
    }

    pub fn is_any_child_presenting(&self) -> bool {
        self.node.is_any_child_presenting()
    }

    // MARK: navigation

    pub async fn push(&self, destination: impl Into<AnyDestination>) -> Result<(), NavigationError> {
        self.perform(vec![Action::Push(destination.into())])
            .await
            .map(|_| ())
    }

    /// Navigate using the destination's preferred method.
    pub async fn navigate_to(
        &self,
        destination: impl Into<AnyDestination>,
    ) -> Result<(), NavigationError> {
        let destination = destination.into();
        let method = destination.method();
        self.navigate_to_with(destination, method).await
    }

    pub async fn navigate_to_with(
        &self,
        destination: impl Into<AnyDestination>,
        method: NavigationMethod,
    ) -> Result<(), NavigationError> {
        self.perform(vec![Action::NavigateTo(destination.into(), method)])
            .await
            .map(|_| ())
    }

    /// Present as a sheet. `managed` overrides whether the sheet gets its own stack;
    /// by default the destination's method decides.
    pub async fn present_sheet(
        &self,
        destination: impl Into<AnyDestination>,
        managed: Option<bool>,
    ) -> Result<(), NavigationError> {
        let destination = destination.into();
        let method = match managed.unwrap_or(destination.method().requires_navigation_stack()) {
            true => NavigationMethod::ManagedSheet,
            false => NavigationMethod::Sheet,
        };
        self.navigate_to_with(destination, method).await
    }

    pub async fn present_cover(
        &self,
        destination: impl Into<AnyDestination>,
        managed: Option<bool>,
    ) -> Result<(), NavigationError> {
        let destination = destination.into();
        let method = match managed.unwrap_or(destination.method().requires_navigation_stack()) {
            true => NavigationMethod::ManagedCover,
            false => NavigationMethod::Cover,
        };
        self.navigate_to_with(destination, method).await
    }

    pub async fn pop(&self) -> Result<bool, NavigationError> {
        self.perform(vec![Action::Pop]).await
    }

    /// Truncate the path to `index` entries.
    pub async fn pop_to(&self, index: usize) -> Result<bool, NavigationError> {
        self.perform(vec![Action::PopTo(index)]).await
    }

    pub async fn pop_all(&self) -> Result<bool, NavigationError> {
        self.perform(vec![Action::PopAll]).await
    }

    /// Pop everything in the scope named `name`.
    pub async fn pop_all_in(&self, name: &str) -> Result<bool, NavigationError> {
        self.perform(vec![Action::PopAllIn(name.to_string())]).await
    }

    /// Dismiss the nearest presented scope containing this one.
    pub async fn dismiss(&self) -> Result<bool, NavigationError> {
        self.perform(vec![Action::Dismiss]).await
    }

    /// Dismiss every presented scope in the tree.
    pub async fn dismiss_any(&self) -> Result<bool, NavigationError> {
        self.perform(vec![Action::DismissAny]).await
    }

    /// Dismiss the scopes this one presented.
    pub async fn dismiss_presented_views(&self) -> Result<bool, NavigationError> {
        self.perform(vec![Action::DismissPresented]).await
    }

    /// Dismiss everything and empty every path in the tree.
    pub async fn reset(&self) -> Result<bool, NavigationError> {
        self.perform(vec![Action::Reset]).await
    }

    /// Apply destinations and actions in order as one batch.
    pub async fn send(
        &self,
        values: impl IntoIterator<Item = SendValue>,
    ) -> Result<bool, NavigationError> {
        self.perform(vec![Action::Send(values.into_iter().collect())])
            .await
    }

    /// Submit a batch and wait for it.
    pub async fn perform(&self, actions: Vec<Action>) -> Result<bool, NavigationError> {
        self.enqueue(actions).outcome().await
    }

    /// Submit a batch without waiting for it.
    pub fn enqueue(&self, actions: Vec<Action>) -> BatchTicket {
        self.node.executor().submit(&self.node, actions)
    }

    pub async fn perform_route<R>(&self, route: R) -> Result<bool, NavigationError>
    where
        R: Any + Send + Sync + fmt::Debug,
    {
        self.perform(vec![Action::PerformRoute(RouteToken::new(route))])
            .await
    }

    // MARK: checkpoints

    pub fn establish_checkpoint<T: Any + Send + Sync>(&self, checkpoint: &Checkpoint<T>) {
        self.node.establish_checkpoint(checkpoint);
    }

    pub fn establish_checkpoint_with<T, F>(&self, checkpoint: &Checkpoint<T>, handler: F)
    where
        T: Any + Send + Sync + Clone,
        F: Fn(T) + Send + Sync + 'static,
    {
        self.node.establish_checkpoint_with(checkpoint, handler);
    }

    pub fn can_return_to_checkpoint<T>(&self, checkpoint: &Checkpoint<T>) -> bool {
        self.node.can_return_to_checkpoint(checkpoint.name())
    }

    pub async fn return_to_checkpoint<T>(
        &self,
        checkpoint: &Checkpoint<T>,
    ) -> Result<bool, NavigationError> {
        self.perform(vec![Action::return_to_checkpoint(checkpoint.name())])
            .await
    }

    /// Return to a checkpoint carrying `value` to its handler.
    ///
    /// A value whose type differs from the checkpoint's declared payload fails here, before
    /// anything is submitted.
    pub async fn return_to_checkpoint_with<T: Any + Send + Sync>(
        &self,
        checkpoint: &Checkpoint<T>,
        value: T,
    ) -> Result<bool, NavigationError> {
        let value = CheckpointValue::new(value);
        self.node.check_checkpoint_value(checkpoint.name(), &value)?;
        self.perform(vec![Action::ReturnToCheckpoint {
            name: checkpoint.name().to_string(),
            value: Some(value),
        }])
        .await
    }

    // MARK: locks and suspension

    pub fn add_lock(&self, id: LockId) {
        self.node.add_lock(id);
    }

    pub fn remove_lock(&self, id: LockId) {
        self.node.remove_lock(id);
    }

    pub fn is_navigation_locked(&self) -> bool {
        self.node.is_navigation_locked()
    }

    /// Continue the paused batch of this tree. False if nothing is paused.
    pub fn resume(&self) -> bool {
        self.node.executor().resume()
    }

    /// Drop the paused batch of this tree. False if nothing is paused.
    pub fn cancel_resume(&self) -> bool {
        self.node.executor().cancel_resume()
    }

    pub fn executor(&self) -> Arc<ActionExecutor> {
        self.node.executor()
    }

    // MARK: registries

    pub fn register_route<R, F>(&self, handler: F)
    where
        R: Any + Send + Sync,
        F: Fn(&R) -> Vec<Action> + Send + Sync + 'static,
    {
        self.node.services().routes.register::<R, F>(handler);
    }

    pub fn register_route_table<R: Any>(&self, table: Arc<dyn RouteTable>) {
        self.node.services().routes.register_table::<R>(table);
    }

    pub fn register_provided_view<D, F>(&self, resolver: F)
    where
        D: Destination,
        F: Fn(&D) -> Rendered + Send + Sync + 'static,
    {
        self.node.services().provided.register::<D, F>(resolver);
    }

    pub fn set_authenticator(&self, authenticator: Arc<dyn Authenticator>) {
        *self.node.services().authenticator.write() = Some(authenticator);
    }

    pub fn register_destination<D: Destination>(&self) {
        self.node.register_destination::<D>();
    }

    // MARK: restoration

    /// Save every named scope of this tree. Returns how many were written.
    pub fn save_state(
        &self,
        store: &dyn RestorationStore,
        codec: &DestinationCodec,
    ) -> Result<usize, NavigationError> {
        crate::store::save_tree(&self.node.root_node(), store, codec)
    }

    /// Restore every named scope of this tree. Returns how many were restored.
    pub fn restore_state(
        &self,
        store: &dyn RestorationStore,
        codec: &DestinationCodec,
    ) -> Result<usize, NavigationError> {
        crate::store::restore_tree(&self.node.root_node(), store, codec)
    }
}

impl fmt::Debug for Navigator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Navigator").field(&self.node).finish()
    }
}
