//! Navigation State Tree
//!
//! Every navigable scope (the application root, a pushed stack, a presented sheet or cover)
//! owns one [`StateNode`]. Parents own their children by identifier; children keep only a
//! weak reference back to their parent. Structural changes bump a per-node change counter
//! that observers can watch.

pub mod hooks;
pub mod presentation;

mod locks;

pub use hooks::{DestinationMap, Hooks, InheritableHook, ViewModifier};
pub use presentation::{DismissCapability, PresentationSlot};

use crate::checkpoint::CheckpointRecord;
use crate::config::NavigationConfiguration;
use crate::destination::{AnyDestination, ProvidedViews};
use crate::error::NavigationError;
use crate::events::{LifecycleEvent, NavigationChange, NavigationEvent};
use crate::executor::ActionExecutor;
use crate::gate::Authenticator;
use crate::routes::RouteRegistry;
use crate::types::{LockId, NodeId, Owner};
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use tokio::sync::watch;

/// Registries and the executor that belong to whichever node is the root of a tree.
///
/// Every node carries one, but only the root's copy is consulted.
#[derive(Default)]
pub struct RootServices {
    pub(crate) provided: ProvidedViews,
    pub(crate) routes: RouteRegistry,
    pub(crate) authenticator: RwLock<Option<Arc<dyn Authenticator>>>,
    pub(crate) executor: OnceLock<Arc<ActionExecutor>>,
}

pub(crate) struct NodeInner {
    pub(crate) name: Option<String>,
    pub(crate) owner: Owner,
    pub(crate) path: Vec<AnyDestination>,
    pub(crate) sheet: Option<AnyDestination>,
    pub(crate) cover: Option<AnyDestination>,
    /// Child scope mounted for each occupied presentation slot
    pub(crate) presented: HashMap<PresentationSlot, NodeId>,
    pub(crate) locks: HashSet<LockId>,
    pub(crate) checkpoints: HashMap<String, CheckpointRecord>,
    pub(crate) parent: Weak<StateNode>,
    pub(crate) children: BTreeMap<NodeId, Arc<StateNode>>,
    pub(crate) change_counter: u64,
    pub(crate) configuration: NavigationConfiguration,
    pub(crate) hooks: Hooks,
    pub(crate) dismiss: Option<DismissCapability>,
    pub(crate) registered_destinations: HashSet<TypeId>,
}

/// One navigable scope in the navigation tree.
pub struct StateNode {
    id: NodeId,
    pub(crate) inner: RwLock<NodeInner>,
    services: RootServices,
    /// Bumped on every mutation of this node or any descendant
    subtree_revision: AtomicU64,
    revision: watch::Sender<u64>,
}

impl StateNode {
    /// Create the root node of a new navigation tree.
    pub fn root(configuration: NavigationConfiguration) -> Arc<Self> {
        let node = Self::build(Owner::Root, Some("root".to_string()), configuration);
        node.log(NavigationEvent::Lifecycle(LifecycleEvent::Configured));
        node
    }

    /// Create a detached scope; its configuration is replaced by the parent's on first attach.
    pub fn new(owner: Owner, name: Option<&str>) -> Arc<Self> {
        Self::build(
            owner,
            name.map(str::to_string),
            NavigationConfiguration::default(),
        )
    }

    fn build(
        owner: Owner,
        name: Option<String>,
        configuration: NavigationConfiguration,
    ) -> Arc<Self> {
        let (revision, _) = watch::channel(0);
        Arc::new(Self {
            id: NodeId::next(),
            inner: RwLock::new(NodeInner {
                name,
                owner,
                path: Vec::new(),
                sheet: None,
                cover: None,
                presented: HashMap::new(),
                locks: HashSet::new(),
                checkpoints: HashMap::new(),
                parent: Weak::new(),
                children: BTreeMap::new(),
                change_counter: 0,
                configuration,
                hooks: Hooks::default(),
                dismiss: None,
                registered_destinations: HashSet::new(),
            }),
            services: RootServices::default(),
            subtree_revision: AtomicU64::new(0),
            revision,
        })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> Option<String> {
        self.inner.read().name.clone()
    }

    pub fn set_name(&self, name: Option<&str>) {
        self.inner.write().name = name.map(str::to_string);
    }

    pub fn owner(&self) -> Owner {
        self.inner.read().owner
    }

    pub fn configuration(&self) -> NavigationConfiguration {
        self.inner.read().configuration.clone()
    }

    /// Replace this node's configuration. Existing children keep their snapshot.
    pub fn set_configuration(&self, configuration: NavigationConfiguration) {
        self.inner.write().configuration = configuration;
    }

    /// Change counter of this node.
    pub fn revision(&self) -> u64 {
        self.inner.read().change_counter
    }

    /// Monotonic mutation count of this node and all of its descendants.
    pub fn subtree_revision(&self) -> u64 {
        self.subtree_revision.load(Ordering::Acquire)
    }

    /// Watch this node's change counter.
    pub fn observe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    // MARK: tree structure

    pub fn parent(&self) -> Option<Arc<StateNode>> {
        self.inner.read().parent.upgrade()
    }

    /// Follow parent references to the top of the tree.
    pub fn root_node(self: &Arc<Self>) -> Arc<StateNode> {
        let mut current = Arc::clone(self);
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    pub fn children(&self) -> Vec<Arc<StateNode>> {
        self.inner.read().children.values().cloned().collect()
    }

    pub fn child(&self, id: NodeId) -> Option<Arc<StateNode>> {
        self.inner.read().children.get(&id).cloned()
    }

    /// True if `other` is this node or one of its ancestors.
    pub fn is_self_or_ancestor(self: &Arc<Self>, other: &StateNode) -> bool {
        let mut current = Some(Arc::clone(self));
        while let Some(node) = current {
            if node.id == other.id {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// Attach `child` below this node.
    ///
    /// Idempotent on identity: re-attaching only replaces the dismiss capability. A first
    /// attach copies configuration and inheritable hooks into the child. A child attached
    /// elsewhere is moved here.
    pub fn attach(
        self: &Arc<Self>,
        child: &Arc<StateNode>,
        dismiss: Option<DismissCapability>,
    ) -> Result<(), NavigationError> {
        if self.is_self_or_ancestor(child) {
            return Err(NavigationError::Cycle {
                parent: self.id,
                child: child.id,
            });
        }

        if self.inner.read().children.contains_key(&child.id) {
            child.inner.write().dismiss = dismiss;
            return Ok(());
        }

        if let Some(previous) = child.parent() {
            previous.detach(child);
        }

        let (configuration, hooks) = {
            let inner = self.inner.read();
            (inner.configuration.clone(), inner.hooks.inherited())
        };
        {
            let mut child_inner = child.inner.write();
            child_inner.configuration = configuration;
            child_inner.hooks = hooks;
            child_inner.parent = Arc::downgrade(self);
            child_inner.dismiss = dismiss;
        }
        {
            let mut inner = self.inner.write();
            inner.children.insert(child.id, Arc::clone(child));
        }
        self.touch();
        self.log(NavigationEvent::Lifecycle(LifecycleEvent::Attached(child.id)));
        Ok(())
    }

    /// Remove `child` from this node. Always clears the child's dismiss capability.
    pub fn detach(&self, child: &StateNode) {
        self.detach_id(child.id);
    }

    pub(crate) fn detach_id(&self, child_id: NodeId) {
        let removed = {
            let mut inner = self.inner.write();
            let vacated: Vec<PresentationSlot> = inner
                .presented
                .iter()
                .filter(|(_, id)| **id == child_id)
                .map(|(slot, _)| *slot)
                .collect();
            for slot in vacated {
                inner.presented.remove(&slot);
                *inner.slot_mut(slot) = None;
            }
            inner.children.remove(&child_id)
        };
        let Some(child) = removed else {
            return;
        };
        {
            let mut child_inner = child.inner.write();
            child_inner.dismiss = None;
            child_inner.parent = Weak::new();
        }
        self.touch();
        self.log(NavigationEvent::Lifecycle(LifecycleEvent::Detached(child_id)));
    }

    /// Depth-first search over this node and its descendants; first match wins.
    pub fn find_named(self: &Arc<Self>, name: &str) -> Option<Arc<StateNode>> {
        if self.inner.read().name.as_deref() == Some(name) {
            return Some(Arc::clone(self));
        }
        self.children()
            .into_iter()
            .find_map(|child| child.find_named(name))
    }

    /// This node and every descendant, parents before children.
    pub fn descendants(self: &Arc<Self>) -> Vec<Arc<StateNode>> {
        let mut out = vec![Arc::clone(self)];
        let mut index = 0;
        while index < out.len() {
            let children = out[index].children();
            out.extend(children);
            index += 1;
        }
        out
    }

    // MARK: path

    pub fn path(&self) -> Vec<AnyDestination> {
        self.inner.read().path.clone()
    }

    pub fn path_len(&self) -> usize {
        self.inner.read().path.len()
    }

    pub(crate) fn push(self: &Arc<Self>, destination: AnyDestination) {
        if !self.accepts(&destination) {
            self.log(NavigationEvent::Warning(format!(
                "{} is not a registered destination type",
                destination.type_name()
            )));
        }
        let description = format!("{:?}", destination);
        self.mutate_path(|path| {
            path.push(destination);
            true
        });
        self.log(NavigationEvent::Navigation(NavigationChange::Pushed(description)));
    }

    pub(crate) fn pop(&self) -> bool {
        self.pop_to_depth(|len| len.checked_sub(1))
    }

    pub(crate) fn pop_to(&self, index: usize) -> bool {
        self.pop_to_depth(|len| (index < len).then_some(index))
    }

    pub(crate) fn pop_all(&self) -> bool {
        self.pop_to_depth(|len| (len > 0).then_some(0))
    }

    fn pop_to_depth(&self, target: impl FnOnce(usize) -> Option<usize>) -> bool {
        let mut depth = 0;
        let changed = self.mutate_path(|path| match target(path.len()) {
            Some(new_len) => {
                path.truncate(new_len);
                depth = new_len;
                true
            }
            None => false,
        });
        if changed {
            self.log(NavigationEvent::Navigation(NavigationChange::Popped(depth)));
        }
        changed
    }

    /// Replace the whole path.
    pub(crate) fn set_path(&self, new_path: Vec<AnyDestination>) {
        self.mutate_path(|path| {
            *path = new_path;
            true
        });
    }

    /// Apply a path mutation; shortening prunes checkpoints deeper than the new length.
    fn mutate_path(&self, mutate: impl FnOnce(&mut Vec<AnyDestination>) -> bool) -> bool {
        let changed = {
            let mut inner = self.inner.write();
            let before = inner.path.len();
            let changed = mutate(&mut inner.path);
            let after = inner.path.len();
            if after < before {
                inner.checkpoints.retain(|_, record| record.depth <= after);
            }
            changed
        };
        if changed {
            self.touch();
        }
        changed
    }

    // MARK: destination registration

    pub fn register_destination<D: 'static>(&self) {
        self.inner
            .write()
            .registered_destinations
            .insert(TypeId::of::<D>());
    }

    /// Whether a destination may be pushed here without a registration warning.
    fn accepts(self: &Arc<Self>, destination: &AnyDestination) -> bool {
        if self.auto_destination_mode() {
            return true;
        }
        let type_id = destination.type_id();
        let mut current = Some(Arc::clone(self));
        while let Some(node) = current {
            if node.inner.read().registered_destinations.contains(&type_id) {
                return true;
            }
            current = node.parent();
        }
        false
    }

    // MARK: root services

    pub(crate) fn services(self: &Arc<Self>) -> RootServicesRef {
        RootServicesRef {
            root: self.root_node(),
        }
    }

    /// The executor owned by this node's root, created on first use.
    pub fn executor(self: &Arc<Self>) -> Arc<ActionExecutor> {
        let root = self.root_node();
        Arc::clone(
            root.services
                .executor
                .get_or_init(|| ActionExecutor::new(Arc::downgrade(&root))),
        )
    }

    // MARK: bookkeeping

    /// Bump this node's change counter and the subtree revision of it and its ancestors.
    pub(crate) fn touch(&self) {
        let counter = {
            let mut inner = self.inner.write();
            inner.change_counter += 1;
            inner.change_counter
        };
        self.revision.send_replace(counter);
        self.subtree_revision.fetch_add(1, Ordering::AcqRel);
        let mut ancestor = self.parent();
        while let Some(node) = ancestor {
            node.subtree_revision.fetch_add(1, Ordering::AcqRel);
            ancestor = node.parent();
        }
    }

    pub(crate) fn log(&self, event: NavigationEvent) {
        let (verbosity, name) = {
            let inner = self.inner.read();
            (inner.configuration.verbosity, inner.name.clone())
        };
        event.emit(verbosity, self.id, name.as_deref());
    }
}

/// Access to the root services of a node's current tree.
pub(crate) struct RootServicesRef {
    root: Arc<StateNode>,
}

impl std::ops::Deref for RootServicesRef {
    type Target = RootServices;

    fn deref(&self) -> &RootServices {
        &self.root.services
    }
}

impl std::fmt::Debug for StateNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("StateNode")
            .field("id", &self.id)
            .field("name", &inner.name)
            .field("owner", &inner.owner)
            .field("path", &inner.path.len())
            .field("children", &inner.children.len())
            .field("change_counter", &inner.change_counter)
            .finish()
    }
}

impl Drop for StateNode {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        NavigationEvent::Lifecycle(LifecycleEvent::Dropped).emit(
            inner.configuration.verbosity,
            self.id,
            inner.name.as_deref(),
        );
    }
}
