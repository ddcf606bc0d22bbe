//! Named return points.
//!
//! A checkpoint remembers a node's path depth under a name. Returning to it dismisses
//! whatever the owning node presented since, truncates the owner's path back to that depth
//! and hands an optional typed value to the checkpoint's handler. Lookup walks from the
//! caller outward through its ancestors; descendants are never searched, so the nearest
//! record of a given name wins.

use crate::error::NavigationError;
use crate::events::{CheckpointEvent, NavigationEvent};
use crate::state::StateNode;
use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Invoked after a successful return, with the value supplied by the caller.
pub type CheckpointHandler = Arc<dyn Fn(Option<&CheckpointValue>) + Send + Sync>;

/// Type-erased value carried back to a checkpoint.
#[derive(Clone)]
pub struct CheckpointValue {
    value: Arc<dyn Any + Send + Sync>,
    payload: PayloadType,
}

impl CheckpointValue {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            payload: PayloadType::of::<T>(),
        }
    }

    pub fn payload_type(&self) -> PayloadType {
        self.payload
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }
}

impl fmt::Debug for CheckpointValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CheckpointValue<{}>", self.payload.name)
    }
}

/// Declared payload type of a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadType {
    id: TypeId,
    name: &'static str,
}

impl PayloadType {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

#[derive(Clone)]
pub struct CheckpointRecord {
    pub name: String,
    /// Path length of the owning node when the checkpoint was established
    pub depth: usize,
    pub payload: Option<PayloadType>,
    pub(crate) handler: Option<CheckpointHandler>,
}

impl CheckpointRecord {
    pub fn new(name: impl Into<String>, depth: usize) -> Self {
        Self {
            name: name.into(),
            depth,
            payload: None,
            handler: None,
        }
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    fn accepts(&self, value: &CheckpointValue) -> Result<(), NavigationError> {
        match self.payload {
            Some(expected) if expected != value.payload => {
                Err(NavigationError::CheckpointTypeMismatch {
                    name: self.name.clone(),
                    expected: expected.name,
                    actual: value.payload.name,
                })
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for CheckpointRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckpointRecord")
            .field("name", &self.name)
            .field("depth", &self.depth)
            .field("payload", &self.payload.map(|p| p.name))
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

/// Typed checkpoint key. `T` is the value type its handler receives.
pub struct Checkpoint<T = ()> {
    name: String,
    _payload: PhantomData<fn(T)>,
}

impl<T> Checkpoint<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            _payload: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T> Clone for Checkpoint<T> {
    fn clone(&self) -> Self {
        Self::new(self.name.clone())
    }
}

impl<T> fmt::Debug for Checkpoint<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Checkpoint({})", self.name)
    }
}

fn typed_handler<T, F>(handler: F) -> CheckpointHandler
where
    T: Any + Send + Sync + Clone,
    F: Fn(T) + Send + Sync + 'static,
{
    Arc::new(move |value: Option<&CheckpointValue>| {
        if let Some(value) = value.and_then(|v| v.downcast_ref::<T>()) {
            handler(value.clone());
        } else if let Some(unit) = (&() as &dyn Any).downcast_ref::<T>() {
            handler(unit.clone());
        }
    })
}

impl StateNode {
    /// Register `checkpoint` at the current path depth, without a handler.
    pub fn establish_checkpoint<T: Any + Send + Sync>(&self, checkpoint: &Checkpoint<T>) {
        let mut record = CheckpointRecord::new(checkpoint.name(), self.path_len());
        record.payload = Some(PayloadType::of::<T>());
        self.insert_checkpoint(record);
    }

    /// Register `checkpoint` at the current path depth with a handler receiving returned values.
    pub fn establish_checkpoint_with<T, F>(&self, checkpoint: &Checkpoint<T>, handler: F)
    where
        T: Any + Send + Sync + Clone,
        F: Fn(T) + Send + Sync + 'static,
    {
        let mut record = CheckpointRecord::new(checkpoint.name(), self.path_len());
        record.payload = Some(PayloadType::of::<T>());
        record.handler = Some(typed_handler(handler));
        self.insert_checkpoint(record);
    }

    /// Register a record as is, replacing any same-named record on this node.
    pub fn insert_checkpoint(&self, record: CheckpointRecord) {
        let event = CheckpointEvent::Established {
            name: record.name.clone(),
            depth: record.depth,
        };
        self.inner
            .write()
            .checkpoints
            .insert(record.name.clone(), record);
        self.log(NavigationEvent::Checkpoint(event));
    }

    pub fn checkpoints(&self) -> Vec<CheckpointRecord> {
        let mut records: Vec<CheckpointRecord> =
            self.inner.read().checkpoints.values().cloned().collect();
        records.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.name.cmp(&b.name)));
        records
    }

    /// Drop every checkpoint recorded deeper than `depth`.
    pub fn prune_checkpoints(&self, depth: usize) {
        self.inner
            .write()
            .checkpoints
            .retain(|_, record| record.depth <= depth);
    }

    /// Nearest node among self and ancestors holding a checkpoint named `name`.
    pub fn find_checkpoint(
        self: &Arc<Self>,
        name: &str,
    ) -> Option<(Arc<StateNode>, CheckpointRecord)> {
        let mut current = Some(Arc::clone(self));
        while let Some(node) = current {
            let record = node.inner.read().checkpoints.get(name).cloned();
            if let Some(record) = record {
                return Some((node, record));
            }
            current = node.parent();
        }
        None
    }

    pub fn can_return_to_checkpoint(self: &Arc<Self>, name: &str) -> bool {
        self.find_checkpoint(name).is_some()
    }

    /// Check a value against the nearest checkpoint's declared payload type.
    ///
    /// An unknown checkpoint passes; it is reported when the return executes.
    pub fn check_checkpoint_value(
        self: &Arc<Self>,
        name: &str,
        value: &CheckpointValue,
    ) -> Result<(), NavigationError> {
        match self.find_checkpoint(name) {
            Some((_, record)) => record.accepts(value),
            None => Ok(()),
        }
    }

    /// Unwind to the nearest checkpoint named `name`.
    ///
    /// Every presented scope between this node and the owning node, plus the owner's own
    /// presentations, is dismissed (failing before any change if one is locked) and the owner's
    /// path is truncated to the recorded depth before the handler runs. Returns whether the
    /// tree changed; an unknown name is a logged no-op.
    pub(crate) fn return_to_checkpoint(
        self: &Arc<Self>,
        name: &str,
        value: Option<CheckpointValue>,
    ) -> Result<bool, NavigationError> {
        let Some((owner, record)) = self.find_checkpoint(name) else {
            self.log(NavigationEvent::Checkpoint(CheckpointEvent::Unknown(
                name.to_string(),
            )));
            return Ok(false);
        };
        if let Some(value) = &value {
            record.accepts(value)?;
        }

        let presented = self.presented_until(&owner);
        StateNode::ensure_unlocked(presented.iter())?;

        let owner_root = owner.root_node();
        let mut changed = false;
        for node in &presented {
            // inner scopes leave the tree with their outer presentation
            if node.root_node().id() == owner_root.id() {
                changed |= node.dismiss_self();
            }
        }
        changed |= owner.pop_to(record.depth);

        owner.log(NavigationEvent::Checkpoint(CheckpointEvent::Returned {
            name: record.name.clone(),
            depth: record.depth,
        }));

        match (&record.handler, &value) {
            (Some(handler), value) => handler(value.as_ref()),
            (None, Some(_)) => owner.log(NavigationEvent::Warning(format!(
                "checkpoint '{}' has no handler, value dropped",
                record.name
            ))),
            (None, None) => {}
        }
        Ok(changed)
    }

    /// Presented scopes torn down by unwinding to `owner`, outermost first: the owner's presented
    /// children, then each presented node on the chain from this node up to the owner.
    fn presented_until(self: &Arc<Self>, owner: &Arc<StateNode>) -> Vec<Arc<StateNode>> {
        let mut chain = Vec::new();
        let mut current = Some(Arc::clone(self));
        while let Some(node) = current {
            if node.id() == owner.id() {
                break;
            }
            if node.is_presented() {
                chain.push(Arc::clone(&node));
            }
            current = node.parent();
        }

        let mut presented = owner.presented_children();
        for node in chain.into_iter().rev() {
            if presented.iter().all(|p| p.id() != node.id()) {
                presented.push(node);
            }
        }
        presented
    }
}
