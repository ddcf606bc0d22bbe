//! Restoration Store
//!
//! Keeps the path and checkpoints of named scopes across launches. Nothing is read or written
//! unless the root's configuration carries a restoration key; records are keyed by
//! `"{restoration_key}/{scope_name}"` so bumping the key invalidates old state.

pub mod persistence;

pub use persistence::SledRestorationStore;

use crate::checkpoint::CheckpointRecord;
use crate::destination::{AnyDestination, Destination, NavigationMethod};
use crate::error::{NavigationError, StorageError};
use crate::events::NavigationEvent;
use crate::state::StateNode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::any::TypeId;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// One serialized path entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedDestination {
    pub tag: String,
    pub method: NavigationMethod,
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedCheckpoint {
    pub name: String,
    pub depth: usize,
}

/// Saved state of one named scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestorationRecord {
    pub scope: String,
    pub path: Vec<PersistedDestination>,
    pub checkpoints: Vec<PersistedCheckpoint>,
    pub saved_at_ms: u64,
}

/// Restoration store interface
pub trait RestorationStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<RestorationRecord>, StorageError>;
    fn put(&self, key: &str, record: &RestorationRecord) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

pub fn record_key(restoration_key: &str, scope: &str) -> String {
    format!("{}/{}", restoration_key, scope)
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

type Encoder =
    Arc<dyn Fn(&AnyDestination) -> Option<Result<serde_json::Value, serde_json::Error>> + Send + Sync>;
type Decoder = Arc<dyn Fn(serde_json::Value) -> Result<AnyDestination, serde_json::Error> + Send + Sync>;

/// Maps serializable destination types to stable tags.
#[derive(Default)]
pub struct DestinationCodec {
    encoders: HashMap<TypeId, (String, Encoder)>,
    decoders: HashMap<String, Decoder>,
}

impl DestinationCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<D>(&mut self, tag: &str)
    where
        D: Destination + Hash + Serialize + DeserializeOwned,
    {
        let encoder: Encoder = Arc::new(|destination: &AnyDestination| {
            destination.downcast_ref::<D>().map(serde_json::to_value)
        });
        let decoder: Decoder = Arc::new(|payload: serde_json::Value| {
            serde_json::from_value::<D>(payload).map(AnyDestination::new)
        });
        self.encoders
            .insert(TypeId::of::<D>(), (tag.to_string(), encoder));
        self.decoders.insert(tag.to_string(), decoder);
    }

    pub fn encode(&self, destination: &AnyDestination) -> Result<PersistedDestination, StorageError> {
        let (tag, encoder) = self
            .encoders
            .get(&destination.type_id())
            .ok_or_else(|| StorageError::UnknownDestinationType(destination.type_name().to_string()))?;
        let payload = encoder(destination)
            .ok_or_else(|| StorageError::UnknownDestinationType(destination.type_name().to_string()))?
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(PersistedDestination {
            tag: tag.clone(),
            method: destination.method(),
            payload,
        })
    }

    pub fn decode(&self, entry: &PersistedDestination) -> Result<AnyDestination, StorageError> {
        let decoder = self
            .decoders
            .get(&entry.tag)
            .ok_or_else(|| StorageError::UnknownDestinationType(entry.tag.clone()))?;
        let destination =
            decoder(entry.payload.clone()).map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(destination.with_method(entry.method))
    }
}

/// Write every named scope of `root`'s tree. Scopes holding unregistered destination types
/// are skipped with a warning.
pub fn save_tree(
    root: &Arc<StateNode>,
    store: &dyn RestorationStore,
    codec: &DestinationCodec,
) -> Result<usize, NavigationError> {
    let Some(key) = root.configuration().restoration_key else {
        return Ok(0);
    };

    let mut saved = 0;
    for node in root.descendants() {
        let Some(scope) = node.name() else {
            continue;
        };
        let path = match node
            .path()
            .iter()
            .map(|destination| codec.encode(destination))
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(path) => path,
            Err(e) => {
                node.log(NavigationEvent::Warning(format!(
                    "not saving scope '{}': {}",
                    scope, e
                )));
                continue;
            }
        };
        let checkpoints = node
            .checkpoints()
            .into_iter()
            .map(|record| PersistedCheckpoint {
                name: record.name,
                depth: record.depth,
            })
            .collect();

        let record = RestorationRecord {
            scope: scope.clone(),
            path,
            checkpoints,
            saved_at_ms: now_millis(),
        };
        store.put(&record_key(&key, &scope), &record)?;
        saved += 1;
    }

    debug!(restoration_key = %key, scopes = saved, "Saved navigation state");
    Ok(saved)
}

/// Load saved paths and checkpoints into every named scope of `root`'s tree.
///
/// Checkpoints already established on a scope are kept; restored ones carry no handler.
/// A record that cannot be decoded leaves its scope untouched.
pub fn restore_tree(
    root: &Arc<StateNode>,
    store: &dyn RestorationStore,
    codec: &DestinationCodec,
) -> Result<usize, NavigationError> {
    let Some(key) = root.configuration().restoration_key else {
        return Ok(0);
    };

    let mut restored = 0;
    for node in root.descendants() {
        let Some(scope) = node.name() else {
            continue;
        };
        let Some(record) = store.get(&record_key(&key, &scope))? else {
            continue;
        };
        let path = match record
            .path
            .iter()
            .map(|entry| codec.decode(entry))
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(path) => path,
            Err(e) => {
                node.log(NavigationEvent::Warning(format!(
                    "not restoring scope '{}': {}",
                    scope, e
                )));
                continue;
            }
        };

        let depth = path.len();
        node.set_path(path);
        let existing: Vec<String> = node.checkpoints().into_iter().map(|r| r.name).collect();
        for checkpoint in record.checkpoints {
            if checkpoint.depth <= depth && !existing.contains(&checkpoint.name) {
                node.insert_checkpoint(CheckpointRecord::new(checkpoint.name, checkpoint.depth));
            }
        }
        restored += 1;
    }

    debug!(restoration_key = %key, scopes = restored, "Restored navigation state");
    Ok(restored)
}
