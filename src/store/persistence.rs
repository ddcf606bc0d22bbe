//! Sled-backed restoration store.

use crate::error::StorageError;
use crate::store::{RestorationRecord, RestorationStore};
use std::path::Path;

const TREE_SCOPES: &str = "navigation_scopes";

#[derive(Clone)]
pub struct SledRestorationStore {
    db: sled::Db,
    scopes: sled::Tree,
}

impl SledRestorationStore {
    /// Open (or create) a store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path).map_err(to_storage_io)?;
        Self::new(db)
    }

    pub fn new(db: sled::Db) -> Result<Self, StorageError> {
        let scopes = db.open_tree(TREE_SCOPES).map_err(to_storage_io)?;
        Ok(Self { db, scopes })
    }

    pub fn db(&self) -> &sled::Db {
        &self.db
    }

    /// Keys of every saved scope, in key order.
    pub fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut out = Vec::new();
        for result in self.scopes.iter() {
            let (key, _) = result.map_err(to_storage_io)?;
            out.push(String::from_utf8_lossy(&key).into_owned());
        }
        Ok(out)
    }

    /// Remove every record saved under `restoration_key`.
    pub fn clear(&self, restoration_key: &str) -> Result<usize, StorageError> {
        let prefix = format!("{}/", restoration_key);
        let mut removed = 0usize;
        for result in self.scopes.scan_prefix(prefix.as_bytes()) {
            let (key, _) = result.map_err(to_storage_io)?;
            self.scopes.remove(key).map_err(to_storage_io)?;
            removed += 1;
        }
        Ok(removed)
    }

    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush().map_err(to_storage_io)?;
        Ok(())
    }
}

impl RestorationStore for SledRestorationStore {
    fn get(&self, key: &str) -> Result<Option<RestorationRecord>, StorageError> {
        let Some(raw) = self.scopes.get(key.as_bytes()).map_err(to_storage_io)? else {
            return Ok(None);
        };
        let record = serde_json::from_slice(&raw).map_err(to_storage_data)?;
        Ok(Some(record))
    }

    fn put(&self, key: &str, record: &RestorationRecord) -> Result<(), StorageError> {
        let value = serde_json::to_vec(record).map_err(to_storage_data)?;
        self.scopes
            .insert(key.as_bytes(), value)
            .map_err(to_storage_io)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.scopes.remove(key.as_bytes()).map_err(to_storage_io)?;
        Ok(())
    }
}

fn to_storage_io(err: sled::Error) -> StorageError {
    StorageError::IoError(std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("Restoration store error: {}", err),
    ))
}

fn to_storage_data(err: serde_json::Error) -> StorageError {
    StorageError::Serialization(err.to_string())
}
