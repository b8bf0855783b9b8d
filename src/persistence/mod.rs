use crate::snapshot::Snapshot;
use serde_json::Error as SerdeJsonError;
use std::io;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] SerdeJsonError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Durable home of the store's snapshot, keyed by a fixed storage key.
///
/// Writes replace the whole snapshot; there is no partial update.
pub trait SnapshotStorage: Send + Sync {
    fn save_snapshot(&self, snapshot: &Snapshot) -> PersistenceResult<()>;
    fn load_snapshot(&self) -> PersistenceResult<Option<Snapshot>>;
    fn clear(&self) -> PersistenceResult<()>;
    /// Size of the persisted representation in bytes, 0 when nothing is stored.
    fn size_bytes(&self) -> PersistenceResult<u64>;
}

/// Keeps the serialised snapshot in memory, the way a browser keeps a
/// local storage entry.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entry: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self) -> Option<String> {
        self.lock().clone()
    }

    pub fn set_raw(&self, text: impl Into<String>) {
        *self.lock() = Some(text.into());
    }

    fn lock(&self) -> MutexGuard<'_, Option<String>> {
        self.entry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SnapshotStorage for MemoryStorage {
    fn save_snapshot(&self, snapshot: &Snapshot) -> PersistenceResult<()> {
        let text = snapshot.to_json()?;
        *self.lock() = Some(text);
        Ok(())
    }

    fn load_snapshot(&self) -> PersistenceResult<Option<Snapshot>> {
        match self.lock().as_deref() {
            Some(text) => Snapshot::from_json(text).map(Some),
            None => Ok(None),
        }
    }

    fn clear(&self) -> PersistenceResult<()> {
        *self.lock() = None;
        Ok(())
    }

    fn size_bytes(&self) -> PersistenceResult<u64> {
        Ok(self.lock().as_ref().map(|text| text.len() as u64).unwrap_or(0))
    }
}

impl<S: SnapshotStorage + ?Sized> SnapshotStorage for std::sync::Arc<S> {
    fn save_snapshot(&self, snapshot: &Snapshot) -> PersistenceResult<()> {
        (**self).save_snapshot(snapshot)
    }

    fn load_snapshot(&self) -> PersistenceResult<Option<Snapshot>> {
        (**self).load_snapshot()
    }

    fn clear(&self) -> PersistenceResult<()> {
        (**self).clear()
    }

    fn size_bytes(&self) -> PersistenceResult<u64> {
        (**self).size_bytes()
    }
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    JsonFileStorage, backup_file_name, export_to_json, import_from_json, save_classes_to_csv,
};
