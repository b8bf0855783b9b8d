use super::{PersistenceResult, SnapshotStorage};
use crate::snapshot::Snapshot;
use rusqlite::{Connection, OptionalExtension, params};
use std::sync::{Mutex, MutexGuard};

/// Snapshot stored as a JSON blob in a key/value table.
pub struct SqliteSnapshotStore {
    connection: Mutex<Connection>,
    key: String,
}

impl SqliteSnapshotStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P, key: &str) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
            key: key.to_string(),
        })
    }

    pub fn in_memory(key: &str) -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
            key: key.to_string(),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS snapshots (
                storage_key TEXT PRIMARY KEY,
                snapshot_json TEXT NOT NULL,
                last_modified TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.connection
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SnapshotStorage for SqliteSnapshotStore {
    fn save_snapshot(&self, snapshot: &Snapshot) -> PersistenceResult<()> {
        let json = snapshot.to_json()?;
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO snapshots (storage_key, snapshot_json, last_modified)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(storage_key) DO UPDATE SET
                snapshot_json = excluded.snapshot_json,
                last_modified = excluded.last_modified",
            params![self.key, json, snapshot.last_modified.to_rfc3339()],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn load_snapshot(&self) -> PersistenceResult<Option<Snapshot>> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT snapshot_json FROM snapshots WHERE storage_key = ?1")?;
        let json: Option<String> = stmt
            .query_row(params![self.key], |row| row.get(0))
            .optional()?;
        match json {
            Some(json) => Snapshot::from_json(&json).map(Some),
            None => Ok(None),
        }
    }

    fn clear(&self) -> PersistenceResult<()> {
        let conn = self.lock();
        conn.execute(
            "DELETE FROM snapshots WHERE storage_key = ?1",
            params![self.key],
        )?;
        Ok(())
    }

    fn size_bytes(&self) -> PersistenceResult<u64> {
        let conn = self.lock();
        let mut stmt =
            conn.prepare("SELECT length(snapshot_json) FROM snapshots WHERE storage_key = ?1")?;
        let len: Option<i64> = stmt
            .query_row(params![self.key], |row| row.get(0))
            .optional()?;
        Ok(len.map(|len| len.max(0) as u64).unwrap_or(0))
    }
}
