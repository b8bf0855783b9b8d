use crate::calendar::WeekGrid;
use crate::persistence::{JsonFileStorage, PersistenceError, PersistenceResult, SnapshotStorage};
use crate::store::{Fallback, Scheduler};
use clap::{Args, ValueEnum};
use std::path::PathBuf;

pub const DEFAULT_STORAGE_KEY: &str = "teachcalc_data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackend {
    Json,
    Sqlite,
}

/// Settings shared by the console and HTTP front ends.
#[derive(Debug, Clone, Args)]
pub struct AppConfig {
    /// Directory holding the persisted schedule
    #[arg(long, env = "CLASS_SCHEDULER_DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,

    /// Storage backend for the persisted schedule
    #[arg(long, env = "CLASS_SCHEDULER_STORAGE", value_enum, default_value_t = StorageBackend::Json)]
    pub storage: StorageBackend,

    /// Key the schedule is stored under
    #[arg(long, env = "CLASS_SCHEDULER_STORAGE_KEY", default_value = DEFAULT_STORAGE_KEY)]
    pub storage_key: String,

    /// Offset of the weekly grid from UTC, in minutes
    #[arg(
        long,
        env = "CLASS_SCHEDULER_UTC_OFFSET",
        default_value_t = 0,
        allow_hyphen_values = true
    )]
    pub utc_offset_minutes: i32,

    /// Start empty instead of with starter data when nothing is persisted
    #[arg(long)]
    pub no_seed: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            storage: StorageBackend::Json,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            utc_offset_minutes: 0,
            no_seed: false,
        }
    }
}

impl AppConfig {
    pub fn grid(&self) -> PersistenceResult<WeekGrid> {
        WeekGrid::with_utc_offset_minutes(self.utc_offset_minutes).ok_or_else(|| {
            PersistenceError::InvalidData(format!(
                "utc offset of {} minutes is out of range",
                self.utc_offset_minutes
            ))
        })
    }

    pub fn open_storage(&self) -> PersistenceResult<Box<dyn SnapshotStorage>> {
        match self.storage {
            StorageBackend::Json => Ok(Box::new(JsonFileStorage::new(
                &self.data_dir,
                &self.storage_key,
            )?)),
            #[cfg(feature = "sqlite")]
            StorageBackend::Sqlite => {
                std::fs::create_dir_all(&self.data_dir)?;
                let path = self.data_dir.join(format!("{}.sqlite3", self.storage_key));
                Ok(Box::new(crate::persistence::sqlite::SqliteSnapshotStore::new(
                    path,
                    &self.storage_key,
                )?))
            }
            #[cfg(not(feature = "sqlite"))]
            StorageBackend::Sqlite => Err(PersistenceError::InvalidData(
                "sqlite storage requires the `sqlite` feature".to_string(),
            )),
        }
    }

    pub fn fallback(&self) -> Fallback {
        if self.no_seed {
            Fallback::Empty
        } else {
            Fallback::Seed
        }
    }

    /// Builds the store described by this configuration.
    pub fn open_scheduler(&self) -> PersistenceResult<Scheduler> {
        let grid = self.grid()?;
        let storage = self.open_storage()?;
        Ok(Scheduler::open(storage, grid, self.fallback()))
    }
}
