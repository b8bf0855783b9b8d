pub mod calendar;
pub mod config;
pub mod conflict;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod model;
pub mod persistence;
pub mod placement;
pub mod report;
pub mod seed;
pub mod snapshot;
pub mod store;

pub use calendar::{ClassFilter, Slot, WeekGrid, search_highlight, teacher_color};
pub use config::{AppConfig, StorageBackend};
pub use conflict::{Conflict, ConflictReason, find_conflict, find_conflict_at, has_conflict};
pub use model::{Attendee, ClassDraft, Group, ScheduledClass, Student, Teacher};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteSnapshotStore;
pub use persistence::{
    JsonFileStorage, MemoryStorage, PersistenceError, PersistenceResult, SnapshotStorage,
    backup_file_name, export_to_json, import_from_json, save_classes_to_csv,
};
pub use placement::{DropEvent, DropLocation, DropOutcome, IgnoredDrop, apply_drop};
pub use report::{StoreSummary, WeeklyReport, render_text_report};
pub use snapshot::{SNAPSHOT_VERSION, Snapshot};
pub use store::{DeleteOutcome, Fallback, ScheduleError, Scheduler};
