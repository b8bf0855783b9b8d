use super::{PersistenceResult, SnapshotStorage};
use crate::calendar::WeekGrid;
use crate::snapshot::Snapshot;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const BACKUP_FILE_PREFIX: &str = "teachcalc";

/// Snapshot stored as a single JSON document at `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new<P: AsRef<Path>>(dir: P, key: &str) -> PersistenceResult<Self> {
        fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            path: dir.as_ref().join(format!("{key}.json")),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStorage for JsonFileStorage {
    fn save_snapshot(&self, snapshot: &Snapshot) -> PersistenceResult<()> {
        let text = snapshot.to_json()?;
        // Write beside the target and rename so a failed write leaves the old file intact.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn load_snapshot(&self) -> PersistenceResult<Option<Snapshot>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Snapshot::from_json(&text).map(Some),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn clear(&self) -> PersistenceResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn size_bytes(&self) -> PersistenceResult<u64> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(0),
            Err(err) => Err(err.into()),
        }
    }
}

pub fn backup_file_name(date: NaiveDate) -> String {
    format!("{BACKUP_FILE_PREFIX}-backup-{}.json", date.format("%Y-%m-%d"))
}

/// Writes `snapshot` as pretty JSON into `dir` under the dated backup name.
pub fn export_to_json<P: AsRef<Path>>(snapshot: &Snapshot, dir: P) -> PersistenceResult<PathBuf> {
    let path = dir
        .as_ref()
        .join(backup_file_name(snapshot.last_modified.date_naive()));
    let file = File::create(&path)?;
    serde_json::to_writer_pretty(file, snapshot)?;
    Ok(path)
}

pub fn import_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Snapshot> {
    let text = fs::read_to_string(path)?;
    Snapshot::from_json(&text)
}

#[derive(Serialize)]
struct ClassCsvRecord<'a> {
    id: &'a str,
    day: &'static str,
    start: String,
    end: String,
    teacher: &'a str,
    group: &'a str,
    student: &'a str,
}

/// Writes one row per scheduled class with names resolved, ordered by start.
pub fn save_classes_to_csv<P: AsRef<Path>>(
    snapshot: &Snapshot,
    grid: &WeekGrid,
    path: P,
) -> PersistenceResult<()> {
    let teachers: HashMap<&str, &str> = snapshot
        .teachers
        .iter()
        .map(|t| (t.id.as_str(), t.name.as_str()))
        .collect();
    let groups: HashMap<&str, &str> = snapshot
        .groups
        .iter()
        .map(|g| (g.id.as_str(), g.name.as_str()))
        .collect();
    let students: HashMap<&str, &str> = snapshot
        .students
        .iter()
        .map(|s| (s.id.as_str(), s.name.as_str()))
        .collect();

    let mut classes: Vec<_> = snapshot.scheduled_classes.iter().collect();
    classes.sort_by_key(|class| class.start_time);

    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for class in classes {
        let start = grid.local(class.start_time);
        let end = grid.local(class.end_time());
        writer.serialize(ClassCsvRecord {
            id: &class.id,
            day: WeekGrid::day_name(grid.slot_of(class.start_time).weekday),
            start: start.format("%Y-%m-%d %H:%M").to_string(),
            end: end.format("%Y-%m-%d %H:%M").to_string(),
            teacher: teachers.get(class.teacher_id.as_str()).copied().unwrap_or(""),
            group: class
                .group_id()
                .and_then(|id| groups.get(id).copied())
                .unwrap_or(""),
            student: class
                .student_id()
                .and_then(|id| students.get(id).copied())
                .unwrap_or(""),
        })?;
    }
    writer.flush()?;
    Ok(())
}
