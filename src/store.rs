use crate::calendar::WeekGrid;
use crate::conflict::{Conflict, find_conflict_at};
use crate::model::{ClassDraft, Group, ScheduledClass, Student, Teacher};
use crate::persistence::{PersistenceResult, SnapshotStorage};
use crate::seed::seed_snapshot;
use crate::snapshot::{SNAPSHOT_VERSION, Snapshot};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("scheduling conflict: {0}")]
    Conflict(Conflict),
    #[error("scheduled class {0} not found")]
    NotFound(String),
    #[error("start time {0} is not on the hour")]
    MisalignedStart(DateTime<Utc>),
}

/// What to start from when storage holds no snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fallback {
    #[default]
    Seed,
    Empty,
}

/// Entities removed or changed by a delete, including cascades.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub teachers: usize,
    pub groups: usize,
    pub students: usize,
    pub scheduled_classes: usize,
    /// Groups whose member list lost an entry.
    pub memberships: usize,
}

impl DeleteOutcome {
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }

    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        if self.teachers > 0 {
            parts.push(format!("teachers={}", self.teachers));
        }
        if self.groups > 0 {
            parts.push(format!("groups={}", self.groups));
        }
        if self.students > 0 {
            parts.push(format!("students={}", self.students));
        }
        if self.scheduled_classes > 0 {
            parts.push(format!("classes={}", self.scheduled_classes));
        }
        if self.memberships > 0 {
            parts.push(format!("memberships={}", self.memberships));
        }
        if parts.is_empty() {
            "nothing removed".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Authoritative in-memory state of teachers, students, groups and classes.
///
/// Every successful mutation writes the full snapshot to the injected
/// storage. A failed write is logged and otherwise ignored; the in-memory
/// change stands.
pub struct Scheduler {
    teachers: Vec<Teacher>,
    groups: Vec<Group>,
    students: Vec<Student>,
    scheduled_classes: Vec<ScheduledClass>,
    grid: WeekGrid,
    storage: Box<dyn SnapshotStorage>,
}

impl Scheduler {
    /// Empty store; nothing is read from or written to storage until the
    /// first mutation.
    pub fn new(storage: Box<dyn SnapshotStorage>, grid: WeekGrid) -> Self {
        Self {
            teachers: Vec::new(),
            groups: Vec::new(),
            students: Vec::new(),
            scheduled_classes: Vec::new(),
            grid,
            storage,
        }
    }

    /// Loads the persisted snapshot, or starts from `fallback` when there is none.
    ///
    /// An unreadable snapshot is treated as absent.
    pub fn open(storage: Box<dyn SnapshotStorage>, grid: WeekGrid, fallback: Fallback) -> Self {
        let mut scheduler = Self::new(storage, grid);
        match scheduler.storage.load_snapshot() {
            Ok(Some(snapshot)) => {
                info!(
                    teachers = snapshot.teachers.len(),
                    groups = snapshot.groups.len(),
                    students = snapshot.students.len(),
                    classes = snapshot.scheduled_classes.len(),
                    "loaded persisted schedule"
                );
                scheduler.replace_all(snapshot);
                return scheduler;
            }
            Ok(None) => {}
            Err(err) => warn!(error = %err, "ignoring unreadable persisted schedule"),
        }

        if fallback == Fallback::Seed {
            let today = grid.local(Utc::now()).date_naive();
            scheduler.replace_all(seed_snapshot(&grid, today));
            info!("seeded schedule with starter data");
        }
        scheduler.persist();
        scheduler
    }

    pub fn grid(&self) -> &WeekGrid {
        &self.grid
    }

    pub fn teachers(&self) -> &[Teacher] {
        &self.teachers
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn scheduled_classes(&self) -> &[ScheduledClass] {
        &self.scheduled_classes
    }

    pub fn find_teacher(&self, id: &str) -> Option<&Teacher> {
        self.teachers.iter().find(|t| t.id == id)
    }

    pub fn find_group(&self, id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn find_student(&self, id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    pub fn find_class(&self, id: &str) -> Option<&ScheduledClass> {
        self.scheduled_classes.iter().find(|c| c.id == id)
    }

    pub fn storage_size_bytes(&self) -> PersistenceResult<u64> {
        self.storage.size_bytes()
    }

    /// Schedules a new class under a freshly generated id.
    ///
    /// Rejected without any state change when the teacher or group is
    /// already booked in that hour.
    pub fn add_scheduled_class(
        &mut self,
        draft: ClassDraft,
    ) -> Result<ScheduledClass, ScheduleError> {
        self.ensure_aligned(draft.start_time)?;
        let candidate = draft.into_class(Uuid::new_v4().to_string());
        if let Some(conflict) = self.conflict_for(&candidate) {
            return Err(ScheduleError::Conflict(conflict));
        }
        self.scheduled_classes.push(candidate.clone());
        self.persist();
        Ok(candidate)
    }

    /// Replaces the class with the same id, subject to the same conflict rule.
    pub fn update_scheduled_class(&mut self, updated: ScheduledClass) -> Result<(), ScheduleError> {
        self.ensure_aligned(updated.start_time)?;
        if let Some(conflict) = self.conflict_for(&updated) {
            return Err(ScheduleError::Conflict(conflict));
        }
        let slot = self
            .scheduled_classes
            .iter_mut()
            .find(|c| c.id == updated.id)
            .ok_or_else(|| ScheduleError::NotFound(updated.id.clone()))?;
        *slot = updated;
        self.persist();
        Ok(())
    }

    pub fn delete_scheduled_class(&mut self, id: &str) -> bool {
        let before = self.scheduled_classes.len();
        self.scheduled_classes.retain(|c| c.id != id);
        let removed = self.scheduled_classes.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    pub fn add_teacher(&mut self, teacher: Teacher) {
        self.teachers.push(teacher);
        self.persist();
    }

    pub fn update_teacher(&mut self, teacher: Teacher) -> bool {
        let replaced = replace_by_id(&mut self.teachers, teacher, |t| t.id.as_str());
        if replaced {
            self.persist();
        }
        replaced
    }

    /// Removes the teacher together with every group it owns and every
    /// class it teaches.
    pub fn delete_teacher(&mut self, id: &str) -> DeleteOutcome {
        let outcome = DeleteOutcome {
            teachers: remove_where(&mut self.teachers, |t| t.id == id),
            groups: remove_where(&mut self.groups, |g| g.teacher_id == id),
            scheduled_classes: remove_where(&mut self.scheduled_classes, |c| c.teacher_id == id),
            ..DeleteOutcome::default()
        };
        if !outcome.is_noop() {
            self.persist();
        }
        outcome
    }

    pub fn add_group(&mut self, group: Group) {
        self.groups.push(group);
        self.persist();
    }

    pub fn update_group(&mut self, group: Group) -> bool {
        let replaced = replace_by_id(&mut self.groups, group, |g| g.id.as_str());
        if replaced {
            self.persist();
        }
        replaced
    }

    /// Removes the group and every class held for it.
    pub fn delete_group(&mut self, id: &str) -> DeleteOutcome {
        let outcome = DeleteOutcome {
            groups: remove_where(&mut self.groups, |g| g.id == id),
            scheduled_classes: remove_where(&mut self.scheduled_classes, |c| {
                c.group_id() == Some(id)
            }),
            ..DeleteOutcome::default()
        };
        if !outcome.is_noop() {
            self.persist();
        }
        outcome
    }

    pub fn add_student(&mut self, student: Student) {
        self.students.push(student);
        self.persist();
    }

    pub fn update_student(&mut self, student: Student) -> bool {
        let replaced = replace_by_id(&mut self.students, student, |s| s.id.as_str());
        if replaced {
            self.persist();
        }
        replaced
    }

    /// Removes the student and strips it from every group.
    ///
    /// Individual classes booked for the student are left in place.
    pub fn delete_student(&mut self, id: &str) -> DeleteOutcome {
        let students = remove_where(&mut self.students, |s| s.id == id);
        let mut memberships = 0;
        for group in &mut self.groups {
            if remove_where(&mut group.student_ids, |sid| sid == id) > 0 {
                memberships += 1;
            }
        }
        let outcome = DeleteOutcome {
            students,
            memberships,
            ..DeleteOutcome::default()
        };
        if !outcome.is_noop() {
            self.persist();
        }
        outcome
    }

    /// Copy of the full state stamped with the current time.
    pub fn export_snapshot(&self) -> Snapshot {
        Snapshot {
            teachers: self.teachers.clone(),
            groups: self.groups.clone(),
            students: self.students.clone(),
            scheduled_classes: self.scheduled_classes.clone(),
            version: SNAPSHOT_VERSION.to_string(),
            last_modified: Utc::now(),
        }
    }

    /// Overwrites all four collections with the snapshot's.
    pub fn import_snapshot(&mut self, snapshot: Snapshot) {
        if snapshot.version != SNAPSHOT_VERSION {
            warn!(version = %snapshot.version, "importing snapshot with unexpected version");
        }
        info!(
            teachers = snapshot.teachers.len(),
            groups = snapshot.groups.len(),
            students = snapshot.students.len(),
            classes = snapshot.scheduled_classes.len(),
            "importing schedule"
        );
        self.replace_all(snapshot);
        self.persist();
    }

    /// Validates untyped snapshot data and imports it. Nothing changes on error.
    pub fn import_value(&mut self, data: serde_json::Value) -> PersistenceResult<()> {
        let snapshot = Snapshot::from_value(data)?;
        self.import_snapshot(snapshot);
        Ok(())
    }

    /// Empties every collection and erases persisted storage.
    ///
    /// Returns whether the storage was erased.
    pub fn clear_all(&mut self) -> bool {
        self.teachers.clear();
        self.groups.clear();
        self.students.clear();
        self.scheduled_classes.clear();
        info!("cleared all schedule data");
        match self.storage.clear() {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "failed to clear persisted schedule");
                false
            }
        }
    }

    /// Writes the current state to storage. Failures are logged, not raised.
    pub fn persist(&self) -> bool {
        match self.storage.save_snapshot(&self.export_snapshot()) {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "failed to persist schedule");
                false
            }
        }
    }

    fn replace_all(&mut self, snapshot: Snapshot) {
        self.teachers = snapshot.teachers;
        self.groups = snapshot.groups;
        self.students = snapshot.students;
        self.scheduled_classes = snapshot.scheduled_classes;
    }

    fn conflict_for(&self, candidate: &ScheduledClass) -> Option<Conflict> {
        find_conflict_at(self.grid.offset(), candidate, &self.scheduled_classes)
    }

    fn ensure_aligned(&self, start: DateTime<Utc>) -> Result<(), ScheduleError> {
        if self.grid.is_aligned(start) {
            Ok(())
        } else {
            Err(ScheduleError::MisalignedStart(start))
        }
    }
}

fn replace_by_id<T>(items: &mut [T], item: T, id: impl Fn(&T) -> &str) -> bool {
    let Some(index) = items.iter().position(|existing| id(existing) == id(&item)) else {
        return false;
    };
    items[index] = item;
    true
}

fn remove_where<T>(items: &mut Vec<T>, predicate: impl Fn(&T) -> bool) -> usize {
    let before = items.len();
    items.retain(|item| !predicate(item));
    before - items.len()
}
