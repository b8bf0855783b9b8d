use crate::model::{Group, ScheduledClass, Student, Teacher};
use crate::persistence::{PersistenceError, PersistenceResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SNAPSHOT_VERSION: &str = "1.0";

/// Full serialisable state of the store plus format metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawSnapshot")]
pub struct Snapshot {
    pub teachers: Vec<Teacher>,
    pub groups: Vec<Group>,
    pub students: Vec<Student>,
    pub scheduled_classes: Vec<ScheduledClass>,
    pub version: String,
    pub last_modified: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(
        teachers: Vec<Teacher>,
        groups: Vec<Group>,
        students: Vec<Student>,
        scheduled_classes: Vec<ScheduledClass>,
    ) -> Self {
        Self {
            teachers,
            groups,
            students,
            scheduled_classes,
            version: SNAPSHOT_VERSION.to_string(),
            last_modified: Utc::now(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new(), Vec::new(), Vec::new())
    }

    pub fn to_json(&self) -> PersistenceResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> PersistenceResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses and validates snapshot text.
    ///
    /// Missing collections are reported as `InvalidData`; malformed JSON as
    /// `Serialization`.
    pub fn from_json(text: &str) -> PersistenceResult<Self> {
        let raw: RawSnapshot = serde_json::from_str(text)?;
        Snapshot::try_from(raw).map_err(PersistenceError::InvalidData)
    }

    pub fn from_value(value: serde_json::Value) -> PersistenceResult<Self> {
        let raw: RawSnapshot = serde_json::from_value(value)?;
        Snapshot::try_from(raw).map_err(PersistenceError::InvalidData)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSnapshot {
    #[serde(default)]
    teachers: Option<Vec<Teacher>>,
    #[serde(default)]
    groups: Option<Vec<Group>>,
    #[serde(default)]
    students: Option<Vec<Student>>,
    #[serde(default)]
    scheduled_classes: Option<Vec<ScheduledClass>>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    last_modified: Option<DateTime<Utc>>,
}

impl TryFrom<RawSnapshot> for Snapshot {
    type Error = String;

    fn try_from(raw: RawSnapshot) -> Result<Self, Self::Error> {
        let mut missing = Vec::new();
        if raw.teachers.is_none() {
            missing.push("teachers");
        }
        if raw.groups.is_none() {
            missing.push("groups");
        }
        if raw.students.is_none() {
            missing.push("students");
        }
        if raw.scheduled_classes.is_none() {
            missing.push("scheduledClasses");
        }
        if !missing.is_empty() {
            return Err(format!(
                "invalid data format: missing required fields: {}",
                missing.join(", ")
            ));
        }

        Ok(Self {
            teachers: raw.teachers.unwrap_or_default(),
            groups: raw.groups.unwrap_or_default(),
            students: raw.students.unwrap_or_default(),
            scheduled_classes: raw.scheduled_classes.unwrap_or_default(),
            version: raw.version.unwrap_or_else(|| SNAPSHOT_VERSION.to_string()),
            last_modified: raw.last_modified.unwrap_or_else(Utc::now),
        })
    }
}
