use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Length of every scheduled class.
pub const CLASS_LENGTH_HOURS: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: String,
    pub name: String,
}

impl Teacher {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    /// Link to the student's profile in an external CRM.
    #[serde(default)]
    pub crm_profile_link: String,
}

impl Student {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            crm_profile_link: String::new(),
        }
    }

    pub fn with_profile_link(mut self, link: impl Into<String>) -> Self {
        self.crm_profile_link = link.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    pub teacher_id: String,
    #[serde(default)]
    pub student_ids: Vec<String>,
}

impl Group {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        teacher_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            teacher_id: teacher_id.into(),
            student_ids: Vec::new(),
        }
    }

    pub fn with_students<I, S>(mut self, student_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.student_ids = student_ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_student(&self, student_id: &str) -> bool {
        self.student_ids.iter().any(|id| id == student_id)
    }
}

/// Who a class is held for: a whole group or a single student, never both.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum Attendee {
    Group(String),
    Student(String),
}

impl Attendee {
    pub fn group_id(&self) -> Option<&str> {
        match self {
            Attendee::Group(id) => Some(id),
            Attendee::Student(_) => None,
        }
    }

    pub fn student_id(&self) -> Option<&str> {
        match self {
            Attendee::Student(id) => Some(id),
            Attendee::Group(_) => None,
        }
    }
}

/// A one-hour class occupying a single slot of the weekly grid.
///
/// The end time is never stored independently; it is always one hour after
/// `start_time`. On the wire the class keeps the flat `groupId`/`studentId`
/// shape of the persisted snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ScheduledClassRecord", into = "ScheduledClassRecord")]
pub struct ScheduledClass {
    pub id: String,
    pub teacher_id: String,
    pub attendee: Attendee,
    pub start_time: DateTime<Utc>,
}

impl ScheduledClass {
    pub fn new(
        id: impl Into<String>,
        teacher_id: impl Into<String>,
        attendee: Attendee,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            teacher_id: teacher_id.into(),
            attendee,
            start_time,
        }
    }

    pub fn for_group(
        id: impl Into<String>,
        teacher_id: impl Into<String>,
        group_id: impl Into<String>,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self::new(id, teacher_id, Attendee::Group(group_id.into()), start_time)
    }

    pub fn for_student(
        id: impl Into<String>,
        teacher_id: impl Into<String>,
        student_id: impl Into<String>,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self::new(id, teacher_id, Attendee::Student(student_id.into()), start_time)
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.start_time + Duration::hours(CLASS_LENGTH_HOURS)
    }

    pub fn group_id(&self) -> Option<&str> {
        self.attendee.group_id()
    }

    pub fn student_id(&self) -> Option<&str> {
        self.attendee.student_id()
    }

    pub fn is_group_class(&self) -> bool {
        matches!(self.attendee, Attendee::Group(_))
    }
}

/// Candidate for a new class; the store assigns the id.
///
/// Uses the same flat `groupId`/`studentId` shape as [`ScheduledClass`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ClassDraftRecord", into = "ClassDraftRecord")]
pub struct ClassDraft {
    pub teacher_id: String,
    pub attendee: Attendee,
    pub start_time: DateTime<Utc>,
}

impl ClassDraft {
    pub fn for_group(
        teacher_id: impl Into<String>,
        group_id: impl Into<String>,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            teacher_id: teacher_id.into(),
            attendee: Attendee::Group(group_id.into()),
            start_time,
        }
    }

    pub fn for_student(
        teacher_id: impl Into<String>,
        student_id: impl Into<String>,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            teacher_id: teacher_id.into(),
            attendee: Attendee::Student(student_id.into()),
            start_time,
        }
    }

    pub fn into_class(self, id: impl Into<String>) -> ScheduledClass {
        ScheduledClass::new(id, self.teacher_id, self.attendee, self.start_time)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduledClassRecord {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    student_id: Option<String>,
    teacher_id: String,
    start_time: DateTime<Utc>,
    // Written for readers of the file; recomputed from start_time on load.
    #[serde(default)]
    end_time: Option<DateTime<Utc>>,
}

fn attendee_from_ids(
    group_id: Option<String>,
    student_id: Option<String>,
    what: &str,
) -> Result<Attendee, String> {
    match (group_id, student_id) {
        (Some(group_id), None) => Ok(Attendee::Group(group_id)),
        (None, Some(student_id)) => Ok(Attendee::Student(student_id)),
        (Some(_), Some(_)) => Err(format!("{what} references both a group and a student")),
        (None, None) => Err(format!("{what} references neither a group nor a student")),
    }
}

fn attendee_ids(attendee: Attendee) -> (Option<String>, Option<String>) {
    match attendee {
        Attendee::Group(id) => (Some(id), None),
        Attendee::Student(id) => (None, Some(id)),
    }
}

impl TryFrom<ScheduledClassRecord> for ScheduledClass {
    type Error = String;

    fn try_from(record: ScheduledClassRecord) -> Result<Self, Self::Error> {
        let what = format!("class {}", record.id);
        let attendee = attendee_from_ids(record.group_id, record.student_id, &what)?;
        Ok(Self {
            id: record.id,
            teacher_id: record.teacher_id,
            attendee,
            start_time: record.start_time,
        })
    }
}

impl From<ScheduledClass> for ScheduledClassRecord {
    fn from(class: ScheduledClass) -> Self {
        let end_time = Some(class.end_time());
        let (group_id, student_id) = attendee_ids(class.attendee);
        Self {
            id: class.id,
            group_id,
            student_id,
            teacher_id: class.teacher_id,
            start_time: class.start_time,
            end_time,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClassDraftRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    student_id: Option<String>,
    teacher_id: String,
    start_time: DateTime<Utc>,
}

impl TryFrom<ClassDraftRecord> for ClassDraft {
    type Error = String;

    fn try_from(record: ClassDraftRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            attendee: attendee_from_ids(record.group_id, record.student_id, "new class")?,
            teacher_id: record.teacher_id,
            start_time: record.start_time,
        })
    }
}

impl From<ClassDraft> for ClassDraftRecord {
    fn from(draft: ClassDraft) -> Self {
        let (group_id, student_id) = attendee_ids(draft.attendee);
        Self {
            group_id,
            student_id,
            teacher_id: draft.teacher_id,
            start_time: draft.start_time,
        }
    }
}
