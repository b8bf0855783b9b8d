use crate::model::ScheduledClass;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::Serialize;
use std::fmt;
use tracing::debug;

const SECONDS_PER_HOUR: i64 = 3600;

/// Which double-booking rule a candidate class breaks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ConflictReason {
    Teacher { teacher_id: String },
    Group { group_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    #[serde(flatten)]
    pub reason: ConflictReason,
    /// Id of the already scheduled class that occupies the slot.
    pub existing_class_id: String,
    pub start_time: DateTime<Utc>,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            ConflictReason::Teacher { teacher_id } => write!(
                f,
                "teacher {teacher_id} is already booked at {} (class {})",
                self.start_time.to_rfc3339(),
                self.existing_class_id
            ),
            ConflictReason::Group { group_id } => write!(
                f,
                "group {group_id} is already scheduled at {} (class {})",
                self.start_time.to_rfc3339(),
                self.existing_class_id
            ),
        }
    }
}

/// Index of the wall-clock hour an instant falls into at `offset`.
///
/// Half-hour offsets move the hour boundary, so the bucket has to be taken
/// on local time rather than on the UTC timestamp.
pub fn hour_bucket(instant: DateTime<Utc>, offset: FixedOffset) -> i64 {
    (instant.timestamp() + i64::from(offset.local_minus_utc())).div_euclid(SECONDS_PER_HOUR)
}

pub fn same_hour(a: DateTime<Utc>, b: DateTime<Utc>, offset: FixedOffset) -> bool {
    hour_bucket(a, offset) == hour_bucket(b, offset)
}

/// [`find_conflict_at`] with clock hours read in UTC.
pub fn find_conflict(candidate: &ScheduledClass, others: &[ScheduledClass]) -> Option<Conflict> {
    find_conflict_at(Utc.fix(), candidate, others)
}

/// Returns the first rule `candidate` breaks against `others`, if any.
///
/// Two classes share a slot when they start in the same clock hour at
/// `offset`. Entries sharing the candidate's id are skipped so that an update
/// never collides with its own previous state. Only teacher and group
/// bookings are checked; two individual classes for the same student do not
/// conflict.
pub fn find_conflict_at(
    offset: FixedOffset,
    candidate: &ScheduledClass,
    others: &[ScheduledClass],
) -> Option<Conflict> {
    for existing in others {
        if existing.id == candidate.id {
            continue;
        }
        if !same_hour(candidate.start_time, existing.start_time, offset) {
            continue;
        }

        if candidate.teacher_id == existing.teacher_id {
            debug!(
                teacher_id = %candidate.teacher_id,
                start = %candidate.start_time,
                existing = %existing.id,
                "teacher already booked"
            );
            return Some(Conflict {
                reason: ConflictReason::Teacher {
                    teacher_id: candidate.teacher_id.clone(),
                },
                existing_class_id: existing.id.clone(),
                start_time: candidate.start_time,
            });
        }

        if let Some(group_id) = candidate.group_id() {
            if existing.group_id() == Some(group_id) {
                debug!(
                    group_id,
                    start = %candidate.start_time,
                    existing = %existing.id,
                    "group already scheduled"
                );
                return Some(Conflict {
                    reason: ConflictReason::Group {
                        group_id: group_id.to_string(),
                    },
                    existing_class_id: existing.id.clone(),
                    start_time: candidate.start_time,
                });
            }
        }
    }
    None
}

pub fn has_conflict(candidate: &ScheduledClass, others: &[ScheduledClass]) -> bool {
    find_conflict(candidate, others).is_some()
}
