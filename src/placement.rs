//! Drag-and-drop rescheduling.
//!
//! The calendar names each droppable cell `cell-<Day>-<HH>:00`; anything else
//! is a non-slot area such as a sidebar or trash zone.

use crate::calendar::{Slot, WeekGrid};
use crate::model::ScheduledClass;
use crate::store::{ScheduleError, Scheduler};
use serde::{Deserialize, Serialize};

const SLOT_PREFIX: &str = "cell";

pub fn slot_id(slot: Slot) -> String {
    format!(
        "{SLOT_PREFIX}-{}-{}",
        WeekGrid::day_name(slot.weekday),
        slot.time_label()
    )
}

/// Parses a droppable id into a slot; `None` for non-slot areas.
pub fn parse_slot_id(id: &str) -> Option<Slot> {
    let mut parts = id.split('-');
    if parts.next()? != SLOT_PREFIX {
        return None;
    }
    let weekday = WeekGrid::parse_day_name(parts.next()?)?;
    let hour = parse_hour_label(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    Some(Slot::new(weekday, hour))
}

/// Parses `HH:00` (or a bare hour) into an hour of the day.
pub fn parse_hour_label(label: &str) -> Option<u32> {
    let (hour, minutes) = match label.split_once(':') {
        Some((hour, minutes)) => (hour, Some(minutes)),
        None => (label, None),
    };
    if let Some(minutes) = minutes {
        if minutes.parse::<u32>().ok()? != 0 {
            return None;
        }
    }
    let hour = hour.trim().parse::<u32>().ok()?;
    (hour < 24).then_some(hour)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropLocation {
    pub droppable_id: String,
    #[serde(default)]
    pub index: usize,
}

impl DropLocation {
    pub fn new(droppable_id: impl Into<String>, index: usize) -> Self {
        Self {
            droppable_id: droppable_id.into(),
            index,
        }
    }

    pub fn slot(slot: Slot, index: usize) -> Self {
        Self::new(slot_id(slot), index)
    }
}

/// End of a drag gesture as reported by the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropEvent {
    pub class_id: String,
    pub source: DropLocation,
    /// `None` when the class was released outside any droppable area.
    #[serde(default)]
    pub destination: Option<DropLocation>,
}

/// Why a drop left the schedule untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoredDrop {
    NoDestination,
    SamePosition,
    UnknownClass,
    NotASlot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum DropOutcome {
    Moved { class: ScheduledClass },
    Ignored { reason: IgnoredDrop },
}

/// Applies a drop to the store.
///
/// A drop onto a new slot keeps the class's Monday-based week, moves it to
/// the slot's day and hour and goes through the regular update, so it can
/// still be rejected as a conflict.
pub fn apply_drop(
    scheduler: &mut Scheduler,
    event: &DropEvent,
) -> Result<DropOutcome, ScheduleError> {
    let Some(destination) = &event.destination else {
        return Ok(ignored(IgnoredDrop::NoDestination));
    };
    if destination == &event.source {
        return Ok(ignored(IgnoredDrop::SamePosition));
    }
    if scheduler.find_class(&event.class_id).is_none() {
        return Ok(ignored(IgnoredDrop::UnknownClass));
    }
    let Some(slot) = parse_slot_id(&destination.droppable_id) else {
        return Ok(ignored(IgnoredDrop::NotASlot));
    };
    move_class_to_slot(scheduler, &event.class_id, slot).map(|class| DropOutcome::Moved { class })
}

/// Moves a class to `slot` within its current week.
pub fn move_class_to_slot(
    scheduler: &mut Scheduler,
    class_id: &str,
    slot: Slot,
) -> Result<ScheduledClass, ScheduleError> {
    let current = scheduler
        .find_class(class_id)
        .cloned()
        .ok_or_else(|| ScheduleError::NotFound(class_id.to_string()))?;
    let start_time = scheduler
        .grid()
        .move_within_week(current.start_time, slot.weekday, slot.hour)
        .ok_or(ScheduleError::MisalignedStart(current.start_time))?;
    let moved = ScheduledClass {
        start_time,
        ..current
    };
    scheduler.update_scheduled_class(moved.clone())?;
    Ok(moved)
}

fn ignored(reason: IgnoredDrop) -> DropOutcome {
    DropOutcome::Ignored { reason }
}
