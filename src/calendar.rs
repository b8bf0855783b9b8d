use crate::model::{Group, ScheduledClass};
use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Timelike,
    Utc, Weekday,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

const TEACHER_COLORS: [&str; 10] = [
    "#FFADAD", "#FFD6A5", "#FDFFB6", "#CAFFBF", "#9BF6FF", "#A0C4FF", "#BDB2FF", "#FFC6FF",
    "#E0BBE4", "#D4F0F0",
];
const DEFAULT_TEACHER_COLOR: &str = "#E0E0E0";

/// One day-of-week x hour cell of the weekly grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub weekday: Weekday,
    pub hour: u32,
}

impl Slot {
    pub fn new(weekday: Weekday, hour: u32) -> Self {
        Self { weekday, hour }
    }

    pub fn time_label(&self) -> String {
        format!("{:02}:00", self.hour)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", WeekGrid::day_name(self.weekday), self.time_label())
    }
}

/// Wall-clock view of the week used for placing and displaying classes.
///
/// Class times are stored as UTC instants; every day/hour computation goes
/// through the grid's fixed offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekGrid {
    offset: FixedOffset,
    first_hour: u32,
    slot_count: u32,
}

impl Default for WeekGrid {
    fn default() -> Self {
        Self {
            offset: Utc.fix(),
            first_hour: 8,
            slot_count: 13,
        }
    }
}

impl WeekGrid {
    pub const DAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    pub fn with_offset(offset: FixedOffset) -> Self {
        Self {
            offset,
            ..Self::default()
        }
    }

    /// Returns `None` when the offset is outside +/- 24h.
    pub fn with_utc_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes.checked_mul(60)?).map(Self::with_offset)
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn day_name(weekday: Weekday) -> &'static str {
        match weekday {
            Weekday::Mon => "Monday",
            Weekday::Tue => "Tuesday",
            Weekday::Wed => "Wednesday",
            Weekday::Thu => "Thursday",
            Weekday::Fri => "Friday",
            Weekday::Sat => "Saturday",
            Weekday::Sun => "Sunday",
        }
    }

    pub fn parse_day_name(name: &str) -> Option<Weekday> {
        Self::DAYS
            .into_iter()
            .find(|day| Self::day_name(*day).eq_ignore_ascii_case(name.trim()))
    }

    pub fn hours(&self) -> impl Iterator<Item = u32> {
        self.first_hour..self.first_hour + self.slot_count
    }

    pub fn time_labels(&self) -> Vec<String> {
        self.hours().map(|hour| format!("{hour:02}:00")).collect()
    }

    pub fn slots(&self) -> Vec<Slot> {
        let mut slots = Vec::with_capacity(Self::DAYS.len() * self.slot_count as usize);
        for hour in self.hours() {
            for day in Self::DAYS {
                slots.push(Slot::new(day, hour));
            }
        }
        slots
    }

    pub fn local(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        instant.with_timezone(&self.offset)
    }

    pub fn slot_of(&self, instant: DateTime<Utc>) -> Slot {
        let local = self.local(instant);
        Slot::new(local.weekday(), local.hour())
    }

    pub fn is_aligned(&self, instant: DateTime<Utc>) -> bool {
        let local = self.local(instant);
        local.minute() == 0 && local.second() == 0 && local.nanosecond() == 0
    }

    /// Instant of `hour:00` on `date` in grid time.
    pub fn at(&self, date: NaiveDate, hour: u32) -> Option<DateTime<Utc>> {
        let time = NaiveTime::from_hms_opt(hour, 0, 0)?;
        self.offset
            .from_local_datetime(&date.and_time(time))
            .single()
            .map(|local| local.with_timezone(&Utc))
    }

    /// Moves `start` to `weekday` of the same Monday-based week at `hour:00`.
    pub fn move_within_week(
        &self,
        start: DateTime<Utc>,
        weekday: Weekday,
        hour: u32,
    ) -> Option<DateTime<Utc>> {
        let date = self.local(start).date_naive();
        let monday = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
        let target = monday + Duration::days(i64::from(weekday.num_days_from_monday()));
        self.at(target, hour)
    }

    pub fn classes_in_slot<'a>(
        &self,
        classes: &'a [ScheduledClass],
        slot: Slot,
    ) -> Vec<&'a ScheduledClass> {
        classes
            .iter()
            .filter(|class| self.slot_of(class.start_time) == slot)
            .collect()
    }
}

/// Narrows the calendar to one teacher and/or one group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

impl ClassFilter {
    pub fn teacher(teacher_id: impl Into<String>) -> Self {
        Self {
            teacher_id: Some(teacher_id.into()),
            group_id: None,
        }
    }

    pub fn group(group_id: impl Into<String>) -> Self {
        Self {
            teacher_id: None,
            group_id: Some(group_id.into()),
        }
    }

    pub fn matches(&self, class: &ScheduledClass) -> bool {
        if let Some(teacher_id) = &self.teacher_id {
            if &class.teacher_id != teacher_id {
                return false;
            }
        }
        if let Some(group_id) = &self.group_id {
            if class.group_id() != Some(group_id.as_str()) {
                return false;
            }
        }
        true
    }

    pub fn apply<'a>(&self, classes: &'a [ScheduledClass]) -> Vec<&'a ScheduledClass> {
        classes.iter().filter(|class| self.matches(class)).collect()
    }
}

/// Search highlighting by group name.
///
/// `None` means no search is active, which includes a whitespace-only query.
/// Otherwise `Some(true)` when the class belongs to a group whose name
/// contains the query as typed, ignoring case.
pub fn search_highlight(
    class: &ScheduledClass,
    groups: &HashMap<&str, &Group>,
    query: &str,
) -> Option<bool> {
    if query.trim().is_empty() {
        return None;
    }
    let needle = query.to_lowercase();
    let hit = class
        .group_id()
        .and_then(|id| groups.get(id))
        .map(|group| group.name.to_lowercase().contains(&needle))
        .unwrap_or(false);
    Some(hit)
}

/// Stable display colour for a teacher.
pub fn teacher_color(teacher_id: &str) -> &'static str {
    if teacher_id.is_empty() {
        return DEFAULT_TEACHER_COLOR;
    }
    let mut hash: i32 = 0;
    for unit in teacher_id.encode_utf16() {
        hash = i32::from(unit).wrapping_add((hash << 5).wrapping_sub(hash));
    }
    let index = (i64::from(hash).unsigned_abs() % TEACHER_COLORS.len() as u64) as usize;
    TEACHER_COLORS[index]
}
