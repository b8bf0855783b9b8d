use crate::calendar::WeekGrid;
use crate::store::Scheduler;
use chrono::Weekday;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write;

const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub class_id: String,
    pub start: String,
    pub end: String,
    /// Student name for individual classes, group name otherwise.
    pub title: String,
    pub individual: bool,
    pub teacher: String,
    /// Member names of a group class, empty for individual classes.
    pub members: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayReport {
    pub day: &'static str,
    #[serde(skip)]
    pub weekday: Weekday,
    pub entries: Vec<ReportEntry>,
}

/// The week's classes grouped by weekday, Monday first, in start order.
/// Days without classes are left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyReport {
    pub days: Vec<DayReport>,
}

impl WeeklyReport {
    pub fn build(scheduler: &Scheduler) -> Self {
        let grid = scheduler.grid();
        let teachers: HashMap<&str, &str> = scheduler
            .teachers()
            .iter()
            .map(|t| (t.id.as_str(), t.name.as_str()))
            .collect();
        let students: HashMap<&str, &str> = scheduler
            .students()
            .iter()
            .map(|s| (s.id.as_str(), s.name.as_str()))
            .collect();
        let groups: HashMap<&str, _> = scheduler
            .groups()
            .iter()
            .map(|g| (g.id.as_str(), g))
            .collect();

        let mut days = Vec::new();
        for weekday in WeekGrid::DAYS {
            let mut classes: Vec<_> = scheduler
                .scheduled_classes()
                .iter()
                .filter(|class| grid.slot_of(class.start_time).weekday == weekday)
                .collect();
            if classes.is_empty() {
                continue;
            }
            classes.sort_by_key(|class| class.start_time);

            let entries = classes
                .into_iter()
                .map(|class| {
                    let student = class.student_id().and_then(|id| students.get(id).copied());
                    let group = class.group_id().and_then(|id| groups.get(id).copied());
                    let title = student
                        .or_else(|| group.map(|g| g.name.as_str()))
                        .unwrap_or(UNKNOWN)
                        .to_string();
                    let members: Vec<String> = group
                        .map(|g| {
                            g.student_ids
                                .iter()
                                .map(|sid| students.get(sid.as_str()).copied().unwrap_or(UNKNOWN))
                                .map(str::to_string)
                                .collect()
                        })
                        .unwrap_or_default();
                    ReportEntry {
                        class_id: class.id.clone(),
                        start: grid.local(class.start_time).format("%H:%M").to_string(),
                        end: grid.local(class.end_time()).format("%H:%M").to_string(),
                        title,
                        individual: student.is_some(),
                        teacher: teachers
                            .get(class.teacher_id.as_str())
                            .copied()
                            .unwrap_or(UNKNOWN)
                            .to_string(),
                        members,
                    }
                })
                .collect();

            days.push(DayReport {
                day: WeekGrid::day_name(weekday),
                weekday,
                entries,
            });
        }
        Self { days }
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn render(&self) -> String {
        let mut out = String::from("Class schedule\n==============\n");
        if self.is_empty() {
            out.push_str("\nNo scheduled classes\n");
            return out;
        }
        for day in &self.days {
            let _ = writeln!(out, "\n{}\n{}", day.day, "-".repeat(day.day.len()));
            for entry in &day.entries {
                let kind = if entry.individual { " (individual)" } else { "" };
                let _ = writeln!(out, "{} - {}  {}{}", entry.start, entry.end, entry.title, kind);
                let _ = writeln!(out, "    Teacher: {}", entry.teacher);
                if !entry.members.is_empty() {
                    let _ = writeln!(out, "    Students: {}", entry.members.join(", "));
                }
            }
        }
        out
    }
}

pub fn render_text_report(scheduler: &Scheduler) -> String {
    WeeklyReport::build(scheduler).render()
}

/// Collection sizes and the persisted footprint.
#[derive(Debug, Clone, Serialize)]
pub struct StoreSummary {
    pub teachers: usize,
    pub groups: usize,
    pub students: usize,
    pub scheduled_classes: usize,
    pub storage_kb: f64,
}

impl StoreSummary {
    pub fn collect(scheduler: &Scheduler) -> Self {
        // An unreadable size is shown as empty storage.
        let bytes = scheduler.storage_size_bytes().unwrap_or(0);
        Self {
            teachers: scheduler.teachers().len(),
            groups: scheduler.groups().len(),
            students: scheduler.students().len(),
            scheduled_classes: scheduler.scheduled_classes().len(),
            storage_kb: bytes as f64 / 1024.0,
        }
    }

    pub fn to_cli_summary(&self) -> String {
        format!(
            "teachers={}, groups={}, students={}, classes={}, storage={:.2} KB",
            self.teachers, self.groups, self.students, self.scheduled_classes, self.storage_kb
        )
    }
}
