use crate::calendar::WeekGrid;
use crate::model::{Group, ScheduledClass, Student, Teacher};
use crate::snapshot::Snapshot;
use chrono::NaiveDate;

/// Starter data used when nothing has been persisted yet.
///
/// One group class for `Math 101` is placed at 10:00 on `today` in grid time.
pub fn seed_snapshot(grid: &WeekGrid, today: NaiveDate) -> Snapshot {
    let teachers = vec![
        Teacher::new("t1", "Dr. Smith"),
        Teacher::new("t2", "Prof. Jones"),
    ];
    let students = vec![
        Student::new("s1", "Alice").with_profile_link("link1"),
        Student::new("s2", "Bob").with_profile_link("link2"),
    ];
    let groups = vec![Group::new("g1", "Math 101", "t1").with_students(["s1", "s2"])];
    let scheduled_classes = grid
        .at(today, 10)
        .map(|start| vec![ScheduledClass::for_group("sc1", "t1", "g1", start)])
        .unwrap_or_default();

    Snapshot::new(teachers, groups, students, scheduled_classes)
}
