use std::collections::HashMap;

use chrono::{Datelike, FixedOffset, NaiveDate, TimeZone, Timelike, Utc, Weekday};
use class_scheduler::{
    ClassFilter, Group, ScheduledClass, Slot, WeekGrid, search_highlight, teacher_color,
};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn grid_covers_monday_to_sunday_eight_to_twenty() {
    let grid = WeekGrid::default();
    let labels = grid.time_labels();
    assert_eq!(labels.len(), 13);
    assert_eq!(labels.first().map(String::as_str), Some("08:00"));
    assert_eq!(labels.last().map(String::as_str), Some("20:00"));

    let slots = grid.slots();
    assert_eq!(slots.len(), 7 * 13);
    assert_eq!(slots[0], Slot::new(Weekday::Mon, 8));
    assert_eq!(slots[6], Slot::new(Weekday::Sun, 8));
    assert_eq!(Slot::new(Weekday::Wed, 9).to_string(), "Wednesday 09:00");
}

#[test]
fn day_names_parse_case_insensitively() {
    assert_eq!(WeekGrid::parse_day_name("tuesday"), Some(Weekday::Tue));
    assert_eq!(WeekGrid::parse_day_name("Sunday"), Some(Weekday::Sun));
    assert_eq!(WeekGrid::parse_day_name("Tue"), None);
}

#[test]
fn offset_grid_places_instants_in_local_time() {
    let grid = WeekGrid::with_utc_offset_minutes(120).unwrap();
    // 23:00 UTC on Sunday is 01:00 Monday at +02:00.
    let instant = Utc.with_ymd_and_hms(2025, 3, 9, 23, 0, 0).unwrap();
    assert_eq!(grid.slot_of(instant), Slot::new(Weekday::Mon, 1));

    let start = grid.at(d(2025, 3, 10), 9).unwrap();
    assert_eq!(start, Utc.with_ymd_and_hms(2025, 3, 10, 7, 0, 0).unwrap());
    assert_eq!(grid.offset(), FixedOffset::east_opt(7200).unwrap());

    assert!(WeekGrid::with_utc_offset_minutes(24 * 60).is_none());
}

#[test]
fn alignment_is_judged_in_grid_time() {
    let grid = WeekGrid::with_utc_offset_minutes(330).unwrap();
    // +05:30: 03:30 UTC is 09:00 local.
    assert!(grid.is_aligned(Utc.with_ymd_and_hms(2025, 3, 10, 3, 30, 0).unwrap()));
    assert!(!grid.is_aligned(Utc.with_ymd_and_hms(2025, 3, 10, 4, 0, 0).unwrap()));
}

#[test]
fn move_within_week_keeps_monday_based_week() {
    let grid = WeekGrid::default();
    // Sunday 2025-03-16 belongs to the week starting Monday 2025-03-10.
    let sunday = Utc.with_ymd_and_hms(2025, 3, 16, 18, 0, 0).unwrap();
    let moved = grid.move_within_week(sunday, Weekday::Tue, 10).unwrap();
    assert_eq!(moved.date_naive(), d(2025, 3, 11));
    assert_eq!(moved.hour(), 10);
    assert_eq!(moved.minute(), 0);

    let monday = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
    let moved = grid.move_within_week(monday, Weekday::Sun, 20).unwrap();
    assert_eq!(moved.weekday(), Weekday::Sun);
    assert_eq!(moved.date_naive(), d(2025, 3, 16));
}

#[test]
fn classes_in_slot_matches_day_and_hour() {
    let grid = WeekGrid::default();
    let classes = vec![
        ScheduledClass::for_group("a", "t1", "g1", Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()),
        ScheduledClass::for_group("b", "t2", "g2", Utc.with_ymd_and_hms(2025, 3, 17, 9, 0, 0).unwrap()),
        ScheduledClass::for_group("c", "t1", "g1", Utc.with_ymd_and_hms(2025, 3, 10, 10, 0, 0).unwrap()),
    ];
    let ids: Vec<&str> = grid
        .classes_in_slot(&classes, Slot::new(Weekday::Mon, 9))
        .into_iter()
        .map(|c| c.id.as_str())
        .collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[test]
fn class_filter_by_teacher_and_group() {
    let start = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
    let classes = vec![
        ScheduledClass::for_group("a", "t1", "g1", start),
        ScheduledClass::for_student("b", "t1", "s1", start),
        ScheduledClass::for_group("c", "t2", "g2", start),
    ];

    assert_eq!(ClassFilter::default().apply(&classes).len(), 3);
    assert_eq!(ClassFilter::teacher("t1").apply(&classes).len(), 2);

    let by_group = ClassFilter::group("g2").apply(&classes);
    assert_eq!(by_group.len(), 1);
    assert_eq!(by_group[0].id, "c");

    let both = ClassFilter {
        teacher_id: Some("t1".into()),
        group_id: Some("g2".into()),
    };
    assert!(both.apply(&classes).is_empty());
}

#[test]
fn search_highlights_matching_group_names() {
    let start = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
    let math = Group::new("g1", "Math 101", "t1");
    let groups: HashMap<&str, &Group> = HashMap::from([("g1", &math)]);
    let group_class = ScheduledClass::for_group("a", "t1", "g1", start);
    let individual = ScheduledClass::for_student("b", "t1", "s1", start);

    assert_eq!(search_highlight(&group_class, &groups, ""), None);
    assert_eq!(search_highlight(&group_class, &groups, "  "), None);
    assert_eq!(search_highlight(&group_class, &groups, "math"), Some(true));
    assert_eq!(search_highlight(&group_class, &groups, "physics"), Some(false));
    assert_eq!(search_highlight(&individual, &groups, "math"), Some(false));
}

#[test]
fn search_matches_the_query_as_typed() {
    let start = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
    let math = Group::new("g1", "Math 101", "t1");
    let groups: HashMap<&str, &Group> = HashMap::from([("g1", &math)]);
    let class = ScheduledClass::for_group("a", "t1", "g1", start);

    // Surrounding spaces are part of the needle once a search is active.
    assert_eq!(search_highlight(&class, &groups, "MATH "), Some(true));
    assert_eq!(search_highlight(&class, &groups, " math"), Some(false));
    assert_eq!(search_highlight(&class, &groups, "101 "), Some(false));
}

#[test]
fn teacher_colors_are_stable_palette_entries() {
    assert_eq!(teacher_color(""), "#E0E0E0");
    assert_eq!(teacher_color("t1"), teacher_color("t1"));
    // "t1" hashes to 3645, which selects the sixth palette entry.
    assert_eq!(teacher_color("t1"), "#A0C4FF");
    assert!(teacher_color("some-long-teacher-identifier").starts_with('#'));
}
