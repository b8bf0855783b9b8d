use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc, Weekday};
use class_scheduler::placement::{move_class_to_slot, parse_hour_label, parse_slot_id, slot_id};
use class_scheduler::{
    ClassDraft, DropEvent, DropLocation, DropOutcome, IgnoredDrop, MemoryStorage, ScheduleError,
    Scheduler, Slot, WeekGrid, apply_drop,
};

fn mon(h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, h, 0, 0).unwrap()
}

fn scheduler_with_class() -> (Scheduler, String) {
    let mut scheduler = Scheduler::new(Box::new(MemoryStorage::new()), WeekGrid::default());
    let class = scheduler
        .add_scheduled_class(ClassDraft::for_group("t1", "g1", mon(9)))
        .unwrap();
    (scheduler, class.id)
}

fn drop_event(class_id: &str, from: &str, to: Option<&str>) -> DropEvent {
    DropEvent {
        class_id: class_id.to_string(),
        source: DropLocation::new(from, 0),
        destination: to.map(|id| DropLocation::new(id, 0)),
    }
}

#[test]
fn slot_ids_round_trip() {
    let slot = Slot::new(Weekday::Tue, 10);
    assert_eq!(slot_id(slot), "cell-Tuesday-10:00");
    assert_eq!(parse_slot_id("cell-Tuesday-10:00"), Some(slot));
    assert_eq!(parse_slot_id("cell-Monday-08:00"), Some(Slot::new(Weekday::Mon, 8)));
}

#[test]
fn non_slot_ids_are_rejected() {
    assert_eq!(parse_slot_id("sidebar"), None);
    assert_eq!(parse_slot_id("trash"), None);
    assert_eq!(parse_slot_id("cell-Funday-10:00"), None);
    assert_eq!(parse_slot_id("cell-Monday-10:30"), None);
    assert_eq!(parse_slot_id("cell-Monday-10:00-extra"), None);
    assert_eq!(parse_hour_label("24:00"), None);
    assert_eq!(parse_hour_label("07:00"), Some(7));
}

#[test]
fn drop_moves_class_to_new_day_and_hour() {
    let (mut scheduler, id) = scheduler_with_class();
    let event = drop_event(&id, "cell-Monday-09:00", Some("cell-Tuesday-10:00"));

    let outcome = apply_drop(&mut scheduler, &event).unwrap();
    let DropOutcome::Moved { class } = outcome else {
        panic!("expected the class to move");
    };
    assert_eq!(class.start_time.weekday(), Weekday::Tue);
    assert_eq!(class.start_time.hour(), 10);
    assert_eq!(class.start_time.minute(), 0);
    assert_eq!(class.start_time.second(), 0);
    assert_eq!(class.end_time() - class.start_time, chrono::Duration::hours(1));
    assert_eq!(scheduler.find_class(&id).unwrap().start_time, class.start_time);
    // Same week as before.
    assert_eq!(class.start_time.date_naive(), mon(9).date_naive().succ_opt().unwrap());
}

#[test]
fn drop_on_same_position_changes_nothing() {
    let (mut scheduler, id) = scheduler_with_class();
    let before = scheduler.scheduled_classes().to_vec();
    let event = drop_event(&id, "cell-Monday-09:00", Some("cell-Monday-09:00"));

    assert_eq!(
        apply_drop(&mut scheduler, &event).unwrap(),
        DropOutcome::Ignored {
            reason: IgnoredDrop::SamePosition
        }
    );
    assert_eq!(scheduler.scheduled_classes(), before.as_slice());
}

#[test]
fn drops_outside_slots_or_for_unknown_classes_are_ignored() {
    let (mut scheduler, id) = scheduler_with_class();
    let before = scheduler.scheduled_classes().to_vec();

    let cases = [
        (drop_event(&id, "cell-Monday-09:00", None), IgnoredDrop::NoDestination),
        (drop_event(&id, "cell-Monday-09:00", Some("sidebar")), IgnoredDrop::NotASlot),
        (
            drop_event("ghost", "cell-Monday-09:00", Some("cell-Friday-12:00")),
            IgnoredDrop::UnknownClass,
        ),
    ];
    for (event, reason) in cases {
        assert_eq!(
            apply_drop(&mut scheduler, &event).unwrap(),
            DropOutcome::Ignored { reason }
        );
    }
    assert_eq!(scheduler.scheduled_classes(), before.as_slice());
}

#[test]
fn drop_into_occupied_hour_is_rejected() {
    let (mut scheduler, id) = scheduler_with_class();
    scheduler
        .add_scheduled_class(ClassDraft::for_group("t1", "g2", mon(11)))
        .unwrap();

    let event = drop_event(&id, "cell-Monday-09:00", Some("cell-Monday-11:00"));
    let err = apply_drop(&mut scheduler, &event).unwrap_err();
    assert!(matches!(err, ScheduleError::Conflict(_)));
    assert_eq!(scheduler.find_class(&id).unwrap().start_time, mon(9));
}

#[test]
fn drop_event_reads_camel_case_json() {
    let event: DropEvent = serde_json::from_str(
        r#"{
            "classId": "c1",
            "source": { "droppableId": "cell-Monday-09:00", "index": 0 },
            "destination": { "droppableId": "cell-Tuesday-10:00", "index": 1 }
        }"#,
    )
    .unwrap();
    assert_eq!(event.class_id, "c1");
    assert_eq!(event.destination.unwrap().index, 1);

    let dropped_outside: DropEvent = serde_json::from_str(
        r#"{ "classId": "c1", "source": { "droppableId": "cell-Monday-09:00" } }"#,
    )
    .unwrap();
    assert!(dropped_outside.destination.is_none());
}

#[test]
fn move_unknown_class_is_not_found() {
    let (mut scheduler, _) = scheduler_with_class();
    let err = move_class_to_slot(&mut scheduler, "ghost", Slot::new(Weekday::Wed, 9)).unwrap_err();
    assert_eq!(err, ScheduleError::NotFound("ghost".into()));
}
