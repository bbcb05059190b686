use chrono::{Duration, NaiveDate};
use commesse_planner::{ActivityPatch, Schedule, ScheduleError, UpsertOutcome, UpsertPolicy};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn upsert_creates_project_and_normalises_dates() {
    let mut s = Schedule::new();
    let outcome = s
        .upsert("Impianto Nord", "S1", "Sopralluogo", "Squadra 1", 1, d(2025, 1, 1))
        .unwrap();
    assert_eq!(outcome, UpsertOutcome::Created);
    assert_eq!(s.list_projects(), vec!["Impianto Nord"]);

    let activity = s.get("Impianto Nord", "S1").unwrap();
    assert_eq!(activity.start, d(2025, 1, 2));
    assert_eq!(activity.end, activity.start);
}

#[test]
fn reject_duplicate_policy_keeps_prior_value() {
    let mut s = Schedule::new().with_policy(UpsertPolicy::RejectDuplicate);
    s.upsert("A", "A1", "Sopralluogo", "R1", 2, d(2025, 3, 3)).unwrap();
    let before = s.clone();

    let err = s
        .upsert("A", "A1", "Pullout", "R2", 3, d(2025, 3, 4))
        .unwrap_err();
    assert_eq!(
        err,
        ScheduleError::DuplicateCode {
            project: "A".into(),
            code: "A1".into()
        }
    );
    assert_eq!(s, before);

    // Same code in a different project is fine.
    s.upsert("B", "A1", "Pullout", "R2", 3, d(2025, 3, 4)).unwrap();
    assert_eq!(s.len(), 2);
}

#[test]
fn invalid_duration_is_rejected_before_scheduling() {
    let mut s = Schedule::new();
    assert_eq!(
        s.upsert("A", "A1", "x", "R1", 0, d(2025, 3, 3)),
        Err(ScheduleError::InvalidDuration(0))
    );
    assert_eq!(
        s.upsert("A", "A1", "x", "R1", -4, d(2025, 3, 3)),
        Err(ScheduleError::InvalidDuration(-4))
    );
    assert_eq!(
        s.upsert("A", "A1", "x", "R1", 100_000_000, d(2025, 1, 2)),
        Err(ScheduleError::InvalidDuration(100_000_000))
    );
    assert_eq!(
        s.upsert("A", "A1", "x", "R1", 61, d(2025, 1, 2)),
        Err(ScheduleError::InvalidDuration(61))
    );
    assert!(s.is_empty());
    assert_eq!(
        s.upsert("A", "A1", "x", "R1", 60, d(2025, 1, 2)),
        Ok(UpsertOutcome::Created)
    );
}

#[test]
fn blank_identifiers_are_rejected() {
    let mut s = Schedule::new();
    assert!(matches!(
        s.upsert(" ", "A1", "x", "R1", 1, d(2025, 3, 3)),
        Err(ScheduleError::InvalidActivity(_))
    ));
    assert!(matches!(
        s.upsert("A", "A1", "x", "", 1, d(2025, 3, 3)),
        Err(ScheduleError::InvalidActivity(_))
    ));
}

#[test]
fn update_recomputes_dates() {
    let mut s = Schedule::new();
    s.upsert("A", "A1", "Montaggio", "R1", 2, d(2025, 4, 22)).unwrap();

    let patch = ActivityPatch {
        duration_days: Some(3),
        start: Some(d(2025, 4, 24)),
        ..ActivityPatch::default()
    };
    let updated = s.update("A", "A1", patch).unwrap();
    // 25 April is a holiday and the weekend follows.
    assert_eq!(updated.start, d(2025, 4, 24));
    assert_eq!(updated.end, d(2025, 4, 29));
    assert_eq!(updated.name, "Montaggio");

    let bad = ActivityPatch {
        duration_days: Some(0),
        ..ActivityPatch::default()
    };
    assert_eq!(
        s.update("A", "A1", bad),
        Err(ScheduleError::InvalidDuration(0))
    );
    assert_eq!(s.get("A", "A1").unwrap().duration_days, 3);
}

#[test]
fn update_of_missing_activity_reports_not_found() {
    let mut s = Schedule::new();
    let patch = ActivityPatch {
        name: Some("Collaudo".into()),
        ..ActivityPatch::default()
    };
    assert_eq!(
        s.update("A", "A1", patch),
        Err(ScheduleError::NotFound {
            project: "A".into(),
            code: "A1".into()
        })
    );
}

#[test]
fn renaming_keeps_dates() {
    let mut s = Schedule::new();
    s.upsert("A", "A1", "Sopralluogo", "R1", 2, d(2025, 5, 5)).unwrap();
    let before = s.get("A", "A1").unwrap().clone();
    let patch = ActivityPatch {
        name: Some("Collaudo".into()),
        resource: Some("R2".into()),
        ..ActivityPatch::default()
    };
    let updated = s.update("A", "A1", patch).unwrap();
    assert_eq!(updated.name, "Collaudo");
    assert_eq!(updated.resource, "R2");
    assert_eq!((updated.start, updated.end), (before.start, before.end));
}

#[test]
fn start_near_end_of_date_range_is_rejected() {
    let mut s = Schedule::new();
    let late = NaiveDate::MAX - Duration::days(2);
    assert_eq!(
        s.upsert("A", "A1", "x", "R1", 10, late),
        Err(ScheduleError::DateOutOfRange(late))
    );
    assert!(s.is_empty());

    s.upsert("A", "A1", "x", "R1", 2, d(2025, 3, 3)).unwrap();
    let before = s.clone();
    let patch = ActivityPatch {
        start: Some(late),
        duration_days: Some(10),
        ..ActivityPatch::default()
    };
    assert_eq!(
        s.update("A", "A1", patch),
        Err(ScheduleError::DateOutOfRange(late))
    );
    assert_eq!(s, before);
}
