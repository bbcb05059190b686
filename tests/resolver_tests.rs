use chrono::{Duration, NaiveDate};
use commesse_planner::{ConflictResolver, Reschedule, Schedule};
use proptest::prelude::*;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn two_projects_on_one_resource() -> Schedule {
    let mut s = Schedule::new();
    s.upsert("A", "A1", "Sopralluogo", "R1", 5, d(2025, 1, 2)).unwrap();
    s.upsert("B", "B1", "Montaggio", "R1", 3, d(2025, 1, 6)).unwrap();
    s
}

#[test]
fn cross_project_overlap_is_pushed_and_logged() {
    let mut s = two_projects_on_one_resource();
    // Epiphany moves B1 onto Tuesday 7 January.
    assert_eq!(s.get("A", "A1").unwrap().end, d(2025, 1, 9));
    assert_eq!(s.get("B", "B1").unwrap().start, d(2025, 1, 7));

    let log = s.resolve_conflicts();

    let b1 = s.get("B", "B1").unwrap();
    assert_eq!(b1.start, d(2025, 1, 10));
    assert_eq!(b1.end, d(2025, 1, 14));
    assert_eq!(s.get("A", "A1").unwrap().start, d(2025, 1, 2));
    assert_eq!(
        log,
        vec![Reschedule {
            resource: "R1".into(),
            project: "B".into(),
            code: "B1".into(),
            from: d(2025, 1, 7),
            to: d(2025, 1, 10),
        }]
    );
    assert_eq!(
        log[0].to_string(),
        "Resource 'R1': moved activity 'B1' of project 'B' from 07/01 to 10/01"
    );
}

#[test]
fn different_resources_never_conflict() {
    let mut s = Schedule::new();
    s.upsert("A", "A1", "x", "R1", 5, d(2025, 1, 2)).unwrap();
    s.upsert("B", "B1", "x", "R2", 3, d(2025, 1, 2)).unwrap();
    let before = s.clone();
    assert!(s.resolve_conflicts().is_empty());
    assert_eq!(s, before);
}

#[test]
fn ties_keep_insertion_order() {
    let mut s = Schedule::new();
    s.upsert("B", "B1", "x", "R1", 2, d(2025, 3, 3)).unwrap();
    s.upsert("A", "A1", "x", "R1", 2, d(2025, 3, 3)).unwrap();

    let log = s.resolve_conflicts();
    assert_eq!(s.get("B", "B1").unwrap().start, d(2025, 3, 3));
    assert_eq!(s.get("A", "A1").unwrap().start, d(2025, 3, 5));
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].code, "A1");
}

#[test]
fn touching_intervals_are_compatible() {
    let mut s = Schedule::new();
    // A1 ends on Wednesday 5 March, B1 starts that same day.
    s.upsert("A", "A1", "x", "R1", 3, d(2025, 3, 3)).unwrap();
    s.upsert("B", "B1", "x", "R1", 2, d(2025, 3, 5)).unwrap();
    assert!(s.resolve_conflicts().is_empty());
    assert_eq!(s.get("B", "B1").unwrap().start, d(2025, 3, 5));
}

#[test]
fn second_run_adds_no_entries() {
    let mut s = two_projects_on_one_resource();
    s.upsert("A", "A2", "x", "R1", 2, d(2025, 1, 8)).unwrap();
    s.upsert("C", "C1", "x", "R1", 4, d(2025, 1, 3)).unwrap();

    let first = s.resolve_conflicts();
    assert!(!first.is_empty());
    let settled = s.clone();
    assert!(s.resolve_conflicts().is_empty());
    assert_eq!(s, settled);
}

#[test]
fn non_destructive_resolution_matches_in_place() {
    let original = two_projects_on_one_resource();
    let resolution = ConflictResolver::new().resolve(&original);

    let mut in_place = original.clone();
    let log = ConflictResolver::new().resolve_in_place(&mut in_place);

    assert_eq!(resolution.schedule, in_place);
    assert_eq!(resolution.log, log);
    assert_ne!(original, in_place);
}

#[test]
fn shift_past_last_date_is_skipped() {
    let mut s = Schedule::new();
    let calendar = s.calendar().clone();
    let mut working = Vec::new();
    let mut day = NaiveDate::MAX;
    while working.len() < 2 {
        if calendar.is_working_day(day) {
            working.push(day);
        }
        day = day.pred_opt().unwrap();
    }
    let (last, second_last) = (working[0], working[1]);
    s.upsert("A", "A1", "x", "R1", 2, second_last).unwrap();
    s.upsert("B", "B1", "x", "R1", 1, second_last).unwrap();
    assert_eq!(s.get("A", "A1").unwrap().end, last);

    let before = s.clone();
    let log = s.resolve_conflicts();
    assert!(log.is_empty());
    assert_eq!(s, before);
}

#[derive(Debug, Clone)]
struct Planned {
    project: usize,
    resource: usize,
    duration: i64,
    offset: i64,
}

fn plans() -> impl Strategy<Value = Vec<Planned>> {
    prop::collection::vec(
        (0usize..3, 0usize..2, 1i64..6, 0i64..30).prop_map(|(project, resource, duration, offset)| {
            Planned {
                project,
                resource,
                duration,
                offset,
            }
        }),
        1..12,
    )
}

fn build(plans: &[Planned]) -> Schedule {
    let mut s = Schedule::new();
    for (i, plan) in plans.iter().enumerate() {
        s.upsert(
            &format!("P{}", plan.project),
            &format!("X{i}"),
            "x",
            &format!("R{}", plan.resource),
            plan.duration,
            d(2025, 3, 3) + Duration::days(plan.offset),
        )
        .unwrap();
    }
    s
}

proptest! {
    #[test]
    fn resolved_activities_on_a_resource_do_not_overlap(plans in plans()) {
        let mut s = build(&plans);
        s.resolve_conflicts();

        let activities: Vec<_> = s.activities().collect();
        for (i, (_, a)) in activities.iter().enumerate() {
            prop_assert!(s.calendar().is_working_day(a.start));
            prop_assert_eq!(
                s.calendar().count_working_days(a.start, a.end),
                a.duration_days as usize
            );
            for (_, b) in &activities[i + 1..] {
                if a.resource == b.resource {
                    prop_assert!(a.is_compatible_with(b), "{a:?} overlaps {b:?}");
                }
            }
        }
    }

    #[test]
    fn activities_only_move_forward(plans in plans()) {
        let before = build(&plans);
        let resolution = ConflictResolver::new().resolve(&before);
        for (project, activity) in before.activities() {
            let after = resolution.schedule.get(project, &activity.code).unwrap();
            prop_assert!(after.start >= activity.start);
            prop_assert_eq!(after.duration_days, activity.duration_days);
        }
        for entry in &resolution.log {
            prop_assert!(entry.to > entry.from);
        }
    }
}
