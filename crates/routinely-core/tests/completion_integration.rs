//! Integration tests for completion interactions through the tracker
//! facade: clamping, delete-on-empty, future-date policy, and the
//! mutation event stream.

use chrono::NaiveDate;
use routinely_core::{
    Config, CoreError, Database, Event, FixedClock, Routine, RoutineTracker,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 7).unwrap()
}

fn tracker_with(routines: &[Routine]) -> RoutineTracker<FixedClock> {
    let db = Database::open_memory().unwrap();
    for routine in routines {
        db.insert_routine(routine).unwrap();
    }
    RoutineTracker::new(db, FixedClock::new(today()), &Config::default())
}

#[tokio::test]
async fn water_counter_end_to_end() {
    let routine = Routine::counter("Water", 8).unwrap();
    let tracker = tracker_with(std::slice::from_ref(&routine));

    for _ in 0..9 {
        tracker.increment(routine.id, today()).unwrap();
    }

    let record = tracker.completion(routine.id, today()).unwrap().unwrap();
    assert_eq!(record.current_count, 8);
    assert!(record.is_completed);
}

#[tokio::test]
async fn toggle_pair_restores_absence_and_publishes_events() {
    let routine = Routine::toggle("Meditate");
    let tracker = tracker_with(std::slice::from_ref(&routine));
    let mut events = tracker.subscribe();

    tracker.toggle(routine.id, today()).unwrap();
    tracker.toggle(routine.id, today()).unwrap();
    assert!(tracker.completion(routine.id, today()).unwrap().is_none());

    match events.recv().await.unwrap() {
        Event::CompletionChanged { record, .. } => {
            assert!(record.unwrap().is_completed);
        }
        other => panic!("unexpected event: {other:?}"),
    }
    match events.recv().await.unwrap() {
        Event::CompletionChanged { record, .. } => assert!(record.is_none()),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn decrement_to_zero_deletes_the_record() {
    let routine = Routine::counter("Water", 3).unwrap();
    let tracker = tracker_with(std::slice::from_ref(&routine));

    tracker.increment(routine.id, today()).unwrap();
    assert!(tracker.completion(routine.id, today()).unwrap().is_some());

    let result = tracker.decrement(routine.id, today()).unwrap();
    assert!(result.is_none());
    assert!(tracker.completion(routine.id, today()).unwrap().is_none());
}

#[tokio::test]
async fn future_dated_mutations_are_rejected_and_store_untouched() {
    let toggle = Routine::toggle("Meditate");
    let counter = Routine::counter("Water", 3).unwrap();
    let tracker = tracker_with(&[toggle.clone(), counter.clone()]);
    let tomorrow = today().succ_opt().unwrap();

    assert!(matches!(
        tracker.toggle(toggle.id, tomorrow),
        Err(CoreError::FutureDateRejected { .. })
    ));
    assert!(matches!(
        tracker.increment(counter.id, tomorrow),
        Err(CoreError::FutureDateRejected { .. })
    ));
    assert!(tracker.completion(toggle.id, tomorrow).unwrap().is_none());
    assert!(tracker.completion(counter.id, tomorrow).unwrap().is_none());
}

#[tokio::test]
async fn unknown_routine_is_reported() {
    let tracker = tracker_with(&[]);
    let ghost = Routine::toggle("Ghost");
    assert!(matches!(
        tracker.toggle(ghost.id, today()),
        Err(CoreError::RoutineNotFound { .. })
    ));
}
