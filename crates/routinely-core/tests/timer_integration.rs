//! Integration tests for the timer actor under paused tokio time.
//!
//! Time is virtual: sleeping in the test deterministically fires the
//! actor's 1-second interval for every elapsed virtual second, so tick
//! counts and checkpoint cadence can be asserted exactly. Sleeps land on
//! half-second offsets so a tick deadline is never tied with the test
//! waking up.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;
use routinely_core::timer::TimerHandle;
use routinely_core::{
    CompletionStore, CoreError, Database, FixedClock, Routine, TimerState,
};
use tokio::sync::broadcast;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 7).unwrap()
}

fn spawn_timer() -> (TimerHandle, Arc<Mutex<Database>>) {
    let store = Arc::new(Mutex::new(Database::open_memory().unwrap()));
    let (events, _) = broadcast::channel(64);
    let handle = TimerHandle::spawn(store.clone(), FixedClock::new(today()), events, 5);
    (handle, store)
}

fn insert(store: &Arc<Mutex<Database>>, routine: &Routine) {
    store.lock().unwrap().insert_routine(routine).unwrap();
}

fn stored_elapsed(store: &Arc<Mutex<Database>>, routine: &Routine) -> Option<u32> {
    store
        .lock()
        .unwrap()
        .get(routine.id, today())
        .unwrap()
        .map(|r| r.elapsed_secs)
}

#[tokio::test(start_paused = true)]
async fn checkpoints_every_fifth_second() {
    let (timer, store) = spawn_timer();
    let routine = Routine::timer("Stretch", 60).unwrap();
    insert(&store, &routine);

    timer.start(routine.clone(), today()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(12_500)).await;

    let snapshot = timer.snapshot();
    assert_eq!(snapshot.state, TimerState::Running);
    assert_eq!(snapshot.elapsed_secs, 12);
    // Last durable checkpoint was at 10; at most 4 seconds are at risk.
    assert_eq!(stored_elapsed(&store, &routine), Some(10));
}

#[tokio::test(start_paused = true)]
async fn reaching_target_completes_once_and_stops_ticking() {
    let (timer, store) = spawn_timer();
    let routine = Routine::timer("Stretch", 7).unwrap();
    insert(&store, &routine);

    timer.start(routine.clone(), today()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20_500)).await;

    let snapshot = timer.snapshot();
    assert_eq!(snapshot.state, TimerState::Completed);
    let record = store
        .lock()
        .unwrap()
        .get(routine.id, today())
        .unwrap()
        .unwrap();
    assert_eq!(record.elapsed_secs, 7);
    assert!(record.is_completed);
}

#[tokio::test(start_paused = true)]
async fn second_start_is_rejected_and_leaves_session_untouched() {
    let (timer, store) = spawn_timer();
    let first = Routine::timer("Stretch", 60).unwrap();
    let second = Routine::timer("Read", 30).unwrap();
    insert(&store, &first);
    insert(&store, &second);

    timer.start(first.clone(), today()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(3_500)).await;

    let err = timer.start(second, today()).await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::AlreadyRunning { routine_id } if routine_id == first.id
    ));

    let snapshot = timer.snapshot();
    assert_eq!(snapshot.routine_id, Some(first.id));
    assert_eq!(snapshot.elapsed_secs, 3);
    assert_eq!(snapshot.anchor_date, Some(today()));
}

#[tokio::test(start_paused = true)]
async fn pause_persists_a_final_checkpoint_and_start_resumes_from_it() {
    let (timer, store) = spawn_timer();
    let routine = Routine::timer("Stretch", 60).unwrap();
    insert(&store, &routine);

    timer.start(routine.clone(), today()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(3_500)).await;

    let record = timer.pause().await.unwrap().unwrap();
    assert_eq!(record.elapsed_secs, 3);
    assert!(!record.is_completed);
    assert_eq!(stored_elapsed(&store, &routine), Some(3));
    assert_eq!(timer.snapshot().state, TimerState::Idle);

    // Restart picks up the persisted progress.
    timer.start(routine.clone(), today()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(2_500)).await;
    assert_eq!(timer.snapshot().elapsed_secs, 5);
}

#[tokio::test(start_paused = true)]
async fn checkpoints_follow_the_anchor_date() {
    let (timer, store) = spawn_timer();
    let routine = Routine::timer("Stretch", 60).unwrap();
    insert(&store, &routine);
    let yesterday = today().pred_opt().unwrap();

    timer.start(routine.clone(), yesterday).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5_500)).await;

    let store = store.lock().unwrap();
    let anchored = store.get(routine.id, yesterday).unwrap();
    assert_eq!(anchored.map(|r| r.elapsed_secs), Some(5));
    assert!(store.get(routine.id, today()).unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn reset_clears_session_and_deletes_the_record() {
    let (timer, store) = spawn_timer();
    let routine = Routine::timer("Stretch", 60).unwrap();
    insert(&store, &routine);

    timer.start(routine.clone(), today()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(6_500)).await;
    assert_eq!(stored_elapsed(&store, &routine), Some(5));

    timer.reset(routine.id, today()).await.unwrap();
    assert_eq!(timer.snapshot().state, TimerState::Idle);
    assert_eq!(stored_elapsed(&store, &routine), None);
}

#[tokio::test(start_paused = true)]
async fn future_dated_start_is_rejected() {
    let (timer, store) = spawn_timer();
    let routine = Routine::timer("Stretch", 60).unwrap();
    insert(&store, &routine);
    let tomorrow = today().succ_opt().unwrap();

    let err = timer.start(routine, tomorrow).await.unwrap_err();
    assert!(matches!(err, CoreError::FutureDateRejected { .. }));
    assert_eq!(timer.snapshot().state, TimerState::Idle);
}

#[tokio::test(start_paused = true)]
async fn pause_when_idle_is_a_noop() {
    let (timer, _store) = spawn_timer();
    assert!(timer.pause().await.unwrap().is_none());
}
