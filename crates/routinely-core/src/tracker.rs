//! Tracking facade.
//!
//! `RoutineTracker` wires the clock, the SQLite store, the completion
//! state machine, the timer actor, and the statistics engine into the
//! single entry point a UI layer consumes. Every successful mutation is
//! published on a broadcast channel, so statistics can be recomputed on
//! write instead of merging live observable streams.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{NaiveDate, Utc};
use tokio::sync::broadcast;

use crate::clock::{Clock, SystemClock};
use crate::completion::{CompletionRecord, CompletionStateMachine};
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::routine::{Routine, RoutineId};
use crate::stats::{StatisticsEngine, StatsSnapshot};
use crate::storage::{Config, Database};
use crate::store::{CompletionStore, RoutineRegistry};
use crate::timer::{TimerHandle, TimerSnapshot};

/// Capacity of the event broadcast channel; slow subscribers see
/// `RecvError::Lagged` rather than blocking writers.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Entry point over one database and one global timer session.
pub struct RoutineTracker<C: Clock + Clone + 'static = SystemClock> {
    store: Arc<Mutex<Database>>,
    clock: C,
    stats: StatisticsEngine,
    timer: TimerHandle,
    events: broadcast::Sender<Event>,
}

impl RoutineTracker<SystemClock> {
    /// Open the default database and spawn the timer actor with settings
    /// from the loaded configuration. Must be called within a tokio
    /// runtime.
    pub fn open() -> Result<Self> {
        let config = Config::load()?;
        let db = Database::open()?;
        let clock = SystemClock::with_week_start(config.week_start.as_weekday());
        Ok(Self::new(db, clock, &config))
    }
}

impl<C: Clock + Clone + 'static> RoutineTracker<C> {
    /// Wire a tracker over an opened database. Must be called within a
    /// tokio runtime (the timer actor is spawned here).
    pub fn new(db: Database, clock: C, config: &Config) -> Self {
        let store = Arc::new(Mutex::new(db));
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let timer = TimerHandle::spawn(
            store.clone(),
            clock.clone(),
            events.clone(),
            config.timer.checkpoint_interval_secs,
        );
        Self {
            store,
            clock,
            stats: StatisticsEngine::new(),
            timer,
            events,
        }
    }

    /// Subscribe to mutation events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    // ── Completion interactions ──────────────────────────────────────

    pub fn toggle(&self, routine_id: RoutineId, date: NaiveDate) -> Result<Option<CompletionRecord>> {
        let routine = self.routine(routine_id)?;
        let record = {
            let store = self.store();
            CompletionStateMachine::new(&*store, &self.clock).toggle(&routine, date)?
        };
        self.publish_completion(routine_id, date, record.clone());
        Ok(record)
    }

    pub fn increment(
        &self,
        routine_id: RoutineId,
        date: NaiveDate,
    ) -> Result<Option<CompletionRecord>> {
        let routine = self.routine(routine_id)?;
        let record = {
            let store = self.store();
            CompletionStateMachine::new(&*store, &self.clock).increment_counter(&routine, date)?
        };
        self.publish_completion(routine_id, date, record.clone());
        Ok(record)
    }

    pub fn decrement(
        &self,
        routine_id: RoutineId,
        date: NaiveDate,
    ) -> Result<Option<CompletionRecord>> {
        let routine = self.routine(routine_id)?;
        let record = {
            let store = self.store();
            CompletionStateMachine::new(&*store, &self.clock).decrement_counter(&routine, date)?
        };
        self.publish_completion(routine_id, date, record.clone());
        Ok(record)
    }

    // ── Timer session ────────────────────────────────────────────────

    pub async fn start_timer(&self, routine_id: RoutineId, date: NaiveDate) -> Result<()> {
        let routine = self.routine(routine_id)?;
        self.timer.start(routine, date).await
    }

    pub async fn pause_timer(&self) -> Result<Option<CompletionRecord>> {
        self.timer.pause().await
    }

    pub async fn reset_timer(&self, routine_id: RoutineId, date: NaiveDate) -> Result<()> {
        self.timer.reset(routine_id, date).await
    }

    pub fn timer_snapshot(&self) -> TimerSnapshot {
        self.timer.snapshot()
    }

    pub fn timer(&self) -> &TimerHandle {
        &self.timer
    }

    // ── Routine editor passthrough ───────────────────────────────────

    pub fn insert_routine(&self, routine: &Routine) -> Result<()> {
        Ok(self.store().insert_routine(routine)?)
    }

    pub fn update_routine(&self, routine: &Routine) -> Result<()> {
        Ok(self.store().update_routine(routine)?)
    }

    /// Permanently delete a routine and its completion history.
    pub fn delete_routine(&self, routine_id: RoutineId) -> Result<()> {
        Ok(self.store().delete_routine(routine_id)?)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn active_routines(&self) -> Result<Vec<Routine>> {
        Ok(self.store().list_active()?)
    }

    pub fn completion(
        &self,
        routine_id: RoutineId,
        date: NaiveDate,
    ) -> Result<Option<CompletionRecord>> {
        Ok(self.store().get(routine_id, date)?)
    }

    /// Recompute statistics from the current store contents.
    pub fn stats_snapshot(&self) -> Result<StatsSnapshot> {
        let (routines, records) = {
            let store = self.store();
            (store.list_active()?, store.all_completions()?)
        };
        Ok(self.stats.snapshot(
            &routines,
            &records,
            self.clock.today(),
            self.clock.first_day_of_week(),
        ))
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn routine(&self, routine_id: RoutineId) -> Result<Routine> {
        self.store()
            .find(routine_id)?
            .ok_or(CoreError::RoutineNotFound { routine_id })
    }

    fn store(&self) -> MutexGuard<'_, Database> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish_completion(
        &self,
        routine_id: RoutineId,
        date: NaiveDate,
        record: Option<CompletionRecord>,
    ) {
        let _ = self.events.send(Event::CompletionChanged {
            routine_id,
            date,
            record,
            at: Utc::now(),
        });
    }
}
