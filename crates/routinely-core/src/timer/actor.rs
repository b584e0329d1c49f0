//! Timer actor task.
//!
//! The engine's session is owned by one dedicated tokio task; start,
//! pause, and reset arrive as messages, so no shared mutable timer state
//! exists outside the task. A 1-second interval drives ticks while a
//! session is running, and checkpoint records handed back by the engine
//! are written to the completion store.
//!
//! A failed checkpoint write does not stop the tick loop -- the next
//! periodic checkpoint retries. The error is logged, remembered, and
//! surfaced to the caller of the next explicit pause or reset.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{NaiveDate, Utc};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{Duration, Instant, Interval};
use tracing::{debug, info, warn};

use super::engine::{TickOutcome, TimerEngine, TimerSnapshot};
use crate::clock::Clock;
use crate::completion::CompletionRecord;
use crate::error::{CoreError, Result, StoreError};
use crate::events::Event;
use crate::routine::{Routine, RoutineId};
use crate::store::CompletionStore;

enum Command {
    Start {
        routine: Routine,
        date: NaiveDate,
        reply: oneshot::Sender<Result<()>>,
    },
    Pause {
        reply: oneshot::Sender<Result<Option<CompletionRecord>>>,
    },
    Reset {
        routine_id: RoutineId,
        date: NaiveDate,
        reply: oneshot::Sender<Result<()>>,
    },
}

/// Client half of the timer actor.
///
/// Cheap to clone; all clones talk to the same single session.
#[derive(Clone)]
pub struct TimerHandle {
    tx: mpsc::Sender<Command>,
    snapshot_rx: watch::Receiver<TimerSnapshot>,
}

impl TimerHandle {
    /// Spawn the actor task. Must be called within a tokio runtime.
    pub fn spawn<S, C>(
        store: Arc<Mutex<S>>,
        clock: C,
        events: broadcast::Sender<Event>,
        checkpoint_interval: u32,
    ) -> Self
    where
        S: CompletionStore + Send + 'static,
        C: Clock + 'static,
    {
        let engine = TimerEngine::with_checkpoint_interval(checkpoint_interval);
        let (snapshot_tx, snapshot_rx) = watch::channel(engine.snapshot());
        let (tx, rx) = mpsc::channel(16);
        let actor = TimerActor {
            engine,
            store,
            clock,
            events,
            snapshot_tx,
            pending_store_error: None,
        };
        tokio::spawn(actor.run(rx));
        Self { tx, snapshot_rx }
    }

    /// Start (or resume) a session for a timer routine.
    pub async fn start(&self, routine: Routine, date: NaiveDate) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Start {
                routine,
                date,
                reply,
            })
            .await
            .map_err(|_| CoreError::TimerUnavailable)?;
        rx.await.map_err(|_| CoreError::TimerUnavailable)?
    }

    /// Stop the running session, persisting a final checkpoint.
    ///
    /// Returns the persisted record, or `None` when nothing was running.
    pub async fn pause(&self) -> Result<Option<CompletionRecord>> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Pause { reply })
            .await
            .map_err(|_| CoreError::TimerUnavailable)?;
        rx.await.map_err(|_| CoreError::TimerUnavailable)?
    }

    /// Clear the session and delete the persisted record for
    /// (routine, date), regardless of current session state.
    pub async fn reset(&self, routine_id: RoutineId, date: NaiveDate) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Reset {
                routine_id,
                date,
                reply,
            })
            .await
            .map_err(|_| CoreError::TimerUnavailable)?;
        rx.await.map_err(|_| CoreError::TimerUnavailable)?
    }

    /// Latest session snapshot.
    pub fn snapshot(&self) -> TimerSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Watch channel for session snapshots (one update per actor step).
    pub fn watch(&self) -> watch::Receiver<TimerSnapshot> {
        self.snapshot_rx.clone()
    }
}

struct TimerActor<S, C> {
    engine: TimerEngine,
    store: Arc<Mutex<S>>,
    clock: C,
    events: broadcast::Sender<Event>,
    snapshot_tx: watch::Sender<TimerSnapshot>,
    pending_store_error: Option<StoreError>,
}

impl<S, C> TimerActor<S, C>
where
    S: CompletionStore + Send + 'static,
    C: Clock + 'static,
{
    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        let mut ticker: Option<Interval> = None;
        loop {
            tokio::select! {
                cmd = rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd, &mut ticker),
                    None => break,
                },
                _ = next_tick(&mut ticker) => self.handle_tick(&mut ticker),
            }
            let _ = self.snapshot_tx.send(self.engine.snapshot());
        }
    }

    fn handle_command(&mut self, cmd: Command, ticker: &mut Option<Interval>) {
        match cmd {
            Command::Start {
                routine,
                date,
                reply,
            } => {
                let _ = reply.send(self.start(routine, date, ticker));
            }
            Command::Pause { reply } => {
                let _ = reply.send(self.pause(ticker));
            }
            Command::Reset {
                routine_id,
                date,
                reply,
            } => {
                let _ = reply.send(self.reset(routine_id, date, ticker));
            }
        }
    }

    fn start(
        &mut self,
        routine: Routine,
        date: NaiveDate,
        ticker: &mut Option<Interval>,
    ) -> Result<()> {
        let today = self.clock.today();
        if date > today {
            return Err(CoreError::FutureDateRejected { date });
        }
        if let Some(session) = self.engine.session().filter(|_| self.engine.is_running()) {
            return Err(CoreError::AlreadyRunning {
                routine_id: session.routine_id,
            });
        }
        let resume_from = self
            .store()
            .get(routine.id, date)?
            .map(|r| r.elapsed_secs)
            .unwrap_or(0);
        let session = self.engine.start(&routine, date, today, resume_from)?;
        let (target_secs, routine_id) = (session.target_secs, session.routine_id);
        info!(%routine_id, %date, resume_from, "timer session started");
        *ticker = Some(tokio::time::interval_at(
            Instant::now() + Duration::from_secs(1),
            Duration::from_secs(1),
        ));
        let _ = self.events.send(Event::TimerStarted {
            routine_id,
            date,
            resumed_from_secs: resume_from,
            target_secs,
            at: Utc::now(),
        });
        Ok(())
    }

    fn pause(&mut self, ticker: &mut Option<Interval>) -> Result<Option<CompletionRecord>> {
        *ticker = None;
        let record = self.engine.pause();
        if let Some(record) = &record {
            self.store().upsert(record)?;
            info!(routine_id = %record.routine_id, elapsed = record.elapsed_secs, "timer session paused");
            let _ = self.events.send(Event::TimerPaused {
                routine_id: record.routine_id,
                date: record.date,
                elapsed_secs: record.elapsed_secs,
                at: Utc::now(),
            });
        }
        if let Some(err) = self.pending_store_error.take() {
            return Err(err.into());
        }
        Ok(record)
    }

    fn reset(
        &mut self,
        routine_id: RoutineId,
        date: NaiveDate,
        ticker: &mut Option<Interval>,
    ) -> Result<()> {
        *ticker = None;
        self.engine.reset();
        self.store().delete(routine_id, date)?;
        info!(%routine_id, %date, "timer session reset");
        let _ = self.events.send(Event::TimerReset {
            routine_id,
            date,
            at: Utc::now(),
        });
        if let Some(err) = self.pending_store_error.take() {
            return Err(err.into());
        }
        Ok(())
    }

    fn handle_tick(&mut self, ticker: &mut Option<Interval>) {
        match self.engine.tick() {
            Some(TickOutcome::Progress { .. }) => {}
            Some(TickOutcome::Checkpoint { record }) => {
                let upsert_result = self.store().upsert(&record);
                match upsert_result {
                    Ok(()) => {
                        debug!(
                            routine_id = %record.routine_id,
                            elapsed = record.elapsed_secs,
                            "checkpoint written"
                        );
                    }
                    Err(err) => {
                        warn!(%err, "checkpoint write failed; will retry at next checkpoint");
                        self.pending_store_error = Some(err);
                    }
                }
                let _ = self.events.send(Event::TimerCheckpointed {
                    routine_id: record.routine_id,
                    date: record.date,
                    elapsed_secs: record.elapsed_secs,
                    at: Utc::now(),
                });
            }
            Some(TickOutcome::Completed { record }) => {
                *ticker = None;
                let upsert_result = self.store().upsert(&record);
                match upsert_result {
                    Ok(()) => {
                        info!(routine_id = %record.routine_id, "timer session completed");
                    }
                    Err(err) => {
                        warn!(%err, "final checkpoint write failed");
                        self.pending_store_error = Some(err);
                    }
                }
                let _ = self.events.send(Event::TimerCompleted {
                    routine_id: record.routine_id,
                    date: record.date,
                    target_secs: record.elapsed_secs,
                    at: Utc::now(),
                });
            }
            None => *ticker = None,
        }
    }

    fn store(&self) -> MutexGuard<'_, S> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
