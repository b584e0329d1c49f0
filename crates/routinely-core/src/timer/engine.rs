//! Timer engine state machine.
//!
//! The engine owns the single in-memory [`TimerSession`] and is ticked
//! externally once per second -- it performs no I/O and spawns no tasks.
//! The actor in [`crate::timer::actor`] drives it and writes the
//! checkpoint records it hands back.
//!
//! ## State transitions
//!
//! ```text
//! Idle -> Running -> Idle        (pause: final checkpoint persisted)
//! Idle -> Running -> Completed   (target reached)
//! ```
//!
//! Pausing destroys the session after a final checkpoint; "paused"
//! progress lives in the store and is picked up by the next `start`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::completion::CompletionRecord;
use crate::error::{CoreError, Result};
use crate::routine::{Routine, RoutineId, RoutineKind};

/// Default tick count between durable checkpoints.
///
/// On abrupt termination at most `DEFAULT_CHECKPOINT_INTERVAL - 1`
/// seconds of progress are lost.
pub const DEFAULT_CHECKPOINT_INTERVAL: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Completed,
}

/// The single system-wide timer session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSession {
    pub routine_id: RoutineId,
    pub running: bool,
    pub elapsed_secs: u32,
    pub target_secs: u32,
    /// Date captured at session start. Every checkpoint for this session
    /// targets this date, regardless of what date the user views later.
    pub anchor_date: NaiveDate,
}

/// Point-in-time view of the engine, published to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub routine_id: Option<RoutineId>,
    pub elapsed_secs: u32,
    pub target_secs: u32,
    pub anchor_date: Option<NaiveDate>,
}

/// What a tick produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// One second elapsed; no durable write due.
    Progress { elapsed_secs: u32 },
    /// One second elapsed and a checkpoint write is due.
    Checkpoint { record: CompletionRecord },
    /// The target was reached: final checkpoint, session destroyed.
    Completed { record: CompletionRecord },
}

/// Core timer state machine.
#[derive(Debug, Clone)]
pub struct TimerEngine {
    state: TimerState,
    session: Option<TimerSession>,
    checkpoint_interval: u32,
}

impl TimerEngine {
    pub fn new() -> Self {
        Self::with_checkpoint_interval(DEFAULT_CHECKPOINT_INTERVAL)
    }

    /// Checkpoint every `interval` ticks (clamped to at least 1).
    pub fn with_checkpoint_interval(interval: u32) -> Self {
        Self {
            state: TimerState::Idle,
            session: None,
            checkpoint_interval: interval.max(1),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn session(&self) -> Option<&TimerSession> {
        self.session.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            state: self.state,
            routine_id: self.session.as_ref().map(|s| s.routine_id),
            elapsed_secs: self.session.as_ref().map(|s| s.elapsed_secs).unwrap_or(0),
            target_secs: self.session.as_ref().map(|s| s.target_secs).unwrap_or(0),
            anchor_date: self.session.as_ref().map(|s| s.anchor_date),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a session for a timer routine, resuming from any previously
    /// persisted elapsed time for (routine, date).
    ///
    /// Fails with `FutureDateRejected` when `date` is after `today`, and
    /// with `AlreadyRunning` when a session is running -- for this or any
    /// other routine. The running session is left untouched; the caller
    /// must pause or reset it first.
    pub fn start(
        &mut self,
        routine: &Routine,
        date: NaiveDate,
        today: NaiveDate,
        resume_from_secs: u32,
    ) -> Result<&TimerSession> {
        if date > today {
            return Err(CoreError::FutureDateRejected { date });
        }
        if self.state == TimerState::Running {
            if let Some(session) = &self.session {
                return Err(CoreError::AlreadyRunning {
                    routine_id: session.routine_id,
                });
            }
        }
        let RoutineKind::Timer {
            target_duration_secs,
        } = routine.kind
        else {
            return Err(CoreError::KindMismatch {
                title: routine.title.clone(),
                expected: "timer",
                actual: routine.kind.name(),
            });
        };
        self.state = TimerState::Running;
        Ok(self.session.insert(TimerSession {
            routine_id: routine.id,
            running: true,
            elapsed_secs: resume_from_secs.min(target_duration_secs),
            target_secs: target_duration_secs,
            anchor_date: date,
        }))
    }

    /// Advance the session by one second.
    ///
    /// Returns `None` when no session is running. Elapsed time never
    /// exceeds the target; reaching the target completes the session and
    /// yields the final record exactly once.
    pub fn tick(&mut self) -> Option<TickOutcome> {
        if self.state != TimerState::Running {
            return None;
        }
        let session = self.session.as_mut()?;
        session.elapsed_secs = (session.elapsed_secs + 1).min(session.target_secs);

        if session.elapsed_secs >= session.target_secs {
            let record = checkpoint_record(session);
            session.running = false;
            self.state = TimerState::Completed;
            self.session = None;
            return Some(TickOutcome::Completed { record });
        }
        if session.elapsed_secs % self.checkpoint_interval == 0 {
            let record = checkpoint_record(session);
            return Some(TickOutcome::Checkpoint { record });
        }
        Some(TickOutcome::Progress {
            elapsed_secs: session.elapsed_secs,
        })
    }

    /// Stop the session, handing back a final checkpoint for the caller
    /// to persist. `None` when nothing was running.
    pub fn pause(&mut self) -> Option<CompletionRecord> {
        if self.state != TimerState::Running {
            return None;
        }
        let session = self.session.take()?;
        self.state = TimerState::Idle;
        Some(checkpoint_record(&session))
    }

    /// Drop any in-memory session, whatever the current state. Deleting
    /// the persisted record is the caller's responsibility.
    pub fn reset(&mut self) {
        self.state = TimerState::Idle;
        self.session = None;
    }
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn checkpoint_record(session: &TimerSession) -> CompletionRecord {
    CompletionRecord::timed(
        session.routine_id,
        session.anchor_date,
        session.elapsed_secs,
        session.target_secs,
    )
}
