//! Pure transition logic for toggle/increment/decrement interactions.
//!
//! Every mutating call writes through to the store synchronously; there
//! is no internal buffering. Mutations for dates after `Clock::today()`
//! are rejected with `FutureDateRejected` before any store access.

use chrono::NaiveDate;

use crate::clock::Clock;
use crate::completion::CompletionRecord;
use crate::error::{CoreError, Result};
use crate::routine::{Routine, RoutineKind};
use crate::store::CompletionStore;

/// Transition logic for per-day completion state.
///
/// Borrows its collaborators; construction is free, so callers typically
/// build one per operation.
pub struct CompletionStateMachine<'a> {
    store: &'a dyn CompletionStore,
    clock: &'a dyn Clock,
}

impl<'a> CompletionStateMachine<'a> {
    pub fn new(store: &'a dyn CompletionStore, clock: &'a dyn Clock) -> Self {
        Self { store, clock }
    }

    /// Flip a toggle routine for the given date.
    ///
    /// A completed record is deleted (un-complete); absence becomes a
    /// completed record. `toggle; toggle` restores the original absence.
    ///
    /// Returns the record state after the transition (`None` when the
    /// record was deleted).
    pub fn toggle(&self, routine: &Routine, date: NaiveDate) -> Result<Option<CompletionRecord>> {
        self.ensure_not_future(date)?;
        if !matches!(routine.kind, RoutineKind::Toggle) {
            return Err(kind_mismatch(routine, "toggle"));
        }
        match self.store.get(routine.id, date)? {
            Some(_) => {
                self.store.delete(routine.id, date)?;
                Ok(None)
            }
            None => {
                let record = CompletionRecord::toggled(routine.id, date);
                self.store.upsert(&record)?;
                Ok(Some(record))
            }
        }
    }

    /// Add one to a counter routine, clamped at the target.
    ///
    /// At the target this is a no-op and the stored record is unchanged.
    pub fn increment_counter(
        &self,
        routine: &Routine,
        date: NaiveDate,
    ) -> Result<Option<CompletionRecord>> {
        self.ensure_not_future(date)?;
        let RoutineKind::Counter { target_count } = routine.kind else {
            return Err(kind_mismatch(routine, "counter"));
        };
        let current = self
            .store
            .get(routine.id, date)?
            .map(|r| r.current_count)
            .unwrap_or(0);
        if current >= target_count {
            // Clamped; nothing written.
            return Ok(Some(CompletionRecord::counted(
                routine.id,
                date,
                current,
                target_count,
            )));
        }
        let record = CompletionRecord::counted(routine.id, date, current + 1, target_count);
        self.store.upsert(&record)?;
        Ok(Some(record))
    }

    /// Remove one from a counter routine.
    ///
    /// No record (or a zero count) is a no-op. Reaching zero deletes the
    /// record entirely; no zero-count record ever persists. Decrementing
    /// always clears completion, since the count can only have been at or
    /// below the target beforehand.
    pub fn decrement_counter(
        &self,
        routine: &Routine,
        date: NaiveDate,
    ) -> Result<Option<CompletionRecord>> {
        self.ensure_not_future(date)?;
        let RoutineKind::Counter { target_count } = routine.kind else {
            return Err(kind_mismatch(routine, "counter"));
        };
        let Some(existing) = self.store.get(routine.id, date)? else {
            return Ok(None);
        };
        if existing.current_count == 0 {
            return Ok(Some(existing));
        }
        let next = existing.current_count - 1;
        if next == 0 {
            self.store.delete(routine.id, date)?;
            return Ok(None);
        }
        let mut record = CompletionRecord::counted(routine.id, date, next, target_count);
        record.is_completed = false;
        self.store.upsert(&record)?;
        Ok(Some(record))
    }

    fn ensure_not_future(&self, date: NaiveDate) -> Result<()> {
        if date > self.clock.today() {
            return Err(CoreError::FutureDateRejected { date });
        }
        Ok(())
    }
}

fn kind_mismatch(routine: &Routine, expected: &'static str) -> CoreError {
    CoreError::KindMismatch {
        title: routine.title.clone(),
        expected,
        actual: routine.kind.name(),
    }
}
