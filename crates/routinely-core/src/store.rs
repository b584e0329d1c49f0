//! Persistence collaborator traits.
//!
//! The completion state machine, timer, and statistics engine talk to
//! storage exclusively through these traits. The SQLite implementation
//! lives in [`crate::storage::Database`]; tests may substitute their own.

use chrono::NaiveDate;

use crate::completion::CompletionRecord;
use crate::error::StoreError;
use crate::routine::{Routine, RoutineId};

/// Key-value access to completion records by (routine, date).
///
/// At most one record exists per (routine, date); `upsert` must replace
/// any previous record for the same key.
pub trait CompletionStore {
    fn get(
        &self,
        routine_id: RoutineId,
        date: NaiveDate,
    ) -> Result<Option<CompletionRecord>, StoreError>;

    fn upsert(&self, record: &CompletionRecord) -> Result<(), StoreError>;

    fn delete(&self, routine_id: RoutineId, date: NaiveDate) -> Result<(), StoreError>;

    /// All records with `from <= date <= to`, any routine.
    fn query_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CompletionRecord>, StoreError>;

    /// All records for one routine with `from <= date <= to`.
    fn query_by_routine(
        &self,
        routine_id: RoutineId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CompletionRecord>, StoreError>;
}

/// Read access to the set of defined routines.
pub trait RoutineRegistry {
    /// Routines with the active flag set.
    fn list_active(&self) -> Result<Vec<Routine>, StoreError>;

    /// Look up one routine. Named `find` rather than `get` so it cannot
    /// collide with [`CompletionStore::get`] on types implementing both.
    fn find(&self, routine_id: RoutineId) -> Result<Option<Routine>, StoreError>;
}
