//! Mutation events.
//!
//! Every write to the completion store produces an [`Event`]. The tracker
//! publishes them on a broadcast channel so consumers (a UI layer, a
//! statistics recomputation hook) can react to writes without the core
//! depending on any reactive framework.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::completion::CompletionRecord;
use crate::routine::RoutineId;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A toggle/increment/decrement changed (or deleted) a record.
    CompletionChanged {
        routine_id: RoutineId,
        date: NaiveDate,
        /// Record state after the write; `None` when it was deleted.
        record: Option<CompletionRecord>,
        at: DateTime<Utc>,
    },
    TimerStarted {
        routine_id: RoutineId,
        date: NaiveDate,
        resumed_from_secs: u32,
        target_secs: u32,
        at: DateTime<Utc>,
    },
    /// Periodic durable write of in-progress timer state.
    TimerCheckpointed {
        routine_id: RoutineId,
        date: NaiveDate,
        elapsed_secs: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        routine_id: RoutineId,
        date: NaiveDate,
        elapsed_secs: u32,
        at: DateTime<Utc>,
    },
    TimerCompleted {
        routine_id: RoutineId,
        date: NaiveDate,
        target_secs: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        routine_id: RoutineId,
        date: NaiveDate,
        at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = Event::TimerCheckpointed {
            routine_id: RoutineId::new(),
            date: NaiveDate::from_ymd_opt(2026, 8, 7).unwrap(),
            elapsed_secs: 10,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "TimerCheckpointed");
        assert_eq!(json["elapsed_secs"], 10);
    }
}
