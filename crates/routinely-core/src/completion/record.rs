//! Per-(routine, date) completion record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::routine::RoutineId;

/// Progress for one routine on one calendar date.
///
/// Keyed by (routine_id, date); at most one record exists per key. A
/// record is created lazily on first interaction and deleted entirely
/// (not zeroed) when progress returns to the no-progress baseline.
///
/// Invariants, per routine kind:
/// - Counter: `0 <= current_count <= target_count`, and `is_completed`
///   iff the count reached the target.
/// - Timer: `0 <= elapsed_secs <= target_duration_secs`, and
///   `is_completed` iff the elapsed time reached the target.
/// - Toggle: the record exists iff `is_completed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub routine_id: RoutineId,
    pub date: NaiveDate,
    pub is_completed: bool,
    pub current_count: u32,
    pub elapsed_secs: u32,
}

impl CompletionRecord {
    /// A completed toggle record.
    pub fn toggled(routine_id: RoutineId, date: NaiveDate) -> Self {
        Self {
            routine_id,
            date,
            is_completed: true,
            current_count: 0,
            elapsed_secs: 0,
        }
    }

    /// A counter record; completion derived from the target.
    pub fn counted(routine_id: RoutineId, date: NaiveDate, count: u32, target: u32) -> Self {
        Self {
            routine_id,
            date,
            is_completed: count >= target,
            current_count: count,
            elapsed_secs: 0,
        }
    }

    /// A timer record; completion derived from the target.
    pub fn timed(routine_id: RoutineId, date: NaiveDate, elapsed_secs: u32, target: u32) -> Self {
        Self {
            routine_id,
            date,
            is_completed: elapsed_secs >= target,
            current_count: 0,
            elapsed_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counted_derives_completion_from_target() {
        let id = RoutineId::new();
        let date = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        assert!(!CompletionRecord::counted(id, date, 2, 3).is_completed);
        assert!(CompletionRecord::counted(id, date, 3, 3).is_completed);
    }

    #[test]
    fn timed_derives_completion_from_target() {
        let id = RoutineId::new();
        let date = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        assert!(!CompletionRecord::timed(id, date, 299, 300).is_completed);
        assert!(CompletionRecord::timed(id, date, 300, 300).is_completed);
    }
}
