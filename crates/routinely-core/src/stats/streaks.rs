//! Consecutive-day streak computations.
//!
//! A day counts toward the global streak iff the set of routines
//! completed on that day is exactly equal to the set of currently active
//! routines. Adding or removing a routine therefore retroactively changes
//! whether historical days count; that semantics is preserved on purpose.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;

use crate::completion::CompletionRecord;
use crate::routine::RoutineId;

/// Completed routine ids grouped by date.
pub(crate) fn completed_by_date(
    records: &[CompletionRecord],
) -> HashMap<NaiveDate, HashSet<RoutineId>> {
    let mut map: HashMap<NaiveDate, HashSet<RoutineId>> = HashMap::new();
    for record in records.iter().filter(|r| r.is_completed) {
        map.entry(record.date).or_default().insert(record.routine_id);
    }
    map
}

/// Consecutive counting days ending at `today`.
///
/// Walks backward day by day; stops at the first day whose completed set
/// is not exactly the active set (today included -- if today does not
/// count, the streak is 0).
pub fn current_streak(
    active: &HashSet<RoutineId>,
    records: &[CompletionRecord],
    today: NaiveDate,
) -> u32 {
    if active.is_empty() {
        return 0;
    }
    let by_date = completed_by_date(records);
    let mut streak = 0;
    let mut day = today;
    while by_date.get(&day).is_some_and(|done| done == active) {
        streak += 1;
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    streak
}

/// Longest run of consecutive calendar dates that each satisfy the same
/// exact-set-equality condition as [`current_streak`]. A calendar gap or
/// a non-matching day resets the running length.
pub fn longest_streak(active: &HashSet<RoutineId>, records: &[CompletionRecord]) -> u32 {
    if active.is_empty() {
        return 0;
    }
    let by_date = completed_by_date(records);
    let mut matching: Vec<NaiveDate> = by_date
        .iter()
        .filter(|(_, done)| *done == active)
        .map(|(date, _)| *date)
        .collect();
    matching.sort_unstable();

    let mut best = 0u32;
    let mut run = 0u32;
    let mut prev: Option<NaiveDate> = None;
    for date in matching {
        run = match prev {
            Some(p) if p.succ_opt() == Some(date) => run + 1,
            _ => 1,
        };
        best = best.max(run);
        prev = Some(date);
    }
    best
}

/// Backward streak of one routine's own completions, independent of any
/// other routine.
pub fn routine_streak(
    routine_id: RoutineId,
    records: &[CompletionRecord],
    today: NaiveDate,
) -> u32 {
    let completed: HashSet<NaiveDate> = records
        .iter()
        .filter(|r| r.routine_id == routine_id && r.is_completed)
        .map(|r| r.date)
        .collect();
    let mut streak = 0;
    let mut day = today;
    while completed.contains(&day) {
        streak += 1;
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    streak
}
