//! Read-only statistics aggregation.
//!
//! The engine is a pure function of (active routines, completion records
//! in the queried window, today, first day of week); it keeps no state
//! and reads nothing itself. Rates are integer percentages, floored and
//! capped at 100. Completions of routines that have since been
//! deactivated still count toward the numerators (the cap absorbs the
//! resulting overshoot), while streaks compare against the active set.

use std::collections::HashSet;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::streaks;
use crate::completion::CompletionRecord;
use crate::routine::{Routine, RoutineId};

/// Trailing window length for the monthly rate, in days. Fixed at 30
/// rather than the calendar month length.
const MONTHLY_WINDOW_DAYS: i64 = 30;

/// Per-routine slice of the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineStats {
    pub routine_id: RoutineId,
    /// Completions in the trailing 30-day window, as a percentage of 30.
    pub completion_rate: u32,
    /// Backward streak of this routine's own completions.
    pub streak: u32,
}

/// Derived statistics; recomputed on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub weekly_rate: u32,
    pub monthly_rate: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
    /// Fraction of routines completed on each day of the current week,
    /// index 0 = first day of the week.
    pub weekly_histogram: [f64; 7],
    pub per_routine: Vec<RoutineStats>,
}

/// Aggregator over the completion history.
#[derive(Debug, Clone, Default)]
pub struct StatisticsEngine;

impl StatisticsEngine {
    pub fn new() -> Self {
        Self
    }

    /// Assemble the full snapshot.
    pub fn snapshot(
        &self,
        routines: &[Routine],
        records: &[CompletionRecord],
        today: NaiveDate,
        week_start: Weekday,
    ) -> StatsSnapshot {
        let active: HashSet<RoutineId> = routines.iter().map(|r| r.id).collect();
        StatsSnapshot {
            weekly_rate: self.weekly_completion_rate(routines, records, today, week_start),
            monthly_rate: self.monthly_completion_rate(routines, records, today),
            current_streak: streaks::current_streak(&active, records, today),
            longest_streak: streaks::longest_streak(&active, records),
            weekly_histogram: self.weekly_histogram(routines, records, today, week_start),
            per_routine: routines
                .iter()
                .map(|routine| RoutineStats {
                    routine_id: routine.id,
                    completion_rate: self.per_routine_rate(routine.id, records, today),
                    streak: streaks::routine_streak(routine.id, records, today),
                })
                .collect(),
        }
    }

    /// Distinct completed (routine, date) pairs this week over
    /// `routine count x 7`, as a floored percentage capped at 100.
    pub fn weekly_completion_rate(
        &self,
        routines: &[Routine],
        records: &[CompletionRecord],
        today: NaiveDate,
        week_start: Weekday,
    ) -> u32 {
        let from = start_of_week(today, week_start);
        self.window_rate(routines, records, from, today, 7)
    }

    /// Same formula over a fixed 30-day trailing window.
    pub fn monthly_completion_rate(
        &self,
        routines: &[Routine],
        records: &[CompletionRecord],
        today: NaiveDate,
    ) -> u32 {
        let from = today - Duration::days(MONTHLY_WINDOW_DAYS - 1);
        self.window_rate(routines, records, from, today, MONTHLY_WINDOW_DAYS as u32)
    }

    /// Fraction of routines completed on each day of the current week.
    pub fn weekly_histogram(
        &self,
        routines: &[Routine],
        records: &[CompletionRecord],
        today: NaiveDate,
        week_start: Weekday,
    ) -> [f64; 7] {
        let mut histogram = [0.0; 7];
        if routines.is_empty() {
            return histogram;
        }
        let by_date = streaks::completed_by_date(records);
        let from = start_of_week(today, week_start);
        for (i, slot) in histogram.iter_mut().enumerate() {
            let day = from + Duration::days(i as i64);
            let done = by_date.get(&day).map(|set| set.len()).unwrap_or(0);
            *slot = (done as f64 / routines.len() as f64).min(1.0);
        }
        histogram
    }

    /// One routine's completions in the trailing 30-day window over 30,
    /// as a floored percentage capped at 100.
    pub fn per_routine_rate(
        &self,
        routine_id: RoutineId,
        records: &[CompletionRecord],
        today: NaiveDate,
    ) -> u32 {
        let from = today - Duration::days(MONTHLY_WINDOW_DAYS - 1);
        let completed: HashSet<NaiveDate> = records
            .iter()
            .filter(|r| {
                r.routine_id == routine_id && r.is_completed && r.date >= from && r.date <= today
            })
            .map(|r| r.date)
            .collect();
        ((completed.len() as u32 * 100) / MONTHLY_WINDOW_DAYS as u32).min(100)
    }

    /// Backward streak for a single routine.
    pub fn per_routine_streak(
        &self,
        routine_id: RoutineId,
        records: &[CompletionRecord],
        today: NaiveDate,
    ) -> u32 {
        streaks::routine_streak(routine_id, records, today)
    }

    fn window_rate(
        &self,
        routines: &[Routine],
        records: &[CompletionRecord],
        from: NaiveDate,
        to: NaiveDate,
        window_days: u32,
    ) -> u32 {
        if routines.is_empty() {
            return 0;
        }
        let pairs: HashSet<(RoutineId, NaiveDate)> = records
            .iter()
            .filter(|r| r.is_completed && r.date >= from && r.date <= to)
            .map(|r| (r.routine_id, r.date))
            .collect();
        let denominator = routines.len() as u32 * window_days;
        ((pairs.len() as u32 * 100) / denominator).min(100)
    }
}

/// Most recent `week_start` day at or before `today`.
fn start_of_week(today: NaiveDate, week_start: Weekday) -> NaiveDate {
    let offset = (7 + today.weekday().num_days_from_monday()
        - week_start.num_days_from_monday())
        % 7;
    today - Duration::days(offset as i64)
}
