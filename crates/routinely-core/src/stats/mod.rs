//! Statistics over the completion history.
//!
//! Rates, the weekly histogram, and streaks are derived on demand from
//! the active routine set and the stored completion records; nothing in
//! this module persists state or performs I/O.

mod engine;
mod streaks;

pub use engine::{RoutineStats, StatisticsEngine, StatsSnapshot};
pub use streaks::{current_streak, longest_streak, routine_streak};
