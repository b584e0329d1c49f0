//! # Routinely Core Library
//!
//! This library provides the core business logic for Routinely, a
//! personal habit/routine completion tracker. It records, per calendar
//! day, whether each user-defined routine was satisfied -- via a simple
//! toggle, a bounded counter, or a bounded timer -- and derives streak
//! and rate statistics from the historical record. It is consumed by a
//! UI layer; no CLI or rendering surface lives here.
//!
//! ## Architecture
//!
//! - **Completion state machine**: pure toggle/increment/decrement
//!   transitions with clamping and delete-on-empty semantics, writing
//!   through to the store synchronously
//! - **Timer**: the single system-wide ticking session, owned by a
//!   dedicated actor task that checkpoints progress every few seconds
//! - **Statistics**: read-only aggregation producing rates, the weekly
//!   histogram, and streaks
//! - **Storage**: SQLite-based routine and completion persistence plus
//!   TOML-based configuration
//!
//! ## Key Components
//!
//! - [`RoutineTracker`]: facade wiring everything over one database
//! - [`CompletionStateMachine`]: per-day completion transitions
//! - [`TimerHandle`]: client half of the timer actor
//! - [`StatisticsEngine`]: snapshot aggregation
//! - [`Database`]: routine and completion persistence

pub mod clock;
pub mod completion;
pub mod error;
pub mod events;
pub mod routine;
pub mod stats;
pub mod storage;
pub mod store;
pub mod timer;
pub mod tracker;

pub use clock::{Clock, FixedClock, SystemClock};
pub use completion::{CompletionRecord, CompletionStateMachine};
pub use error::{ConfigError, CoreError, Result, StoreError};
pub use events::Event;
pub use routine::{Routine, RoutineId, RoutineKind, WeekdaySet};
pub use stats::{RoutineStats, StatisticsEngine, StatsSnapshot};
pub use storage::{Config, Database, WeekStart};
pub use store::{CompletionStore, RoutineRegistry};
pub use timer::{TimerHandle, TimerSession, TimerSnapshot, TimerState};
pub use tracker::RoutineTracker;
