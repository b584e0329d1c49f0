//! Core error types for routinely-core.
//!
//! All failures are returned as typed results; no operation in this
//! library is fatal to the process.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use crate::routine::RoutineId;

/// Core error type for routinely-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A mutation targeted a date strictly after "today".
    ///
    /// Always rejected before any store access; the store is unchanged.
    #[error("mutation rejected for future date {date}")]
    FutureDateRejected { date: NaiveDate },

    /// `start` was called while a timer session is already running.
    ///
    /// The running session is left untouched; the caller must pause or
    /// reset it first.
    #[error("a timer session is already running for routine {routine_id}")]
    AlreadyRunning { routine_id: RoutineId },

    /// An operation was invoked against a routine of the wrong kind,
    /// e.g. `toggle` on a counter routine.
    #[error("routine '{title}' is a {actual} routine, expected {expected}")]
    KindMismatch {
        title: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A routine id could not be resolved by the registry.
    #[error("routine {routine_id} not found")]
    RoutineNotFound { routine_id: RoutineId },

    /// Routine construction or edit violated a model invariant.
    #[error("invalid routine: {0}")]
    InvalidRoutine(String),

    /// The timer task has shut down and can no longer accept commands.
    #[error("timer task unavailable")]
    TimerUnavailable,

    /// Store-related errors, propagated verbatim. Retry policy belongs
    /// to the caller or the store, never to this core.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Store-specific errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the database file.
    #[error("failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Migration failed.
    #[error("database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked.
    #[error("database is locked")]
    Locked,

    /// A stored value could not be decoded into a model type.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration.
    #[error("failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration.
    #[error("failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// The data directory could not be determined or created.
    #[error("data directory unavailable: {0}")]
    DataDir(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError.
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
