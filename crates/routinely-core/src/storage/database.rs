//! SQLite-backed completion store and routine registry.
//!
//! One database holds both the routine definitions (edited by the
//! external editor surface) and the per-day completion records. The
//! composite primary key on `completions` enforces the one-record-per-
//! (routine, date) invariant at the storage layer as well.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};

use super::data_dir;
use crate::completion::CompletionRecord;
use crate::error::{CoreError, StoreError};
use crate::routine::{Routine, RoutineId, RoutineKind, WeekdaySet};
use crate::store::{CompletionStore, RoutineRegistry};

/// SQLite database for routines and completion records.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data_dir>/routinely.db`, creating the file
    /// and schema as needed.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("routinely.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open (or create) a database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: PathBuf::from(path),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::OpenFailed {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        super::migrations::migrate(&conn)?;
        Ok(Self { conn })
    }

    // ── Routine editor backend ───────────────────────────────────────

    pub fn insert_routine(&self, routine: &Routine) -> Result<(), StoreError> {
        let (target_count, target_duration_secs) =
            (routine.target_count(), routine.target_duration_secs());
        self.conn.execute(
            "INSERT INTO routines (id, title, schedule, kind, target_count, target_duration_secs, active, pinned, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                routine.id.to_string(),
                routine.title,
                schedule_json(&routine.schedule)?,
                routine.kind.name(),
                target_count,
                target_duration_secs,
                routine.active,
                routine.pinned,
                routine.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn update_routine(&self, routine: &Routine) -> Result<(), StoreError> {
        let (target_count, target_duration_secs) =
            (routine.target_count(), routine.target_duration_secs());
        self.conn.execute(
            "UPDATE routines
             SET title = ?2, schedule = ?3, kind = ?4, target_count = ?5,
                 target_duration_secs = ?6, active = ?7, pinned = ?8
             WHERE id = ?1",
            params![
                routine.id.to_string(),
                routine.title,
                schedule_json(&routine.schedule)?,
                routine.kind.name(),
                target_count,
                target_duration_secs,
                routine.active,
                routine.pinned,
            ],
        )?;
        Ok(())
    }

    /// Permanently delete a routine and its completion history.
    pub fn delete_routine(&self, routine_id: RoutineId) -> Result<(), StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM completions WHERE routine_id = ?1",
            [routine_id.to_string()],
        )?;
        tx.execute("DELETE FROM routines WHERE id = ?1", [routine_id.to_string()])?;
        tx.commit()?;
        Ok(())
    }

    /// All routines, active or not, pinned first.
    pub fn list_routines(&self) -> Result<Vec<Routine>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, schedule, kind, target_count, target_duration_secs, active, pinned, created_at
             FROM routines ORDER BY pinned DESC, created_at",
        )?;
        let rows = stmt.query_map([], routine_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Every completion record ever written (statistics input).
    pub fn all_completions(&self) -> Result<Vec<CompletionRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT routine_id, date, is_completed, current_count, elapsed_secs
             FROM completions ORDER BY date",
        )?;
        let rows = stmt.query_map([], record_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl CompletionStore for Database {
    fn get(
        &self,
        routine_id: RoutineId,
        date: NaiveDate,
    ) -> Result<Option<CompletionRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT routine_id, date, is_completed, current_count, elapsed_secs
             FROM completions WHERE routine_id = ?1 AND date = ?2",
        )?;
        let mut rows = stmt.query_map(
            params![routine_id.to_string(), date.to_string()],
            record_from_row,
        )?;
        rows.next().transpose().map_err(StoreError::from)
    }

    fn upsert(&self, record: &CompletionRecord) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO completions (routine_id, date, is_completed, current_count, elapsed_secs)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(routine_id, date) DO UPDATE SET
                 is_completed = excluded.is_completed,
                 current_count = excluded.current_count,
                 elapsed_secs = excluded.elapsed_secs",
            params![
                record.routine_id.to_string(),
                record.date.to_string(),
                record.is_completed,
                record.current_count,
                record.elapsed_secs,
            ],
        )?;
        Ok(())
    }

    fn delete(&self, routine_id: RoutineId, date: NaiveDate) -> Result<(), StoreError> {
        self.conn.execute(
            "DELETE FROM completions WHERE routine_id = ?1 AND date = ?2",
            params![routine_id.to_string(), date.to_string()],
        )?;
        Ok(())
    }

    fn query_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CompletionRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT routine_id, date, is_completed, current_count, elapsed_secs
             FROM completions WHERE date >= ?1 AND date <= ?2 ORDER BY date",
        )?;
        let rows = stmt.query_map(params![from.to_string(), to.to_string()], record_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn query_by_routine(
        &self,
        routine_id: RoutineId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CompletionRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT routine_id, date, is_completed, current_count, elapsed_secs
             FROM completions
             WHERE routine_id = ?1 AND date >= ?2 AND date <= ?3 ORDER BY date",
        )?;
        let rows = stmt.query_map(
            params![routine_id.to_string(), from.to_string(), to.to_string()],
            record_from_row,
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl RoutineRegistry for Database {
    fn list_active(&self) -> Result<Vec<Routine>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, schedule, kind, target_count, target_duration_secs, active, pinned, created_at
             FROM routines WHERE active = 1 ORDER BY pinned DESC, created_at",
        )?;
        let rows = stmt.query_map([], routine_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn find(&self, routine_id: RoutineId) -> Result<Option<Routine>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, schedule, kind, target_count, target_duration_secs, active, pinned, created_at
             FROM routines WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map([routine_id.to_string()], routine_from_row)?;
        rows.next().transpose().map_err(StoreError::from)
    }
}

fn schedule_json(schedule: &WeekdaySet) -> Result<String, StoreError> {
    serde_json::to_string(schedule).map_err(|e| StoreError::Corrupt(e.to_string()))
}

fn routine_from_row(row: &Row<'_>) -> rusqlite::Result<Routine> {
    let id: String = row.get(0)?;
    let schedule: String = row.get(2)?;
    let kind: String = row.get(3)?;
    let target_count: Option<u32> = row.get(4)?;
    let target_duration_secs: Option<u32> = row.get(5)?;
    let created_at: String = row.get(8)?;

    let kind = match kind.as_str() {
        "toggle" => RoutineKind::Toggle,
        "counter" => RoutineKind::Counter {
            target_count: target_count
                .ok_or_else(|| corrupt(4, "counter routine without target_count"))?,
        },
        "timer" => RoutineKind::Timer {
            target_duration_secs: target_duration_secs
                .ok_or_else(|| corrupt(5, "timer routine without target_duration_secs"))?,
        },
        other => return Err(corrupt(3, format!("unknown routine kind: {other}"))),
    };

    Ok(Routine {
        id: RoutineId::from_str(&id).map_err(|e| conversion(0, e))?,
        title: row.get(1)?,
        schedule: serde_json::from_str(&schedule).map_err(|e| conversion(2, e))?,
        kind,
        active: row.get(6)?,
        pinned: row.get(7)?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| conversion(8, e))?
            .with_timezone(&Utc),
    })
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<CompletionRecord> {
    let routine_id: String = row.get(0)?;
    let date: String = row.get(1)?;
    Ok(CompletionRecord {
        routine_id: RoutineId::from_str(&routine_id).map_err(|e| conversion(0, e))?,
        date: NaiveDate::from_str(&date).map_err(|e| conversion(1, e))?,
        is_completed: row.get(2)?,
        current_count: row.get(3)?,
        elapsed_secs: row.get(4)?,
    })
}

fn conversion(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn corrupt(idx: usize, message: impl Into<String>) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, d).unwrap()
    }

    #[test]
    fn routine_roundtrip_all_kinds() {
        let db = Database::open_memory().unwrap();
        let toggle = Routine::toggle("Meditate");
        let counter = Routine::counter("Water", 8).unwrap();
        let timer = Routine::timer("Stretch", 300).unwrap();
        for routine in [&toggle, &counter, &timer] {
            db.insert_routine(routine).unwrap();
        }

        let loaded = db.find(counter.id).unwrap().unwrap();
        assert_eq!(loaded.kind, RoutineKind::Counter { target_count: 8 });
        let loaded = db.find(timer.id).unwrap().unwrap();
        assert_eq!(
            loaded.kind,
            RoutineKind::Timer {
                target_duration_secs: 300
            }
        );
        assert_eq!(db.list_routines().unwrap().len(), 3);
    }

    #[test]
    fn list_active_filters_inactive() {
        let db = Database::open_memory().unwrap();
        let mut routine = Routine::toggle("Meditate");
        db.insert_routine(&routine).unwrap();
        assert_eq!(db.list_active().unwrap().len(), 1);

        routine.active = false;
        db.update_routine(&routine).unwrap();
        assert!(db.list_active().unwrap().is_empty());
    }

    #[test]
    fn upsert_replaces_existing_record() {
        let db = Database::open_memory().unwrap();
        let routine = Routine::counter("Water", 8).unwrap();
        db.insert_routine(&routine).unwrap();

        db.upsert(&CompletionRecord::counted(routine.id, date(7), 1, 8))
            .unwrap();
        db.upsert(&CompletionRecord::counted(routine.id, date(7), 2, 8))
            .unwrap();

        let records = db.query_by_routine(routine.id, date(1), date(31)).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].current_count, 2);
    }

    #[test]
    fn delete_routine_removes_completion_history() {
        let db = Database::open_memory().unwrap();
        let routine = Routine::toggle("Meditate");
        db.insert_routine(&routine).unwrap();
        db.upsert(&CompletionRecord::toggled(routine.id, date(7)))
            .unwrap();

        db.delete_routine(routine.id).unwrap();
        assert!(db.find(routine.id).unwrap().is_none());
        assert!(db.get(routine.id, date(7)).unwrap().is_none());
    }

    #[test]
    fn query_range_is_inclusive() {
        let db = Database::open_memory().unwrap();
        let routine = Routine::toggle("Meditate");
        db.insert_routine(&routine).unwrap();
        for d in [1, 5, 9] {
            db.upsert(&CompletionRecord::toggled(routine.id, date(d)))
                .unwrap();
        }
        let records = db.query_range(date(1), date(5)).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn reopen_preserves_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routinely.db");
        let routine = Routine::counter("Water", 8).unwrap();
        {
            let db = Database::open_at(&path).unwrap();
            db.insert_routine(&routine).unwrap();
            db.upsert(&CompletionRecord::counted(routine.id, date(7), 3, 8))
                .unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        let record = db.get(routine.id, date(7)).unwrap().unwrap();
        assert_eq!(record.current_count, 3);
        assert_eq!(db.list_routines().unwrap().len(), 1);
    }
}
