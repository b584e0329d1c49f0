//! Database schema migrations.
//!
//! Migrations are versioned and applied automatically when opening the
//! database. The `schema_version` table tracks the current version.

use rusqlite::{Connection, Result as SqliteResult};

use crate::error::StoreError;

/// Apply all pending migrations.
///
/// # Errors
/// Returns an error if a migration fails; already-applied migrations are
/// never re-run.
pub fn migrate(conn: &Connection) -> Result<(), StoreError> {
    create_schema_version_table(conn).map_err(migration_failed)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn).map_err(migration_failed)?;
    }
    if current_version < 2 {
        migrate_v2(conn).map_err(migration_failed)?;
    }

    Ok(())
}

fn migration_failed(err: rusqlite::Error) -> StoreError {
    StoreError::MigrationFailed(err.to_string())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Returns 0 if no version is set (fresh database).
fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or(0)
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: initial schema.
///
/// `completions` carries a composite primary key so at most one record
/// can exist per (routine, date).
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS routines (
            id          TEXT PRIMARY KEY,
            title       TEXT NOT NULL,
            schedule    TEXT NOT NULL DEFAULT '[]',
            kind        TEXT NOT NULL,
            target_count INTEGER,
            target_duration_secs INTEGER,
            active      INTEGER NOT NULL DEFAULT 1,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS completions (
            routine_id  TEXT NOT NULL,
            date        TEXT NOT NULL,
            is_completed INTEGER NOT NULL DEFAULT 0,
            current_count INTEGER NOT NULL DEFAULT 0,
            elapsed_secs INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (routine_id, date)
        );

        CREATE INDEX IF NOT EXISTS idx_completions_date ON completions(date);
        CREATE INDEX IF NOT EXISTS idx_completions_completed ON completions(is_completed, date);",
    )?;
    set_schema_version(conn, 1)
}

/// Migration v2: pinned flag on routines.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch("ALTER TABLE routines ADD COLUMN pinned INTEGER NOT NULL DEFAULT 0;")?;
    set_schema_version(conn, 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), 2);
    }

    #[test]
    fn fresh_database_reaches_current_version() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        // The pinned column from v2 must exist.
        conn.execute("INSERT INTO routines (id, title, kind, created_at, pinned) VALUES ('x', 'X', 'toggle', '2026-01-01T00:00:00+00:00', 1)", [])
            .unwrap();
    }
}
