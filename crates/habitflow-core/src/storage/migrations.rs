//! Database schema migrations for habitflow.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};
use tracing::{debug, warn};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const SCHEMA_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Returns 0 if no version is set (initial database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// v1: habits and their completion ledger.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    debug!("applying schema migration v1");
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS habits (
            id          TEXT PRIMARY KEY,
            owner       TEXT NOT NULL,
            title       TEXT NOT NULL,
            description TEXT,
            category    TEXT NOT NULL DEFAULT 'Other',
            target_days INTEGER NOT NULL DEFAULT 30,
            color       TEXT NOT NULL DEFAULT '#4f46e5',
            is_active   INTEGER NOT NULL DEFAULT 1,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS habit_completions (
            habit_id TEXT NOT NULL REFERENCES habits(id) ON DELETE CASCADE,
            day      TEXT NOT NULL,
            PRIMARY KEY (habit_id, day)
        );",
    )?;
    set_schema_version(conn, 1)
}

/// v2: index for per-owner listing.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    debug!("applying schema migration v2");
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_habits_owner_created
            ON habits(owner, created_at);",
    )?;
    set_schema_version(conn, 2)
}
