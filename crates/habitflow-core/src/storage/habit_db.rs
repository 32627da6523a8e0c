//! SQLite-based storage for habits and their completion ledger.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use tracing::debug;

use super::{data_dir, migrations, HabitRecord, HabitStore};
use crate::day::CalendarDay;
use crate::error::{CoreError, DatabaseError, Result};
use crate::habit::{Habit, HabitCategory, HabitId};

const HABIT_COLUMNS: &str =
    "id, owner, title, description, category, target_days, color, is_active, created_at";

fn corrupt(table: &'static str, message: impl Into<String>) -> CoreError {
    CoreError::Database(DatabaseError::CorruptRow {
        table,
        message: message.into(),
    })
}

/// Raw `habits` row, decoded into a `Habit` outside the rusqlite closure so
/// decode failures surface as `CorruptRow` rather than query errors.
struct HabitRow {
    id: String,
    owner: String,
    title: String,
    description: Option<String>,
    category: String,
    target_days: u32,
    color: String,
    is_active: bool,
    created_at: String,
}

impl HabitRow {
    fn from_row(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get(0)?,
            owner: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            category: row.get(4)?,
            target_days: row.get(5)?,
            color: row.get(6)?,
            is_active: row.get(7)?,
            created_at: row.get(8)?,
        })
    }

    fn into_habit(self) -> Result<Habit> {
        let id = self
            .id
            .parse::<HabitId>()
            .map_err(|e| corrupt("habits", e.to_string()))?;
        let category = self
            .category
            .parse::<HabitCategory>()
            .map_err(|e| corrupt("habits", e.to_string()))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| corrupt("habits", format!("created_at '{}': {e}", self.created_at)))?;
        Ok(Habit {
            id,
            owner: self.owner,
            title: self.title,
            description: self.description,
            category,
            target_days: self.target_days,
            color: self.color,
            is_active: self.is_active,
            created_at,
        })
    }
}

/// SQLite database for habit storage.
///
/// The connection sits behind a mutex, which serializes every operation;
/// deletes run in a transaction so a habit and its completions disappear
/// together.
pub struct HabitDb {
    conn: Mutex<Connection>,
}

impl HabitDb {
    /// Open the database at `<data_dir>/habitflow.db`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("habitflow.db");
        Self::open_at(&path)
    }

    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "opened habit database");
        Self::with_connection(conn)
    }

    /// Open an in-memory database (for tests).
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| CoreError::Database(DatabaseError::Poisoned))
    }
}

fn habit_exists(conn: &Connection, id: HabitId) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM habits WHERE id = ?1",
            params![id.to_string()],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

fn ensure_habit(conn: &Connection, id: HabitId) -> Result<()> {
    if habit_exists(conn, id)? {
        Ok(())
    } else {
        Err(CoreError::habit_not_found(id))
    }
}

fn load_habit(conn: &Connection, id: HabitId) -> Result<Habit> {
    let sql = format!("SELECT {HABIT_COLUMNS} FROM habits WHERE id = ?1");
    let row = conn
        .query_row(&sql, params![id.to_string()], HabitRow::from_row)
        .optional()?;
    row.ok_or_else(|| CoreError::habit_not_found(id))?
        .into_habit()
}

fn load_days(conn: &Connection, id: HabitId) -> Result<BTreeSet<CalendarDay>> {
    let mut stmt = conn.prepare("SELECT day FROM habit_completions WHERE habit_id = ?1")?;
    let rows = stmt.query_map(params![id.to_string()], |row| row.get::<_, String>(0))?;

    let mut days = BTreeSet::new();
    for row in rows {
        let raw = row?;
        let day = CalendarDay::parse(&raw)
            .map_err(|e| corrupt("habit_completions", e.to_string()))?;
        days.insert(day);
    }
    Ok(days)
}

fn commit(tx: Transaction<'_>) -> Result<()> {
    tx.commit()?;
    Ok(())
}

impl HabitStore for HabitDb {
    fn insert_habit(&self, habit: &Habit) -> Result<()> {
        let conn = self.lock()?;
        if habit_exists(&conn, habit.id)? {
            return Err(CoreError::invalid(
                "habit_id",
                format!("habit {} already exists", habit.id),
            ));
        }
        conn.execute(
            &format!("INSERT INTO habits ({HABIT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
            params![
                habit.id.to_string(),
                habit.owner,
                habit.title,
                habit.description,
                habit.category.as_str(),
                habit.target_days,
                habit.color,
                habit.is_active,
                habit.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn get_habit(&self, id: HabitId) -> Result<Habit> {
        let conn = self.lock()?;
        load_habit(&conn, id)
    }

    fn update_habit(&self, habit: &Habit) -> Result<()> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE habits
             SET title = ?2, description = ?3, category = ?4, target_days = ?5,
                 color = ?6, is_active = ?7
             WHERE id = ?1",
            params![
                habit.id.to_string(),
                habit.title,
                habit.description,
                habit.category.as_str(),
                habit.target_days,
                habit.color,
                habit.is_active,
            ],
        )?;
        if changed == 0 {
            return Err(CoreError::habit_not_found(habit.id));
        }
        Ok(())
    }

    fn delete_habit(&self, id: HabitId) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM habit_completions WHERE habit_id = ?1",
            params![id.to_string()],
        )?;
        let deleted = tx.execute("DELETE FROM habits WHERE id = ?1", params![id.to_string()])?;
        if deleted == 0 {
            // Dropping the transaction rolls it back.
            return Err(CoreError::habit_not_found(id));
        }
        commit(tx)
    }

    fn mark_done(&self, id: HabitId, day: CalendarDay) -> Result<bool> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        ensure_habit(&tx, id)?;
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO habit_completions (habit_id, day) VALUES (?1, ?2)",
            params![id.to_string(), day.to_string()],
        )?;
        commit(tx)?;
        let added = inserted > 0;
        debug!(habit = %id, %day, added, "mark_done");
        Ok(added)
    }

    fn unmark(&self, id: HabitId, day: CalendarDay) -> Result<bool> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        ensure_habit(&tx, id)?;
        let deleted = tx.execute(
            "DELETE FROM habit_completions WHERE habit_id = ?1 AND day = ?2",
            params![id.to_string(), day.to_string()],
        )?;
        commit(tx)?;
        let removed = deleted > 0;
        debug!(habit = %id, %day, removed, "unmark");
        Ok(removed)
    }

    fn days(&self, id: HabitId) -> Result<BTreeSet<CalendarDay>> {
        let conn = self.lock()?;
        ensure_habit(&conn, id)?;
        load_days(&conn, id)
    }

    fn record(&self, id: HabitId) -> Result<HabitRecord> {
        let conn = self.lock()?;
        let habit = load_habit(&conn, id)?;
        let days = load_days(&conn, id)?;
        Ok(HabitRecord { habit, days })
    }

    fn list_habits(&self, owner: &str) -> Result<Vec<HabitRecord>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {HABIT_COLUMNS} FROM habits WHERE owner = ?1 ORDER BY created_at, id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![owner], HabitRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|row| -> Result<HabitRecord> {
                let habit = row.into_habit()?;
                let days = load_days(&conn, habit.id)?;
                Ok(HabitRecord { habit, days })
            })
            .collect()
    }
}
