mod config;
pub mod habit_db;
pub mod memory;
pub mod migrations;

pub use config::{CalendarConfig, Config, HabitsConfig, LoggingConfig, TrackerConfig};
pub use habit_db::HabitDb;
pub use memory::MemoryStore;

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::day::CalendarDay;
use crate::error::{ConfigError, Result};
use crate::habit::{Habit, HabitId};

/// A habit together with a snapshot of its completion ledger, read under
/// one lock so the two always agree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitRecord {
    pub habit: Habit,
    pub days: BTreeSet<CalendarDay>,
}

/// Habit metadata plus the per-habit completion ledger.
///
/// Implementations serialize every mutation of a single habit: a
/// `delete_habit` never interleaves with a `mark_done`/`unmark` on the same
/// habit, so a deleted ledger cannot be resurrected.
pub trait HabitStore: Send + Sync {
    /// Store a new habit with an empty ledger.
    ///
    /// # Errors
    /// `InvalidArgument` if a habit with the same id already exists.
    fn insert_habit(&self, habit: &Habit) -> Result<()>;

    /// # Errors
    /// `NotFound` if the habit does not exist.
    fn get_habit(&self, id: HabitId) -> Result<Habit>;

    /// Replace a habit's metadata. The ledger is untouched.
    ///
    /// # Errors
    /// `NotFound` if the habit does not exist.
    fn update_habit(&self, habit: &Habit) -> Result<()>;

    /// Remove a habit and its whole ledger atomically.
    ///
    /// # Errors
    /// `NotFound` if the habit does not exist.
    fn delete_habit(&self, id: HabitId) -> Result<()>;

    /// Insert `day` into the ledger. Returns `true` only if it was absent.
    ///
    /// # Errors
    /// `NotFound` if the habit does not exist.
    fn mark_done(&self, id: HabitId, day: CalendarDay) -> Result<bool>;

    /// Remove `day` from the ledger. Returns `true` only if it was present.
    ///
    /// # Errors
    /// `NotFound` if the habit does not exist.
    fn unmark(&self, id: HabitId, day: CalendarDay) -> Result<bool>;

    /// Read-only snapshot of the ledger.
    ///
    /// # Errors
    /// `NotFound` if the habit does not exist.
    fn days(&self, id: HabitId) -> Result<BTreeSet<CalendarDay>>;

    /// Habit metadata and ledger snapshot in one read.
    ///
    /// # Errors
    /// `NotFound` if the habit does not exist.
    fn record(&self, id: HabitId) -> Result<HabitRecord>;

    /// Every habit owned by `owner`, oldest first.
    fn list_habits(&self, owner: &str) -> Result<Vec<HabitRecord>>;
}

/// Returns the HabitFlow data directory, creating it if needed.
///
/// `HABITFLOW_HOME` wins when set. Otherwise `~/.config/habitflow`, or
/// `~/.config/habitflow-dev` when `HABITFLOW_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("HABITFLOW_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("HABITFLOW_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("habitflow-dev")
            } else {
                base_dir.join("habitflow")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
