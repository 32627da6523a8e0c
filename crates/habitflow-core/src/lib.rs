//! # HabitFlow Core Library
//!
//! This library provides the core logic for the HabitFlow habit tracker.
//! The CLI binary is a thin layer over it; any other request layer (HTTP,
//! desktop) is expected to be one too.
//!
//! ## Architecture
//!
//! - **Calendar days**: timezone-free dates; the caller decides what "today" is
//! - **Completion ledger**: per-habit sets of completed days behind the
//!   [`HabitStore`] trait, with in-memory and SQLite backends
//! - **Streak engine**: a pure function from (days, as-of day) to current and
//!   longest streak
//! - **Tracker**: recomputes streaks on every read and write, so missed days
//!   decay a streak without any write
//!
//! ## Key Components
//!
//! - [`compute_streaks`]: streak calculation
//! - [`HabitTracker`]: reconciling service over a store
//! - [`HabitDb`]: SQLite-backed store
//! - [`Config`]: application configuration management

pub mod day;
pub mod error;
pub mod habit;
pub mod storage;
pub mod streak;
pub mod tracker;

pub use day::CalendarDay;
pub use error::{ConfigError, CoreError, DatabaseError, Result};
pub use habit::{Habit, HabitCategory, HabitId, HabitPatch, NewHabit};
pub use storage::{Config, HabitDb, HabitRecord, HabitStore, MemoryStore};
pub use streak::{compute_streaks, StreakState};
pub use tracker::{Completion, Dashboard, HabitTracker, HabitView};
