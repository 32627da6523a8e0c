//! Habit tracker service.
//!
//! Wraps a [`HabitStore`] and recomputes streaks on every read and every
//! write, always against the caller's as-of day. Nothing derived is ever
//! written back, so a day missed with no write shows up as a broken streak
//! on the next read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::day::CalendarDay;
use crate::error::{CoreError, Result};
use crate::habit::{Habit, HabitId, HabitPatch, NewHabit};
use crate::storage::{Config, HabitRecord, HabitStore, HabitsConfig, TrackerConfig};
use crate::streak::{compute_streaks, last_completed_on_or_before, StreakState};

/// A habit as served to callers, with streaks computed at serve time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitView {
    pub habit: Habit,
    pub as_of: CalendarDay,
    pub completed_days: usize,
    pub last_completed: Option<CalendarDay>,
    pub done_today: bool,
    #[serde(flatten)]
    pub streak: StreakState,
    /// `completed_days / target_days`, rounded; may exceed 100.
    pub completion_percentage: u32,
}

impl HabitView {
    pub fn from_record(record: &HabitRecord, as_of: CalendarDay) -> Self {
        let completed_days = record.days.len();
        Self {
            habit: record.habit.clone(),
            as_of,
            completed_days,
            last_completed: last_completed_on_or_before(&record.days, as_of),
            done_today: record.days.contains(&as_of),
            streak: compute_streaks(&record.days, as_of),
            completion_percentage: rounded_percentage(
                completed_days as u64,
                u64::from(record.habit.target_days),
            ),
        }
    }
}

/// Result of a ledger write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub view: HabitView,
    /// `true` if the ledger changed: the day was newly added (`mark_done`)
    /// or was present and removed (`unmark`).
    pub changed: bool,
}

/// Per-owner summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub owner: String,
    pub as_of: CalendarDay,
    pub total_habits: usize,
    pub active_habits: usize,
    pub completed_today: usize,
    pub longest_streak: u32,
    pub completion_rate: u32,
    pub generated_at: DateTime<Utc>,
}

fn rounded_percentage(done: u64, possible: u64) -> u32 {
    let possible = possible.max(1);
    let pct = (done * 100 + possible / 2) / possible;
    u32::try_from(pct).unwrap_or(u32::MAX)
}

/// Reconciling front for a habit store.
pub struct HabitTracker<S: HabitStore> {
    store: S,
    habits: HabitsConfig,
    policy: TrackerConfig,
}

impl<S: HabitStore> HabitTracker<S> {
    /// Create a tracker using default habit settings and policy.
    pub fn new(store: S) -> Self {
        Self {
            store,
            habits: HabitsConfig::default(),
            policy: TrackerConfig::default(),
        }
    }

    /// Create a tracker configured from `config`.
    pub fn with_config(store: S, config: &Config) -> Self {
        Self {
            store,
            habits: config.habits.clone(),
            policy: config.tracker.clone(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create a habit for `owner`.
    ///
    /// # Errors
    /// `InvalidArgument` if the input fails validation.
    pub fn create_habit(&self, owner: &str, new: NewHabit, as_of: CalendarDay) -> Result<HabitView> {
        let habit = new.into_habit(owner, &self.habits)?;
        self.store.insert_habit(&habit)?;
        info!(habit = %habit.id, owner = %habit.owner, title = %habit.title, "habit created");
        self.view(habit.id, as_of)
    }

    /// Record a completion of `id` on `day` and return the refreshed view.
    ///
    /// Marking an already-completed day is not an error; `changed` is then
    /// `false`.
    ///
    /// # Errors
    /// `InvalidArgument` if `day` is after `as_of` and future days are not
    /// allowed (nothing is written); `NotFound` if the habit does not exist.
    pub fn mark_done(&self, id: HabitId, day: CalendarDay, as_of: CalendarDay) -> Result<Completion> {
        if day > as_of && !self.policy.allow_future_days {
            return Err(CoreError::invalid(
                "day",
                format!("{day} is after {as_of}; future completions are disabled"),
            ));
        }
        let changed = self.store.mark_done(id, day)?;
        let view = self.view(id, as_of)?;
        if changed {
            info!(
                habit = %id,
                %day,
                current = view.streak.current_streak,
                longest = view.streak.longest_streak,
                "habit completed"
            );
        }
        Ok(Completion { view, changed })
    }

    /// Remove the completion of `id` on `day`, if any.
    ///
    /// # Errors
    /// `NotFound` if the habit does not exist.
    pub fn unmark(&self, id: HabitId, day: CalendarDay, as_of: CalendarDay) -> Result<Completion> {
        let changed = self.store.unmark(id, day)?;
        let view = self.view(id, as_of)?;
        if changed {
            info!(habit = %id, %day, "completion removed");
        }
        Ok(Completion { view, changed })
    }

    /// Delete a habit and its ledger.
    ///
    /// # Errors
    /// `NotFound` if the habit does not exist.
    pub fn delete_habit(&self, id: HabitId) -> Result<()> {
        self.store.delete_habit(id)?;
        info!(habit = %id, "habit deleted");
        Ok(())
    }

    /// Current view of one habit.
    ///
    /// # Errors
    /// `NotFound` if the habit does not exist.
    pub fn view(&self, id: HabitId, as_of: CalendarDay) -> Result<HabitView> {
        let record = self.store.record(id)?;
        let view = HabitView::from_record(&record, as_of);
        debug!(habit = %id, %as_of, current = view.streak.current_streak, "view");
        Ok(view)
    }

    /// Streaks only.
    ///
    /// # Errors
    /// `NotFound` if the habit does not exist.
    pub fn streaks(&self, id: HabitId, as_of: CalendarDay) -> Result<StreakState> {
        let days = self.store.days(id)?;
        Ok(compute_streaks(&days, as_of))
    }

    /// Every habit of `owner`, oldest first.
    pub fn list(&self, owner: &str, as_of: CalendarDay) -> Result<Vec<HabitView>> {
        let records = self.store.list_habits(owner)?;
        Ok(records
            .iter()
            .map(|record| HabitView::from_record(record, as_of))
            .collect())
    }

    /// Summary counters over `owner`'s habits.
    pub fn dashboard(&self, owner: &str, as_of: CalendarDay) -> Result<Dashboard> {
        let views = self.list(owner, as_of)?;
        let total_done: u64 = views.iter().map(|v| v.completed_days as u64).sum();
        let total_possible: u64 = views.iter().map(|v| u64::from(v.habit.target_days)).sum();

        Ok(Dashboard {
            owner: owner.to_string(),
            as_of,
            total_habits: views.len(),
            active_habits: views.iter().filter(|v| v.habit.is_active).count(),
            completed_today: views.iter().filter(|v| v.done_today).count(),
            longest_streak: views
                .iter()
                .map(|v| v.streak.longest_streak)
                .max()
                .unwrap_or(0),
            completion_rate: rounded_percentage(total_done, total_possible),
            generated_at: Utc::now(),
        })
    }

    /// Change a habit's metadata. The ledger is untouched.
    ///
    /// # Errors
    /// `InvalidArgument` if the patch is invalid (nothing is written);
    /// `NotFound` if the habit does not exist.
    pub fn update_details(&self, id: HabitId, patch: HabitPatch, as_of: CalendarDay) -> Result<HabitView> {
        let mut habit = self.store.get_habit(id)?;
        habit.apply(patch)?;
        self.store.update_habit(&habit)?;
        info!(habit = %id, "habit updated");
        self.view(id, as_of)
    }

    /// Pause or resume a habit.
    ///
    /// # Errors
    /// `NotFound` if the habit does not exist.
    pub fn set_active(&self, id: HabitId, active: bool, as_of: CalendarDay) -> Result<HabitView> {
        self.update_details(
            id,
            HabitPatch {
                is_active: Some(active),
                ..Default::default()
            },
            as_of,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn d0() -> CalendarDay {
        CalendarDay::from_ymd(2024, 9, 10).unwrap()
    }

    fn tracker() -> HabitTracker<MemoryStore> {
        HabitTracker::new(MemoryStore::new())
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(rounded_percentage(1, 3), 33);
        assert_eq!(rounded_percentage(2, 3), 67);
        assert_eq!(rounded_percentage(1, 200), 1);
        assert_eq!(rounded_percentage(45, 30), 150);
        assert_eq!(rounded_percentage(0, 0), 0);
    }

    #[test]
    fn write_path_returns_recomputed_view() {
        let t = tracker();
        let habit = t.create_habit("alice", NewHabit::titled("Stretch"), d0()).unwrap();
        let id = habit.habit.id;

        t.mark_done(id, d0().offset(-2), d0()).unwrap();
        t.mark_done(id, d0().offset(-1), d0()).unwrap();
        let done = t.mark_done(id, d0(), d0()).unwrap();

        assert!(done.changed);
        assert!(done.view.done_today);
        assert_eq!(done.view.streak.current_streak, 3);
        assert_eq!(done.view.streak.longest_streak, 3);
        assert_eq!(done.view.completed_days, 3);
        assert_eq!(done.view.completion_percentage, 10);
    }

    #[test]
    fn repeat_completion_is_not_double_counted() {
        let t = tracker();
        let id = t.create_habit("alice", NewHabit::titled("Stretch"), d0()).unwrap().habit.id;
        let first = t.mark_done(id, d0(), d0()).unwrap();
        let second = t.mark_done(id, d0(), d0()).unwrap();
        assert!(first.changed);
        assert!(!second.changed);
        assert_eq!(second.view.completed_days, 1);
    }

    #[test]
    fn read_path_applies_passive_decay() {
        let t = tracker();
        let id = t.create_habit("alice", NewHabit::titled("Journal"), d0()).unwrap().habit.id;
        t.mark_done(id, d0(), d0()).unwrap();

        let tomorrow = t.view(id, d0().succ()).unwrap();
        assert_eq!(tomorrow.streak.current_streak, 1);
        assert!(!tomorrow.done_today);

        let later = t.view(id, d0().offset(2)).unwrap();
        assert_eq!(later.streak.current_streak, 0);
        assert_eq!(later.streak.longest_streak, 1);
        assert_eq!(later.last_completed, Some(d0()));
    }

    #[test]
    fn future_days_are_rejected_by_default() {
        let t = tracker();
        let id = t.create_habit("alice", NewHabit::titled("Walk"), d0()).unwrap().habit.id;
        let err = t.mark_done(id, d0().succ(), d0()).unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(t.store().days(id).unwrap().is_empty());
    }

    #[test]
    fn future_days_allowed_by_policy() {
        let mut config = Config::default();
        config.tracker.allow_future_days = true;
        let t = HabitTracker::with_config(MemoryStore::new(), &config);
        let id = t.create_habit("alice", NewHabit::titled("Walk"), d0()).unwrap().habit.id;
        let done = t.mark_done(id, d0().succ(), d0()).unwrap();
        assert!(done.changed);
        assert_eq!(done.view.streak.current_streak, 0);
        assert_eq!(done.view.streak.longest_streak, 1);
    }

    #[test]
    fn unmark_recomputes_longest_from_scratch() {
        let t = tracker();
        let id = t.create_habit("alice", NewHabit::titled("Walk"), d0()).unwrap().habit.id;
        for offset in -3..=0 {
            t.mark_done(id, d0().offset(offset), d0()).unwrap();
        }
        let undone = t.unmark(id, d0().offset(-2), d0()).unwrap();
        assert!(undone.changed);
        assert_eq!(undone.view.streak.current_streak, 2);
        assert_eq!(undone.view.streak.longest_streak, 2);

        let again = t.unmark(id, d0().offset(-2), d0()).unwrap();
        assert!(!again.changed);
    }

    #[test]
    fn deleted_habit_is_gone_everywhere() {
        let t = tracker();
        let id = t.create_habit("alice", NewHabit::titled("Walk"), d0()).unwrap().habit.id;
        t.mark_done(id, d0(), d0()).unwrap();
        t.delete_habit(id).unwrap();

        assert!(t.view(id, d0()).unwrap_err().is_not_found());
        assert!(t.streaks(id, d0()).unwrap_err().is_not_found());
        assert!(t.mark_done(id, d0(), d0()).unwrap_err().is_not_found());
        assert!(t.delete_habit(id).unwrap_err().is_not_found());
    }

    #[test]
    fn dashboard_summarizes_owner_habits() {
        let t = tracker();
        let a = t
            .create_habit(
                "alice",
                NewHabit {
                    target_days: Some(10),
                    ..NewHabit::titled("Read")
                },
                d0(),
            )
            .unwrap()
            .habit
            .id;
        let b = t
            .create_habit(
                "alice",
                NewHabit {
                    target_days: Some(10),
                    ..NewHabit::titled("Run")
                },
                d0(),
            )
            .unwrap()
            .habit
            .id;
        t.create_habit("bob", NewHabit::titled("Swim"), d0()).unwrap();

        for offset in -4..=-1 {
            t.mark_done(a, d0().offset(offset), d0()).unwrap();
        }
        t.mark_done(b, d0(), d0()).unwrap();
        t.set_active(b, false, d0()).unwrap();

        let dash = t.dashboard("alice", d0()).unwrap();
        assert_eq!(dash.total_habits, 2);
        assert_eq!(dash.active_habits, 1);
        assert_eq!(dash.completed_today, 1);
        assert_eq!(dash.longest_streak, 4);
        assert_eq!(dash.completion_rate, 25);

        let empty = t.dashboard("carol", d0()).unwrap();
        assert_eq!(empty.total_habits, 0);
        assert_eq!(empty.completion_rate, 0);
    }

    #[test]
    fn update_details_keeps_history() {
        let t = tracker();
        let id = t.create_habit("alice", NewHabit::titled("Walk"), d0()).unwrap().habit.id;
        t.mark_done(id, d0(), d0()).unwrap();

        let view = t
            .update_details(
                id,
                HabitPatch {
                    title: Some("Evening walk".into()),
                    target_days: Some(1),
                    ..Default::default()
                },
                d0(),
            )
            .unwrap();
        assert_eq!(view.habit.title, "Evening walk");
        assert_eq!(view.completed_days, 1);
        assert_eq!(view.completion_percentage, 100);

        let err = t
            .update_details(
                id,
                HabitPatch {
                    target_days: Some(0),
                    ..Default::default()
                },
                d0(),
            )
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }
}
