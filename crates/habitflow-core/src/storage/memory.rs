//! In-memory habit store.
//!
//! The habit map sits behind an `RwLock`; each habit has its own `Mutex`.
//! Ledger writes hold the map's read lock plus the habit's mutex, so writes
//! to different habits proceed in parallel while `delete_habit`, which needs
//! the write lock, waits for every in-flight write to finish.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use super::{HabitRecord, HabitStore};
use crate::day::CalendarDay;
use crate::error::{CoreError, Result};
use crate::habit::{Habit, HabitId};

#[derive(Debug, Default)]
pub struct MemoryStore {
    habits: RwLock<HashMap<HabitId, Mutex<HabitRecord>>>,
}

// A panic mid-write can only leave a set with or without one day, both of
// which are valid ledgers, so poisoned locks are recovered.
fn lock(entry: &Mutex<HabitRecord>) -> MutexGuard<'_, HabitRecord> {
    entry.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<HabitId, Mutex<HabitRecord>>> {
        self.habits.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<HabitId, Mutex<HabitRecord>>> {
        self.habits.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` on one habit's record while holding the map read lock.
    fn with_record<T>(&self, id: HabitId, f: impl FnOnce(&mut HabitRecord) -> T) -> Result<T> {
        let habits = self.read();
        let entry = habits.get(&id).ok_or_else(|| CoreError::habit_not_found(id))?;
        let mut record = lock(entry);
        Ok(f(&mut record))
    }
}

impl HabitStore for MemoryStore {
    fn insert_habit(&self, habit: &Habit) -> Result<()> {
        let mut habits = self.write();
        if habits.contains_key(&habit.id) {
            return Err(CoreError::invalid(
                "habit_id",
                format!("habit {} already exists", habit.id),
            ));
        }
        habits.insert(
            habit.id,
            Mutex::new(HabitRecord {
                habit: habit.clone(),
                days: BTreeSet::new(),
            }),
        );
        Ok(())
    }

    fn get_habit(&self, id: HabitId) -> Result<Habit> {
        self.with_record(id, |record| record.habit.clone())
    }

    fn update_habit(&self, habit: &Habit) -> Result<()> {
        self.with_record(habit.id, |record| record.habit = habit.clone())
    }

    fn delete_habit(&self, id: HabitId) -> Result<()> {
        let mut habits = self.write();
        habits
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| CoreError::habit_not_found(id))
    }

    fn mark_done(&self, id: HabitId, day: CalendarDay) -> Result<bool> {
        let added = self.with_record(id, |record| record.days.insert(day))?;
        debug!(habit = %id, %day, added, "mark_done");
        Ok(added)
    }

    fn unmark(&self, id: HabitId, day: CalendarDay) -> Result<bool> {
        let removed = self.with_record(id, |record| record.days.remove(&day))?;
        debug!(habit = %id, %day, removed, "unmark");
        Ok(removed)
    }

    fn days(&self, id: HabitId) -> Result<BTreeSet<CalendarDay>> {
        self.with_record(id, |record| record.days.clone())
    }

    fn record(&self, id: HabitId) -> Result<HabitRecord> {
        self.with_record(id, |record| record.clone())
    }

    fn list_habits(&self, owner: &str) -> Result<Vec<HabitRecord>> {
        let habits = self.read();
        let mut records: Vec<HabitRecord> = habits
            .values()
            .map(lock)
            .filter(|record| record.habit.owner == owner)
            .map(|record| record.clone())
            .collect();
        records.sort_by(|a, b| {
            a.habit
                .created_at
                .cmp(&b.habit.created_at)
                .then_with(|| a.habit.id.cmp(&b.habit.id))
        });
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::NewHabit;
    use crate::storage::HabitsConfig;
    use std::sync::Arc;
    use std::thread;

    fn make_habit(owner: &str, title: &str) -> Habit {
        NewHabit::titled(title)
            .into_habit(owner, &HabitsConfig::default())
            .unwrap()
    }

    fn day(offset: i64) -> CalendarDay {
        CalendarDay::from_ymd(2024, 5, 1).unwrap().offset(offset)
    }

    #[test]
    fn mark_done_is_idempotent() {
        let store = MemoryStore::new();
        let habit = make_habit("alice", "Run");
        store.insert_habit(&habit).unwrap();

        assert!(store.mark_done(habit.id, day(0)).unwrap());
        assert!(!store.mark_done(habit.id, day(0)).unwrap());
        assert_eq!(store.days(habit.id).unwrap(), BTreeSet::from([day(0)]));
    }

    #[test]
    fn unmark_absent_day_is_noop() {
        let store = MemoryStore::new();
        let habit = make_habit("alice", "Run");
        store.insert_habit(&habit).unwrap();
        store.mark_done(habit.id, day(0)).unwrap();

        assert!(!store.unmark(habit.id, day(1)).unwrap());
        assert!(store.unmark(habit.id, day(0)).unwrap());
        assert!(store.days(habit.id).unwrap().is_empty());
    }

    #[test]
    fn unknown_habit_is_not_found() {
        let store = MemoryStore::new();
        let id = HabitId::new();
        assert!(store.mark_done(id, day(0)).unwrap_err().is_not_found());
        assert!(store.unmark(id, day(0)).unwrap_err().is_not_found());
        assert!(store.days(id).unwrap_err().is_not_found());
        assert!(store.delete_habit(id).unwrap_err().is_not_found());
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let store = MemoryStore::new();
        let habit = make_habit("alice", "Run");
        store.insert_habit(&habit).unwrap();
        assert!(store.insert_habit(&habit).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn list_is_scoped_to_owner() {
        let store = MemoryStore::new();
        store.insert_habit(&make_habit("alice", "Run")).unwrap();
        store.insert_habit(&make_habit("alice", "Read")).unwrap();
        store.insert_habit(&make_habit("bob", "Swim")).unwrap();

        assert_eq!(store.list_habits("alice").unwrap().len(), 2);
        assert_eq!(store.list_habits("bob").unwrap().len(), 1);
        assert!(store.list_habits("carol").unwrap().is_empty());
    }

    #[test]
    fn concurrent_mark_done_counts_each_day_once() {
        let store = Arc::new(MemoryStore::new());
        let habit = make_habit("alice", "Run");
        store.insert_habit(&habit).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.mark_done(habit.id, day(0)).unwrap())
            })
            .collect();
        let newly_added = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|added| *added)
            .count();

        assert_eq!(newly_added, 1);
        assert_eq!(store.days(habit.id).unwrap().len(), 1);
    }

    #[test]
    fn delete_racing_mark_done_leaves_no_ledger() {
        for _ in 0..20 {
            let store = Arc::new(MemoryStore::new());
            let habit = make_habit("alice", "Run");
            store.insert_habit(&habit).unwrap();

            let writer = {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for offset in 0..50 {
                        if store.mark_done(habit.id, day(offset)).is_err() {
                            break;
                        }
                    }
                })
            };
            store.delete_habit(habit.id).unwrap();
            writer.join().unwrap();

            assert!(store.days(habit.id).unwrap_err().is_not_found());
            assert!(store.list_habits("alice").unwrap().is_empty());
        }
    }
}
