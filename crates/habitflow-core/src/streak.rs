//! Streak calculation over a habit's completion days.
//!
//! [`compute_streaks`] is a pure function of the ledger contents and an
//! explicit "as of" day. It never reads the clock, so passive decay (a day
//! missed with no write) falls out of calling it with the caller's today.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::day::CalendarDay;

/// Derived streak values. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakState {
    pub current_streak: u32,
    pub longest_streak: u32,
}

impl StreakState {
    pub const EMPTY: StreakState = StreakState {
        current_streak: 0,
        longest_streak: 0,
    };
}

/// Compute current and longest streak as of `as_of`.
///
/// The current streak is the run of consecutive days ending at the most
/// recent completion on or before `as_of`, provided that completion is
/// `as_of` itself or the day before. Completions after `as_of` never count
/// toward it. The longest streak is the longest run anywhere in `days`,
/// and is always at least the current streak.
pub fn compute_streaks(days: &BTreeSet<CalendarDay>, as_of: CalendarDay) -> StreakState {
    if days.is_empty() {
        return StreakState::EMPTY;
    }

    let current = current_run(days, as_of);
    let longest = longest_run(days).max(current);

    StreakState {
        current_streak: current,
        longest_streak: longest,
    }
}

/// The latest completion on or before `as_of`.
pub fn last_completed_on_or_before(
    days: &BTreeSet<CalendarDay>,
    as_of: CalendarDay,
) -> Option<CalendarDay> {
    days.range(..=as_of).next_back().copied()
}

fn current_run(days: &BTreeSet<CalendarDay>, as_of: CalendarDay) -> u32 {
    let Some(most_recent) = last_completed_on_or_before(days, as_of) else {
        return 0;
    };
    if as_of.days_since(most_recent) > 1 {
        return 0;
    }

    let mut run = 1;
    let mut expected = most_recent.pred();
    for &day in days.range(..most_recent).rev() {
        if day != expected {
            break;
        }
        run += 1;
        expected = expected.pred();
    }
    run
}

fn longest_run(days: &BTreeSet<CalendarDay>) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut prev: Option<CalendarDay> = None;

    for &day in days {
        run = match prev {
            Some(p) if day.days_since(p) == 1 => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(day);
    }
    longest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d0() -> CalendarDay {
        CalendarDay::from_ymd(2024, 3, 15).unwrap()
    }

    fn set(offsets: &[i64]) -> BTreeSet<CalendarDay> {
        offsets.iter().map(|&o| d0().offset(o)).collect()
    }

    fn state(current: u32, longest: u32) -> StreakState {
        StreakState {
            current_streak: current,
            longest_streak: longest,
        }
    }

    #[test]
    fn empty_ledger_has_no_streaks() {
        assert_eq!(compute_streaks(&BTreeSet::new(), d0()), StreakState::EMPTY);
    }

    #[test]
    fn consecutive_run_ending_today() {
        assert_eq!(compute_streaks(&set(&[0, -1, -2]), d0()), state(3, 3));
    }

    #[test]
    fn run_ending_yesterday_is_still_alive() {
        assert_eq!(compute_streaks(&set(&[-1, -2]), d0()), state(2, 2));
    }

    #[test]
    fn gap_resets_current_but_keeps_longest() {
        assert_eq!(compute_streaks(&set(&[-5, -4, -3]), d0()), state(0, 3));
    }

    #[test]
    fn isolated_days_are_separate_runs() {
        assert_eq!(compute_streaks(&set(&[-10, -7]), d0().offset(-7)), state(1, 1));
    }

    #[test]
    fn passive_decay_two_days_later() {
        let days = set(&[0]);
        let before = compute_streaks(&days, d0());
        let later = compute_streaks(&days, d0().offset(2));
        assert_eq!(before, state(1, 1));
        assert_eq!(later.current_streak, 0);
        assert_eq!(later.longest_streak, before.longest_streak);
    }

    #[test]
    fn longest_can_be_an_older_run() {
        // 4-run long ago, 2-run ending today
        let days = set(&[-20, -19, -18, -17, -1, 0]);
        assert_eq!(compute_streaks(&days, d0()), state(2, 4));
    }

    #[test]
    fn current_walk_stops_at_first_gap() {
        let days = set(&[0, -1, -3, -4, -5]);
        assert_eq!(compute_streaks(&days, d0()), state(2, 3));
    }

    #[test]
    fn future_days_do_not_count_toward_current() {
        let days = set(&[-1, 0, 2, 3, 4]);
        let s = compute_streaks(&days, d0());
        assert_eq!(s.current_streak, 2);
        assert_eq!(s.longest_streak, 3);
        assert_eq!(last_completed_on_or_before(&days, d0()), Some(d0()));
    }

    #[test]
    fn only_future_days_means_no_current() {
        let days = set(&[3, 4]);
        assert_eq!(compute_streaks(&days, d0()), state(0, 2));
    }

    #[test]
    fn runs_cross_month_and_year_boundaries() {
        let new_year = CalendarDay::from_ymd(2024, 1, 1).unwrap();
        let days: BTreeSet<_> = (0..5).map(|o| new_year.offset(-o)).collect();
        assert_eq!(compute_streaks(&days, new_year), state(5, 5));
    }
}
