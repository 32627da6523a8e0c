//! Calendar day type.
//!
//! A `CalendarDay` is a date with no time-of-day and no timezone. Its textual
//! form is ISO `YYYY-MM-DD`, which is also how completions are persisted.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

const DAY_FORMAT: &str = "%Y-%m-%d";

/// A single calendar day, totally ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDay(NaiveDate);

impl CalendarDay {
    /// Build a day from year/month/day parts.
    ///
    /// # Errors
    /// Returns `InvalidArgument` if the parts do not name a real date.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, CoreError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| {
                CoreError::invalid("day", format!("{year:04}-{month:02}-{day:02} is not a date"))
            })
    }

    /// Parse an ISO `YYYY-MM-DD` string.
    ///
    /// Surrounding whitespace is ignored; anything else (time components,
    /// other separators, out-of-range fields) is rejected.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for malformed input.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let trimmed = input.trim();
        // chrono accepts unpadded fields; the ledger format does not.
        if trimmed.len() != 10 {
            return Err(CoreError::invalid(
                "day",
                format!("expected YYYY-MM-DD, got '{input}'"),
            ));
        }
        NaiveDate::parse_from_str(trimmed, DAY_FORMAT)
            .map(Self)
            .map_err(|e| CoreError::invalid("day", format!("'{input}': {e}")))
    }

    /// The canonical current day: UTC now shifted by a fixed offset.
    pub fn today(utc_offset_minutes: i32) -> Self {
        let now = Utc::now() + Duration::minutes(i64::from(utc_offset_minutes));
        Self(now.date_naive())
    }

    /// The following day. Saturates at the end of chrono's range.
    pub fn succ(self) -> Self {
        Self(self.0.succ_opt().unwrap_or(self.0))
    }

    /// The preceding day. Saturates at the start of chrono's range.
    pub fn pred(self) -> Self {
        Self(self.0.pred_opt().unwrap_or(self.0))
    }

    /// Shift by a signed number of days, saturating at chrono's range.
    pub fn offset(self, days: i64) -> Self {
        let shifted = Duration::try_days(days).and_then(|d| self.0.checked_add_signed(d));
        match shifted {
            Some(date) => Self(date),
            None if days < 0 => Self(NaiveDate::MIN),
            None => Self(NaiveDate::MAX),
        }
    }

    /// Signed number of days from `earlier` to `self`.
    pub fn days_since(self, earlier: CalendarDay) -> i64 {
        (self.0 - earlier.0).num_days()
    }
}

impl fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DAY_FORMAT))
    }
}

impl FromStr for CalendarDay {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<NaiveDate> for CalendarDay {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl Serialize for CalendarDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CalendarDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> CalendarDay {
        CalendarDay::parse(s).unwrap()
    }

    #[test]
    fn parses_iso_days() {
        let d = day("2024-02-29");
        assert_eq!(d.to_string(), "2024-02-29");
        assert_eq!(day(" 2024-01-05 "), CalendarDay::from_ymd(2024, 1, 5).unwrap());
    }

    #[test]
    fn rejects_malformed_days() {
        for bad in ["", "2024-2-3", "2023-02-29", "2024-13-01", "yesterday", "2024-01-05T10:00:00Z"] {
            let err = CalendarDay::parse(bad).unwrap_err();
            assert!(err.is_invalid_argument(), "{bad} should be rejected");
        }
    }

    #[test]
    fn successor_and_predecessor_cross_month_boundaries() {
        assert_eq!(day("2024-02-28").succ(), day("2024-02-29"));
        assert_eq!(day("2024-03-01").pred(), day("2024-02-29"));
        assert_eq!(day("2023-12-31").succ(), day("2024-01-01"));
    }

    #[test]
    fn days_since_is_signed() {
        assert_eq!(day("2024-01-10").days_since(day("2024-01-03")), 7);
        assert_eq!(day("2024-01-03").days_since(day("2024-01-10")), -7);
        assert_eq!(day("2024-01-03").offset(-3), day("2023-12-31"));
    }

    #[test]
    fn shifts_saturate_at_range_ends() {
        let max = CalendarDay::from(NaiveDate::MAX);
        let min = CalendarDay::from(NaiveDate::MIN);
        let d = day("2024-01-01");

        assert_eq!(d.offset(i64::MAX), max);
        assert_eq!(d.offset(i64::MIN), min);
        assert_eq!(d.offset(1_000_000_000), max);
        assert_eq!(d.offset(-1_000_000_000), min);
        assert_eq!(max.succ(), max);
        assert_eq!(min.pred(), min);
        assert_eq!(max.offset(1), max);
        assert_eq!(min.offset(-1), min);
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&day("2024-06-01")).unwrap();
        assert_eq!(json, "\"2024-06-01\"");
        let back: CalendarDay = serde_json::from_str(&json).unwrap();
        assert_eq!(back, day("2024-06-01"));
        assert!(serde_json::from_str::<CalendarDay>("\"06/01/2024\"").is_err());
    }
}
