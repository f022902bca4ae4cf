//! Daily-use streak.
//!
//! A streak counts consecutive calendar days on which the app was opened.
//! Days are compared as dates, never as timestamps.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakRecord {
    /// Always at least 1.
    pub days: u32,
    pub last_access: NaiveDate,
}

impl StreakRecord {
    pub fn first(today: NaiveDate) -> Self {
        Self {
            days: 1,
            last_access: today,
        }
    }
}

/// Result of applying today's launch to the stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakOutcome {
    /// Same calendar day as the stored record; nothing to write.
    Unchanged(StreakRecord),
    /// Yesterday was the last access.
    Extended(StreakRecord),
    /// No record, a gap of two or more days, or a date in the future.
    Started(StreakRecord),
}

impl StreakOutcome {
    pub fn record(&self) -> StreakRecord {
        match *self {
            StreakOutcome::Unchanged(r) | StreakOutcome::Extended(r) | StreakOutcome::Started(r) => r,
        }
    }

    /// Whether the record must be persisted.
    pub fn changed(&self) -> bool {
        !matches!(self, StreakOutcome::Unchanged(_))
    }
}

/// Apply a launch on `today` to the stored record.
pub fn advance(previous: Option<&StreakRecord>, today: NaiveDate) -> StreakOutcome {
    let Some(prev) = previous else {
        return StreakOutcome::Started(StreakRecord::first(today));
    };
    if prev.last_access == today {
        return StreakOutcome::Unchanged(*prev);
    }
    let yesterday = today.checked_sub_days(Days::new(1));
    if yesterday == Some(prev.last_access) {
        StreakOutcome::Extended(StreakRecord {
            days: prev.days.max(1).saturating_add(1),
            last_access: today,
        })
    } else {
        StreakOutcome::Started(StreakRecord::first(today))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn record(days: u32, last: &str) -> StreakRecord {
        StreakRecord {
            days,
            last_access: day(last),
        }
    }

    #[test]
    fn yesterday_extends() {
        let out = advance(Some(&record(5, "2026-03-09")), day("2026-03-10"));
        assert_eq!(out, StreakOutcome::Extended(record(6, "2026-03-10")));
        assert!(out.changed());
    }

    #[test]
    fn same_day_is_idempotent() {
        let out = advance(Some(&record(5, "2026-03-10")), day("2026-03-10"));
        assert_eq!(out.record(), record(5, "2026-03-10"));
        assert!(!out.changed());
    }

    #[test]
    fn gap_resets() {
        let out = advance(Some(&record(5, "2026-03-07")), day("2026-03-10"));
        assert_eq!(out, StreakOutcome::Started(record(1, "2026-03-10")));
    }

    #[test]
    fn first_launch_starts_at_one() {
        let out = advance(None, day("2026-03-10"));
        assert_eq!(out.record(), record(1, "2026-03-10"));
        assert!(out.changed());
    }

    #[test]
    fn future_date_resets() {
        let out = advance(Some(&record(9, "2026-03-11")), day("2026-03-10"));
        assert_eq!(out.record(), record(1, "2026-03-10"));
    }

    #[test]
    fn month_and_year_boundaries() {
        let out = advance(Some(&record(2, "2025-12-31")), day("2026-01-01"));
        assert_eq!(out.record().days, 3);
        let out = advance(Some(&record(2, "2024-02-29")), day("2024-03-01"));
        assert_eq!(out.record().days, 3);
    }

    #[test]
    fn stored_format_is_iso_date() {
        let json = serde_json::to_string(&record(3, "2026-03-10")).unwrap();
        assert_eq!(json, r#"{"days":3,"last_access":"2026-03-10"}"#);
    }
}
