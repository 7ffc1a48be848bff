use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;

pub const FIRST_WEEK: u8 = 1;
pub const LAST_WEEK: u8 = 40;

const WEEK_MS: i64 = 7 * 24 * 60 * 60 * 1000;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("week must be between {FIRST_WEEK} and {LAST_WEEK}, got {0}")]
pub struct InvalidWeek(pub i64);

/// A gestational week, always within `1..=40`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "u8")]
pub struct Week(u8);

impl Week {
    pub const FIRST: Week = Week(FIRST_WEEK);
    pub const LAST: Week = Week(LAST_WEEK);

    pub fn new(value: i64) -> Result<Self, InvalidWeek> {
        if (i64::from(FIRST_WEEK)..=i64::from(LAST_WEEK)).contains(&value) {
            Ok(Week(value as u8))
        } else {
            Err(InvalidWeek(value))
        }
    }

    /// Week picked by hand instead of derived from a due date. Rejected, not
    /// clamped, when out of range.
    pub fn explicit(value: i64) -> Result<Self, InvalidWeek> {
        Self::new(value)
    }

    fn clamped(value: i64) -> Self {
        let value = value.clamp(i64::from(FIRST_WEEK), i64::from(LAST_WEEK));
        Week(value as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl From<Week> for u8 {
    fn from(week: Week) -> Self {
        week.0
    }
}

impl std::fmt::Display for Week {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whole weeks left until `due`, rounding any partial week up. Zero or
/// negative once the due date has passed.
fn weeks_remaining(due: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let ms = (due - now).num_milliseconds();
    ms.div_euclid(WEEK_MS) + i64::from(ms.rem_euclid(WEEK_MS) > 0)
}

/// Current gestational week for a pregnancy due at `due`, seen from `now`.
///
/// `40 - ceil(remaining / 7 days)`, clamped to `1..=40`. Never fails: a due
/// date in the past yields week 40, one further than 39 weeks away yields week 1.
pub fn current_week(due: DateTime<Utc>, now: DateTime<Utc>) -> Week {
    let week = i64::from(LAST_WEEK).saturating_sub(weeks_remaining(due, now));
    Week::clamped(week)
}

/// Same as [`current_week`] for a date-only due date, read as midnight UTC.
pub fn current_week_for_date(due: NaiveDate, now: DateTime<Utc>) -> Week {
    current_week(due.and_time(chrono::NaiveTime::MIN).and_utc(), now)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub current_week: Week,
    pub weeks_remaining: u8,
    pub percent_complete: u8,
}

impl Progress {
    pub fn for_week(week: Week) -> Self {
        Progress {
            current_week: week,
            weeks_remaining: LAST_WEEK - week.get(),
            percent_complete: (u16::from(week.get()) * 100 / u16::from(LAST_WEEK)) as u8,
        }
    }

    pub fn for_due_date(due: NaiveDate, now: DateTime<Utc>) -> Self {
        Self::for_week(current_week_for_date(due, now))
    }
}
