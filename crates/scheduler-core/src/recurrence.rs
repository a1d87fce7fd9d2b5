//! Recurrence resolution for repeating tasks.
//!
//! A repeat rule is a short space-separated string:
//!
//! - `d <n>` repeats every `n` days, with `1 <= n <= 400`
//! - `y` repeats every year on the same month and day
//!
//! [`resolve`] takes a reference date ("now"), the task's stored date and its
//! rule, and returns the first occurrence that is not before "now".

use chrono::{Datelike, Days, NaiveDate};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Canonical on-disk and on-wire date layout.
pub const DATE_FORMAT: &str = "%Y%m%d";

/// Inclusive bounds of the daily interval.
pub const MIN_DAILY_INTERVAL: u32 = 1;
pub const MAX_DAILY_INTERVAL: u32 = 400;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecurrenceError {
    #[error("invalid date '{0}', expected YYYYMMDD")]
    InvalidDate(String),

    #[error("repeat rule is empty")]
    NoRule,

    #[error("{0}")]
    InvalidRule(String),

    #[error("unsupported repeat rule '{0}'")]
    UnsupportedRule(String),
}

/// A parsed repeat rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepeatRule {
    /// Every `n` days.
    Daily(u32),
    /// Every year, same month and day.
    Yearly,
}

impl RepeatRule {
    /// Parses a raw rule, treating the empty string as "no repetition".
    ///
    /// # Errors
    /// * [`RecurrenceError::InvalidRule`] for a `d` rule whose interval is
    ///   missing, non-numeric or outside `1..=400`
    /// * [`RecurrenceError::UnsupportedRule`] for any other leading token
    pub fn parse(raw: &str) -> Result<Option<Self>, RecurrenceError> {
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse().map(Some)
    }

    /// Computes the next occurrence of this rule on or after `now`, starting
    /// from `base`.
    ///
    /// # Behavior
    /// - A `base` strictly after `now` is advanced by one step before anything
    ///   else, so a future date never comes back unchanged.
    /// - The date is then stepped forward until it is no longer before `now`.
    ///
    /// The pre-advance is relied upon by clients of the date preview and must
    /// not be removed.
    pub fn next_after(self, now: NaiveDate, base: NaiveDate) -> Result<NaiveDate, RecurrenceError> {
        let mut date = base;
        if date > now {
            date = self.step(date)?;
        }

        match self {
            RepeatRule::Daily(interval) => {
                if date < now {
                    let interval = i64::from(interval);
                    let behind = (now - date).num_days();
                    let steps = (behind + interval - 1) / interval;
                    date = add_days(date, steps * interval)?;
                }
            }
            RepeatRule::Yearly => {
                while date < now {
                    date = self.step(date)?;
                }
            }
        }

        Ok(date)
    }

    /// Computes the first occurrence strictly after `today`, starting from
    /// `base`.
    ///
    /// Completion uses this instead of [`RepeatRule::next_after`]: a task
    /// finished on its due day must move to a later day.
    pub fn next_after_day(
        self,
        today: NaiveDate,
        base: NaiveDate,
    ) -> Result<NaiveDate, RecurrenceError> {
        let next = self.next_after(today, base)?;
        if next > today {
            Ok(next)
        } else {
            self.step(next)
        }
    }

    /// Advances `date` by exactly one period of this rule.
    pub fn step(self, date: NaiveDate) -> Result<NaiveDate, RecurrenceError> {
        match self {
            RepeatRule::Daily(interval) => add_days(date, i64::from(interval)),
            RepeatRule::Yearly => add_year(date).ok_or_else(|| out_of_range(date)),
        }
    }
}

impl FromStr for RepeatRule {
    type Err = RecurrenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = s.split(' ');
        match tokens.next() {
            Some("d") => {
                let token = tokens.next().ok_or_else(|| {
                    RecurrenceError::InvalidRule(format!("'{}': missing day interval", s))
                })?;
                let interval: i64 = token.parse().map_err(|_| {
                    RecurrenceError::InvalidRule(format!(
                        "'{}': day interval '{}' is not a number",
                        s, token
                    ))
                })?;
                if !(i64::from(MIN_DAILY_INTERVAL)..=i64::from(MAX_DAILY_INTERVAL))
                    .contains(&interval)
                {
                    return Err(RecurrenceError::InvalidRule(format!(
                        "'{}': day interval must be between {} and {}",
                        s, MIN_DAILY_INTERVAL, MAX_DAILY_INTERVAL
                    )));
                }
                // Range checked above.
                Ok(RepeatRule::Daily(interval as u32))
            }
            // Trailing tokens after `y` are accepted and ignored.
            Some("y") => Ok(RepeatRule::Yearly),
            _ => Err(RecurrenceError::UnsupportedRule(s.to_string())),
        }
    }
}

impl fmt::Display for RepeatRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepeatRule::Daily(interval) => write!(f, "d {}", interval),
            RepeatRule::Yearly => write!(f, "y"),
        }
    }
}

/// Parses a `YYYYMMDD` date. Exactly eight ASCII digits are accepted.
pub fn parse_date(s: &str) -> Result<NaiveDate, RecurrenceError> {
    let invalid = || RecurrenceError::InvalidDate(s.to_string());
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let year: i32 = s[0..4].parse().map_err(|_| invalid())?;
    let month: u32 = s[4..6].parse().map_err(|_| invalid())?;
    let day: u32 = s[6..8].parse().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

/// Renders a date in the canonical `YYYYMMDD` layout.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Resolves the next due date for a raw stored date and rule.
///
/// Validation happens in order: the base date, then rule presence, then the
/// rule grammar. The result is formatted as `YYYYMMDD`.
///
/// # Errors
/// * [`RecurrenceError::InvalidDate`] if `base` is not a valid `YYYYMMDD` date
/// * [`RecurrenceError::NoRule`] if `rule` is empty
/// * [`RecurrenceError::InvalidRule`] or [`RecurrenceError::UnsupportedRule`]
///   if `rule` does not parse
pub fn resolve(now: NaiveDate, base: &str, rule: &str) -> Result<String, RecurrenceError> {
    let base = parse_date(base)?;
    let rule = RepeatRule::parse(rule)?.ok_or(RecurrenceError::NoRule)?;
    rule.next_after(now, base).map(format_date)
}

fn add_days(date: NaiveDate, days: i64) -> Result<NaiveDate, RecurrenceError> {
    u64::try_from(days)
        .ok()
        .and_then(|days| date.checked_add_days(Days::new(days)))
        .ok_or_else(|| out_of_range(date))
}

/// Same month and day one year later. A day that does not exist in the target
/// year overflows into the following month, so Feb 29 becomes Mar 1.
fn add_year(date: NaiveDate) -> Option<NaiveDate> {
    let year = date.year().checked_add(1)?;
    NaiveDate::from_ymd_opt(year, date.month(), date.day()).or_else(|| {
        NaiveDate::from_ymd_opt(year, date.month(), 1)?
            .checked_add_days(Days::new(u64::from(date.day() - 1)))
    })
}

fn out_of_range(date: NaiveDate) -> RecurrenceError {
    RecurrenceError::InvalidDate(format!("{} is out of the supported range", format_date(date)))
}
