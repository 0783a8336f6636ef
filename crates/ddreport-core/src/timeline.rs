//! Expansion of an activity range into gap-free day and month sequences.

use crate::{ReportError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};
use std::fmt;

/// Calendar month key, ordered chronologically and displayed as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Every day and every month between two dates, inclusive, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    days: Vec<NaiveDate>,
    months: Vec<MonthKey>,
}

impl Timeline {
    pub fn days(&self) -> &[NaiveDate] {
        &self.days
    }

    pub fn months(&self) -> &[MonthKey] {
        &self.months
    }

    pub fn first_day(&self) -> NaiveDate {
        self.days[0]
    }

    pub fn last_day(&self) -> NaiveDate {
        self.days[self.days.len() - 1]
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.first_day() && date <= self.last_day()
    }
}

/// Expand `[first, last]` into its days and the distinct months they cover.
///
/// Both sequences are non-empty on success. An inverted range is rejected
/// before anything is allocated.
pub fn expand_range(first: NaiveDate, last: NaiveDate) -> Result<Timeline> {
    if first > last {
        return Err(ReportError::InvalidRange { first, last });
    }

    let span = (last - first).num_days() as usize + 1;
    let mut days = Vec::with_capacity(span);
    let mut months: Vec<MonthKey> = Vec::with_capacity(span / 28 + 2);

    // `iter_days` stops at the calendar's end instead of overflowing past it.
    for day in first.iter_days().take(span) {
        let month = MonthKey::from_date(day);
        // Days are visited in order, so a new month can only differ from the last one pushed.
        if months.last() != Some(&month) {
            months.push(month);
        }
        days.push(day);
    }

    Ok(Timeline { days, months })
}
