//! Calendar-month generation windows.
//!
//! A period is always a whole UTC calendar month. Windows are half-open:
//! `[start, end)`, where `end` is the first instant of the next month.

use crate::{
    error::{GenError, GenResult},
    rng::StageRng,
    types::Instant,
};
use chrono::{Datelike, Duration, Months, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    first_day: NaiveDate,
}

impl Period {
    pub fn new(year: i32, month: u32) -> GenResult<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|first_day| Self { first_day })
            .ok_or_else(|| GenError::Config(format!("invalid period {year}-{month:02}")))
    }

    pub fn year(&self) -> i32 {
        self.first_day.year()
    }

    pub fn month(&self) -> u32 {
        self.first_day.month()
    }

    pub fn next(&self) -> Self {
        Self {
            first_day: self
                .first_day
                .checked_add_months(Months::new(1))
                .unwrap_or(NaiveDate::MAX),
        }
    }

    pub fn start(&self) -> Instant {
        self.first_day.and_time(NaiveTime::MIN).and_utc()
    }

    /// Exclusive end of the window.
    pub fn end(&self) -> Instant {
        self.next().start()
    }

    pub fn contains(&self, at: Instant) -> bool {
        at >= self.start() && at < self.end()
    }

    /// Every calendar day of the month, in order.
    pub fn days(&self) -> Vec<NaiveDate> {
        self.first_day
            .iter_days()
            .take_while(|d| d.month() == self.first_day.month())
            .collect()
    }

    pub fn day_count(&self) -> usize {
        self.days().len()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for Period {
    type Err = GenError;

    fn from_str(s: &str) -> GenResult<Self> {
        let (y, m) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| GenError::Config(format!("period '{s}' is not YYYY-MM")))?;
        let year = y
            .parse()
            .map_err(|_| GenError::Config(format!("period '{s}' has a bad year")))?;
        let month = m
            .parse()
            .map_err(|_| GenError::Config(format!("period '{s}' has a bad month")))?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for Period {
    type Error = GenError;

    fn try_from(s: String) -> GenResult<Self> {
        s.parse()
    }
}

impl From<Period> for String {
    fn from(p: Period) -> String {
        p.to_string()
    }
}

/// `[00:00, next 00:00)` of one calendar day.
pub fn day_window(day: NaiveDate) -> (Instant, Instant) {
    let start = day.and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

/// Uniform instant in `[lo, hi)` at millisecond resolution.
/// Returns `lo` when the window is empty.
pub fn sample_between(rng: &mut StageRng, lo: Instant, hi: Instant) -> Instant {
    let span = (hi - lo).num_milliseconds();
    if span <= 0 {
        return lo;
    }
    lo + Duration::milliseconds(rng.next_u64_below(span as u64) as i64)
}
