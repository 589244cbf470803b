use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{ProcessingError, Result};

pub const PRIOR_LABEL: &str = "prior";
pub const CURRENT_LABEL: &str = "current";

/// Inclusive date range accumulated from zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodWindow {
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PeriodWindow {
    pub fn new(label: &str, start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(ProcessingError::InvalidPeriod {
                label: label.to_string(),
                start,
                end,
            });
        }
        Ok(Self {
            label: label.to_string(),
            start,
            end,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Number of calendar days covered, both ends included.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn offset(&self, days: i64) -> NaiveDate {
        self.start + Duration::days(days)
    }
}

/// The two stitched periods of one run. `current` is absent when the run
/// date is the first day of the year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Periods {
    pub prior: PeriodWindow,
    pub current: Option<PeriodWindow>,
}

impl Periods {
    /// Whole previous calendar year, and this year up to the day before
    /// `as_of`.
    pub fn from_as_of(as_of: NaiveDate) -> Result<Self> {
        let year = as_of.year();
        let prior_start = ymd(year - 1, 1, 1)?;
        let prior_end = ymd(year - 1, 12, 31)?;
        let current_start = ymd(year, 1, 1)?;
        let current_end = as_of - Duration::days(1);

        let current = if current_end >= current_start {
            Some(PeriodWindow::new(CURRENT_LABEL, current_start, current_end)?)
        } else {
            None
        };

        Ok(Self {
            prior: PeriodWindow::new(PRIOR_LABEL, prior_start, prior_end)?,
            current,
        })
    }
}

fn ymd(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        ProcessingError::InvalidFormat(format!("invalid date {:04}-{:02}-{:02}", year, month, day))
    })
}
