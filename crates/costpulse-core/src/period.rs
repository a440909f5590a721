//! Report periods
//!
//! Maps "today" to the three date ranges a report is built from:
//!
//! | Period | Range |
//! |---|---|
//! | `two_days_ago` | `[today-2d, today-1d)` |
//! | `month_remaining` | `[today+1d, first day of next month)` |
//! | `trailing` | `[today-3 months, today-1d)` |
//!
//! All ranges have an inclusive start and an exclusive end, matching the
//! billing API convention. Dates are exchanged as ISO calendar dates.
//!
//! # Examples
//!
//! ```
//! use chrono::NaiveDate;
//! use costpulse_core::period::ReportPeriods;
//!
//! let today = NaiveDate::from_ymd_opt(2022, 11, 25).unwrap();
//! let periods = ReportPeriods::from_today(today);
//!
//! assert_eq!(periods.two_days_ago.to_string(), "2022-11-23..2022-11-24");
//! assert_eq!(periods.month_remaining.to_string(), "2022-11-26..2022-12-01");
//! assert_eq!(periods.trailing.to_string(), "2022-08-25..2022-11-24");
//! ```

use crate::error::{CostpulseError, Result};
use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Date format used for every date sent to or received from the billing API
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse an ISO calendar date as returned by the billing API
pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|e| CostpulseError::parse(field, raw, e))
}

/// A date range with inclusive start and exclusive end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Parse a period from two ISO dates
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Ok(Self {
            start: parse_date("period.start", start)?,
            end: parse_date("period.end", end)?,
        })
    }

    /// A period that does not end after it starts covers no days
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Number of days covered
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days().max(0)
    }

    pub fn start_str(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

/// The three periods of a report run, computed once and never mutated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportPeriods {
    /// The day summarized in the text report
    pub two_days_ago: Period,
    /// Days left in the current month, used for forecasts
    pub month_remaining: Period,
    /// Window of the stacked chart
    pub trailing: Period,
}

impl ReportPeriods {
    /// Compute all periods from the local calendar date of "now"
    pub fn from_today(today: NaiveDate) -> Self {
        let yesterday = today - Days::new(1);

        Self {
            two_days_ago: Period::new(today - Days::new(2), yesterday),
            month_remaining: Period::new(today + Days::new(1), first_day_of_next_month(today)),
            trailing: Period::new(
                // Clamps to the last valid day, e.g. May 31 -> Feb 28
                today - Months::new(3),
                yesterday,
            ),
        }
    }

    /// Whether a forecast can be requested for the rest of the month
    ///
    /// On the last day of a month there are no remaining days, so the
    /// forecast period is empty and no request must be issued.
    pub fn forecast_available(&self) -> bool {
        !self.month_remaining.is_empty()
    }
}

fn first_day_of_next_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}
