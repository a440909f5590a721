//! Stacked time-series construction for the daily cost chart
//!
//! Builds everything a chart backend needs to draw the trailing window as a
//! stacked bar chart, one segment per account:
//!
//! - the date axis and its sparse labels (first of each month, last day)
//! - a shared y-axis maximum of 1.5 times the largest daily total
//! - one series per account, aligned to the date axis
//! - the stack order, ascending by each account's final-day value, so the
//!   account spending the most on the last day sits on top
//! - a color per stack position from a fixed palette
//!
//! Nothing here draws; see [`crate::chart`] for the backend.

use chrono::{Datelike, NaiveDate};
use costpulse_core::period::DATE_FORMAT;
use costpulse_core::{Account, DailyCosts, Period};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::debug;

/// Headroom above the largest daily total
pub const Y_HEADROOM: f64 = 1.5;

/// An sRGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Fixed series palette: seven soft tones followed by seven dark ones
pub const PALETTE: [Rgb; 14] = [
    Rgb(241, 90, 96),
    Rgb(122, 195, 106),
    Rgb(90, 155, 212),
    Rgb(250, 167, 91),
    Rgb(158, 103, 171),
    Rgb(206, 112, 88),
    Rgb(215, 127, 180),
    Rgb(238, 46, 47),
    Rgb(0, 140, 72),
    Rgb(24, 90, 169),
    Rgb(244, 125, 35),
    Rgb(102, 44, 145),
    Rgb(162, 29, 33),
    Rgb(180, 56, 148),
];

/// Palette color of a stack position, cycling past the end
pub fn palette_color(stack_position: usize) -> Rgb {
    PALETTE[stack_position % PALETTE.len()]
}

/// One account's segment of the stacked chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackedSeries {
    pub account_name: String,
    /// Daily amounts aligned to [`StackedChart::dates`], 0 on days without cost
    pub values: Vec<f64>,
    /// Height at which each bar segment starts
    pub baseline: Vec<f64>,
    pub color: Rgb,
    /// Draw order, 0 at the bottom
    pub stack_position: usize,
}

impl StackedSeries {
    /// Amount on the last day of the window
    pub fn final_value(&self) -> f64 {
        self.values.last().copied().unwrap_or(0.0)
    }
}

/// Finished chart data, series in stack order (bottom first)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackedChart {
    pub period: Period,
    pub dates: Vec<NaiveDate>,
    /// ISO date on labeled positions, empty elsewhere
    pub labels: Vec<String>,
    pub y_max: f64,
    pub series: Vec<StackedSeries>,
}

impl StackedChart {
    /// Build the chart over every day of `period`
    ///
    /// The date axis is the full window, so days the API returned no row for
    /// still get a position (with zero cost) and the final day of the window
    /// is always the last label. Rows outside the window are ignored.
    ///
    /// Accounts are taken in directory order; an account without a single
    /// entry in the window gets no series. Directory entries repeating an
    /// already seen name are skipped, since entries are keyed by name.
    pub fn build(days: &[DailyCosts], accounts: &[Account], period: &Period) -> Self {
        let dates: Vec<NaiveDate> = period
            .start
            .iter_days()
            .take_while(|d| *d < period.end)
            .collect();
        let by_date: HashMap<NaiveDate, &DailyCosts> = days.iter().map(|d| (d.date, d)).collect();
        let aligned: Vec<Option<&DailyCosts>> =
            dates.iter().map(|d| by_date.get(d).copied()).collect();

        let labels = axis_labels(&dates);
        let max_total = aligned
            .iter()
            .flatten()
            .map(|d| d.total())
            .fold(0.0, f64::max);

        let mut seen = HashSet::new();
        let mut series: Vec<StackedSeries> = accounts
            .iter()
            .filter(|account| seen.insert(account.name.as_str()))
            .filter_map(|account| account_series(&aligned, &account.name))
            .collect();

        // Stable: equal final values keep directory order
        series.sort_by(|a, b| {
            a.final_value()
                .partial_cmp(&b.final_value())
                .unwrap_or(Ordering::Equal)
        });

        let mut baseline = vec![0.0; dates.len()];
        for (position, s) in series.iter_mut().enumerate() {
            s.stack_position = position;
            s.color = palette_color(position);
            s.baseline = baseline.clone();
            // Credits are drawn as nothing and do not lower the stack
            for (level, value) in baseline.iter_mut().zip(&s.values) {
                *level += value.max(0.0);
            }
        }

        debug!(
            "Built chart for {}: {} days, {} series, y max {:.2}",
            period,
            dates.len(),
            series.len(),
            max_total * Y_HEADROOM
        );

        Self {
            period: *period,
            dates,
            labels,
            y_max: max_total * Y_HEADROOM,
            series,
        }
    }

    /// Stack height of every day
    pub fn daily_totals(&self) -> Vec<f64> {
        let mut totals = vec![0.0; self.dates.len()];
        for s in &self.series {
            for (total, value) in totals.iter_mut().zip(&s.values) {
                *total += value;
            }
        }
        totals
    }
}

/// Label the first day of each month and the last day of the axis
///
/// [`StackedChart::build`] passes the whole window, so the last position is
/// the window's final day.
pub fn axis_labels(dates: &[NaiveDate]) -> Vec<String> {
    let last = dates.len().saturating_sub(1);
    dates
        .iter()
        .enumerate()
        .map(|(i, date)| {
            if date.day() == 1 || i == last {
                date.format(DATE_FORMAT).to_string()
            } else {
                String::new()
            }
        })
        .collect()
}

fn account_series(days: &[Option<&DailyCosts>], account_name: &str) -> Option<StackedSeries> {
    let totals: Vec<Option<f64>> = days
        .iter()
        .copied()
        .map(|d| d.and_then(|d| d.account_total(account_name)))
        .collect();
    if totals.iter().all(Option::is_none) {
        return None;
    }

    Some(StackedSeries {
        account_name: account_name.to_string(),
        values: totals.into_iter().map(|t| t.unwrap_or(0.0)).collect(),
        baseline: Vec::new(),
        color: PALETTE[0],
        stack_position: 0,
    })
}
