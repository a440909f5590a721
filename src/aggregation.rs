//! Report aggregation
//!
//! Turns the normalized entries of the summarized day into the figures the
//! text report shows: the total, per-account subtotals, and the five most
//! expensive account/service pairs.
//!
//! # Ordering
//!
//! Both rankings are sorted descending by amount with a stable sort, so
//! equal amounts keep the order in which they were first encountered. The
//! resulting order depends only on the input entries, never on API response
//! timing or forecast completion order.
//!
//! # Examples
//!
//! ```
//! use costpulse::aggregation::ReportAggregate;
//! use costpulse_core::CostEntry;
//!
//! let entries = vec![
//!     CostEntry::new("account_1", "service_a", 1.1),
//!     CostEntry::new("account_2", "service_a", 3.2),
//! ];
//! let report = ReportAggregate::build(&entries, None);
//!
//! assert_eq!(report.by_account[0].account_name, "account_2");
//! assert_eq!(report.total_forecast, 0.0);
//! ```

use costpulse_core::money;
use costpulse_core::{CostEntry, ForecastMap};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Number of rows in the top services ranking
pub const TOP_SERVICES: usize = 5;

/// Cost of one account over the summarized day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountSubtotal {
    pub account_name: String,
    pub amount: f64,
}

/// Figures shown in the text report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportAggregate {
    /// Sum of every entry amount
    pub total: f64,
    /// Sum of every forecast, zero when no forecast was collected
    pub total_forecast: f64,
    /// Per-account subtotals, descending
    pub by_account: Vec<AccountSubtotal>,
    /// The most expensive entries, descending, at most [`TOP_SERVICES`]
    pub top_services: Vec<CostEntry>,
}

impl ReportAggregate {
    /// Aggregate entries and the optional forecast map
    pub fn build(entries: &[CostEntry], forecasts: Option<&ForecastMap>) -> Self {
        let mut by_account = subtotals(entries);
        by_account.sort_by(|a, b| descending(a.amount, b.amount));

        let mut ranked = entries.to_vec();
        ranked.sort_by(|a, b| descending(a.amount, b.amount));
        ranked.truncate(TOP_SERVICES);

        Self {
            total: money::sum(entries.iter().map(|e| e.amount)),
            total_forecast: forecasts
                .map(|f| money::sum(f.values().copied()))
                .unwrap_or(0.0),
            by_account,
            top_services: ranked,
        }
    }
}

/// Subtotals in first-encountered account order
fn subtotals(entries: &[CostEntry]) -> Vec<AccountSubtotal> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut subtotals: Vec<AccountSubtotal> = Vec::new();

    for entry in entries {
        match index.get(entry.account_name.as_str()) {
            Some(&i) => subtotals[i].amount += entry.amount,
            None => {
                index.insert(&entry.account_name, subtotals.len());
                subtotals.push(AccountSubtotal {
                    account_name: entry.account_name.clone(),
                    amount: entry.amount,
                });
            }
        }
    }
    subtotals
}

// NaN compares equal so it keeps its place
fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}
