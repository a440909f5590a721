//! Cost normalization
//!
//! Converts merged grouped rows into flat [`CostEntry`] values:
//!
//! - the first group key is resolved through the dimension map to an
//!   account name (unknown ids resolve to `""`)
//! - the second group key, when present, is the service name
//! - one entry is emitted per requested metric per group; amounts of
//!   different metrics are never summed
//!
//! Entries keep the input row and group order. Any unparsable amount or date
//! fails the whole normalization.

use crate::fetcher::GroupedCosts;
use costpulse_core::billing::CostGroup;
use costpulse_core::error::{CostpulseError, Result};
use costpulse_core::period::parse_date;
use costpulse_core::types::{CostEntry, DailyCosts};
use std::collections::BTreeMap;
use tracing::debug;

/// Normalize every group of every row into one flat sequence
pub fn normalize_entries(costs: &GroupedCosts, metrics: &[String]) -> Result<Vec<CostEntry>> {
    let mut entries = Vec::new();
    for row in &costs.rows {
        for group in &row.groups {
            push_group_entries(costs, group, metrics, &mut entries)?;
        }
    }
    Ok(entries)
}

/// Normalize rows into one entry list per calendar day, sorted by date
///
/// A day split across pages arrives as several rows with the same start
/// date; their entries are concatenated in delivery order.
pub fn normalize_daily(costs: &GroupedCosts, metrics: &[String]) -> Result<Vec<DailyCosts>> {
    let mut by_date: BTreeMap<_, Vec<CostEntry>> = BTreeMap::new();

    for row in &costs.rows {
        let date = parse_date("TimePeriod.Start", &row.start)?;
        let end = parse_date("TimePeriod.End", &row.end)?;
        if end < date {
            return Err(CostpulseError::parse(
                "TimePeriod.End",
                row.end.as_str(),
                format!("ends before its start {}", row.start),
            ));
        }

        let entries = by_date.entry(date).or_default();
        for group in &row.groups {
            push_group_entries(costs, group, metrics, entries)?;
        }
    }

    if by_date.len() < costs.rows.len() {
        debug!(
            "Merged {} cost rows into {} days",
            costs.rows.len(),
            by_date.len()
        );
    }
    Ok(by_date
        .into_iter()
        .map(|(date, entries)| DailyCosts { date, entries })
        .collect())
}

fn push_group_entries(
    costs: &GroupedCosts,
    group: &CostGroup,
    metrics: &[String],
    out: &mut Vec<CostEntry>,
) -> Result<()> {
    let account_name = group
        .keys
        .first()
        .map(|id| costs.describe(id))
        .unwrap_or_default();
    let service_name = group.keys.get(1).map(String::as_str).unwrap_or_default();

    for metric in metrics {
        let raw = group.metrics.get(metric).ok_or_else(|| {
            CostpulseError::parse(metric.as_str(), "", "metric missing from response group")
        })?;
        out.push(CostEntry::new(account_name, service_name, parse_amount(metric, raw)?));
    }
    Ok(())
}

/// Parse a textual monetary amount
pub fn parse_amount(field: &str, raw: &str) -> Result<f64> {
    let amount = raw
        .trim()
        .parse::<f64>()
        .map_err(|e| CostpulseError::parse(field, raw, e))?;
    if !amount.is_finite() {
        return Err(CostpulseError::parse(field, raw, "amount is not finite"));
    }
    Ok(amount)
}
