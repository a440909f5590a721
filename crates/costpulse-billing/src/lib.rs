//! Cost acquisition for costpulse
//!
//! This crate turns billing API responses into normalized cost data:
//! paginated fetching with dimension-map merging, normalization into
//! [`CostEntry`](costpulse_core::CostEntry) values, and concurrent per-account
//! forecast collection.

pub mod fetcher;
pub mod forecast;
pub mod normalizer;
pub mod queries;

#[cfg(test)]
pub mod test_utils;

pub use fetcher::{CostFetcher, GroupedCosts};
pub use forecast::ForecastAggregator;
pub use normalizer::{normalize_daily, normalize_entries};
pub use queries::{ChartQueryOverrides, chart_query, daily_summary_query};
