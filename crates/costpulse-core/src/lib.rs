//! Core types, traits, and utilities for costpulse
//!
//! This crate provides the foundational types, error handling, report
//! periods, timezone configuration, money formatting, and the collaborator
//! traits used by all other costpulse crates.

pub mod billing;
pub mod error;
pub mod money;
pub mod period;
pub mod timezone;
pub mod types;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use error::{CostpulseError, Result};
pub use period::{Period, ReportPeriods};
pub use types::{Account, CostEntry, DailyCosts, ForecastMap};
