//! Error types for costpulse
//!
//! This module defines the error types used throughout the costpulse crates.
//! All errors are derived from `thiserror` for convenient error handling
//! and automatic `From` implementations.
//!
//! The taxonomy mirrors how a report run can fail:
//!
//! - [`CostpulseError::Fetch`]: a billing or directory call failed. Fatal
//!   for cost data; for forecasts only the affected account is dropped.
//! - [`CostpulseError::Parse`]: a response carried a malformed amount or
//!   date. Always fatal for the fetch it belongs to.
//! - [`CostpulseError::Config`]: the layered configuration could not be
//!   resolved. Raised at startup, before any fetch is issued.
//!
//! # Example
//!
//! ```
//! use costpulse_core::error::{CostpulseError, Result};
//!
//! fn parse_amount(raw: &str) -> Result<f64> {
//!     raw.parse::<f64>().map_err(|e| CostpulseError::parse("amount", raw, e))
//! }
//!
//! assert!(parse_amount("1.25").is_ok());
//! assert!(parse_amount("n/a").is_err());
//! ```

use thiserror::Error;

/// Main error type for costpulse operations
#[derive(Error, Debug)]
pub enum CostpulseError {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// A billing, directory, or secret-store call failed
    #[error("Fetch error during {operation}: {message}")]
    Fetch {
        /// The remote operation that failed (e.g. "GetCostAndUsage")
        operation: String,
        /// The underlying error message
        message: String,
    },

    /// A response field could not be parsed
    #[error("Parse error in {field} ({value:?}): {reason}")]
    Parse {
        /// Name of the offending field
        field: String,
        /// The raw value as received
        value: String,
        /// Why the value was rejected
        reason: String,
    },

    /// Invalid date format
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    /// Invalid timezone
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The chart backend could not produce an image
    #[error("Chart error: {0}")]
    Chart(String),

    /// The messaging channel rejected the report
    #[error("Delivery error: {0}")]
    Delivery(String),
}

impl CostpulseError {
    /// Build a [`CostpulseError::Fetch`] from any displayable error
    pub fn fetch(operation: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Fetch {
            operation: operation.into(),
            message: err.to_string(),
        }
    }

    /// Build a [`CostpulseError::Parse`] from any displayable error
    pub fn parse(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl std::fmt::Display,
    ) -> Self {
        Self::Parse {
            field: field.into(),
            value: value.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error came from a failed remote call
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Network(_))
    }
}

/// Convenience type alias for Results in costpulse
///
/// # Example
///
/// ```
/// use costpulse_core::Result;
///
/// fn process_data() -> Result<String> {
///     Ok("Processed successfully".to_string())
/// }
/// ```
pub type Result<T> = std::result::Result<T, CostpulseError>;
