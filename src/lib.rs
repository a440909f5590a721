//! costpulse - Daily AWS cost summary and 3-month stacked chart
//!
//! This library provides functionality to:
//! - Fetch grouped daily costs from the billing API, following pagination
//! - Collect month-end forecasts for every account concurrently
//! - Aggregate per-account subtotals and the top services of a day
//! - Build a stacked per-account time series and render it as a chart
//! - Render the text report and deliver it to Slack or local files
//!
//! # Examples
//!
//! ```no_run
//! use costpulse::report::ReportGenerator;
//! use costpulse_aws::{CostExplorerBilling, OrganizationsDirectory, load_sdk_config};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> costpulse::Result<()> {
//!     let sdk = load_sdk_config(None).await;
//!     let generator = ReportGenerator::new(
//!         Arc::new(CostExplorerBilling::new(&sdk)),
//!         Arc::new(OrganizationsDirectory::new(&sdk)),
//!     );
//!
//!     let today = chrono::Utc::now().date_naive();
//!     let report = generator.generate(today).await?;
//!     println!("{}", report.text);
//!     Ok(())
//! }
//! ```

pub mod aggregation;
pub mod chart;
pub mod cli;
pub mod config;
pub mod delivery;
pub mod output;
pub mod report;
pub mod timeseries;

// Re-export core modules for convenience
pub use costpulse_core::{error, money, period, timezone, types};

// Re-export commonly used types
pub use costpulse_core::{CostpulseError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
