//! CLI interface for costpulse
//!
//! The binary has no subcommands: one invocation produces and delivers one
//! report. Flags form the highest-precedence configuration layer.
//!
//! # Example
//!
//! ```bash
//! # Print the report and write the chart to ./tmp instead of posting
//! costpulse --dry-run
//!
//! # Backfill the report as it would have looked on 2024-06-10
//! costpulse --dry-run --date 2024-06-10 --timezone Asia/Tokyo
//! ```

use crate::config::ConfigLayer;
use chrono::NaiveDate;
use clap::Parser;
use costpulse_core::error::{CostpulseError, Result};
use costpulse_core::period::DATE_FORMAT;
use std::path::PathBuf;

/// Daily AWS cost report with a 3-month stacked chart
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "costpulse")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Print the report and write the chart locally instead of posting to Slack
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the month-end forecast
    #[arg(long)]
    pub disable_forecast: bool,

    /// Configuration file (overrides CONFIG_PATH)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory for the dry-run chart
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Timezone deciding what "today" is (e.g. "Asia/Tokyo", "UTC")
    /// If not specified, uses TZ or the system's local timezone
    #[arg(long, short = 'z')]
    pub timezone: Option<String>,

    /// Use UTC for "today" (overrides --timezone)
    #[arg(long)]
    pub utc: bool,

    /// Report as if today were this date (YYYY-MM-DD)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub date: Option<String>,

    /// Only log warnings and errors
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

impl Cli {
    /// Configuration layer carried by the flags
    ///
    /// Boolean flags only ever switch a setting on.
    pub fn config_layer(&self) -> ConfigLayer {
        ConfigLayer {
            dry_run: self.dry_run.then_some(true),
            disable_forecast: self.disable_forecast.then_some(true),
            output_dir: self.output_dir.clone(),
            ..Default::default()
        }
    }

    /// The `--date` override, if given
    pub fn today_override(&self) -> Result<Option<NaiveDate>> {
        self.date
            .as_deref()
            .map(|raw| {
                NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| {
                    CostpulseError::InvalidDate(format!("{raw}, expected YYYY-MM-DD"))
                })
            })
            .transpose()
    }
}
