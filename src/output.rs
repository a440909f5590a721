//! Text report rendering
//!
//! The report is a fixed template: a heading line with the summarized date,
//! the total, and a forecast clause, followed by two fenced tables (cost by
//! account, top services). Tables are borderless `prettytable` tables with
//! centered upper-case headers and right-aligned amounts.
//!
//! Every amount goes through [`format_amount`], the same function the chart
//! uses for its axis.

use crate::aggregation::ReportAggregate;
use costpulse_core::money::{format_amount, format_usd};
use costpulse_core::period::DATE_FORMAT;
use costpulse_core::{ForecastMap, ReportPeriods};
use prettytable::format::{FormatBuilder, TableFormat};
use prettytable::{Table, row};

const CODE_FENCE: &str = "```";

/// Forecast state of a report run
#[derive(Debug, Clone, PartialEq)]
pub enum ForecastStatus {
    /// Forecasting was switched off by configuration
    Disabled,
    /// Today is the last day of the month; nothing left to forecast
    Unavailable,
    /// Forecasts collected for the remaining days of the month
    Available(ForecastMap),
}

impl ForecastStatus {
    pub fn forecasts(&self) -> Option<&ForecastMap> {
        match self {
            ForecastStatus::Available(map) => Some(map),
            _ => None,
        }
    }
}

/// Renders the text part of the report
pub struct ReportText;

impl ReportText {
    pub fn render(
        report: &ReportAggregate,
        periods: &ReportPeriods,
        forecast: &ForecastStatus,
    ) -> String {
        format!(
            "\n{heading}\n\nCost by account:\n\n{fence}\n{accounts}\n{fence}\n\nTop {top} services:\n\n{fence}\n{services}\n{fence}\n",
            heading = Self::heading(report, periods, forecast),
            accounts = Self::account_table(report, forecast.forecasts()),
            top = crate::aggregation::TOP_SERVICES,
            services = Self::services_table(report),
            fence = CODE_FENCE,
        )
    }

    /// `"{date} total cost: {total} USD {clause}"`
    pub fn heading(
        report: &ReportAggregate,
        periods: &ReportPeriods,
        forecast: &ForecastStatus,
    ) -> String {
        format!(
            "{} total cost: {} {}",
            periods.two_days_ago.start.format(DATE_FORMAT),
            format_usd(report.total),
            Self::forecast_clause(report, periods, forecast)
        )
    }

    pub fn forecast_clause(
        report: &ReportAggregate,
        periods: &ReportPeriods,
        forecast: &ForecastStatus,
    ) -> String {
        match forecast {
            ForecastStatus::Disabled => String::new(),
            ForecastStatus::Unavailable => {
                "(no forecast: today is the last day of the month)".to_string()
            }
            ForecastStatus::Available(_) => format!(
                "({} forecast: {})",
                periods.month_remaining.start.format("%B"),
                format_usd(report.total_forecast)
            ),
        }
    }

    /// Per-account subtotals, with a forecast column when forecasts exist
    ///
    /// Accounts without a forecast show `0.00`.
    pub fn account_table(report: &ReportAggregate, forecasts: Option<&ForecastMap>) -> String {
        let mut table = Table::new();
        table.set_format(borderless());

        match forecasts {
            Some(forecasts) => {
                table.set_titles(row![c -> "ACCOUNT", c -> "COST(USD)", c -> "FORECAST"]);
                for subtotal in &report.by_account {
                    let forecast = forecasts
                        .get(&subtotal.account_name)
                        .copied()
                        .unwrap_or(0.0);
                    table.add_row(row![
                        subtotal.account_name,
                        r -> format_amount(subtotal.amount),
                        r -> format_amount(forecast)
                    ]);
                }
            }
            None => {
                table.set_titles(row![c -> "ACCOUNT", c -> "COST(USD)"]);
                for subtotal in &report.by_account {
                    table.add_row(row![
                        subtotal.account_name,
                        r -> format_amount(subtotal.amount)
                    ]);
                }
            }
        }

        table.to_string()
    }

    pub fn services_table(report: &ReportAggregate) -> String {
        let mut table = Table::new();
        table.set_format(borderless());
        table.set_titles(row![c -> "SERVICE", c -> "COST(USD)"]);
        for entry in &report.top_services {
            table.add_row(row![entry.service_name, r -> format_amount(entry.amount)]);
        }
        table.to_string()
    }
}

fn borderless() -> TableFormat {
    FormatBuilder::new().padding(1, 1).borders(' ').build()
}
