//! Report pipeline
//!
//! [`ReportGenerator`] runs every step of a report strictly in order and
//! stops at the first fatal error, so a failed run never reaches delivery.
//! The only concurrent step is forecast collection, which fans out one task
//! per account and joins them before anything else proceeds.

use crate::aggregation::ReportAggregate;
use crate::chart::{ChartBackend, ChartImage, SvgChart};
use crate::config::Config;
use crate::delivery::{Delivery, LocalDelivery, SlackDelivery};
use crate::output::{ForecastStatus, ReportText};
use crate::timeseries::StackedChart;
use chrono::NaiveDate;
use costpulse_aws::{CostExplorerBilling, OrganizationsDirectory, load_sdk_config};
use costpulse_billing::{
    ChartQueryOverrides, CostFetcher, ForecastAggregator, chart_query, daily_summary_query,
    normalize_daily, normalize_entries,
};
use costpulse_core::billing::{AccountDirectory, BillingApi};
use costpulse_core::error::{CostpulseError, Result};
use costpulse_core::ReportPeriods;
use std::sync::Arc;
use tracing::info;

/// A finished report, ready for delivery
#[derive(Debug, Clone)]
pub struct Report {
    pub periods: ReportPeriods,
    pub aggregate: ReportAggregate,
    pub forecast: ForecastStatus,
    pub text: String,
    pub timeseries: StackedChart,
    pub chart: ChartImage,
}

/// Builds one report from the billing API and the account directory
pub struct ReportGenerator<B: ?Sized, D: ?Sized> {
    billing: Arc<B>,
    directory: Arc<D>,
    backend: Box<dyn ChartBackend>,
    disable_forecast: bool,
    chart_overrides: ChartQueryOverrides,
}

impl<B, D> ReportGenerator<B, D>
where
    B: BillingApi + ?Sized + 'static,
    D: AccountDirectory + ?Sized,
{
    pub fn new(billing: Arc<B>, directory: Arc<D>) -> Self {
        Self {
            billing,
            directory,
            backend: Box::new(SvgChart::default()),
            disable_forecast: false,
            chart_overrides: ChartQueryOverrides::default(),
        }
    }

    pub fn with_chart_backend(mut self, backend: Box<dyn ChartBackend>) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_forecast_disabled(mut self, disabled: bool) -> Self {
        self.disable_forecast = disabled;
        self
    }

    pub fn with_chart_overrides(mut self, overrides: ChartQueryOverrides) -> Self {
        self.chart_overrides = overrides;
        self
    }

    /// Generate the report for the local calendar date `today`
    pub async fn generate(&self, today: NaiveDate) -> Result<Report> {
        let periods = ReportPeriods::from_today(today);
        info!(
            "Generating report for {} (chart window {})",
            periods.two_days_ago.start, periods.trailing
        );

        let accounts = self.directory.list_accounts().await?;
        info!("Organization directory lists {} accounts", accounts.len());

        let forecast = if self.disable_forecast {
            ForecastStatus::Disabled
        } else {
            let forecasts = ForecastAggregator::new(Arc::clone(&self.billing))
                .collect(&accounts, periods.month_remaining)
                .await?;
            if periods.forecast_available() {
                ForecastStatus::Available(forecasts)
            } else {
                ForecastStatus::Unavailable
            }
        };

        let fetcher = CostFetcher::new(Arc::clone(&self.billing));

        let summary_query = daily_summary_query(periods.two_days_ago);
        let summary = fetcher.fetch(&summary_query).await?;
        let entries = normalize_entries(&summary, &summary_query.metrics)?;

        let trailing_query = chart_query(periods.trailing, &self.chart_overrides);
        let trailing = fetcher.fetch(&trailing_query).await?;
        let days = normalize_daily(&trailing, &trailing_query.metrics)?;

        let aggregate = ReportAggregate::build(&entries, forecast.forecasts());
        let text = ReportText::render(&aggregate, &periods, &forecast);

        let timeseries = StackedChart::build(&days, &accounts, &trailing_query.period);
        let chart = self.backend.render(&timeseries)?;

        Ok(Report {
            periods,
            aggregate,
            forecast,
            text,
            timeseries,
            chart,
        })
    }
}

/// Pick the delivery channel for `config`
pub fn delivery_for(config: &Config) -> Result<Box<dyn Delivery>> {
    if config.dry_run {
        return Ok(Box::new(LocalDelivery::new(&config.output_dir)));
    }
    match (&config.slack_bot_token, &config.slack_channel) {
        (Some(token), Some(channel)) => Ok(Box::new(SlackDelivery::new(token, channel))),
        _ => Err(CostpulseError::Config(
            "Slack delivery needs SLACK_BOT_TOKEN and SLACK_CHANNEL".to_string(),
        )),
    }
}

/// Generate the report against AWS and deliver it
pub async fn run(config: &Config, today: NaiveDate) -> Result<()> {
    let delivery = delivery_for(config)?;

    let sdk = load_sdk_config(config.region.as_deref()).await;
    let generator = ReportGenerator::new(
        Arc::new(CostExplorerBilling::new(&sdk)),
        Arc::new(OrganizationsDirectory::new(&sdk)),
    )
    .with_forecast_disabled(config.disable_forecast)
    .with_chart_overrides(config.chart.clone());

    let report = generator.generate(today).await?;
    delivery.deliver(&report.text, &report.chart).await?;

    info!(
        "Delivered report for {}: total {:.2} USD",
        report.periods.two_days_ago.start, report.aggregate.total
    );
    Ok(())
}
