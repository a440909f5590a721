//! End-to-end tests of the report pipeline against in-memory collaborators

mod common;

use common::{
    FakeBilling, FakeDirectory, ForecastReply, accounts, chart_rows, date, group, row,
};
use costpulse::delivery::{Delivery, LocalDelivery};
use costpulse::output::ForecastStatus;
use costpulse::report::ReportGenerator;
use costpulse_core::{CostpulseError, ReportPeriods};
use std::sync::Arc;

/// Directory, billing, and today's date of a two-account organization
fn two_account_setup() -> (Arc<FakeBilling>, Arc<FakeDirectory>, chrono::NaiveDate) {
    let today = date(2022, 11, 25);
    let periods = ReportPeriods::from_today(today);
    let directory = accounts(&["account_1", "account_2"]);

    let billing = FakeBilling::new(directory.clone())
        .summary(vec![row(
            date(2022, 11, 23),
            vec![
                group(&["100", "service_a"], "1.1"),
                group(&["101", "service_a"], "3.2"),
            ],
        )])
        .chart(chart_rows(
            periods.trailing.start,
            periods.trailing.end,
            &directory,
            |day, i| (day % 5) as f64 + i as f64,
        ))
        .forecast("100", ForecastReply::Amount("5.1".to_string()))
        .forecast("101", ForecastReply::Amount("7.7".to_string()));

    (Arc::new(billing), Arc::new(FakeDirectory(directory)), today)
}

#[tokio::test]
async fn test_full_report() {
    let (billing, directory, today) = two_account_setup();

    let report = ReportGenerator::new(billing.clone(), directory)
        .generate(today)
        .await
        .unwrap();

    assert!(
        report
            .text
            .contains("2022-11-23 total cost: 4.30 USD (November forecast: 12.80 USD)")
    );
    let account_2 = report.text.find("account_2").unwrap();
    let account_1 = report.text.find("account_1").unwrap();
    assert!(account_2 < account_1);

    // One summary page plus 91 chart days in pages of 7
    assert_eq!(report.timeseries.dates.len(), 91);
    assert_eq!(billing.cost_calls(), 1 + 13);
    assert_eq!(billing.forecast_calls(), 2);
    assert!(report.chart.bytes.starts_with(b"<svg"));
}

#[tokio::test]
async fn test_partial_forecast_failure_still_reports() {
    let today = date(2022, 11, 25);
    let directory = accounts(&["a", "b", "c"]);
    let billing = Arc::new(
        FakeBilling::new(directory.clone())
            .summary(vec![row(date(2022, 11, 23), vec![group(&["100", "EC2"], "1.0")])])
            .forecast("100", ForecastReply::Amount("1.0".to_string()))
            .forecast("101", ForecastReply::Fails)
            .forecast("102", ForecastReply::Amount("2.0".to_string())),
    );

    let report = ReportGenerator::new(billing, Arc::new(FakeDirectory(directory)))
        .generate(today)
        .await
        .unwrap();

    let ForecastStatus::Available(forecasts) = &report.forecast else {
        panic!("expected forecasts, got {:?}", report.forecast);
    };
    assert_eq!(forecasts.len(), 2);
    assert!(!forecasts.contains_key("b"));
    assert_eq!(report.aggregate.total_forecast, 3.0);
}

#[tokio::test]
async fn test_malformed_forecast_fails_report() {
    let today = date(2022, 11, 25);
    let directory = accounts(&["a", "b"]);
    let billing = Arc::new(
        FakeBilling::new(directory.clone())
            .forecast("100", ForecastReply::Amount("1.0".to_string()))
            .forecast("101", ForecastReply::Amount("about three".to_string())),
    );

    let result = ReportGenerator::new(billing.clone(), Arc::new(FakeDirectory(directory)))
        .generate(today)
        .await;

    assert!(matches!(result, Err(CostpulseError::Parse { .. })));
    // Aborted before any cost was fetched
    assert_eq!(billing.cost_calls(), 0);
}

#[tokio::test]
async fn test_missing_forecast_data_is_not_an_error() {
    let directory = accounts(&["a"]);
    let billing = Arc::new(FakeBilling::new(directory.clone()).forecast("100", ForecastReply::NoData));

    let report = ReportGenerator::new(billing, Arc::new(FakeDirectory(directory)))
        .generate(date(2022, 11, 25))
        .await
        .unwrap();

    assert_eq!(report.forecast, ForecastStatus::Available(Default::default()));
    assert!(report.text.contains("(November forecast: 0.00 USD)"));
}

#[tokio::test]
async fn test_last_day_of_month_issues_no_forecast_calls() {
    let directory = accounts(&["a", "b"]);
    let billing = Arc::new(
        FakeBilling::new(directory.clone())
            .forecast("100", ForecastReply::Amount("1.0".to_string())),
    );

    let report = ReportGenerator::new(billing.clone(), Arc::new(FakeDirectory(directory)))
        .generate(date(2022, 11, 30))
        .await
        .unwrap();

    assert_eq!(billing.forecast_calls(), 0);
    assert_eq!(report.forecast, ForecastStatus::Unavailable);
    assert!(
        report
            .text
            .contains("(no forecast: today is the last day of the month)")
    );
    // Two-column account table
    assert!(!report.text.contains("FORECAST"));
}

#[tokio::test]
async fn test_disabled_forecast() {
    let directory = accounts(&["a"]);
    let billing = Arc::new(FakeBilling::new(directory.clone()));

    let report = ReportGenerator::new(billing.clone(), Arc::new(FakeDirectory(directory)))
        .with_forecast_disabled(true)
        .generate(date(2022, 11, 25))
        .await
        .unwrap();

    assert_eq!(billing.forecast_calls(), 0);
    assert_eq!(report.forecast, ForecastStatus::Disabled);
    assert!(report.text.contains("2022-11-23 total cost: 0.00 USD \n"));
}

#[tokio::test]
async fn test_cost_fetch_failure_aborts() {
    let directory = accounts(&["a"]);
    let billing = Arc::new(FakeBilling::new(directory.clone()).failing_costs());

    let result = ReportGenerator::new(billing, Arc::new(FakeDirectory(directory)))
        .with_forecast_disabled(true)
        .generate(date(2022, 11, 25))
        .await;

    assert!(matches!(result, Err(CostpulseError::Fetch { .. })));
}

#[tokio::test]
async fn test_stack_order_follows_final_day_values() {
    let today = date(2024, 6, 10);
    let periods = ReportPeriods::from_today(today);
    let directory = accounts(&["low", "high", "mid"]);
    let last_day = periods.trailing.days() as usize - 1;
    let billing = Arc::new(FakeBilling::new(directory.clone()).chart(chart_rows(
        periods.trailing.start,
        periods.trailing.end,
        &directory,
        |day, i| {
            if day == last_day {
                [1.0, 5.0, 3.0][i]
            } else {
                2.0
            }
        },
    )));

    let report = ReportGenerator::new(billing, Arc::new(FakeDirectory(directory)))
        .with_forecast_disabled(true)
        .generate(today)
        .await
        .unwrap();

    let order: Vec<_> = report
        .timeseries
        .series
        .iter()
        .map(|s| (s.account_name.as_str(), s.stack_position))
        .collect();
    assert_eq!(order, vec![("low", 0), ("mid", 1), ("high", 2)]);
    assert_eq!(report.timeseries.y_max, 1.5 * 9.0);
}

#[tokio::test]
async fn test_axis_labels_over_trailing_window() {
    let (billing, directory, today) = two_account_setup();

    let report = ReportGenerator::new(billing, directory)
        .generate(today)
        .await
        .unwrap();

    let labeled: Vec<_> = report
        .timeseries
        .labels
        .iter()
        .filter(|l| !l.is_empty())
        .map(String::as_str)
        .collect();
    assert_eq!(
        labeled,
        vec!["2022-09-01", "2022-10-01", "2022-11-01", "2022-11-23"]
    );
}

#[tokio::test]
async fn test_dry_run_delivery_writes_chart() {
    let (billing, directory, today) = two_account_setup();
    let report = ReportGenerator::new(billing, directory)
        .generate(today)
        .await
        .unwrap();
    let dir = tempfile::tempdir().unwrap();

    LocalDelivery::new(dir.path())
        .deliver(&report.text, &report.chart)
        .await
        .unwrap();

    let svg = std::fs::read_to_string(dir.path().join("timeseries.svg")).unwrap();
    assert!(svg.contains("account_1"));
    assert!(svg.contains("account_2"));
}
