//! Per-account forecast collection
//!
//! One forecast request is issued per directory account, all concurrently
//! (one tokio task each, no pool limit). Results are read only after every
//! task has finished.
//!
//! Forecast data is allowed to be partial:
//!
//! - a failed *call* is logged and the account is left out of the map
//! - a successful call without an amount is treated as "no data"
//! - a successful call with a malformed amount fails the whole collection,
//!   since it points at a payload problem rather than an outage
//!
//! When several amounts are malformed, the error of the first account in
//! directory order is returned and the remaining ones are logged.

use crate::normalizer::parse_amount;
use costpulse_core::billing::{
    BillingApi, FORECAST_UNBLENDED_COST, ForecastQuery, ForecastResponse, Granularity,
};
use costpulse_core::error::{CostpulseError, Result};
use costpulse_core::period::Period;
use costpulse_core::types::{Account, ForecastMap};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Collects month-remaining forecasts for every account
pub struct ForecastAggregator<B: ?Sized> {
    api: Arc<B>,
    metric: String,
}

impl<B: BillingApi + ?Sized + 'static> ForecastAggregator<B> {
    pub fn new(api: Arc<B>) -> Self {
        Self {
            api,
            metric: FORECAST_UNBLENDED_COST.to_string(),
        }
    }

    /// Use a different forecast metric
    pub fn with_metric(mut self, metric: impl Into<String>) -> Self {
        self.metric = metric.into();
        self
    }

    /// Collect forecasts over `period`, keyed by account name
    ///
    /// An empty period means no days remain in the month: no request is
    /// issued and an empty map is returned.
    ///
    /// # Errors
    ///
    /// Returns [`CostpulseError::Parse`] if any successful call carried an
    /// unparsable amount, or [`CostpulseError::Fetch`] if a task panicked.
    pub async fn collect(&self, accounts: &[Account], period: Period) -> Result<ForecastMap> {
        if period.is_empty() {
            info!("No days remain in {}, skipping forecasts", period);
            return Ok(ForecastMap::new());
        }

        let mut tasks = JoinSet::new();
        for (index, account) in accounts.iter().cloned().enumerate() {
            let api = Arc::clone(&self.api);
            let query = ForecastQuery {
                period,
                granularity: Granularity::Monthly,
                metric: self.metric.clone(),
                account_id: account.id.clone(),
            };
            tasks.spawn(async move {
                let outcome = api.forecast(&query).await;
                (index, account, outcome)
            });
        }

        let mut outcomes = Vec::with_capacity(accounts.len());
        while let Some(joined) = tasks.join_next().await {
            outcomes.push(joined.map_err(|e| CostpulseError::fetch("GetCostForecast", e))?);
        }
        outcomes.sort_by_key(|(index, _, _)| *index);

        let mut forecasts = ForecastMap::new();
        let mut malformed = Vec::new();
        for (_, account, outcome) in outcomes {
            match outcome {
                Err(e) => warn!(
                    "Unable to get cost forecast for {} ({}): {}",
                    account.name, account.id, e
                ),
                Ok(ForecastResponse { amount: None }) => {
                    debug!("No forecast data for {} ({})", account.name, account.id)
                }
                Ok(ForecastResponse { amount: Some(raw) }) => {
                    match parse_amount("Total.Amount", &raw) {
                        Ok(amount) => *forecasts.entry(account.name).or_insert(0.0) += amount,
                        Err(e) => malformed.push(e),
                    }
                }
            }
        }

        let mut malformed = malformed.into_iter();
        if let Some(first) = malformed.next() {
            for other in malformed {
                warn!("Additional malformed forecast: {}", other);
            }
            return Err(first);
        }

        info!(
            "Collected forecasts for {} of {} accounts",
            forecasts.len(),
            accounts.len()
        );
        Ok(forecasts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ForecastScript, ScriptedBilling};
    use chrono::NaiveDate;
    use std::time::Duration;

    fn accounts() -> Vec<Account> {
        vec![
            Account::new("1", Some("account_1")),
            Account::new("2", Some("account_2")),
            Account::new("3", Some("account_3")),
        ]
    }

    fn month_remaining() -> Period {
        Period::new(
            NaiveDate::from_ymd_opt(2022, 11, 25).unwrap(),
            NaiveDate::from_ymd_opt(2022, 12, 1).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_collects_all_accounts() {
        let api = Arc::new(ScriptedBilling::with_forecasts(&[
            ("1", ForecastScript::Amount("5.1")),
            ("2", ForecastScript::Amount("7.7")),
            ("3", ForecastScript::Amount("0")),
        ]));

        let forecasts = ForecastAggregator::new(api.clone())
            .collect(&accounts(), month_remaining())
            .await
            .unwrap();

        assert_eq!(forecasts.len(), 3);
        assert_eq!(forecasts["account_1"], 5.1);
        assert_eq!(forecasts["account_2"], 7.7);
        assert_eq!(api.forecast_calls(), 3);
    }

    #[tokio::test]
    async fn test_calls_are_in_flight_together() {
        // Each call blocks until all three are pending; awaiting them one by
        // one would never get past the first
        let api = Arc::new(
            ScriptedBilling::with_forecasts(&[
                ("1", ForecastScript::Amount("1.0")),
                ("2", ForecastScript::Amount("2.0")),
                ("3", ForecastScript::Amount("3.0")),
            ])
            .with_rendezvous(3),
        );

        let forecasts = tokio::time::timeout(
            Duration::from_secs(5),
            ForecastAggregator::new(api.clone()).collect(&accounts(), month_remaining()),
        )
        .await
        .expect("forecast calls did not run concurrently")
        .unwrap();

        assert_eq!(forecasts.len(), 3);
        assert_eq!(api.forecast_calls(), 3);
    }

    #[tokio::test]
    async fn test_failed_call_is_dropped() {
        let api = Arc::new(ScriptedBilling::with_forecasts(&[
            ("1", ForecastScript::Amount("5.1")),
            ("2", ForecastScript::CallFails),
            ("3", ForecastScript::Amount("1.0")),
        ]));

        let forecasts = ForecastAggregator::new(api)
            .collect(&accounts(), month_remaining())
            .await
            .unwrap();

        assert_eq!(forecasts.len(), 2);
        assert!(!forecasts.contains_key("account_2"));
    }

    #[tokio::test]
    async fn test_missing_amount_is_dropped() {
        let api = Arc::new(ScriptedBilling::with_forecasts(&[
            ("1", ForecastScript::NoData),
            ("2", ForecastScript::Amount("2.0")),
            ("3", ForecastScript::Amount("3.0")),
        ]));

        let forecasts = ForecastAggregator::new(api)
            .collect(&accounts(), month_remaining())
            .await
            .unwrap();

        assert_eq!(forecasts.keys().collect::<Vec<_>>(), vec!["account_2", "account_3"]);
    }

    #[tokio::test]
    async fn test_malformed_amount_fails_collection() {
        let api = Arc::new(ScriptedBilling::with_forecasts(&[
            ("1", ForecastScript::Amount("5.1")),
            ("2", ForecastScript::Amount("seven")),
            ("3", ForecastScript::Amount("eight")),
        ]));

        let err = ForecastAggregator::new(api)
            .collect(&accounts(), month_remaining())
            .await
            .unwrap_err();

        // First malformed account in directory order wins
        assert!(matches!(err, CostpulseError::Parse { ref value, .. } if value == "seven"));
    }

    #[tokio::test]
    async fn test_empty_period_issues_no_calls() {
        let api = Arc::new(ScriptedBilling::with_forecasts(&[(
            "1",
            ForecastScript::Amount("5.1"),
        )]));
        let last_day = NaiveDate::from_ymd_opt(2022, 12, 1).unwrap();

        let forecasts = ForecastAggregator::new(api.clone())
            .collect(&accounts(), Period::new(last_day, last_day))
            .await
            .unwrap();

        assert!(forecasts.is_empty());
        assert_eq!(api.forecast_calls(), 0);
    }

    #[tokio::test]
    async fn test_no_accounts() {
        let api = Arc::new(ScriptedBilling::default());
        let forecasts = ForecastAggregator::new(api)
            .collect(&[], month_remaining())
            .await
            .unwrap();
        assert!(forecasts.is_empty());
    }
}
