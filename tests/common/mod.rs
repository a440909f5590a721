//! Common test utilities and helpers for costpulse tests
//!
//! Provides an in-memory billing API that pages its rows, an in-memory
//! account directory, and builders for cost rows.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use costpulse_core::billing::{
    AccountDirectory, BillingApi, CostGroup, CostPage, CostQuery, CostRow, DimensionValue,
    ForecastQuery, ForecastResponse, UNBLENDED_COST,
};
use costpulse_core::error::{CostpulseError, Result};
use costpulse_core::types::Account;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Outcome of one forecast call
#[derive(Debug, Clone)]
pub enum ForecastReply {
    Amount(String),
    NoData,
    Fails,
}

/// In-memory billing API
///
/// Queries with a filter are served from `chart_rows`, all others from
/// `summary_rows`. Rows are split into pages of `page_size`; each page only
/// describes the account ids it contains.
pub struct FakeBilling {
    pub accounts: Vec<Account>,
    pub summary_rows: Vec<CostRow>,
    pub chart_rows: Vec<CostRow>,
    pub page_size: usize,
    pub forecasts: HashMap<String, ForecastReply>,
    pub fail_costs: bool,
    cost_calls: AtomicUsize,
    forecast_calls: AtomicUsize,
}

impl FakeBilling {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self {
            accounts,
            summary_rows: Vec::new(),
            chart_rows: Vec::new(),
            page_size: 7,
            forecasts: HashMap::new(),
            fail_costs: false,
            cost_calls: AtomicUsize::new(0),
            forecast_calls: AtomicUsize::new(0),
        }
    }

    pub fn summary(mut self, rows: Vec<CostRow>) -> Self {
        self.summary_rows = rows;
        self
    }

    pub fn chart(mut self, rows: Vec<CostRow>) -> Self {
        self.chart_rows = rows;
        self
    }

    pub fn forecast(mut self, account_id: &str, reply: ForecastReply) -> Self {
        self.forecasts.insert(account_id.to_string(), reply);
        self
    }

    pub fn failing_costs(mut self) -> Self {
        self.fail_costs = true;
        self
    }

    pub fn cost_calls(&self) -> usize {
        self.cost_calls.load(Ordering::SeqCst)
    }

    pub fn forecast_calls(&self) -> usize {
        self.forecast_calls.load(Ordering::SeqCst)
    }

    fn describe(&self, rows: &[CostRow]) -> Vec<DimensionValue> {
        let mut seen = Vec::new();
        for id in rows
            .iter()
            .flat_map(|r| &r.groups)
            .filter_map(|g| g.keys.first())
        {
            if seen.iter().any(|d: &DimensionValue| &d.value == id) {
                continue;
            }
            if let Some(account) = self.accounts.iter().find(|a| a.id.as_str() == id) {
                seen.push(DimensionValue {
                    value: id.clone(),
                    description: Some(account.name.clone()),
                });
            }
        }
        seen
    }
}

#[async_trait]
impl BillingApi for FakeBilling {
    async fn cost_page(&self, query: &CostQuery, page_token: Option<&str>) -> Result<CostPage> {
        self.cost_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_costs {
            return Err(CostpulseError::fetch("GetCostAndUsage", "service unavailable"));
        }

        let rows = if query.filter.is_some() {
            &self.chart_rows
        } else {
            &self.summary_rows
        };
        let offset: usize = page_token.map_or(Ok(0), str::parse::<usize>).map_err(|e| {
            CostpulseError::fetch("GetCostAndUsage", format!("bad page token: {e}"))
        })?;
        let end = (offset + self.page_size).min(rows.len());
        let page = rows[offset.min(end)..end].to_vec();

        Ok(CostPage {
            dimensions: self.describe(&page),
            rows: page,
            next_page_token: (end < rows.len()).then(|| end.to_string()),
        })
    }

    async fn forecast(&self, query: &ForecastQuery) -> Result<ForecastResponse> {
        self.forecast_calls.fetch_add(1, Ordering::SeqCst);
        match self.forecasts.get(query.account_id.as_str()) {
            Some(ForecastReply::Amount(amount)) => Ok(ForecastResponse {
                amount: Some(amount.clone()),
            }),
            Some(ForecastReply::NoData) => Ok(ForecastResponse::default()),
            Some(ForecastReply::Fails) | None => Err(CostpulseError::fetch(
                "GetCostForecast",
                "DataUnavailableException",
            )),
        }
    }
}

/// In-memory organization directory
pub struct FakeDirectory(pub Vec<Account>);

#[async_trait]
impl AccountDirectory for FakeDirectory {
    async fn list_accounts(&self) -> Result<Vec<Account>> {
        Ok(self.0.clone())
    }
}

pub fn accounts(names: &[&str]) -> Vec<Account> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| Account::new(format!("{}", 100 + i), Some(*name)))
        .collect()
}

/// Group keyed by `keys` with an `UnblendedCost` amount
pub fn group(keys: &[&str], amount: &str) -> CostGroup {
    CostGroup {
        keys: keys.iter().map(|k| k.to_string()).collect(),
        metrics: [(UNBLENDED_COST.to_string(), amount.to_string())].into(),
    }
}

/// One-day row starting on `day`
pub fn row(day: NaiveDate, groups: Vec<CostGroup>) -> CostRow {
    CostRow {
        start: day.format("%Y-%m-%d").to_string(),
        end: (day + Days::new(1)).format("%Y-%m-%d").to_string(),
        groups,
    }
}

/// Chart rows for every day of `[start, end)`, amounts from `amount(day_index, account_index)`
pub fn chart_rows<F>(
    start: NaiveDate,
    end: NaiveDate,
    accounts: &[Account],
    amount: F,
) -> Vec<CostRow>
where
    F: Fn(usize, usize) -> f64,
{
    start
        .iter_days()
        .take_while(|d| *d < end)
        .enumerate()
        .map(|(day, d)| {
            let groups = accounts
                .iter()
                .enumerate()
                .map(|(i, a)| group(&[a.id.as_str()], &amount(day, i).to_string()))
                .collect();
            row(d, groups)
        })
        .collect()
}
