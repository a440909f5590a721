//! Scripted billing API for unit tests
//!
//! Integration tests in the root crate keep their own copy of these helpers
//! in `tests/common/mod.rs`.

use async_trait::async_trait;
use chrono::NaiveDate;
use costpulse_core::Period;
use costpulse_core::billing::{
    BillingApi, CostGroup, CostPage, CostQuery, CostRow, DimensionValue, ForecastQuery,
    ForecastResponse, UNBLENDED_COST,
};
use costpulse_core::error::{CostpulseError, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Barrier;

/// Scripted outcome of one forecast call
#[derive(Debug, Clone)]
pub enum ForecastScript {
    Amount(&'static str),
    NoData,
    CallFails,
}

/// Billing API replaying scripted pages and forecasts
#[derive(Default)]
pub struct ScriptedBilling {
    pages: Mutex<VecDeque<Result<CostPage>>>,
    tokens: Mutex<Vec<Option<String>>>,
    forecasts: HashMap<String, ForecastScript>,
    forecast_calls: AtomicUsize,
    rendezvous: Option<Arc<Barrier>>,
}

impl ScriptedBilling {
    pub fn with_pages(pages: Vec<Result<CostPage>>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
            ..Default::default()
        }
    }

    pub fn with_forecasts(forecasts: &[(&str, ForecastScript)]) -> Self {
        Self {
            forecasts: forecasts
                .iter()
                .map(|(id, script)| (id.to_string(), script.clone()))
                .collect(),
            ..Default::default()
        }
    }

    /// Make every forecast call wait until `parties` calls are in flight
    pub fn with_rendezvous(mut self, parties: usize) -> Self {
        self.rendezvous = Some(Arc::new(Barrier::new(parties)));
        self
    }

    /// Continuation tokens received, in call order
    pub fn tokens_seen(&self) -> Vec<Option<String>> {
        self.tokens.lock().unwrap().clone()
    }

    pub fn forecast_calls(&self) -> usize {
        self.forecast_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BillingApi for ScriptedBilling {
    async fn cost_page(&self, _query: &CostQuery, page_token: Option<&str>) -> Result<CostPage> {
        self.tokens
            .lock()
            .unwrap()
            .push(page_token.map(str::to_string));
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CostpulseError::fetch("GetCostAndUsage", "no page scripted")))
    }

    async fn forecast(&self, query: &ForecastQuery) -> Result<ForecastResponse> {
        self.forecast_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(barrier) = &self.rendezvous {
            barrier.wait().await;
        }
        match self.forecasts.get(query.account_id.as_str()) {
            Some(ForecastScript::Amount(amount)) => Ok(ForecastResponse {
                amount: Some(amount.to_string()),
            }),
            Some(ForecastScript::NoData) => Ok(ForecastResponse::default()),
            Some(ForecastScript::CallFails) | None => Err(CostpulseError::fetch(
                "GetCostForecast",
                format!("access denied for {}", query.account_id),
            )),
        }
    }
}

pub fn test_period() -> Period {
    Period::new(
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 6, 2).unwrap(),
    )
}

/// Group with an `UnblendedCost` amount
pub fn group(keys: &[&str], amount: &str) -> CostGroup {
    CostGroup {
        keys: keys.iter().map(|k| k.to_string()).collect(),
        metrics: [(UNBLENDED_COST.to_string(), amount.to_string())].into(),
    }
}

/// Daily row starting on `start`
pub fn row(start: &str, groups: Vec<CostGroup>) -> CostRow {
    let end = NaiveDate::parse_from_str(start, "%Y-%m-%d")
        .map(|d| (d + chrono::Days::new(1)).format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    CostRow {
        start: start.to_string(),
        end,
        groups,
    }
}

pub fn page(rows: Vec<CostRow>, dimensions: &[(&str, &str)], next: Option<&str>) -> CostPage {
    CostPage {
        rows,
        dimensions: dimensions
            .iter()
            .map(|(value, description)| DimensionValue {
                value: value.to_string(),
                description: Some(description.to_string()),
            })
            .collect(),
        next_page_token: next.map(str::to_string),
    }
}
