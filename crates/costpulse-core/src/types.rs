//! Core domain types for costpulse
//!
//! These types are created fresh for every report run and discarded once
//! the report has been delivered. Nothing here is persisted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Strongly-typed account id wrapper
///
/// Account ids are the stable key of the organization directory; names
/// are display-only and may be empty.
///
/// # Examples
/// ```
/// use costpulse_core::types::AccountId;
///
/// let id = AccountId::new("123456789012");
/// assert_eq!(id.as_str(), "123456789012");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Create a new AccountId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An account of the organization directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Stable account id
    pub id: AccountId,
    /// Display name, empty when the directory has none
    pub name: String,
}

impl Account {
    /// Create an account, mapping a missing upstream name to `""`
    pub fn new(id: impl Into<String>, name: Option<impl Into<String>>) -> Self {
        Self {
            id: AccountId::new(id),
            name: name.map(Into::into).unwrap_or_default(),
        }
    }
}

/// One normalized cost amount
///
/// Produced by the cost normalizer and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEntry {
    /// Resolved account name (empty when the id was not in the dimension map)
    pub account_name: String,
    /// Service name, empty when the query was not grouped by service
    pub service_name: String,
    /// Amount in USD
    pub amount: f64,
}

impl CostEntry {
    pub fn new(account_name: impl Into<String>, service_name: impl Into<String>, amount: f64) -> Self {
        Self {
            account_name: account_name.into(),
            service_name: service_name.into(),
            amount,
        }
    }
}

/// All entries of a single calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCosts {
    /// The day the costs were incurred
    pub date: NaiveDate,
    /// Entries in API delivery order
    pub entries: Vec<CostEntry>,
}

impl DailyCosts {
    /// Sum of all entries of the day
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|e| e.amount).sum()
    }

    /// Sum of the entries belonging to one account
    pub fn account_total(&self, account_name: &str) -> Option<f64> {
        let mut found = false;
        let mut total = 0.0;
        for entry in self.entries.iter().filter(|e| e.account_name == account_name) {
            found = true;
            total += entry.amount;
        }
        found.then_some(total)
    }
}

/// Forecasted amount keyed by account name
///
/// May be empty when no forecast is available for the period, or partial
/// when individual forecast calls failed. The order carries no meaning.
pub type ForecastMap = BTreeMap<String, f64>;
