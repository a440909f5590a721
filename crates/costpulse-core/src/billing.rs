//! Collaborator traits for the billing API, the organization directory, and
//! the secret store
//!
//! The report pipeline only talks to the outside world through these traits.
//! Request and response shapes are plain data so that tests can script
//! multi-page responses and failures without a network.
//!
//! Amounts and dates are carried as the raw strings the API returned; the
//! normalizer owns parsing them so that malformed payloads surface as
//! [`CostpulseError::Parse`](crate::error::CostpulseError::Parse).

use crate::error::Result;
use crate::period::Period;
use crate::types::{Account, AccountId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Dimension key grouping costs by linked (member) account
pub const LINKED_ACCOUNT: &str = "LINKED_ACCOUNT";
/// Dimension key grouping costs by service
pub const SERVICE: &str = "SERVICE";
/// Metric used for cost queries
pub const UNBLENDED_COST: &str = "UnblendedCost";
/// Metric used for forecast queries
pub const FORECAST_UNBLENDED_COST: &str = "UNBLENDED_COST";
/// Service value of tax line items
pub const TAX_SERVICE: &str = "Tax";

/// Time granularity of cost rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Granularity {
    #[default]
    Daily,
    Monthly,
}

/// Whether a group key is a cost dimension or a cost allocation tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupKind {
    #[default]
    Dimension,
    Tag,
}

/// One grouping level of a cost query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupBy {
    #[serde(rename = "type", default)]
    pub kind: GroupKind,
    pub key: String,
}

impl GroupBy {
    pub fn dimension(key: impl Into<String>) -> Self {
        Self {
            kind: GroupKind::Dimension,
            key: key.into(),
        }
    }
}

/// Key and accepted values of a dimension or tag match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchValues {
    pub key: String,
    pub values: Vec<String>,
}

/// Filter expression applied to a cost query
///
/// Serialized in snake case, e.g.
/// `{"not": {"dimension": {"key": "SERVICE", "values": ["Tax"]}}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    Dimension(MatchValues),
    Tag(MatchValues),
    Not(Box<Filter>),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    /// Match a dimension against a set of values
    pub fn dimension<I, S>(key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Filter::Dimension(MatchValues {
            key: key.into(),
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    /// Negate this filter
    pub fn negate(self) -> Self {
        Filter::Not(Box::new(self))
    }

    /// Exclude tax line items
    pub fn exclude_tax() -> Self {
        Self::dimension(SERVICE, [TAX_SERVICE]).negate()
    }
}

/// A grouped cost query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostQuery {
    pub period: Period,
    pub granularity: Granularity,
    pub metrics: Vec<String>,
    pub group_by: Vec<GroupBy>,
    pub filter: Option<Filter>,
}

/// One page of a grouped cost response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostPage {
    /// Time rows of this page
    pub rows: Vec<CostRow>,
    /// Dimension value descriptions introduced by this page
    pub dimensions: Vec<DimensionValue>,
    /// Continuation token; `None` on the last page
    pub next_page_token: Option<String>,
}

/// All groups of one time bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRow {
    /// ISO start date of the bucket, as returned
    pub start: String,
    /// ISO end date of the bucket, as returned
    pub end: String,
    pub groups: Vec<CostGroup>,
}

/// One group of a time bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostGroup {
    /// Group key values, in query group-by order
    pub keys: Vec<String>,
    /// Metric name to raw textual amount
    pub metrics: BTreeMap<String, String>,
}

/// Human-readable description of an opaque dimension value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionValue {
    pub value: String,
    pub description: Option<String>,
}

/// A forecast request scoped to a single linked account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastQuery {
    pub period: Period,
    pub granularity: Granularity,
    pub metric: String,
    pub account_id: AccountId,
}

/// Forecast response with the raw textual total
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub amount: Option<String>,
}

/// Billing API (cost and usage, cost forecast)
#[async_trait]
pub trait BillingApi: Send + Sync {
    /// Fetch one page of grouped costs
    async fn cost_page(&self, query: &CostQuery, page_token: Option<&str>) -> Result<CostPage>;

    /// Fetch the forecast total for one account
    async fn forecast(&self, query: &ForecastQuery) -> Result<ForecastResponse>;
}

/// Organization directory
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// List every account of the organization
    async fn list_accounts(&self) -> Result<Vec<Account>>;
}

/// Secret store holding a JSON configuration layer
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the current secret string, `None` if the secret has no string value
    async fn secret_string(&self, name: &str) -> Result<Option<String>>;
}
