//! Cost queries issued by a report run
//!
//! The daily summary query is fixed. The chart query has documented
//! defaults, and each of its fields can be overridden on its own through
//! [`ChartQueryOverrides`].

use costpulse_core::billing::{
    CostQuery, Filter, Granularity, GroupBy, LINKED_ACCOUNT, SERVICE, UNBLENDED_COST,
};
use costpulse_core::error::{CostpulseError, Result};
use costpulse_core::period::Period;
use serde::{Deserialize, Serialize};

/// Yesterday-but-one costs grouped by account and service
pub fn daily_summary_query(period: Period) -> CostQuery {
    CostQuery {
        period,
        granularity: Granularity::Daily,
        metrics: vec![UNBLENDED_COST.to_string()],
        group_by: vec![GroupBy::dimension(LINKED_ACCOUNT), GroupBy::dimension(SERVICE)],
        filter: None,
    }
}

/// Chart query: daily costs per account over `period`, tax excluded,
/// with any configured overrides applied
pub fn chart_query(period: Period, overrides: &ChartQueryOverrides) -> CostQuery {
    CostQuery {
        period: overrides.period.unwrap_or(period),
        granularity: overrides.granularity.unwrap_or(Granularity::Daily),
        metrics: overrides
            .metrics
            .clone()
            .unwrap_or_else(|| vec![UNBLENDED_COST.to_string()]),
        group_by: overrides
            .group_by
            .clone()
            .unwrap_or_else(|| vec![GroupBy::dimension(LINKED_ACCOUNT)]),
        filter: Some(overrides.filter.clone().unwrap_or_else(Filter::exclude_tax)),
    }
}

/// Per-field overrides of the chart query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChartQueryOverrides {
    pub granularity: Option<Granularity>,
    pub metrics: Option<Vec<String>>,
    pub group_by: Option<Vec<GroupBy>>,
    pub filter: Option<Filter>,
    pub period: Option<Period>,
}

impl ChartQueryOverrides {
    /// Layer `other` on top of `self`; fields set in `other` win
    pub fn merge(self, other: ChartQueryOverrides) -> Self {
        Self {
            granularity: other.granularity.or(self.granularity),
            metrics: other.metrics.or(self.metrics),
            group_by: other.group_by.or(self.group_by),
            filter: other.filter.or(self.filter),
            period: other.period.or(self.period),
        }
    }

    /// Reject overrides that cannot produce a valid query
    pub fn validate(&self) -> Result<()> {
        if self.metrics.as_ref().is_some_and(|m| m.is_empty()) {
            return Err(CostpulseError::Config(
                "chart.metrics must name at least one metric".to_string(),
            ));
        }
        match self.group_by.as_ref().map(Vec::len) {
            Some(0) => {
                return Err(CostpulseError::Config(
                    "chart.group_by must contain at least one key".to_string(),
                ));
            }
            Some(n) if n > 2 => {
                return Err(CostpulseError::Config(format!(
                    "chart.group_by accepts at most two keys, got {n}"
                )));
            }
            _ => {}
        }
        if let Some(period) = self.period.filter(Period::is_empty) {
            return Err(CostpulseError::Config(format!(
                "chart.period must end after it starts, got {period}"
            )));
        }
        Ok(())
    }
}
