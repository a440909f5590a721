//! Cost Explorer billing API

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_costexplorer::Client;
use aws_sdk_costexplorer::error::DisplayErrorContext;
use aws_sdk_costexplorer::types::{
    DateInterval, Dimension, DimensionValues, DimensionValuesWithAttributes, Expression,
    Granularity as CeGranularity, GroupDefinition, GroupDefinitionType, Metric, ResultByTime,
    TagValues,
};
use costpulse_core::billing::{
    BillingApi, CostGroup, CostPage, CostQuery, CostRow, DimensionValue, Filter, ForecastQuery,
    ForecastResponse, Granularity, GroupBy, GroupKind, LINKED_ACCOUNT,
};
use costpulse_core::error::{CostpulseError, Result};
use costpulse_core::period::Period;
use tracing::debug;

const GET_COST_AND_USAGE: &str = "GetCostAndUsage";
const GET_COST_FORECAST: &str = "GetCostForecast";
const DESCRIPTION_ATTRIBUTE: &str = "description";

/// [`BillingApi`] backed by AWS Cost Explorer
#[derive(Clone)]
pub struct CostExplorerBilling {
    client: Client,
}

impl CostExplorerBilling {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl BillingApi for CostExplorerBilling {
    async fn cost_page(&self, query: &CostQuery, page_token: Option<&str>) -> Result<CostPage> {
        debug!(
            "GetCostAndUsage {} ({} group keys, token {:?})",
            query.period,
            query.group_by.len(),
            page_token
        );
        let output = self
            .client
            .get_cost_and_usage()
            .time_period(date_interval(query.period)?)
            .granularity(granularity(query.granularity))
            .set_metrics(Some(query.metrics.clone()))
            .set_group_by(Some(query.group_by.iter().map(group_definition).collect()))
            .set_filter(query.filter.as_ref().map(expression))
            .set_next_page_token(page_token.map(str::to_string))
            .send()
            .await
            .map_err(|e| CostpulseError::fetch(GET_COST_AND_USAGE, DisplayErrorContext(&e)))?;

        Ok(CostPage {
            rows: cost_rows(output.results_by_time())?,
            dimensions: dimension_values(output.dimension_value_attributes()),
            next_page_token: output.next_page_token().map(str::to_string),
        })
    }

    async fn forecast(&self, query: &ForecastQuery) -> Result<ForecastResponse> {
        let output = self
            .client
            .get_cost_forecast()
            .time_period(date_interval(query.period)?)
            .granularity(granularity(query.granularity))
            .metric(Metric::from(query.metric.as_str()))
            .filter(expression(&Filter::dimension(
                LINKED_ACCOUNT,
                [query.account_id.as_str()],
            )))
            .send()
            .await
            .map_err(|e| CostpulseError::fetch(GET_COST_FORECAST, DisplayErrorContext(&e)))?;

        Ok(ForecastResponse {
            amount: output
                .total()
                .and_then(|total| total.amount())
                .map(str::to_string),
        })
    }
}

fn date_interval(period: Period) -> Result<DateInterval> {
    DateInterval::builder()
        .start(period.start_str())
        .end(period.end_str())
        .build()
        .map_err(|e| CostpulseError::fetch("DateInterval", e))
}

fn granularity(granularity: Granularity) -> CeGranularity {
    match granularity {
        Granularity::Daily => CeGranularity::Daily,
        Granularity::Monthly => CeGranularity::Monthly,
    }
}

pub(crate) fn group_definition(group: &GroupBy) -> GroupDefinition {
    let kind = match group.kind {
        GroupKind::Dimension => GroupDefinitionType::Dimension,
        GroupKind::Tag => GroupDefinitionType::Tag,
    };
    GroupDefinition::builder()
        .r#type(kind)
        .key(group.key.as_str())
        .build()
}

/// Translate a filter tree into a Cost Explorer expression
pub(crate) fn expression(filter: &Filter) -> Expression {
    match filter {
        Filter::Dimension(m) => Expression::builder()
            .dimensions(
                DimensionValues::builder()
                    .key(Dimension::from(m.key.as_str()))
                    .set_values(Some(m.values.clone()))
                    .build(),
            )
            .build(),
        Filter::Tag(m) => Expression::builder()
            .tags(
                TagValues::builder()
                    .key(m.key.as_str())
                    .set_values(Some(m.values.clone()))
                    .build(),
            )
            .build(),
        Filter::Not(inner) => Expression::builder().not(expression(inner)).build(),
        Filter::And(all) => Expression::builder()
            .set_and(Some(all.iter().map(expression).collect()))
            .build(),
        Filter::Or(any) => Expression::builder()
            .set_or(Some(any.iter().map(expression).collect()))
            .build(),
    }
}

pub(crate) fn cost_rows(results: &[ResultByTime]) -> Result<Vec<CostRow>> {
    results
        .iter()
        .map(|result| {
            let interval = result.time_period().ok_or_else(|| {
                CostpulseError::parse("TimePeriod", "", "missing from result row")
            })?;
            let groups = result
                .groups()
                .iter()
                .map(|group| CostGroup {
                    keys: group.keys().to_vec(),
                    metrics: group
                        .metrics()
                        .into_iter()
                        .flatten()
                        .filter_map(|(name, value)| {
                            value.amount().map(|a| (name.clone(), a.to_string()))
                        })
                        .collect(),
                })
                .collect();
            Ok(CostRow {
                start: interval.start().to_string(),
                end: interval.end().to_string(),
                groups,
            })
        })
        .collect()
}

pub(crate) fn dimension_values(values: &[DimensionValuesWithAttributes]) -> Vec<DimensionValue> {
    values
        .iter()
        .filter_map(|v| {
            Some(DimensionValue {
                value: v.value()?.to_string(),
                description: v
                    .attributes()
                    .and_then(|attrs| attrs.get(DESCRIPTION_ATTRIBUTE))
                    .cloned(),
            })
        })
        .collect()
}
