//! Paginated cost fetching
//!
//! The billing API splits large responses into pages linked by a
//! continuation token. [`CostFetcher::fetch`] follows the tokens until the
//! API reports none, accumulating both the time rows and the dimension
//! descriptions of every page. Pages may introduce dimension values that
//! earlier pages never mentioned, so the maps are merged rather than
//! replaced.
//!
//! Pagination is strictly sequential: each request depends on the token
//! of the previous response. A failure on any page aborts the whole fetch.
//!
//! # Examples
//!
//! ```no_run
//! use costpulse_billing::{CostFetcher, daily_summary_query};
//! use costpulse_core::billing::BillingApi;
//! use costpulse_core::ReportPeriods;
//! use std::sync::Arc;
//!
//! # async fn example<B: BillingApi>(api: Arc<B>) -> costpulse_core::Result<()> {
//! let periods = ReportPeriods::from_today(chrono::NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
//! let costs = CostFetcher::new(api).fetch(&daily_summary_query(periods.two_days_ago)).await?;
//! println!("{} rows over {} pages", costs.rows.len(), costs.pages);
//! # Ok(())
//! # }
//! ```

use costpulse_core::billing::{BillingApi, CostPage, CostQuery, CostRow};
use costpulse_core::error::Result;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Merged result of every page of a cost query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedCosts {
    /// Time rows, concatenated in page order
    pub rows: Vec<CostRow>,
    /// Dimension value to description, later pages winning on collision
    pub dimensions: BTreeMap<String, String>,
    /// Number of pages fetched
    pub pages: usize,
}

impl GroupedCosts {
    /// Append one page
    pub fn merge_page(&mut self, page: CostPage) {
        for dimension in page.dimensions {
            self.dimensions
                .insert(dimension.value, dimension.description.unwrap_or_default());
        }
        self.rows.extend(page.rows);
        self.pages += 1;
    }

    /// Resolve a dimension value to its description
    ///
    /// Values that no page described resolve to an empty string.
    pub fn describe(&self, value: &str) -> &str {
        self.dimensions.get(value).map(String::as_str).unwrap_or("")
    }
}

/// Fetches every page of a grouped cost query
pub struct CostFetcher<B: ?Sized> {
    api: Arc<B>,
}

impl<B: BillingApi + ?Sized> CostFetcher<B> {
    pub fn new(api: Arc<B>) -> Self {
        Self { api }
    }

    /// Fetch all pages of `query`
    ///
    /// # Errors
    ///
    /// Returns the first page error; rows from earlier pages are discarded.
    pub async fn fetch(&self, query: &CostQuery) -> Result<GroupedCosts> {
        let mut merged = GroupedCosts::default();
        let mut token: Option<String> = None;

        loop {
            let page = self.api.cost_page(query, token.as_deref()).await?;
            debug!(
                "Fetched cost page {} for {}: {} rows, {} dimension values",
                merged.pages + 1,
                query.period,
                page.rows.len(),
                page.dimensions.len()
            );

            let next = page.next_page_token.clone();
            merged.merge_page(page);

            match next {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        info!(
            "Fetched {} cost rows for {} in {} page(s)",
            merged.rows.len(),
            query.period,
            merged.pages
        );
        Ok(merged)
    }
}
