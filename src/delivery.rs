//! Report delivery
//!
//! [`SlackDelivery`] posts the text to a channel and uploads the chart as a
//! file with an initial comment. [`LocalDelivery`] is the dry-run variant:
//! it prints the text and writes the chart to a local directory.

use crate::chart::ChartImage;
use async_trait::async_trait;
use costpulse_core::error::{CostpulseError, Result};
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use tracing::{debug, info};

/// Default Slack Web API endpoint
pub const SLACK_API_BASE: &str = "https://slack.com/api";
/// Comment attached to the uploaded chart
pub const CHART_COMMENT: &str = "Daily cost by account (3 months)";

/// Sends a finished report somewhere
#[async_trait]
pub trait Delivery: Send + Sync {
    async fn deliver(&self, text: &str, chart: &ChartImage) -> Result<()>;
}

/// Slack Web API delivery
pub struct SlackDelivery {
    client: reqwest::Client,
    base_url: String,
    token: String,
    channel: String,
}

/// Common envelope of Slack Web API responses
#[derive(Debug, Deserialize)]
struct SlackResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    upload_url: Option<String>,
    #[serde(default)]
    file_id: Option<String>,
}

impl SlackDelivery {
    pub fn new(token: impl Into<String>, channel: impl Into<String>) -> Self {
        Self::with_base_url(token, channel, SLACK_API_BASE)
    }

    /// Use another API endpoint
    pub fn with_base_url(
        token: impl Into<String>,
        channel: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            channel: channel.into(),
        }
    }

    async fn post_message(&self, text: &str) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/chat.postMessage", self.base_url))
            .bearer_auth(&self.token)
            .json(&json!({ "channel": self.channel, "text": text }))
            .send()
            .await?;
        check("chat.postMessage", response.json().await?)?;
        Ok(())
    }

    async fn upload_file(&self, chart: &ChartImage) -> Result<()> {
        let url = Url::parse_with_params(
            &format!("{}/files.getUploadURLExternal", self.base_url),
            &[
                ("filename", chart.file_name.clone()),
                ("length", chart.bytes.len().to_string()),
            ],
        )
        .map_err(|e| CostpulseError::Delivery(format!("invalid Slack API URL: {e}")))?;

        let ticket = check(
            "files.getUploadURLExternal",
            self.client
                .get(url)
                .bearer_auth(&self.token)
                .send()
                .await?
                .json()
                .await?,
        )?;
        let (Some(upload_url), Some(file_id)) = (ticket.upload_url, ticket.file_id) else {
            return Err(CostpulseError::Delivery(
                "files.getUploadURLExternal returned no upload URL".to_string(),
            ));
        };
        debug!("Uploading {} bytes as file {}", chart.bytes.len(), file_id);

        self.client
            .post(&upload_url)
            .header(reqwest::header::CONTENT_TYPE, chart.mime)
            .body(chart.bytes.clone())
            .send()
            .await?
            .error_for_status()?;

        let response = self
            .client
            .post(format!("{}/files.completeUploadExternal", self.base_url))
            .bearer_auth(&self.token)
            .json(&json!({
                "files": [{ "id": file_id, "title": chart.file_name }],
                "channel_id": self.channel,
                "initial_comment": CHART_COMMENT,
            }))
            .send()
            .await?;
        check("files.completeUploadExternal", response.json().await?)?;
        Ok(())
    }
}

fn check(method: &str, response: SlackResponse) -> Result<SlackResponse> {
    if response.ok {
        Ok(response)
    } else {
        Err(CostpulseError::Delivery(format!(
            "{} failed: {}",
            method,
            response.error.as_deref().unwrap_or("unknown error")
        )))
    }
}

#[async_trait]
impl Delivery for SlackDelivery {
    async fn deliver(&self, text: &str, chart: &ChartImage) -> Result<()> {
        self.post_message(text).await?;
        self.upload_file(chart).await?;
        info!("Posted report to Slack channel {}", self.channel);
        Ok(())
    }
}

/// Dry-run delivery: stdout plus a local chart file
pub struct LocalDelivery {
    output_dir: PathBuf,
}

impl LocalDelivery {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Where the chart of `chart` ends up
    pub fn chart_path(&self, chart: &ChartImage) -> PathBuf {
        self.output_dir.join(&chart.file_name)
    }
}

#[async_trait]
impl Delivery for LocalDelivery {
    async fn deliver(&self, text: &str, chart: &ChartImage) -> Result<()> {
        println!("{text}");

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.chart_path(chart);
        tokio::fs::write(&path, &chart.bytes).await?;
        info!("Wrote chart to {}", path.display());
        Ok(())
    }
}
