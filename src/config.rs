//! Layered configuration
//!
//! A run is configured from four sources, applied in this order:
//!
//! 1. the JSON file at `CONFIG_PATH` (default `config.json`)
//! 2. the JSON secret named by `SECRET_NAME`, when set
//! 3. environment variables
//! 4. command-line flags
//!
//! Each source produces a [`ConfigLayer`] whose fields are all optional. A
//! later layer overrides only the fields it sets; chart query overrides are
//! merged field by field. [`resolve_config`] validates the result once, so a
//! bad configuration fails before anything is fetched.

use costpulse_billing::ChartQueryOverrides;
use costpulse_core::billing::SecretStore;
use costpulse_core::error::{CostpulseError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Config file read when `CONFIG_PATH` is not set
pub const DEFAULT_CONFIG_PATH: &str = "config.json";
/// Dry-run chart directory when none is configured
pub const DEFAULT_OUTPUT_DIR: &str = "./tmp";

/// One configuration source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigLayer {
    #[serde(rename = "SLACK_BOT_TOKEN", alias = "slack_bot_token")]
    pub slack_bot_token: Option<String>,
    #[serde(rename = "SLACK_CHANNEL", alias = "slack_channel")]
    pub slack_channel: Option<String>,
    pub dry_run: Option<bool>,
    pub disable_forecast: Option<bool>,
    pub region: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub chart: Option<ChartQueryOverrides>,
}

impl ConfigLayer {
    /// Parse a JSON layer; `source` names it in errors
    pub fn from_json(source: &str, json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| CostpulseError::Config(format!("invalid JSON in {source}: {e}")))
    }

    /// Read the file layer
    ///
    /// A missing file is an empty layer unless the path was given explicitly.
    pub fn from_file(path: &Path, explicit: bool) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(json) => {
                debug!("Loaded config file {}", path.display());
                Self::from_json(&path.display().to_string(), &json)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !explicit => {
                debug!("No config file at {}", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(CostpulseError::Config(format!(
                "cannot read config file {}: {e}",
                path.display()
            ))),
        }
    }

    /// Read the environment layer through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());
        Self {
            slack_bot_token: var("SLACK_BOT_TOKEN"),
            slack_channel: var("SLACK_CHANNEL"),
            dry_run: var("DRY_RUN").map(|v| v == "true"),
            disable_forecast: var("DISABLE_FORECAST").map(|v| v == "true"),
            region: var("AWS_REGION"),
            output_dir: var("OUTPUT_DIR").map(PathBuf::from),
            chart: None,
        }
    }

    /// Read the environment layer from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Layer `other` on top of `self`
    pub fn merge(self, other: ConfigLayer) -> Self {
        Self {
            slack_bot_token: other.slack_bot_token.or(self.slack_bot_token),
            slack_channel: other.slack_channel.or(self.slack_channel),
            dry_run: other.dry_run.or(self.dry_run),
            disable_forecast: other.disable_forecast.or(self.disable_forecast),
            region: other.region.or(self.region),
            output_dir: other.output_dir.or(self.output_dir),
            chart: match (self.chart, other.chart) {
                (Some(base), Some(over)) => Some(base.merge(over)),
                (base, over) => over.or(base),
            },
        }
    }
}

/// Resolved, immutable configuration of one run
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub slack_bot_token: Option<String>,
    pub slack_channel: Option<String>,
    pub dry_run: bool,
    pub disable_forecast: bool,
    pub region: Option<String>,
    pub output_dir: PathBuf,
    pub chart: ChartQueryOverrides,
}

/// Merge the layers in precedence order and validate the result
///
/// # Errors
///
/// Returns [`CostpulseError::Config`] when Slack credentials are missing
/// outside dry-run mode, or when the chart overrides are invalid.
pub fn resolve_config(
    file: ConfigLayer,
    secret: Option<ConfigLayer>,
    env: ConfigLayer,
    cli: ConfigLayer,
) -> Result<Config> {
    let merged = file
        .merge(secret.unwrap_or_default())
        .merge(env)
        .merge(cli);

    let config = Config {
        slack_bot_token: merged.slack_bot_token.filter(|t| !t.is_empty()),
        slack_channel: merged.slack_channel.filter(|c| !c.is_empty()),
        dry_run: merged.dry_run.unwrap_or(false),
        disable_forecast: merged.disable_forecast.unwrap_or(false),
        region: merged.region,
        output_dir: merged
            .output_dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
        chart: merged.chart.unwrap_or_default(),
    };

    if !config.dry_run {
        if config.slack_bot_token.is_none() {
            return Err(CostpulseError::Config(
                "SLACK_BOT_TOKEN is required unless running in dry-run mode".to_string(),
            ));
        }
        if config.slack_channel.is_none() {
            return Err(CostpulseError::Config(
                "SLACK_CHANNEL is required unless running in dry-run mode".to_string(),
            ));
        }
    }
    config.chart.validate()?;

    Ok(config)
}

/// Configuration sources known before any AWS call
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    pub file: ConfigLayer,
    pub env: ConfigLayer,
    pub cli: ConfigLayer,
    /// Secret holding an extra JSON layer (`SECRET_NAME`)
    pub secret_name: Option<String>,
}

impl ConfigSources {
    /// Read the file and environment layers
    ///
    /// `config_path` (from `--config`) takes precedence over `CONFIG_PATH`.
    pub fn load(config_path: Option<PathBuf>, cli: ConfigLayer) -> Result<Self> {
        let explicit = config_path.or_else(|| {
            std::env::var("CONFIG_PATH")
                .ok()
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
        });
        let file = match &explicit {
            Some(path) => ConfigLayer::from_file(path, true)?,
            None => ConfigLayer::from_file(Path::new(DEFAULT_CONFIG_PATH), false)?,
        };

        Ok(Self {
            file,
            env: ConfigLayer::from_env(),
            cli,
            secret_name: std::env::var("SECRET_NAME").ok().filter(|s| !s.is_empty()),
        })
    }

    /// Region from the layers available without the secret
    pub fn region(&self) -> Option<String> {
        self.cli
            .region
            .clone()
            .or_else(|| self.env.region.clone())
            .or_else(|| self.file.region.clone())
    }

    /// Fetch the secret layer, if any, and resolve
    pub async fn resolve(self, store: &dyn SecretStore) -> Result<Config> {
        let secret = match &self.secret_name {
            Some(name) => {
                info!("Loading configuration secret {}", name);
                match store.secret_string(name).await? {
                    Some(json) => Some(ConfigLayer::from_json(&format!("secret {name}"), &json)?),
                    None => {
                        warn!("Secret {} has no string value, ignoring it", name);
                        None
                    }
                }
            }
            None => None,
        };
        resolve_config(self.file, secret, self.env, self.cli)
    }
}
