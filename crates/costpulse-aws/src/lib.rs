//! AWS adapters for costpulse
//!
//! Implements the collaborator traits of `costpulse_core::billing` on top of
//! the AWS SDK:
//!
//! - [`CostExplorerBilling`]: cost and usage pages, per-account forecasts
//! - [`OrganizationsDirectory`]: organization accounts
//! - [`SecretsManagerStore`]: JSON configuration secret
//!
//! All three share one [`SdkConfig`] loaded by [`load_sdk_config`].

pub mod cost_explorer;
pub mod organizations;
pub mod secrets;

pub use aws_config::SdkConfig;
pub use cost_explorer::CostExplorerBilling;
pub use organizations::OrganizationsDirectory;
pub use secrets::SecretsManagerStore;

use aws_config::{BehaviorVersion, Region};
use tracing::debug;

/// Load the shared SDK configuration from the default credential chain
///
/// `region` overrides the region resolved from the environment or profile.
pub async fn load_sdk_config(region: Option<&str>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        debug!("Using AWS region {}", region);
        loader = loader.region(Region::new(region.to_string()));
    }
    loader.load().await
}
