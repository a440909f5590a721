//! Secrets Manager configuration store

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_secretsmanager::Client;
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use costpulse_core::billing::SecretStore;
use costpulse_core::error::{CostpulseError, Result};

const CURRENT_VERSION_STAGE: &str = "AWSCURRENT";

/// [`SecretStore`] reading the current version of a Secrets Manager secret
#[derive(Clone)]
pub struct SecretsManagerStore {
    client: Client,
}

impl SecretsManagerStore {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl SecretStore for SecretsManagerStore {
    async fn secret_string(&self, name: &str) -> Result<Option<String>> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(name)
            .version_stage(CURRENT_VERSION_STAGE)
            .send()
            .await
            .map_err(|e| CostpulseError::fetch("GetSecretValue", DisplayErrorContext(&e)))?;
        Ok(output.secret_string().map(str::to_string))
    }
}
