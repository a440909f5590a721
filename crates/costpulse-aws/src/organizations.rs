//! Organizations account directory

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_organizations::Client;
use aws_sdk_organizations::error::DisplayErrorContext;
use costpulse_core::billing::AccountDirectory;
use costpulse_core::error::{CostpulseError, Result};
use costpulse_core::types::Account;
use tracing::{debug, warn};

/// [`AccountDirectory`] listing the accounts of the caller's organization
#[derive(Clone)]
pub struct OrganizationsDirectory {
    client: Client,
}

impl OrganizationsDirectory {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl AccountDirectory for OrganizationsDirectory {
    async fn list_accounts(&self) -> Result<Vec<Account>> {
        let mut accounts = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let output = self
                .client
                .list_accounts()
                .set_next_token(token.take())
                .send()
                .await
                .map_err(|e| CostpulseError::fetch("ListAccounts", DisplayErrorContext(&e)))?;

            for account in output.accounts() {
                match account.id() {
                    Some(id) => accounts.push(Account::new(id, account.name())),
                    None => warn!("Skipping organization account without an id"),
                }
            }

            match output.next_token() {
                Some(next) => token = Some(next.to_string()),
                None => break,
            }
        }

        debug!("Organization has {} accounts", accounts.len());
        Ok(accounts)
    }
}
