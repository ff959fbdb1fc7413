use super::{OrganizationsApi, Tag, sdk_error, to_date};
use crate::errors::ReportError;
use crate::model::{Account, AccountStatus, Page};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_organizations::Client;
use aws_sdk_organizations::types::Account as SdkAccount;
use std::collections::BTreeMap;

pub struct SdkOrganizations {
    client: Client,
}

impl SdkOrganizations {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl OrganizationsApi for SdkOrganizations {
    async fn list_accounts(&self, next_token: Option<String>) -> Result<Page<Account>, ReportError> {
        let out = self
            .client
            .list_accounts()
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|err| sdk_error("organizations:ListAccounts", err))?;

        let items = out
            .accounts()
            .iter()
            .map(map_account)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page {
            items,
            next: out.next_token().map(str::to_string),
        })
    }

    async fn list_tags(
        &self,
        account_id: &str,
        next_token: Option<String>,
    ) -> Result<Page<Tag>, ReportError> {
        let out = self
            .client
            .list_tags_for_resource()
            .resource_id(account_id)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|err| sdk_error("organizations:ListTagsForResource", err))?;

        let items = out
            .tags()
            .iter()
            .map(|tag| (tag.key().to_string(), tag.value().to_string()))
            .collect();
        Ok(Page {
            items,
            next: out.next_token().map(str::to_string),
        })
    }
}

#[allow(deprecated)]
fn map_account(account: &SdkAccount) -> Result<Account, ReportError> {
    let id = account.id().ok_or_else(|| {
        ReportError::ServiceUnavailable("organizations:ListAccounts returned an account without Id".to_string())
    })?;
    Ok(Account {
        id: id.to_string(),
        name: account.name().unwrap_or_default().to_string(),
        email: account.email().unwrap_or_default().to_string(),
        created_date: account.joined_timestamp().and_then(to_date),
        status: account
            .status()
            .map(|status| AccountStatus::parse(status.as_str()))
            .unwrap_or(AccountStatus::Unknown),
        tags: BTreeMap::new(),
    })
}
