use super::{IamApi, Tag, next_marker, sdk_error, to_date};
use crate::errors::ReportError;
use crate::model::{AccessKey, AccessKeyStatus, Page};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_iam::Client;

pub struct SdkIam {
    client: Client,
}

impl SdkIam {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl IamApi for SdkIam {
    async fn list_users(&self, marker: Option<String>) -> Result<Page<String>, ReportError> {
        let out = self
            .client
            .list_users()
            .set_marker(marker)
            .send()
            .await
            .map_err(|err| sdk_error("iam:ListUsers", err))?;

        let items = out
            .users()
            .iter()
            .map(|user| user.user_name().to_string())
            .collect();
        Ok(Page {
            items,
            next: next_marker(out.is_truncated(), out.marker()),
        })
    }

    async fn list_access_keys(
        &self,
        user_name: &str,
        marker: Option<String>,
    ) -> Result<Page<AccessKey>, ReportError> {
        let out = self
            .client
            .list_access_keys()
            .user_name(user_name)
            .set_marker(marker)
            .send()
            .await
            .map_err(|err| sdk_error("iam:ListAccessKeys", err))?;

        let items = out
            .access_key_metadata()
            .iter()
            .filter_map(|meta| {
                let id = meta.access_key_id()?;
                Some(AccessKey {
                    id: id.to_string(),
                    status: meta
                        .status()
                        .map(|status| AccessKeyStatus::parse(status.as_str()))
                        .unwrap_or(AccessKeyStatus::Unknown),
                    created_date: meta.create_date().and_then(to_date),
                })
            })
            .collect();
        Ok(Page {
            items,
            next: next_marker(out.is_truncated(), out.marker()),
        })
    }

    async fn list_user_tags(
        &self,
        user_name: &str,
        marker: Option<String>,
    ) -> Result<Page<Tag>, ReportError> {
        let out = self
            .client
            .list_user_tags()
            .user_name(user_name)
            .set_marker(marker)
            .send()
            .await
            .map_err(|err| sdk_error("iam:ListUserTags", err))?;

        let items = out
            .tags()
            .iter()
            .map(|tag| (tag.key().to_string(), tag.value().to_string()))
            .collect();
        Ok(Page {
            items,
            next: next_marker(out.is_truncated(), out.marker()),
        })
    }
}
