//! AWS service seams.
//!
//! The enumerators only see [`OrganizationsApi`] and [`IamApi`]; the SDK-backed
//! implementations live in the submodules and are built per credential set.

use crate::config::CredentialSet;
use crate::errors::ReportError;
use crate::model::{AccessKey, Account, Page};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_organizations::config::Credentials;
use aws_sdk_organizations::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_organizations::primitives::DateTime as SmithyDateTime;
use chrono::{DateTime, NaiveDate, Utc};
use std::error::Error as StdError;

mod iam;
mod organizations;

pub use iam::SdkIam;
pub use organizations::SdkOrganizations;

pub type Tag = (String, String);

#[async_trait]
pub trait OrganizationsApi: Send + Sync {
    /// One page of `ListAccounts`; returned accounts carry no tags.
    async fn list_accounts(&self, next_token: Option<String>) -> Result<Page<Account>, ReportError>;

    async fn list_tags(
        &self,
        account_id: &str,
        next_token: Option<String>,
    ) -> Result<Page<Tag>, ReportError>;
}

#[async_trait]
pub trait IamApi: Send + Sync {
    /// One page of user names.
    async fn list_users(&self, marker: Option<String>) -> Result<Page<String>, ReportError>;

    async fn list_access_keys(
        &self,
        user_name: &str,
        marker: Option<String>,
    ) -> Result<Page<AccessKey>, ReportError>;

    async fn list_user_tags(
        &self,
        user_name: &str,
        marker: Option<String>,
    ) -> Result<Page<Tag>, ReportError>;
}

/// Shared SDK config for one credential set. Organizations and IAM are global
/// services, so the region only picks the signing endpoint.
pub async fn load_sdk_config(set: &CredentialSet, region: &str) -> SdkConfig {
    let credentials = Credentials::new(
        set.access_key.expose(),
        set.secret_key.expose(),
        None,
        None,
        "orgwiki-static",
    );
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .credentials_provider(credentials)
        .load()
        .await
}

pub(crate) fn sdk_error<E, R>(operation: &str, err: SdkError<E, R>) -> ReportError
where
    E: ProvideErrorMetadata + StdError + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    let code = err.code().map(str::to_string);
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| DisplayErrorContext(&err).to_string());
    classify_error(operation, code.as_deref(), &message)
}

/// Maps an AWS error code onto the report error kinds. Anything without a
/// recognised code (throttling, 5xx, dispatch failures) is treated as transient.
pub fn classify_error(operation: &str, code: Option<&str>, message: &str) -> ReportError {
    let detail = match code {
        Some(code) => format!("{}: {} ({})", operation, message, code),
        None => format!("{}: {}", operation, message),
    };
    match code.unwrap_or_default() {
        "AccessDenied"
        | "AccessDeniedException"
        | "AccessDeniedForDependencyException"
        | "UnauthorizedOperation"
        | "AWSOrganizationsNotInUseException"
        | "InvalidClientTokenId"
        | "SignatureDoesNotMatch"
        | "UnrecognizedClientException"
        | "ExpiredToken" => ReportError::AccessDenied(detail),
        "NoSuchEntity" | "AccountNotFoundException" | "TargetNotFoundException" => {
            ReportError::NotFound(detail)
        }
        "InvalidInputException" | "InvalidInput" | "ValidationError" => {
            ReportError::InvalidArgument(detail)
        }
        _ => ReportError::ServiceUnavailable(detail),
    }
}

pub(crate) fn to_date(value: &SmithyDateTime) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp(value.secs(), 0).map(|dt| dt.date_naive())
}

/// IAM signals more pages with `IsTruncated` plus `Marker`.
pub(crate) fn next_marker(is_truncated: bool, marker: Option<&str>) -> Option<String> {
    if is_truncated {
        marker.filter(|m| !m.is_empty()).map(str::to_string)
    } else {
        None
    }
}
