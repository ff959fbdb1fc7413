use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Tag key that feeds the Description column, matched case-insensitively.
pub const DESCRIPTION_TAG: &str = "Description";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    Active,
    Suspended,
    PendingClosure,
    Unknown,
}

impl AccountStatus {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => AccountStatus::Active,
            "SUSPENDED" => AccountStatus::Suspended,
            "PENDING_CLOSURE" => AccountStatus::PendingClosure,
            _ => AccountStatus::Unknown,
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AccountStatus::Active => "ACTIVE",
            AccountStatus::Suspended => "SUSPENDED",
            AccountStatus::PendingClosure => "PENDING_CLOSURE",
            AccountStatus::Unknown => "UNKNOWN",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_date: Option<NaiveDate>,
    pub status: AccountStatus,
    pub tags: BTreeMap<String, String>,
}

impl Account {
    pub fn description(&self) -> &str {
        tag_value(&self.tags, DESCRIPTION_TAG).unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AccessKeyStatus {
    Active,
    Inactive,
    Unknown,
}

impl AccessKeyStatus {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => AccessKeyStatus::Active,
            "inactive" => AccessKeyStatus::Inactive,
            _ => AccessKeyStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessKey {
    pub id: String,
    pub status: AccessKeyStatus,
    pub created_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IamUser {
    pub name: String,
    pub access_keys: Vec<AccessKey>,
    pub tags: BTreeMap<String, String>,
}

impl IamUser {
    pub fn description(&self) -> &str {
        tag_value(&self.tags, DESCRIPTION_TAG).unwrap_or("")
    }
}

/// Exact key match first, then a case-insensitive one.
pub fn tag_value<'a>(tags: &'a BTreeMap<String, String>, key: &str) -> Option<&'a str> {
    tags.get(key)
        .or_else(|| {
            tags.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v)
        })
        .map(String::as_str)
}

/// One page of a continuation-token listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }
}

/// Everything enumerated for one credential set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgInventory {
    pub label: String,
    pub accounts: Vec<Account>,
    pub users: Vec<IamUser>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    AccessDenied,
    InvalidArgument,
    ServiceUnavailable,
    PublishFailure,
    Runtime,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub code: i32,
    pub message: String,
    pub kind: Option<ErrorKind>,
}

/// Outcome line for one credential set, printed at the end of a run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSummary {
    pub label: String,
    pub accounts: Option<usize>,
    pub users: Option<usize>,
    pub document: Option<String>,
    pub error: Option<ErrorPayload>,
}

impl SetSummary {
    pub fn ok(inventory: &OrgInventory) -> Self {
        Self {
            label: inventory.label.clone(),
            accounts: Some(inventory.accounts.len()),
            users: Some(inventory.users.len()),
            document: None,
            error: None,
        }
    }

    pub fn error(label: String, error: ErrorPayload) -> Self {
        Self {
            label,
            accounts: None,
            users: None,
            document: None,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}
