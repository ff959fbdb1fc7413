use crate::errors::{ReportError, ReportResult};
use crate::report::file_stem;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub const CREDENTIALS_ENV: &str = "AWS_CREDENTIALS_JSON";
pub const DEFAULT_OUTLINE_URL: &str = "https://app.getoutline.com";
pub const DEFAULT_REGION: &str = "us-east-1";

/// String secret that is wiped on drop and never printed.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// One labelled access-key pair, as supplied by the operator.
#[derive(Debug, Clone)]
pub struct CredentialSet {
    pub label: String,
    pub access_key: Secret,
    pub secret_key: Secret,
}

#[derive(Deserialize)]
struct CredentialsDocument {
    accounts: Option<Vec<RawCredentialSet>>,
}

#[derive(Deserialize, Default)]
struct RawCredentialSet {
    #[serde(alias = "label")]
    name: Option<String>,
    access_key: Option<String>,
    secret_key: Option<String>,
}

impl Drop for RawCredentialSet {
    fn drop(&mut self) {
        self.access_key.zeroize();
        self.secret_key.zeroize();
    }
}

#[derive(Debug, Clone)]
pub enum CredentialSource {
    Inline(Secret),
    File(PathBuf),
}

impl CredentialSource {
    pub fn describe(&self) -> String {
        match self {
            CredentialSource::Inline(_) => CREDENTIALS_ENV.to_string(),
            CredentialSource::File(path) => path.display().to_string(),
        }
    }

    pub fn load(&self) -> ReportResult<Vec<CredentialSet>> {
        match self {
            CredentialSource::Inline(json) => parse_credential_sets(json.expose()),
            CredentialSource::File(path) => {
                let contents = Secret::new(fs::read_to_string(path).map_err(|err| {
                    ReportError::InvalidArgument(format!(
                        "read credentials {}: {}",
                        path.display(),
                        err
                    ))
                })?);
                parse_credential_sets(contents.expose())
            }
        }
    }
}

/// Parses `{"accounts": [{"name", "access_key", "secret_key"}, ...]}`.
pub fn parse_credential_sets(json: &str) -> ReportResult<Vec<CredentialSet>> {
    if json.trim().is_empty() {
        return Err(ReportError::InvalidArgument(format!(
            "{} is empty",
            CREDENTIALS_ENV
        )));
    }
    // serde_json errors can quote the offending input, so keep only the position.
    let document: CredentialsDocument = serde_json::from_str(json).map_err(|err| {
        ReportError::InvalidArgument(format!(
            "invalid credentials JSON at line {} column {}",
            err.line(),
            err.column()
        ))
    })?;
    let raw = document.accounts.ok_or_else(|| {
        ReportError::InvalidArgument("credentials JSON has no \"accounts\" list".to_string())
    })?;

    // Labels become page titles and `<stem>.md` file names, so two labels that
    // collapse to the same lowercase stem are duplicates.
    let mut seen: HashMap<String, String> = HashMap::new();
    let mut sets = Vec::with_capacity(raw.len());
    for (index, entry) in raw.iter().enumerate() {
        let set = validate_entry(index, entry)?;
        let key = file_stem(&set.label).to_lowercase();
        if let Some(previous) = seen.get(&key) {
            return Err(ReportError::InvalidArgument(format!(
                "duplicate credential set label '{}' (clashes with '{}')",
                set.label, previous
            )));
        }
        seen.insert(key, set.label.clone());
        sets.push(set);
    }
    Ok(sets)
}

fn validate_entry(index: usize, entry: &RawCredentialSet) -> ReportResult<CredentialSet> {
    let field = |value: &Option<String>, name: &str| -> ReportResult<String> {
        value
            .as_deref()
            .map(str::trim)
            .filter(|val| !val.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                ReportError::InvalidArgument(format!(
                    "credential set #{} is missing '{}'",
                    index + 1,
                    name
                ))
            })
    };

    Ok(CredentialSet {
        label: field(&entry.name, "name")?,
        access_key: Secret::new(field(&entry.access_key, "access_key")?),
        secret_key: Secret::new(field(&entry.secret_key, "secret_key")?),
    })
}

/// Outline target for published documents.
#[derive(Debug, Clone)]
pub struct WikiSettings {
    pub api_url: String,
    pub document_id: String,
    pub api_token: Secret,
}

impl WikiSettings {
    pub fn new(
        api_url: Option<String>,
        document_id: Option<String>,
        api_token: Option<String>,
    ) -> ReportResult<Self> {
        let document_id = nonblank(document_id).ok_or_else(|| {
            ReportError::InvalidArgument("GETOUTLINE_DOCUMENT_ID is required".to_string())
        })?;
        let api_token = nonblank(api_token).ok_or_else(|| {
            ReportError::InvalidArgument("GETOUTLINE_API_TOKEN is required".to_string())
        })?;
        let api_url = nonblank(api_url)
            .unwrap_or_else(|| DEFAULT_OUTLINE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            api_url,
            document_id,
            api_token: Secret::new(api_token),
        })
    }
}

/// Build metadata reported at start-up.
#[derive(Debug, Clone)]
pub struct BuildInfo {
    pub version: String,
    pub commit_sha: String,
    pub build_timestamp: String,
}

impl BuildInfo {
    pub fn new(
        version: Option<String>,
        commit_sha: Option<String>,
        build_timestamp: Option<String>,
    ) -> Self {
        let or_unknown = |value: Option<String>| nonblank(value).unwrap_or_else(|| "unknown".to_string());
        Self {
            version: or_unknown(version),
            commit_sha: or_unknown(commit_sha),
            build_timestamp: or_unknown(build_timestamp),
        }
    }
}

fn nonblank(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}
