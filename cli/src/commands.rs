use anyhow::{Context, Result};
use orgwiki_core::config::{BuildInfo, CredentialSet, WikiSettings};
use orgwiki_core::errors::{ReportError, RunError};
use orgwiki_core::model::{ErrorKind, ErrorPayload, OutputFormat, SetSummary};
use orgwiki_core::publish::OutlineClient;
use orgwiki_core::report::{RenderedDocument, file_stem};
use orgwiki_core::service::{RunOptions, RunOutcome, SdkClientFactory, publish_all, render_all};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::args::{
    BuildArgs, ConfigArgs, ConfigCommand, ConfigCommandArgs, CredentialArgs, GlobalArgs,
    PublishArgs, RenderArgs, WikiArgs,
};

pub struct OutputPreferences {
    pub format: OutputFormat,
    pub pretty: bool,
    pub json_only: bool,
}

impl OutputPreferences {
    pub fn for_publish(args: &PublishArgs, global: &GlobalArgs) -> Self {
        Self {
            format: if global.json_only || global.json_output {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            },
            pretty: args.pretty,
            json_only: global.json_only,
        }
    }

    pub fn for_render(args: &RenderArgs, global: &GlobalArgs) -> Self {
        Self {
            format: if global.json_only {
                OutputFormat::Json
            } else {
                args.format.into()
            },
            pretty: args.pretty,
            json_only: global.json_only,
        }
    }

    pub fn for_config(cmd: &ConfigCommand, global: &GlobalArgs) -> Self {
        Self {
            format: if global.json_only {
                OutputFormat::Json
            } else {
                cmd.format()
            },
            pretty: cmd.pretty(),
            json_only: global.json_only,
        }
    }

    pub fn uses_json_output(&self) -> bool {
        self.json_only || self.format == OutputFormat::Json
    }

    fn print_json(&self, value: &serde_json::Value) -> Result<()> {
        if self.pretty {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", serde_json::to_string(value)?);
        }
        Ok(())
    }
}

pub fn log_build_info(build: &BuildArgs) {
    let info = BuildInfo::new(
        build.build_version.clone(),
        build.commit_sha.clone(),
        build.build_timestamp.clone(),
    );
    info!(
        version = %info.version,
        commit_sha = %info.commit_sha,
        build_timestamp = %info.build_timestamp,
        "starting orgwiki"
    );
}

fn load_credential_sets(args: &CredentialArgs) -> Result<Vec<CredentialSet>> {
    let source = args.source().ok_or_else(|| {
        ReportError::InvalidArgument(
            "AWS_CREDENTIALS_JSON not set (or pass --credentials-file)".to_string(),
        )
    })?;
    let sets = source.load()?;
    info!(source = %source.describe(), count = sets.len(), "loaded credential sets");
    if sets.is_empty() {
        warn!("no credential sets configured, nothing to enumerate");
    }
    Ok(sets)
}

fn wiki_settings(args: &WikiArgs) -> Result<WikiSettings, ReportError> {
    WikiSettings::new(
        args.api_url.clone(),
        args.document_id.clone(),
        args.api_token.clone(),
    )
}

pub async fn run_publish(args: PublishArgs, prefs: &OutputPreferences) -> Result<()> {
    let sets = load_credential_sets(&args.credentials)?;
    let wiki = wiki_settings(&args.wiki)?;
    let publisher = OutlineClient::new(&wiki)?;
    let factory = SdkClientFactory::new(args.credentials.aws_region.clone());

    let outcome = publish_all(
        &sets,
        &factory,
        &publisher,
        &wiki.document_id,
        args.run_options(),
    )
    .await
    .with_context(|| format!("publish under document {}", wiki.document_id))?;

    report_outcome(&outcome, prefs, false)?;
    finish(&outcome)
}

pub async fn run_render(args: RenderArgs, prefs: &OutputPreferences) -> Result<()> {
    let sets = load_credential_sets(&args.credentials)?;
    let factory = SdkClientFactory::new(args.credentials.aws_region.clone());
    let outcome = render_all(
        &sets,
        &factory,
        RunOptions {
            aggregate: args.aggregate,
            dry_run: true,
        },
    )
    .await;

    if let Some(dir) = args.output_dir.as_deref() {
        write_documents(dir, &outcome.documents)?;
        report_outcome(&outcome, prefs, false)?;
    } else if prefs.uses_json_output() {
        report_outcome(&outcome, prefs, true)?;
    } else {
        let bodies: Vec<&str> = outcome.documents.iter().map(|d| d.body.as_str()).collect();
        print!("{}", bodies.join("\n"));
        report_outcome(&outcome, prefs, false)?;
    }
    finish(&outcome)
}

pub async fn run_config(cmd: ConfigCommandArgs, prefs: &OutputPreferences) -> Result<()> {
    match cmd.command {
        ConfigCommand::Validate(args) => validate_config(args, prefs),
    }
}

fn validate_config(args: ConfigArgs, prefs: &OutputPreferences) -> Result<()> {
    let sets = load_credential_sets(&args.credentials)?;
    let wiki = if args.wiki.is_empty() {
        None
    } else {
        Some(wiki_settings(&args.wiki)?)
    };
    let labels: Vec<&str> = sets.iter().map(|set| set.label.as_str()).collect();

    match prefs.format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "status": "ok",
                "credentialSets": labels,
                "region": args.credentials.aws_region,
                "wiki": wiki.as_ref().map(|w| serde_json::json!({
                    "apiUrl": w.api_url,
                    "documentId": w.document_id,
                })),
            });
            prefs.print_json(&output)?;
        }
        OutputFormat::Text => {
            println!("config ok: {} credential set(s)", labels.len());
            for label in &labels {
                println!("  - {}", label);
            }
            match &wiki {
                Some(w) => println!("wiki: {} (parent {})", w.api_url, w.document_id),
                None => println!("wiki: not configured"),
            }
        }
    }
    Ok(())
}

fn write_documents(dir: &Path, documents: &[RenderedDocument]) -> Result<()> {
    let mut stems: HashMap<String, &str> = HashMap::new();
    for document in documents {
        let stem = file_stem(&document.title);
        if let Some(previous) = stems.insert(stem.to_lowercase(), &document.title) {
            return Err(ReportError::InvalidArgument(format!(
                "documents '{}' and '{}' would both be written to {}.md",
                previous, document.title, stem
            ))
            .into());
        }
    }

    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    for document in documents {
        let path = dir.join(format!("{}.md", file_stem(&document.title)));
        fs::write(&path, &document.body).with_context(|| format!("write {}", path.display()))?;
        info!(path = %path.display(), "wrote document");
    }
    Ok(())
}

fn report_outcome(outcome: &RunOutcome, prefs: &OutputPreferences, with_documents: bool) -> Result<()> {
    if prefs.uses_json_output() {
        let mut value = serde_json::json!({ "summaries": outcome.summaries });
        if with_documents {
            value["documents"] = serde_json::Value::Array(
                outcome
                    .documents
                    .iter()
                    .map(|d| serde_json::json!({ "title": d.title, "body": d.body }))
                    .collect(),
            );
        }
        return prefs.print_json(&value);
    }

    for summary in &outcome.summaries {
        log_summary(summary);
    }
    Ok(())
}

fn log_summary(summary: &SetSummary) {
    match &summary.error {
        None => info!(
            set = %summary.label,
            accounts = summary.accounts.unwrap_or_default(),
            users = summary.users.unwrap_or_default(),
            document = summary.document.as_deref().unwrap_or("-"),
            "credential set done"
        ),
        Some(error) => warn!(set = %summary.label, error = %error.message, "credential set failed"),
    }
}

fn finish(outcome: &RunOutcome) -> Result<()> {
    if !outcome.failed() {
        return Ok(());
    }
    let failed: Vec<String> = outcome.failures().map(|s| s.label.clone()).collect();
    Err(RunError::SetsFailed {
        failed,
        total: outcome.summaries.len(),
        code: outcome.exit_code(),
    }
    .into())
}

pub fn cli_error_payload(code: i32, message: String, kind: ErrorKind) -> SetSummary {
    SetSummary::error(
        "cli".to_string(),
        ErrorPayload {
            code,
            message,
            kind: Some(kind),
        },
    )
}

pub fn format_error_chain(err: &anyhow::Error) -> String {
    let mut parts: Vec<String> = err.chain().map(|e| e.to_string()).collect();
    if parts.is_empty() {
        return "Unknown error".to_string();
    }
    parts.dedup();
    parts.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(title: &str) -> RenderedDocument {
        RenderedDocument {
            title: title.to_string(),
            body: format!("# {}\n", title),
        }
    }

    #[test]
    fn writes_one_file_per_document() {
        let dir = std::env::temp_dir().join(format!("orgwiki-write-{}", std::process::id()));
        write_documents(&dir, &[document("prod org"), document("dev")]).expect("write");
        let body = fs::read_to_string(dir.join("prod_org.md")).expect("read");
        assert_eq!(body, "# prod org\n");
        assert!(dir.join("dev.md").exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn refuses_to_overwrite_a_sibling_document() {
        let dir = std::env::temp_dir().join(format!("orgwiki-clash-{}", std::process::id()));
        let err = write_documents(&dir, &[document("prod org"), document("prod_org")])
            .expect_err("clash");
        assert!(err.to_string().contains("prod_org.md"));
        assert!(!dir.exists());
        assert_eq!(crate::exit_codes::exit_code_for_error(&err), 2);
    }

    #[test]
    fn partial_failure_names_failed_sets() {
        let outcome = RunOutcome {
            documents: Vec::new(),
            summaries: vec![
                cli_error_payload(3, "denied".to_string(), ErrorKind::AccessDenied),
                SetSummary {
                    label: "dev".to_string(),
                    accounts: Some(1),
                    users: Some(0),
                    document: None,
                    error: None,
                },
            ],
        };
        let err = finish(&outcome).expect_err("failed");
        assert_eq!(err.to_string(), "1 of 2 credential sets failed: cli");
        assert_eq!(crate::exit_codes::exit_code_for_error(&err), 1);
    }

    #[test]
    fn error_chain_drops_repeats() {
        let err = anyhow::Error::new(ReportError::PublishFailure("HTTP 500".to_string()))
            .context("publish prod");
        assert_eq!(
            format_error_chain(&err),
            "publish prod: publish failed: HTTP 500"
        );
    }
}
