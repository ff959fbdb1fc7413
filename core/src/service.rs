use crate::aws::{IamApi, OrganizationsApi, SdkIam, SdkOrganizations, load_sdk_config};
use crate::config::CredentialSet;
use crate::enumerate::{AccountEnumerator, UserEnumerator};
use crate::errors::{ReportError, ReportResult};
use crate::model::{ErrorPayload, OrgInventory, SetSummary};
use crate::publish::{ParentDocument, Publisher};
use crate::report::{AGGREGATE_TITLE, RenderedDocument, merge_documents, render_document};
use async_trait::async_trait;
use tracing::{debug, error, info, warn};

/// AWS handles for one credential set.
pub struct OrgClients {
    pub organizations: Box<dyn OrganizationsApi>,
    pub iam: Box<dyn IamApi>,
}

#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn clients(&self, set: &CredentialSet) -> ReportResult<OrgClients>;
}

pub struct SdkClientFactory {
    region: String,
}

impl SdkClientFactory {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
        }
    }
}

#[async_trait]
impl ClientFactory for SdkClientFactory {
    async fn clients(&self, set: &CredentialSet) -> ReportResult<OrgClients> {
        let config = load_sdk_config(set, &self.region).await;
        Ok(OrgClients {
            organizations: Box::new(SdkOrganizations::new(&config)),
            iam: Box::new(SdkIam::new(&config)),
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// One merged page instead of one page per credential set.
    pub aggregate: bool,
    /// Render and log, but leave the wiki untouched.
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    pub documents: Vec<RenderedDocument>,
    pub summaries: Vec<SetSummary>,
}

impl RunOutcome {
    pub fn failed(&self) -> bool {
        self.summaries.iter().any(|summary| !summary.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &SetSummary> {
        self.summaries.iter().filter(|summary| !summary.is_ok())
    }

    /// 0 on full success. When every set failed with the same code that code is
    /// returned, otherwise 1.
    pub fn exit_code(&self) -> i32 {
        if !self.failed() {
            return 0;
        }
        if self.summaries.iter().any(SetSummary::is_ok) {
            return 1;
        }
        let mut codes = self
            .summaries
            .iter()
            .filter_map(|summary| summary.error.as_ref().map(|error| error.code));
        match codes.next() {
            Some(first) if codes.all(|code| code == first) => first,
            _ => 1,
        }
    }
}

pub async fn collect_inventory(label: &str, clients: &OrgClients) -> ReportResult<OrgInventory> {
    let accounts = AccountEnumerator::new(clients.organizations.as_ref())
        .accounts_with_tags()
        .await?;
    let users = UserEnumerator::new(clients.iam.as_ref()).users().await?;
    Ok(OrgInventory {
        label: label.to_string(),
        accounts,
        users,
    })
}

async fn inventory_for_set(
    set: &CredentialSet,
    factory: &dyn ClientFactory,
) -> ReportResult<(OrgInventory, String)> {
    info!(set = %set.label, "processing credential set");
    let clients = factory.clients(set).await?;
    let inventory = collect_inventory(&set.label, &clients).await?;
    let body = render_document(&inventory)?;
    debug!(set = %set.label, markdown = %body, "rendered markdown");
    Ok((inventory, body))
}

pub fn error_payload(err: &ReportError) -> ErrorPayload {
    ErrorPayload {
        code: exit_code_for_report_error(err),
        message: err.to_string(),
        kind: Some(err.kind()),
    }
}

pub fn exit_code_for_report_error(err: &ReportError) -> i32 {
    match err {
        ReportError::InvalidArgument(_) => 2,
        ReportError::AccessDenied(_) => 3,
        ReportError::ServiceUnavailable(_) | ReportError::NotFound(_) => 4,
        ReportError::PublishFailure(_) => 5,
    }
}

fn failed_summary(label: &str, err: &ReportError) -> SetSummary {
    error!(set = %label, error = %err, "credential set failed");
    SetSummary::error(label.to_string(), error_payload(err))
}

/// Enumerates and renders every credential set without publishing. A failing
/// set is recorded and the remaining sets still run.
pub async fn render_all(
    sets: &[CredentialSet],
    factory: &dyn ClientFactory,
    options: RunOptions,
) -> RunOutcome {
    let mut outcome = RunOutcome::default();
    let mut bodies = Vec::new();
    for set in sets {
        match inventory_for_set(set, factory).await {
            Ok((inventory, body)) => {
                outcome.summaries.push(SetSummary::ok(&inventory));
                if options.aggregate {
                    bodies.push(body);
                } else {
                    outcome.documents.push(RenderedDocument {
                        title: set.label.clone(),
                        body,
                    });
                }
            }
            Err(err) => outcome.summaries.push(failed_summary(&set.label, &err)),
        }
    }
    if options.aggregate && !bodies.is_empty() {
        outcome.documents.push(RenderedDocument {
            title: AGGREGATE_TITLE.to_string(),
            body: merge_documents(&bodies),
        });
    }
    outcome
}

/// Full run: clears the parent's existing children, then writes one child per
/// credential set (or one merged child). Each set is published before the next
/// one is enumerated. Failing to resolve or clear the parent aborts the run.
pub async fn publish_all(
    sets: &[CredentialSet],
    factory: &dyn ClientFactory,
    publisher: &dyn Publisher,
    document_id: &str,
    options: RunOptions,
) -> ReportResult<RunOutcome> {
    let parent = if options.dry_run {
        None
    } else {
        Some(prepare_parent(publisher, document_id).await?)
    };

    if options.aggregate {
        let mut outcome = render_all(sets, factory, options).await;
        if let (Some(parent), Some(document)) = (parent.as_ref(), outcome.documents.first()) {
            match publisher
                .create_document(parent, &document.title, &document.body)
                .await
            {
                Ok(id) => {
                    info!(document = %id, "published merged page");
                    for summary in outcome.summaries.iter_mut().filter(|s| s.is_ok()) {
                        summary.document = Some(id.clone());
                    }
                }
                Err(err) => {
                    // Every set that made it into the merged page shares the failure.
                    for summary in outcome.summaries.iter_mut().filter(|s| s.is_ok()) {
                        *summary = failed_summary(&summary.label, &err);
                    }
                }
            }
        }
        return Ok(outcome);
    }

    let mut outcome = RunOutcome::default();
    for set in sets {
        let (inventory, body) = match inventory_for_set(set, factory).await {
            Ok(result) => result,
            Err(err) => {
                outcome.summaries.push(failed_summary(&set.label, &err));
                continue;
            }
        };
        let mut summary = SetSummary::ok(&inventory);
        if let Some(parent) = parent.as_ref() {
            match publisher.create_document(parent, &set.label, &body).await {
                Ok(id) => {
                    info!(set = %set.label, document = %id, "published");
                    summary.document = Some(id);
                }
                Err(err) => {
                    outcome.summaries.push(failed_summary(&set.label, &err));
                    continue;
                }
            }
        } else {
            info!(set = %set.label, "dry run, skipping publish");
        }
        outcome.summaries.push(summary);
        outcome.documents.push(RenderedDocument {
            title: set.label.clone(),
            body,
        });
    }
    Ok(outcome)
}

async fn prepare_parent(publisher: &dyn Publisher, document_id: &str) -> ReportResult<ParentDocument> {
    let parent = publisher.resolve_parent(document_id).await?;
    let children = publisher.list_children(&parent).await?;
    if !children.is_empty() {
        warn!(count = children.len(), parent = %parent.id, "removing previously generated documents");
    }
    for child in &children {
        publisher.delete_document(child).await?;
    }
    Ok(parent)
}
