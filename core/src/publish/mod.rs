use crate::errors::ReportResult;
use async_trait::async_trait;

mod outline;

pub use outline::OutlineClient;

/// The wiki page every generated document is nested under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentDocument {
    pub id: String,
    pub collection_id: Option<String>,
}

#[async_trait]
pub trait Publisher: Send + Sync {
    async fn resolve_parent(&self, document_id: &str) -> ReportResult<ParentDocument>;

    async fn list_children(&self, parent: &ParentDocument) -> ReportResult<Vec<String>>;

    async fn delete_document(&self, id: &str) -> ReportResult<()>;

    /// Creates and publishes a child page, returning its id.
    async fn create_document(
        &self,
        parent: &ParentDocument,
        title: &str,
        text: &str,
    ) -> ReportResult<String>;
}
