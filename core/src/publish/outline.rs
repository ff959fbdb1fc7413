//! Minimal Outline API client: enough to replace the children of one page.

use super::{ParentDocument, Publisher};
use crate::config::{Secret, WikiSettings};
use crate::errors::{ReportError, ReportResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const LIST_PAGE_SIZE: usize = 100;

pub struct OutlineClient {
    http: Client,
    api_url: String,
    token: Secret,
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentInfo {
    id: String,
    collection_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DocumentRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

impl ErrorBody {
    fn detail(self) -> String {
        self.message
            .or(self.error)
            .unwrap_or_else(|| "no error message".to_string())
    }
}

impl OutlineClient {
    pub fn new(settings: &WikiSettings) -> ReportResult<Self> {
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|err| ReportError::PublishFailure(format!("http client: {}", err)))?;
        Ok(Self {
            http,
            api_url: settings.api_url.clone(),
            token: settings.api_token.clone(),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: Value) -> ReportResult<T> {
        let url = format!("{}/api/{}", self.api_url, method);
        debug!(method, "outline request");
        let resp = self
            .http
            .post(&url)
            .bearer_auth(self.token.expose())
            .json(&body)
            .send()
            .await
            .map_err(|err| ReportError::PublishFailure(format!("{}: {}", method, err)))?;

        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|err| ReportError::PublishFailure(format!("{}: {}", method, err)))?;
        if !status.is_success() {
            let detail = serde_json::from_slice::<ErrorBody>(&bytes)
                .map(ErrorBody::detail)
                .unwrap_or_else(|_| "no error message".to_string());
            return Err(ReportError::PublishFailure(format!(
                "{} (HTTP {}): {}",
                method,
                status.as_u16(),
                detail
            )));
        }

        let value: Value = serde_json::from_slice(&bytes).map_err(|err| {
            ReportError::PublishFailure(format!("{}: unexpected response: {}", method, err))
        })?;
        // Outline can report a failed write with a 2xx status and `ok: false`.
        if value.get("ok").and_then(Value::as_bool) == Some(false) {
            let detail = serde_json::from_value::<ErrorBody>(value)
                .map(ErrorBody::detail)
                .unwrap_or_else(|_| "no error message".to_string());
            return Err(ReportError::PublishFailure(format!(
                "{} (HTTP {}, ok=false): {}",
                method,
                status.as_u16(),
                detail
            )));
        }
        serde_json::from_value(value).map_err(|err| {
            ReportError::PublishFailure(format!("{}: unexpected response: {}", method, err))
        })
    }
}

#[async_trait]
impl Publisher for OutlineClient {
    async fn resolve_parent(&self, document_id: &str) -> ReportResult<ParentDocument> {
        let info: DataEnvelope<DocumentInfo> = self
            .call("documents.info", json!({ "id": document_id }))
            .await?;
        Ok(ParentDocument {
            id: info.data.id,
            collection_id: info.data.collection_id,
        })
    }

    async fn list_children(&self, parent: &ParentDocument) -> ReportResult<Vec<String>> {
        let mut ids = Vec::new();
        let mut offset = 0usize;
        loop {
            let page: DataEnvelope<Vec<DocumentRef>> = self
                .call(
                    "documents.list",
                    json!({
                        "parentDocumentId": parent.id,
                        "limit": LIST_PAGE_SIZE,
                        "offset": offset,
                    }),
                )
                .await?;
            let fetched = page.data.len();
            ids.extend(page.data.into_iter().map(|doc| doc.id));
            if fetched < LIST_PAGE_SIZE {
                break;
            }
            offset += fetched;
        }
        Ok(ids)
    }

    async fn delete_document(&self, id: &str) -> ReportResult<()> {
        let _: Value = self.call("documents.delete", json!({ "id": id })).await?;
        info!(document = id, "deleted stale child document");
        Ok(())
    }

    async fn create_document(
        &self,
        parent: &ParentDocument,
        title: &str,
        text: &str,
    ) -> ReportResult<String> {
        let created: DataEnvelope<DocumentRef> = self
            .call(
                "documents.create",
                json!({
                    "title": title,
                    "text": text,
                    "collectionId": parent.collection_id,
                    "parentDocumentId": parent.id,
                    "publish": true,
                }),
            )
            .await?;
        info!(document = %created.data.id, title, "created child document");
        Ok(created.data.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WikiSettings;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> OutlineClient {
        let settings = WikiSettings::new(
            Some(server.uri()),
            Some("parent-slug".to_string()),
            Some("test-token".to_string()),
        )
        .expect("settings");
        OutlineClient::new(&settings).expect("client")
    }

    fn parent() -> ParentDocument {
        ParentDocument {
            id: "uuid-parent".to_string(),
            collection_id: Some("col-1".to_string()),
        }
    }

    #[tokio::test]
    async fn resolves_parent_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/documents.info"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_partial_json(json!({ "id": "parent-slug" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "id": "uuid-parent", "collectionId": "col-1", "title": "AWS" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let resolved = client(&server)
            .resolve_parent("parent-slug")
            .await
            .expect("resolve");
        assert_eq!(resolved, parent());
    }

    #[tokio::test]
    async fn lists_children_across_pages() {
        let server = MockServer::start().await;
        let full_page: Vec<Value> = (0..LIST_PAGE_SIZE)
            .map(|i| json!({ "id": format!("doc-{}", i) }))
            .collect();
        Mock::given(method("POST"))
            .and(path("/api/documents.list"))
            .and(body_partial_json(json!({ "parentDocumentId": "uuid-parent", "offset": 0 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": full_page })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/documents.list"))
            .and(body_partial_json(json!({ "offset": LIST_PAGE_SIZE })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "data": [{ "id": "doc-last" }] })),
            )
            .mount(&server)
            .await;

        let ids = client(&server).list_children(&parent()).await.expect("list");
        assert_eq!(ids.len(), LIST_PAGE_SIZE + 1);
        assert_eq!(ids.last().map(String::as_str), Some("doc-last"));
    }

    #[tokio::test]
    async fn creates_published_child() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/documents.create"))
            .and(body_partial_json(json!({
                "title": "prod-org",
                "parentDocumentId": "uuid-parent",
                "collectionId": "col-1",
                "publish": true,
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "data": { "id": "new-doc" } })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let id = client(&server)
            .create_document(&parent(), "prod-org", "# body")
            .await
            .expect("create");
        assert_eq!(id, "new-doc");
    }

    #[tokio::test]
    async fn rejected_write_is_publish_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/documents.delete"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "ok": false, "error": "authorization_error", "message": "Authorization error"
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .delete_document("doc-1")
            .await
            .expect_err("forbidden");
        let ReportError::PublishFailure(message) = err else {
            panic!("expected publish failure");
        };
        assert!(message.contains("403"));
        assert!(message.contains("Authorization error"));
    }

    #[tokio::test]
    async fn ok_false_body_is_publish_failure_despite_200() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/documents.delete"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "ok": false, "error": "not_found" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server)
            .delete_document("doc-1")
            .await
            .expect_err("ok false");
        let ReportError::PublishFailure(message) = err else {
            panic!("expected publish failure");
        };
        assert!(message.contains("documents.delete"));
        assert!(message.contains("not_found"));
    }

    #[tokio::test]
    async fn ok_true_body_deletes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/documents.delete"))
            .and(body_partial_json(json!({ "id": "doc-1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "success": true })))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).delete_document("doc-1").await.expect("delete");
    }
}
