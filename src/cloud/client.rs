//! Typed access to the document and task endpoints

use crate::cloud::{
    ApiRequest, DocumentUpload, Operation, Task, TaskStatusSource, TaskSubmission, Transport,
};
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use std::borrow::Cow;
use std::future::Future;
use tracing::{debug, info};

/// Client for the PDF cloud API.
///
/// Thin layer over [`Transport`]: it knows the endpoint paths and response
/// shapes but has no retry or polling logic of its own.
#[derive(Clone)]
pub struct CloudClient {
    transport: Transport,
    max_download_bytes: u64,
}

impl CloudClient {
    pub fn new(config: &ApiConfig, max_download_bytes: u64) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(config)?,
            max_download_bytes,
        })
    }

    /// Upload a file and return its document id
    pub async fn upload_document(&self, file_name: &str, data: Vec<u8>) -> Result<String> {
        let size = data.len();
        let upload: DocumentUpload = self
            .transport
            .send_json(&ApiRequest::upload("/documents/upload", file_name, data))
            .await?;
        info!(document_id = %upload.document_id, size, "document uploaded");
        Ok(upload.document_id)
    }

    /// Fetch a document's content; `filename` is forwarded as a query hint
    pub async fn download_document(&self, document_id: &str, filename: Option<&str>) -> Result<Vec<u8>> {
        let path = format!("/documents/{}/download", path_segment(document_id)?);
        let mut request = ApiRequest::get(path);
        if let Some(name) = filename {
            request = request.with_query("filename", name);
        }
        let data = self.transport.download(&request, self.max_download_bytes).await?;
        debug!(document_id, size = data.len(), "document downloaded");
        Ok(data)
    }

    pub async fn delete_document(&self, document_id: &str) -> Result<()> {
        let path = format!("/documents/{}", path_segment(document_id)?);
        self.transport.send_empty(&ApiRequest::delete(path)).await?;
        info!(document_id, "document deleted");
        Ok(())
    }

    /// Single status read of a task
    pub async fn get_task(&self, task_id: &str) -> Result<Task> {
        self.transport
            .send_json(&ApiRequest::get(format!("/tasks/{}", path_segment(task_id)?)))
            .await
    }

    /// Submit an operation and return the id of the task it created
    pub async fn submit(&self, operation: &Operation) -> Result<String> {
        let submission: TaskSubmission = self.transport.send_json(&operation.to_request()).await?;
        debug!(endpoint = operation.endpoint(), task_id = %submission.task_id, "operation submitted");
        Ok(submission.task_id)
    }
}

/// Encode an opaque id as exactly one path segment
fn path_segment(id: &str) -> Result<Cow<'_, str>> {
    if id.is_empty() || id == "." || id == ".." {
        return Err(Error::InvalidParams {
            reason: format!("Invalid identifier: '{}'", id),
        });
    }
    Ok(urlencoding::encode(id))
}

impl TaskStatusSource for CloudClient {
    fn task_status(&self, task_id: &str) -> impl Future<Output = Result<Task>> + Send {
        let client = self.clone();
        let task_id = task_id.to_string();
        async move { client.get_task(&task_id).await }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::{RetryPolicy, TaskEngine, TaskStatus};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> CloudClient {
        let config = ApiConfig::new(server.uri(), "id", "secret")
            .unwrap()
            .with_retry(RetryPolicy::disabled())
            .with_request_timeout(Duration::from_secs(5));
        CloudClient::new(&config, 1024 * 1024).unwrap()
    }

    #[tokio::test]
    async fn test_upload_returns_document_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/documents/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"documentId": "doc-1"})))
            .expect(1)
            .mount(&server)
            .await;

        let id = client_for(&server)
            .upload_document("a.pdf", b"%PDF".to_vec())
            .await
            .unwrap();
        assert_eq!(id, "doc-1");
    }

    #[tokio::test]
    async fn test_upload_missing_document_id_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "doc-1"})))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .upload_document("a.pdf", b"%PDF".to_vec())
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some("INVALID_RESPONSE"));
    }

    #[tokio::test]
    async fn test_download_with_filename_hint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/documents/doc-1/download"))
            .and(query_param("filename", "out.docx"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK\x03\x04".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let data = client_for(&server)
            .download_document("doc-1", Some("out.docx"))
            .await
            .unwrap();
        assert_eq!(data, b"PK\x03\x04");
    }

    #[tokio::test]
    async fn test_delete_document() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/documents/doc-1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).delete_document("doc-1").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_unknown_document() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "code": "DOCUMENT_NOT_FOUND",
                "message": "Document not found"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).delete_document("nope").await.unwrap_err();
        assert!(matches!(err, Error::Api { status: 404, .. }));
        assert_eq!(err.code(), Some("DOCUMENT_NOT_FOUND"));
    }

    #[tokio::test]
    async fn test_submit_posts_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/documents/modify/pdf-compress"))
            .and(body_json(json!({"documentId": "doc-1", "compressionLevel": "HIGH"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"taskId": "t1"})))
            .expect(1)
            .mount(&server)
            .await;

        let op = Operation::compress("doc-1", crate::cloud::CompressionLevel::High, None).unwrap();
        let task_id = client_for(&server).submit(&op).await.unwrap();
        assert_eq!(task_id, "t1");
    }

    #[tokio::test]
    async fn test_task_status_source() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks/t1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "taskId": "t1",
                "status": "PROCESSING",
                "progress": 40
            })))
            .mount(&server)
            .await;

        let task = client_for(&server).task_status("t1").await.unwrap();
        assert_eq!(task.status, TaskStatus::Processing);
        assert_eq!(task.progress, 40);
    }

    #[tokio::test]
    async fn test_ids_are_sent_as_one_path_segment() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/documents/victim"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/documents/victim%3Fx%3D"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/documents/a%2Fb%23c/download"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        client.delete_document("victim?x=").await.unwrap();
        assert_eq!(client.download_document("a/b#c", None).await.unwrap(), b"%PDF");
    }

    #[tokio::test]
    async fn test_dot_segments_rejected_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        for id in ["", ".", ".."] {
            let err = client.delete_document(id).await.unwrap_err();
            assert!(matches!(err, Error::InvalidParams { .. }));
        }
    }

    #[tokio::test]
    async fn test_wait_tolerates_sloppy_progress() {
        let server = MockServer::start().await;
        let polls = AtomicUsize::new(0);
        Mock::given(method("GET"))
            .and(path("/tasks/t1"))
            .respond_with(move |_req: &wiremock::Request| {
                let body = match polls.fetch_add(1, Ordering::SeqCst) {
                    0 => json!({"taskId": null, "status": "PROCESSING", "progress": null}),
                    1 => json!({"taskId": "t1", "status": "PROCESSING", "progress": 37.5}),
                    _ => json!({"taskId": "t1", "status": "COMPLETED", "resultDocumentId": "d9"}),
                };
                ResponseTemplate::new(200).set_body_json(body)
            })
            .expect(3)
            .mount(&server)
            .await;

        let engine = TaskEngine::new(
            client_for(&server),
            Duration::from_millis(10),
            Duration::from_secs(5),
        );
        let task = engine.wait("t1", None).await.unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.result_document_id.as_deref(), Some("d9"));
    }
}
