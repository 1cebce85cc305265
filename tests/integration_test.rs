//! Integration tests for the Foxit PDF MCP Server
//!
//! Drive the public client API against a mocked Foxit endpoint.

use foxit_pdf_mcp_server::cloud::{
    CloudClient, DocumentRef, Operation, RetryPolicy, SourceFormat, TaskEngine, TaskStatus,
};
use foxit_pdf_mcp_server::envelope::{Failure, Success};
use foxit_pdf_mcp_server::source::resolve_path;
use foxit_pdf_mcp_server::{ApiConfig, Error};
use serde_json::{json, Value};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn api_config(uri: &str) -> ApiConfig {
    ApiConfig::new(uri, "integration-id", "integration-secret")
        .unwrap()
        .with_poll_interval(Duration::from_millis(10))
        .with_default_timeout(Duration::from_secs(5))
        .with_request_timeout(Duration::from_secs(5))
        .with_retry(RetryPolicy::disabled())
}

fn setup(uri: &str) -> (CloudClient, TaskEngine<CloudClient>) {
    let config = api_config(uri);
    let client = CloudClient::new(&config, 1024 * 1024).unwrap();
    let engine = TaskEngine::from_config(client.clone(), &config);
    (client, engine)
}

/// Status responder that reports PENDING, PROCESSING, then `terminal`
fn task_progression(terminal: Value) -> impl Fn(&Request) -> ResponseTemplate + Send + Sync {
    let polls = AtomicUsize::new(0);
    move |_req: &Request| match polls.fetch_add(1, Ordering::SeqCst) {
        0 => ResponseTemplate::new(200).set_body_json(json!({"status": "PENDING", "progress": 0})),
        1 => ResponseTemplate::new(200)
            .set_body_json(json!({"status": "PROCESSING", "progress": 60})),
        _ => ResponseTemplate::new(200).set_body_json(terminal.clone()),
    }
}

#[tokio::test]
async fn test_upload_convert_download_workflow() {
    let api = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/documents/upload"))
        .and(header("client_id", "integration-id"))
        .and(header("client_secret", "integration-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"documentId": "src-1"})))
        .expect(1)
        .mount(&api)
        .await;
    Mock::given(method("POST"))
        .and(path("/documents/create/pdf-from-word"))
        .and(body_json(json!({"documentId": "src-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"taskId": "task-1"})))
        .expect(1)
        .mount(&api)
        .await;
    Mock::given(method("GET"))
        .and(path("/tasks/task-1"))
        .respond_with(task_progression(json!({
            "taskId": "task-1",
            "status": "COMPLETED",
            "progress": 100,
            "resultDocumentId": "out-1"
        })))
        .expect(3)
        .mount(&api)
        .await;
    Mock::given(method("GET"))
        .and(path("/documents/out-1/download"))
        .and(query_param("filename", "report.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(b"%PDF-1.7 converted".to_vec()),
        )
        .expect(1)
        .mount(&api)
        .await;

    let mut file = tempfile::Builder::new().suffix(".docx").tempfile().unwrap();
    file.write_all(b"fake word document").unwrap();
    let upload = resolve_path(file.path(), Some("report.docx"), 1024).unwrap();

    let (client, engine) = setup(&api.uri());
    let document_id = client
        .upload_document(&upload.file_name, upload.data)
        .await
        .unwrap();
    assert_eq!(document_id, "src-1");

    let op = Operation::create_pdf(SourceFormat::Word, &document_id).unwrap();
    let task = engine
        .submit_and_wait(|| client.submit(&op), None)
        .await
        .unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.task_id, "task-1");
    let result_id = task.result_document_id.clone().unwrap();

    let envelope: Value = serde_json::from_str(
        &Success::from_task(&task, "Word document converted to PDF successfully").render(),
    )
    .unwrap();
    assert_eq!(envelope["resultDocumentId"], json!("out-1"));

    let bytes = client
        .download_document(&result_id, Some("report.pdf"))
        .await
        .unwrap();
    assert_eq!(bytes, b"%PDF-1.7 converted");
}

#[tokio::test]
async fn test_failed_task_surfaces_remote_error() {
    let api = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/documents/enhance/pdf-combine"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"taskId": "task-2"})))
        .expect(1)
        .mount(&api)
        .await;
    Mock::given(method("GET"))
        .and(path("/tasks/task-2"))
        .respond_with(task_progression(json!({
            "taskId": "task-2",
            "status": "FAILED",
            "error": {"code": "ENCRYPTED_INPUT", "message": "Document is password protected"}
        })))
        .mount(&api)
        .await;

    let (client, engine) = setup(&api.uri());
    let documents = vec![
        DocumentRef {
            document_id: "a".to_string(),
            password: None,
        },
        DocumentRef {
            document_id: "b".to_string(),
            password: None,
        },
    ];
    let op = Operation::merge(&documents).unwrap();
    let err = engine
        .submit_and_wait(|| client.submit(&op), None)
        .await
        .unwrap_err();

    let failure: Value =
        serde_json::from_str(&Failure::from_error(&err, "MERGE_FAILED").render()).unwrap();
    assert_eq!(
        failure,
        json!({
            "success": false,
            "error": "Document is password protected",
            "code": "ENCRYPTED_INPUT",
            "taskId": "task-2"
        })
    );
}

#[tokio::test]
async fn test_rate_limited_submit_is_retried() {
    let api = MockServer::start().await;
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    Mock::given(method("POST"))
        .and(path("/documents/optimize/pdf-linearize"))
        .respond_with(move |_req: &Request| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                ResponseTemplate::new(429)
            } else {
                ResponseTemplate::new(200).set_body_json(json!({"taskId": "task-3"}))
            }
        })
        .mount(&api)
        .await;

    let config = api_config(&api.uri()).with_retry(RetryPolicy {
        max_retries: 2,
        base_wait: Duration::from_millis(5),
        max_wait: Duration::from_millis(20),
        jitter: false,
    });
    let client = CloudClient::new(&config, 1024).unwrap();

    let op = Operation::linearize("doc-1").unwrap();
    let task_id = client.submit(&op).await.unwrap();
    assert_eq!(task_id, "task-3");
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_wait_resumes_after_timeout() {
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks/task-4"))
        .respond_with(task_progression(json!({
            "taskId": "task-4",
            "status": "COMPLETED",
            "resultDocumentId": "out-4"
        })))
        .mount(&api)
        .await;

    let (_client, engine) = setup(&api.uri());

    let err = engine
        .wait("task-4", Some(Duration::ZERO))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TaskTimeout { ref task_id, .. } if task_id == "task-4"));

    // The remote task kept running; a second wait picks it up
    let task = engine.wait("task-4", None).await.unwrap();
    assert_eq!(task.result_document_id.as_deref(), Some("out-4"));
}

#[tokio::test]
async fn test_download_size_cap() {
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/documents/big/download"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 4096]))
        .mount(&api)
        .await;

    let config = api_config(&api.uri());
    let client = CloudClient::new(&config, 1024).unwrap();
    let err = client.download_document("big", None).await.unwrap_err();
    assert!(matches!(err, Error::FileTooLarge { .. }));
}
