//! Tool response envelopes
//!
//! Every tool answers with a JSON string: either a success envelope
//! `{success: true, taskId?, resultDocumentId?, message, ...}` or a
//! failure envelope `{success: false, error, code, taskId?, details?}`.

use crate::cloud::Task;
use crate::error::Error;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Success {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result_document_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result_data: Option<Value>,
    message: String,
    /// Tool-specific fields, flattened into the envelope
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Success {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            task_id: None,
            result_document_id: None,
            result_data: None,
            message: message.into(),
            extra: Map::new(),
        }
    }

    /// Envelope for a completed file-producing task.
    ///
    /// `action` is the past-tense summary ("PDF flattened successfully");
    /// the download hint is appended when the task produced a document.
    pub fn from_task(task: &Task, action: &str) -> Self {
        let message = match &task.result_document_id {
            Some(id) => format!("{}. Download using documentId: {}", action, id),
            None => format!("{}.", action),
        };
        Self {
            task_id: Some(task.task_id.clone()),
            result_document_id: task.result_document_id.clone(),
            result_data: task.result_data.clone(),
            ..Self::new(message)
        }
    }

    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    /// Add a tool-specific field. Reserved envelope keys are ignored.
    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        if matches!(
            key,
            "success" | "taskId" | "resultDocumentId" | "resultData" | "message"
        ) {
            return self;
        }
        if let Ok(value) = serde_json::to_value(value) {
            self.extra.insert(key.to_string(), value);
        }
        self
    }

    pub fn render(&self) -> String {
        render(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Failure {
    success: bool,
    error: String,
    code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl Failure {
    /// Build the failure envelope for `err`.
    ///
    /// Depends only on the error value and `fallback_code`, so formatting
    /// the same error twice yields identical output.
    pub fn from_error(err: &Error, fallback_code: &str) -> Self {
        Self {
            success: false,
            error: err.client_message(),
            code: err.code().unwrap_or(fallback_code).to_string(),
            task_id: err.task_id().map(str::to_string),
            details: err.details().cloned(),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn render(&self) -> String {
        render(self)
    }
}

/// Render a tool outcome, logging failures the way every tool does
pub fn respond(tool: &str, fallback_code: &str, outcome: crate::error::Result<Success>) -> String {
    match outcome {
        Ok(success) => success.render(),
        Err(e) => {
            tracing::warn!(tool, error = %e, code = e.code().unwrap_or(fallback_code), "tool failed");
            Failure::from_error(&e, fallback_code).render()
        }
    }
}

fn render<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}
