//! Remote task model

use crate::error::{Error, TASK_FAILED_DEFAULT_MESSAGE};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Lifecycle state of a remote task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    /// Any state this client does not know; treated as still running
    #[serde(other)]
    Unknown,
}

impl TaskStatus {
    /// `COMPLETED` and `FAILED` never transition further
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Processing => "PROCESSING",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Failed => "FAILED",
            TaskStatus::Unknown => "UNKNOWN",
        }
    }
}

/// Error reported by the service for a failed task.
///
/// Every field is optional so a malformed failure still deserializes;
/// defaults are applied in [`Task::failure`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Snapshot of a remote task as returned by `GET /tasks/{task_id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Some deployments omit the id from status bodies or send `null`
    #[serde(default, deserialize_with = "null_as_empty")]
    pub task_id: String,
    pub status: TaskStatus,
    /// Advisory only, never used for control flow
    #[serde(default, deserialize_with = "lenient_progress")]
    pub progress: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_document_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<TaskError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Task {
    /// Build the classified error for a task in the `FAILED` state.
    ///
    /// `task_id` is the id the client submitted, which wins over whatever
    /// the status body echoed back.
    pub fn failure(&self, task_id: &str) -> Error {
        let error = self.error.clone().unwrap_or_default();
        Error::TaskFailed {
            task_id: task_id.to_string(),
            code: error.code.unwrap_or_else(|| "TASK_FAILED".to_string()),
            message: error
                .message
                .unwrap_or_else(|| TASK_FAILED_DEFAULT_MESSAGE.to_string()),
            details: error.details,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Percentage clamped to 0..=100. Anything that is not a number reads as 0
/// so a sloppy progress field cannot fail a status read.
fn lenient_progress<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let progress = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().map_or(0, |p| p.clamp(0.0, 100.0) as u32),
        _ => 0,
    };
    Ok(progress)
}

/// Body returned by `POST /documents/upload`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUpload {
    pub document_id: String,
}

/// Body returned by every operation submission
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSubmission {
    pub task_id: String,
}
