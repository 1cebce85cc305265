//! Error types for the Foxit PDF MCP Server

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for the Foxit PDF MCP Server
pub type Result<T> = std::result::Result<T, Error>;

/// Message used when a task fails and the service omits the error details
pub const TASK_FAILED_DEFAULT_MESSAGE: &str = "Task failed without error details";

/// Error types for the Foxit PDF MCP Server.
///
/// Remote failures are classified into the protocol taxonomy (see
/// [`Error::code`]); the remaining variants describe local failures that
/// happen before anything is sent to the service.
#[derive(Error, Debug)]
pub enum Error {
    /// The request never produced an HTTP response
    #[error("Request failed: {message}")]
    RequestFailed { message: String },

    /// The request timed out at the network layer
    #[error("Request timeout: {message}")]
    Timeout { message: String },

    /// Non-2xx response whose body was not structured error JSON
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Non-2xx response (or error-shaped download) with a `{code, message}` body
    #[error("{message}")]
    Api {
        code: String,
        message: String,
        status: u16,
        details: Option<Value>,
    },

    /// 2xx response whose body did not have the expected JSON shape
    #[error("Invalid JSON response: {reason}")]
    InvalidResponse { reason: String },

    /// Polled task reached the FAILED state
    #[error("{message}")]
    TaskFailed {
        task_id: String,
        code: String,
        message: String,
        details: Option<Value>,
    },

    /// Polling gave up while the task was still running remotely
    #[error("Task {task_id} did not complete within {}s", timeout.as_secs_f64())]
    TaskTimeout { task_id: String, timeout: Duration },

    /// Missing or malformed configuration
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    /// Tool parameters rejected before submission
    #[error("Invalid parameters: {reason}")]
    InvalidParams { reason: String },

    /// Local file not found
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// Local file or downloaded document exceeds the configured limit
    #[error("File too large: {size} bytes (max: {max_size} bytes)")]
    FileTooLarge { size: u64, max_size: u64 },

    /// Path access denied (outside allowed resource directories)
    #[error("Path access denied: {path}")]
    PathAccessDenied { path: String },

    /// Base64 decode error
    #[error("Invalid base64 data: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classify a transport failure that happened before any response arrived.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout {
                message: err.to_string(),
            }
        } else {
            Error::RequestFailed {
                message: err.to_string(),
            }
        }
    }

    /// Classify an error response body.
    ///
    /// A JSON object body becomes [`Error::Api`], using the server's `code`
    /// and `message` when present; anything else becomes [`Error::Http`].
    pub(crate) fn from_error_body(status: u16, body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(map)) => {
                let code = map
                    .get("code")
                    .and_then(Value::as_str)
                    .unwrap_or("API_ERROR")
                    .to_string();
                let message = map
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("API request failed")
                    .to_string();
                Error::Api {
                    code,
                    message,
                    status,
                    details: Some(Value::Object(map)),
                }
            }
            _ => Error::Http {
                status,
                body: body.to_string(),
            },
        }
    }

    /// Machine-readable classification code.
    ///
    /// Local errors have no code; the tool layer substitutes its own
    /// fallback (e.g. `MERGE_FAILED`).
    pub fn code(&self) -> Option<&str> {
        match self {
            Error::RequestFailed { .. } => Some("REQUEST_FAILED"),
            Error::Timeout { .. } => Some("TIMEOUT"),
            Error::Http { .. } => Some("HTTP_ERROR"),
            Error::Api { code, .. } => Some(code),
            Error::InvalidResponse { .. } => Some("INVALID_RESPONSE"),
            Error::TaskFailed { code, .. } => Some(code),
            Error::TaskTimeout { .. } => Some("TASK_TIMEOUT"),
            Error::Config { .. }
            | Error::InvalidParams { .. }
            | Error::FileNotFound { .. }
            | Error::FileTooLarge { .. }
            | Error::PathAccessDenied { .. }
            | Error::Base64Decode(_)
            | Error::Io(_) => None,
        }
    }

    /// Task the error originated from, when known
    pub fn task_id(&self) -> Option<&str> {
        match self {
            Error::TaskFailed { task_id, .. } | Error::TaskTimeout { task_id, .. } => {
                Some(task_id)
            }
            _ => None,
        }
    }

    /// Structured details supplied by the service
    pub fn details(&self) -> Option<&Value> {
        match self {
            Error::Api { details, .. } | Error::TaskFailed { details, .. } => details.as_ref(),
            _ => None,
        }
    }

    /// Return a message safe to send to clients.
    ///
    /// Remote errors pass the service's message through verbatim. Local
    /// errors omit paths and library internals; full details should be
    /// logged via tracing before calling this.
    pub fn client_message(&self) -> String {
        match self {
            Error::FileNotFound { .. } => "File not found".to_string(),
            Error::PathAccessDenied { .. } => "Access denied".to_string(),
            Error::Io(_) => "I/O error".to_string(),
            Error::Base64Decode(_) => "Invalid base64 data".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_error_body_with_code_and_message() {
        let err = Error::from_error_body(400, r#"{"code":"BAD_INPUT","message":"corrupt file"}"#);
        assert_eq!(err.code(), Some("BAD_INPUT"));
        assert_eq!(err.client_message(), "corrupt file");
        assert_eq!(
            err.details(),
            Some(&json!({"code": "BAD_INPUT", "message": "corrupt file"}))
        );
    }

    #[test]
    fn test_error_body_json_without_fields_defaults() {
        let err = Error::from_error_body(403, r#"{"detail":"nope"}"#);
        assert_eq!(err.code(), Some("API_ERROR"));
        assert_eq!(err.to_string(), "API request failed");
    }

    #[test]
    fn test_error_body_not_json() {
        let err = Error::from_error_body(502, "Bad Gateway");
        assert_eq!(err.code(), Some("HTTP_ERROR"));
        assert_eq!(err.to_string(), "HTTP 502: Bad Gateway");
    }

    #[test]
    fn test_error_body_json_array_is_http_error() {
        let err = Error::from_error_body(500, "[1,2]");
        assert!(matches!(err, Error::Http { status: 500, .. }));
    }

    #[test]
    fn test_task_errors_carry_task_id() {
        let failed = Error::TaskFailed {
            task_id: "t1".to_string(),
            code: "TASK_FAILED".to_string(),
            message: TASK_FAILED_DEFAULT_MESSAGE.to_string(),
            details: None,
        };
        assert_eq!(failed.task_id(), Some("t1"));
        assert_eq!(failed.code(), Some("TASK_FAILED"));

        let timeout = Error::TaskTimeout {
            task_id: "t2".to_string(),
            timeout: Duration::from_secs(5),
        };
        assert_eq!(timeout.task_id(), Some("t2"));
        assert_eq!(timeout.code(), Some("TASK_TIMEOUT"));
        assert_eq!(timeout.to_string(), "Task t2 did not complete within 5s");
    }

    #[test]
    fn test_task_timeout_distinct_from_request_timeout() {
        let request = Error::Timeout {
            message: "operation timed out".to_string(),
        };
        let task = Error::TaskTimeout {
            task_id: "t".to_string(),
            timeout: Duration::from_secs(1),
        };
        assert_ne!(request.code(), task.code());
    }

    #[test]
    fn test_local_errors_have_no_code() {
        let err = Error::InvalidParams {
            reason: "x".to_string(),
        };
        assert_eq!(err.code(), None);
        assert_eq!(err.task_id(), None);
    }

    #[test]
    fn test_client_message_hides_paths() {
        let err = Error::FileNotFound {
            path: "/secret/location.pdf".to_string(),
        };
        assert_eq!(err.client_message(), "File not found");
        let err = Error::PathAccessDenied {
            path: "/etc/passwd".to_string(),
        };
        assert_eq!(err.client_message(), "Access denied");
    }
}
