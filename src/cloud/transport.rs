//! Authenticated HTTP transport with rate-limit backoff

use crate::cloud::RetryPolicy;
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

const CLIENT_ID_HEADER: &str = "client_id";
const CLIENT_SECRET_HEADER: &str = "client_secret";

/// Payload of an outbound request
#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(Value),
    /// Multipart upload with a single `file` part
    File { file_name: String, data: Vec<u8> },
}

/// One request against the API, relative to the configured base URL.
///
/// Requests are plain data so the transport can rebuild them for every
/// retry; multipart bodies cannot be cloned once handed to reqwest.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn post_json(path: impl Into<String>, payload: Value) -> Self {
        Self {
            body: RequestBody::Json(payload),
            ..Self::new(Method::POST, path)
        }
    }

    pub fn upload(path: impl Into<String>, file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            body: RequestBody::File {
                file_name: file_name.into(),
                data,
            },
            ..Self::new(Method::POST, path)
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

/// HTTP transport for the PDF cloud API.
///
/// Decorates every request with the `client_id`/`client_secret` header
/// pair and retries 429 responses according to the configured
/// [`RetryPolicy`]. Any other 4xx/5xx is classified and returned at once.
/// The transport holds no mutable state and is cheap to clone.
#[derive(Clone)]
pub struct Transport {
    http: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl Transport {
    /// Build a transport from configuration
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(CLIENT_ID_HEADER),
            header_value(&config.client_id)?,
        );
        let mut secret = header_value(&config.client_secret)?;
        secret.set_sensitive(true);
        headers.insert(HeaderName::from_static(CLIENT_SECRET_HEADER), secret);

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config {
                reason: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry: config.retry.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn build(&self, request: &ApiRequest) -> Result<RequestBuilder> {
        let mut builder = self
            .http
            .request(request.method.clone(), self.url(&request.path));

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(payload) => builder.json(payload),
            RequestBody::File { file_name, data } => {
                let part = reqwest::multipart::Part::bytes(data.clone())
                    .file_name(file_name.clone())
                    .mime_str("application/octet-stream")
                    .map_err(Error::from_transport)?;
                builder.multipart(reqwest::multipart::Form::new().part("file", part))
            }
        };

        Ok(builder)
    }

    /// Send a request, absorbing rate-limit rejections.
    ///
    /// Returns the response only when its status is below 400.
    pub async fn send(&self, request: &ApiRequest) -> Result<Response> {
        let mut attempt: u32 = 0;

        loop {
            debug!(
                attempt = attempt + 1,
                method = %request.method,
                path = %request.path,
                "sending API request"
            );

            let response = self.build(request)?.send().await.map_err(|e| {
                debug!(method = %request.method, path = %request.path, error = %e, "API request failed");
                Error::from_transport(e)
            })?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS && self.retry.should_retry(attempt) {
                let delay = self.retry.delay(attempt);
                warn!(
                    attempt = attempt + 1,
                    max_retries = self.retry.max_retries,
                    delay_secs = delay.as_secs_f64(),
                    path = %request.path,
                    "rate limit exceeded, backing off"
                );
                drop(response);
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            if status.is_client_error() || status.is_server_error() {
                let body = response.text().await.map_err(Error::from_transport)?;
                debug!(%status, path = %request.path, "API returned error status");
                return Err(Error::from_error_body(status.as_u16(), &body));
            }

            debug!(%status, path = %request.path, "received API response");
            return Ok(response);
        }
    }

    /// Send a request and parse the response body as JSON.
    ///
    /// A 2xx body that does not match `T` but looks like a service error
    /// (`{code, message}`) is reported as that error; any other mismatch
    /// is `INVALID_RESPONSE`.
    pub async fn send_json<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T> {
        let response = self.send(request).await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(Error::from_transport)?;

        serde_json::from_slice::<T>(&bytes).map_err(|e| {
            error_shaped(status, &bytes).unwrap_or_else(|| Error::InvalidResponse {
                reason: e.to_string(),
            })
        })
    }

    /// Send a request whose response body is irrelevant
    pub async fn send_empty(&self, request: &ApiRequest) -> Result<()> {
        self.send(request).await.map(|_| ())
    }

    /// Download a binary body, refusing anything larger than `max_bytes`.
    ///
    /// The service reports some failures with a 2xx JSON body; when the
    /// Content-Type is JSON and the body carries `code` and `message`, it
    /// is returned as an error instead of as document content.
    pub async fn download(&self, request: &ApiRequest, max_bytes: u64) -> Result<Vec<u8>> {
        let response = self.send(request).await?;
        let status = response.status().as_u16();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_ascii_lowercase().starts_with("application/json"))
            .unwrap_or(false);

        // Check Content-Length header for early rejection
        if let Some(content_length) = response.content_length() {
            if content_length > max_bytes {
                return Err(Error::FileTooLarge {
                    size: content_length,
                    max_size: max_bytes,
                });
            }
        }

        let mut data = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(Error::from_transport)?;
            data.extend_from_slice(&chunk);
            if data.len() as u64 > max_bytes {
                return Err(Error::FileTooLarge {
                    size: data.len() as u64,
                    max_size: max_bytes,
                });
            }
        }

        if is_json {
            if let Some(err) = error_shaped(status, &data) {
                return Err(err);
            }
        }

        Ok(data)
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| Error::Config {
        reason: "Credentials contain characters not allowed in HTTP headers".to_string(),
    })
}

/// Classify a body as a service error if it is an object with string `code` and `message`
fn error_shaped(status: u16, body: &[u8]) -> Option<Error> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let obj = value.as_object()?;
    let code = obj.get("code")?.as_str()?.to_string();
    let message = obj.get("message")?.as_str()?.to_string();
    Some(Error::Api {
        code,
        message,
        status,
        details: Some(value),
    })
}
