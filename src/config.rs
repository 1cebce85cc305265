//! Server and API configuration

use crate::cloud::RetryPolicy;
use crate::error::{Error, Result};
use std::time::Duration;

/// Default service root; the client talks to `<root>/api`
pub const DEFAULT_SERVICE_ROOT: &str = "https://na1.fusion.foxit.com/pdf-services";

/// Path prefix of the REST API below the service root
const API_PREFIX: &str = "/api";

/// Connection settings for the Foxit PDF cloud API.
///
/// Built once at startup and injected into the transport; request code
/// never reads the environment.
#[derive(Clone)]
pub struct ApiConfig {
    /// API base URL (service root plus `/api`) without trailing slash;
    /// endpoint paths such as `/documents/upload` are appended to it
    pub base_url: String,
    /// Value of the `client_id` header
    pub client_id: String,
    /// Value of the `client_secret` header
    pub client_secret: String,
    /// How long a task wait lasts when the caller gives no timeout (default: 300s)
    pub default_timeout: Duration,
    /// Delay between task status polls (default: 2s)
    pub poll_interval: Duration,
    /// Network timeout for a single HTTP request (default: 300s)
    pub request_timeout: Duration,
    /// Backoff applied to rate-limited (429) responses
    pub retry: RetryPolicy,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("default_timeout", &self.default_timeout)
            .field("poll_interval", &self.poll_interval)
            .field("request_timeout", &self.request_timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

impl ApiConfig {
    /// Create a configuration with default timing for the given endpoint and credentials.
    pub fn new(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self> {
        let base_url = normalize_base_url(&base_url.into())?;
        let client_id = client_id.into();
        let client_secret = client_secret.into();

        if client_id.is_empty() || client_secret.is_empty() {
            return Err(Error::Config {
                reason: "FOXIT_CLOUD_API_CLIENT_ID and FOXIT_CLOUD_API_CLIENT_SECRET are required"
                    .to_string(),
            });
        }

        Ok(Self {
            base_url,
            client_id,
            client_secret,
            default_timeout: Duration::from_secs(300),
            poll_interval: Duration::from_secs(2),
            request_timeout: Duration::from_secs(300),
            retry: RetryPolicy::default(),
        })
    }

    /// Load configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// `FOXIT_CLOUD_API_BASE_URL` is the service root and gets `/api`
    /// appended. `FOXIT_CLOUD_API_HOST` already names the API prefix and is
    /// used as is. Without either, [`DEFAULT_SERVICE_ROOT`] applies. Empty
    /// values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url = match get("FOXIT_CLOUD_API_BASE_URL") {
            Some(root) => api_url_from_root(&root),
            None => get("FOXIT_CLOUD_API_HOST")
                .unwrap_or_else(|| api_url_from_root(DEFAULT_SERVICE_ROOT)),
        };
        let client_id = get("FOXIT_CLOUD_API_CLIENT_ID").unwrap_or_default();
        let client_secret = get("FOXIT_CLOUD_API_CLIENT_SECRET").unwrap_or_default();

        Self::new(base_url, client_id, client_secret)
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// API base URL below a service root. A root that already ends in the
/// prefix is left alone.
fn api_url_from_root(root: &str) -> String {
    let root = root.trim().trim_end_matches('/');
    if root.ends_with(API_PREFIX) {
        root.to_string()
    } else {
        format!("{}{}", root, API_PREFIX)
    }
}

/// Validate a base URL and strip trailing slashes
fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = url::Url::parse(trimmed).map_err(|e| Error::Config {
        reason: format!("Invalid API base URL format: {} ({})", raw, e),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(Error::Config {
            reason: format!("Invalid API base URL format: {}", raw),
        });
    }

    Ok(trimmed.to_string())
}

/// Security and resource configuration for the MCP server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Remote API settings
    pub api: ApiConfig,
    /// Directories local uploads may read from and downloads may write to.
    /// Empty means no restriction.
    pub resource_dirs: Vec<String>,
    /// Maximum size of a file accepted for upload (default: 100MB)
    pub max_upload_bytes: u64,
    /// Maximum size of a downloaded document (default: 512MB)
    pub max_download_bytes: u64,
}

impl ServerConfig {
    pub fn new(api: ApiConfig) -> Self {
        Self {
            api,
            resource_dirs: Vec::new(),
            max_upload_bytes: 100 * 1024 * 1024, // 100MB
            max_download_bytes: 512 * 1024 * 1024, // 512MB
        }
    }

    /// Load the full server configuration from the environment.
    ///
    /// `FOXIT_MCP_RESOURCE_DIRS` optionally holds a path list (same
    /// separator as `PATH`) restricting local file access.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new(ApiConfig::from_env()?);
        if let Some(dirs) = std::env::var_os("FOXIT_MCP_RESOURCE_DIRS") {
            config.resource_dirs = std::env::split_paths(&dirs)
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| p.to_string_lossy().to_string())
                .collect();
        }
        Ok(config)
    }
}
