//! Network access for the caching worker.
//!
//! [`Fetcher`] is the seam between the worker and the network: the worker
//! only ever calls `fetch`, so tests substitute a scripted implementation
//! and hosts plug in [`HttpFetcher`].
//!
//! ### Transport rules
//! - Any HTTP status is a response, not an error; callers decide what a
//!   non-2xx means.
//! - Errors are reserved for "no response": connect failures, DNS, timeouts
//!   and bodies over the configured limit.
//! - The timeout is the HTTP client's; the worker adds none of its own.

pub mod url;

use bytes::Bytes;
use reqwest::Client;
use reqwest::header::{self, HeaderName, HeaderValue};
use spritz_core::cache::compute_cache_key;
use spritz_core::{AppConfig, Error, Snapshot};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub use self::url::{UrlError, canonicalize, resolve};
pub use reqwest::header::HeaderMap;
pub use reqwest::{Method, StatusCode, Url};

/// Transport failure: no response was received.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// Connect, DNS or protocol failure.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// The HTTP client's timeout elapsed.
    #[error("request timeout")]
    Timeout,

    /// Response body exceeded the configured limit.
    #[error("response too large: {size} bytes exceeds {limit}")]
    TooLarge { size: u64, limit: usize },

    /// The network is not reachable from this host.
    #[error("unreachable: {0}")]
    Unreachable(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { FetchError::Timeout } else { FetchError::Network(Arc::new(err)) }
    }
}

/// An outbound request as seen by the worker.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self { method, url, headers: HeaderMap::new() }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// URL identifying this request. Fragments never reach the server, so
    /// they are not part of the identity.
    pub fn identity_url(&self) -> Url {
        let mut url = self.url.clone();
        url.set_fragment(None);
        url
    }

    /// Lookup key of this request's identity (method + URL with query).
    pub fn cache_key(&self) -> String {
        compute_cache_key(self.method.as_str(), self.identity_url().as_str())
    }
}

/// A response, either from the network or rebuilt from a snapshot.
#[derive(Debug, Clone)]
pub struct Response {
    /// URL the response was produced for.
    pub url: Url,
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body bytes
    pub bytes: Bytes,
}

impl Response {
    pub fn new(url: Url, status: StatusCode, headers: HeaderMap, bytes: impl Into<Bytes>) -> Self {
        Self { url, status, headers, bytes: bytes.into() }
    }

    /// Synthetic `503 Service Unavailable` used when neither network nor
    /// cache can answer.
    pub fn offline(url: &Url, body: &'static str, content_type: Option<&'static str>) -> Self {
        let mut headers = HeaderMap::new();
        if let Some(content_type) = content_type {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        Self::new(url.clone(), StatusCode::SERVICE_UNAVAILABLE, headers, Bytes::from_static(body.as_bytes()))
    }

    /// 2xx-class status. Only such responses are ever cached.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// Body decoded as UTF-8, lossy.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    /// Capture this response as a snapshot of `request` in `bucket`.
    pub fn to_snapshot(&self, bucket: &str, request: &Request) -> Result<Snapshot, Error> {
        let headers: Vec<(String, String)> = self
            .headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();

        Snapshot::capture(
            bucket,
            request.method.as_str(),
            request.identity_url().as_str(),
            self.status.as_u16(),
            &headers,
            self.bytes.to_vec(),
        )
    }

    /// Rebuild a response from a stored snapshot.
    ///
    /// Header pairs that are no longer valid header syntax are dropped.
    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Self, Error> {
        let url = Url::parse(&snapshot.url).map_err(|e| Error::CorruptSnapshot(format!("url: {e}")))?;
        let status = StatusCode::from_u16(snapshot.status_code)
            .map_err(|e| Error::CorruptSnapshot(format!("status {}: {e}", snapshot.status_code)))?;

        let mut headers = HeaderMap::new();
        for (name, value) in snapshot.headers()? {
            if let (Ok(name), Ok(value)) = (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(&value)) {
                headers.append(name, value);
            }
        }

        Ok(Self::new(url, status, headers, snapshot.body.clone()))
    }
}

/// Performs network requests on behalf of the worker.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError>;
}

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "spritz/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 10MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "spritz/0.1".to_string(),
            max_bytes: 10 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// reqwest-backed [`Fetcher`].
pub struct HttpFetcher {
    http: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Create a new fetcher with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        let start = Instant::now();

        let response = self
            .http
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone())
            .send()
            .await?;

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(FetchError::TooLarge { size: len, limit: self.config.max_bytes });
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.bytes().await?;

        if bytes.len() > self.config.max_bytes {
            return Err(FetchError::TooLarge { size: bytes.len() as u64, limit: self.config.max_bytes });
        }

        tracing::debug!(
            method = %request.method,
            url = %request.url,
            status = status.as_u16(),
            bytes = bytes.len(),
            fetch_ms = start.elapsed().as_millis() as u64,
            "network fetch complete"
        );

        Ok(Response::new(request.url.clone(), status, headers, bytes))
    }
}
