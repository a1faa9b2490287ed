use base64::Engine;
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::config::Config;

const MAX_RETRIES: u32 = 3;
const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while fetching widget data.
///
/// All of them are caught at the widget boundary: the widget stays
/// uninitialized and renders a failure message instead.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Server returned 429 Too Many Requests after max retries
    #[error("Rate limited after {0} retries")]
    RateLimited(u32),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response body was not valid UTF-8
    #[error("Invalid UTF-8 in response")]
    InvalidUtf8,
    /// Proxy answered with an envelope that carried no contents
    #[error("Proxy returned no contents (upstream status {0})")]
    EmptyEnvelope(String),
}

/// Text-fetching capability the widgets depend on.
///
/// The returned future is boxed so the trait stays object-safe and refresh
/// jobs can hold an `Arc<dyn TextSource>` across spawned tasks.
pub trait TextSource: Send + Sync {
    fn fetch_text<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String, FetchError>>;
}

/// JSON envelope returned by allorigins-style CORS proxies.
#[derive(Debug, Deserialize)]
struct ProxyEnvelope {
    contents: Option<String>,
    #[serde(default)]
    status: Option<serde_json::Value>,
}

/// reqwest-backed [`TextSource`] with an optional proxy prefix.
///
/// When a proxy is configured the target URL is percent-encoded and appended
/// to the prefix, and a `{"contents": ...}` envelope in the response is
/// unwrapped. Bodies that are not an envelope are returned as-is.
#[derive(Clone)]
pub struct HttpTextSource {
    client: reqwest::Client,
    proxy_prefix: Option<String>,
    timeout: Duration,
    retry_base: Duration,
}

impl HttpTextSource {
    pub fn new(client: reqwest::Client, proxy_prefix: Option<String>, timeout: Duration) -> Self {
        Self {
            client,
            proxy_prefix: proxy_prefix.filter(|p| !p.trim().is_empty()),
            timeout,
            retry_base: Duration::from_secs(1),
        }
    }

    /// Build a source from configuration with the shared client settings.
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let timeout = Duration::from_secs(config.request_timeout_secs.max(1));
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(30))
            .timeout(timeout)
            .build()?;
        Ok(Self::new(client, Some(config.proxy_url.clone()), timeout))
    }

    /// Base delay for exponential backoff (1s, 2s, 4s by default).
    pub fn with_retry_base(mut self, retry_base: Duration) -> Self {
        self.retry_base = retry_base;
        self
    }

    /// The URL actually requested for `url`, after proxy wrapping.
    pub fn request_url(&self, url: &str) -> String {
        match &self.proxy_prefix {
            Some(prefix) => {
                let encoded: String = url::form_urlencoded::byte_serialize(url.as_bytes()).collect();
                format!("{}{}", prefix, encoded)
            }
            None => url.to_string(),
        }
    }

    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let request_url = self.request_url(url);
        let bytes = self.fetch_bytes(&request_url).await?;
        let body = String::from_utf8(bytes).map_err(|_| FetchError::InvalidUtf8)?;

        if self.proxy_prefix.is_none() {
            return Ok(body);
        }

        match serde_json::from_str::<ProxyEnvelope>(&body) {
            Ok(ProxyEnvelope {
                contents: Some(contents),
                ..
            }) => Ok(contents),
            Ok(ProxyEnvelope { status, .. }) => Err(FetchError::EmptyEnvelope(
                status.map(|s| s.to_string()).unwrap_or_else(|| "unknown".to_string()),
            )),
            // Raw-mode proxies pass the upstream body straight through
            Err(_) => Ok(body),
        }
    }

    async fn fetch_bytes(&self, request_url: &str) -> Result<Vec<u8>, FetchError> {
        let mut retry_count = 0;

        loop {
            let response = tokio::time::timeout(self.timeout, self.client.get(request_url).send())
                .await
                .map_err(|_| FetchError::Timeout)?
                .map_err(FetchError::Network)?;

            let status = response.status();

            // EDGE-004: Rate limiting and server errors back off exponentially
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                if retry_count >= MAX_RETRIES {
                    return Err(if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        FetchError::RateLimited(MAX_RETRIES)
                    } else {
                        FetchError::HttpStatus(status.as_u16())
                    });
                }

                let delay = self.retry_base * 2u32.pow(retry_count);
                tracing::warn!(
                    url = %request_url,
                    status = %status,
                    retry = retry_count,
                    delay_ms = delay.as_millis() as u64,
                    "Fetch failed, retrying after delay"
                );
                tokio::time::sleep(delay).await;
                retry_count += 1;
                continue;
            }

            // 4xx errors fail immediately
            if !status.is_success() {
                return Err(FetchError::HttpStatus(status.as_u16()));
            }

            return read_limited_bytes(response, MAX_FEED_SIZE).await;
        }
    }
}

impl TextSource for HttpTextSource {
    fn fetch_text<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String, FetchError>> {
        self.fetch(url).boxed()
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

/// Decode a CSV payload that may arrive base64-encoded.
///
/// Whitespace is ignored when testing for base64, since proxies wrap long
/// encodings. Anything that does not decode to UTF-8 text (plain CSV with its
/// commas never does) is returned unchanged.
pub fn decode_payload(payload: &str) -> String {
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return String::new();
    }

    let encoded = compact
        .split_once("base64,")
        .map_or(compact.as_str(), |(_, data)| data);

    match base64::engine::general_purpose::STANDARD.decode(encoded) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(_) => payload.to_string(),
        },
        Err(_) => payload.to_string(),
    }
}
