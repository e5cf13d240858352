//! HTTP client for fetching product detail pages
//!
//! One client is built per run with a fixed browser-like user agent and a
//! bounded request timeout. There is no retry: a failed fetch ends that
//! item's processing and nothing else.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, USER_AGENT},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Default identity presented to product sites.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 15;

/// HTTP client configuration, read-only for the duration of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub follow_redirects: bool,
    /// Honour `HTTP_PROXY`/`HTTPS_PROXY` from the environment
    pub use_system_proxy: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            follow_redirects: true,
            use_system_proxy: true,
        }
    }
}

/// Transport-level failure for a single detail page.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request to {url} timed out after {timeout_seconds}s")]
    Timeout { url: String, timeout_seconds: u64 },

    #[error("connection to {url} failed: {reason}")]
    Connection { url: String, reason: String },

    #[error("HTTP {status} for url ({url})")]
    Status { status: u16, url: String },

    #[error("failed to read response body from {url}: {reason}")]
    Body { url: String, reason: String },

    #[error("request to {url} failed: {reason}")]
    Other { url: String, reason: String },
}

impl RequestError {
    pub fn url(&self) -> &str {
        match self {
            Self::InvalidUrl { url, .. }
            | Self::Timeout { url, .. }
            | Self::Connection { url, .. }
            | Self::Status { url, .. }
            | Self::Body { url, .. }
            | Self::Other { url, .. } => url,
        }
    }
}

/// Raw response of a successful fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: String,
    pub status: u16,
    pub body: String,
}

/// Source of detail-page content.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, RequestError>;
}

/// `reqwest`-backed page fetcher
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Build the client with the configured identity and timeout
    pub fn new(config: HttpClientConfig) -> anyhow::Result<Self> {
        use anyhow::Context;

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).context("Invalid user agent")?,
        );

        let mut builder = Client::builder();
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()
            .context("Failed to create HTTP client")?;

        info!(
            "HTTP client ready (timeout {}s, user agent '{}')",
            config.timeout_seconds, config.user_agent
        );
        Ok(Self { client, config })
    }

    fn classify(&self, url: &str, err: &reqwest::Error) -> RequestError {
        let url = url.to_string();
        if err.is_timeout() {
            RequestError::Timeout {
                url,
                timeout_seconds: self.config.timeout_seconds,
            }
        } else if err.is_connect() {
            RequestError::Connection {
                url,
                reason: err.to_string(),
            }
        } else if let Some(status) = err.status() {
            RequestError::Status {
                status: status.as_u16(),
                url,
            }
        } else if err.is_body() || err.is_decode() {
            RequestError::Body {
                url,
                reason: err.to_string(),
            }
        } else {
            RequestError::Other {
                url,
                reason: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, RequestError> {
        let parsed = url::Url::parse(url).map_err(|e| RequestError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        debug!("Fetching URL: {}", url);

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| self.classify(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RequestError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| self.classify(url, &e))?;

        debug!("Fetched {} ({} bytes, HTTP {})", url, body.len(), status.as_u16());
        Ok(FetchedPage {
            url: final_url,
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Serve exactly one canned HTTP response and hand back the raw request.
    async fn serve_once(response: String) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
                if request.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            let _ = tx.send(String::from_utf8_lossy(&request).into_owned());
        });

        (format!("http://{addr}/product"), rx)
    }

    fn http_response(status_line: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    fn local_config() -> HttpClientConfig {
        HttpClientConfig {
            use_system_proxy: false,
            ..Default::default()
        }
    }

    #[test]
    fn default_config_matches_fixed_identity() {
        let config = HttpClientConfig::default();
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.timeout_seconds, 15);
        assert!(HttpClient::new(config).is_ok());
    }

    #[tokio::test]
    async fn fetch_sends_user_agent_and_returns_body() {
        let (url, request) = serve_once(http_response("200 OK", "<p>Colour: Red</p>")).await;
        let client = HttpClient::new(local_config()).unwrap();

        let page = client.fetch(&url).await.unwrap();
        assert_eq!(page.status, 200);
        assert_eq!(page.body, "<p>Colour: Red</p>");

        let raw = request.await.unwrap().to_lowercase();
        assert!(raw.contains(&format!("user-agent: {}", DEFAULT_USER_AGENT.to_lowercase())));
    }

    #[tokio::test]
    async fn non_success_status_is_request_error() {
        let (url, _request) = serve_once(http_response("404 Not Found", "gone")).await;
        let client = HttpClient::new(local_config()).unwrap();

        let err = client.fetch(&url).await.unwrap_err();
        assert!(matches!(err, RequestError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let client = HttpClient::new(HttpClientConfig {
            timeout_seconds: 1,
            ..local_config()
        })
        .unwrap();
        let err = client.fetch(&format!("http://{addr}/slow")).await.unwrap_err();
        assert!(matches!(err, RequestError::Timeout { timeout_seconds: 1, .. }));
    }

    #[tokio::test]
    async fn malformed_url_is_rejected_before_sending() {
        let client = HttpClient::new(HttpClientConfig::default()).unwrap();
        let err = client.fetch("http//missing-colon").await.unwrap_err();
        assert!(matches!(err, RequestError::InvalidUrl { .. }));
        assert_eq!(err.url(), "http//missing-colon");
    }
}
