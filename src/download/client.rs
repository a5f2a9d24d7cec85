//! `reqwest`-backed [`Fetcher`] implementation.
//!
//! The client is created once and reused for every download so connections are
//! pooled. It applies a connect timeout only; the per-attempt deadline covering
//! headers and body is enforced by the orchestrator.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap};
use tracing::{debug, instrument};
use url::Url;

use super::fetch::{FetchError, FetchResponse, Fetcher};
use crate::config::CONNECT_TIMEOUT_SECS;
use crate::user_agent;

/// HTTP client for streaming GET requests.
///
/// # Example
///
/// ```no_run
/// use ghfetch_core::download::{Fetcher, HttpClient};
/// use url::Url;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new();
/// let url = Url::parse("https://github.com/acme/tool/releases/download/v1.0/tool.zip")?;
/// let response = client.fetch(&url).await?;
/// println!("status {} length {:?}", response.status, response.content_length);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a client with the default 30 second connect timeout.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the static configuration.
    /// This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::try_new(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .expect("failed to build HTTP client with static configuration")
    }

    /// Creates a client with an explicit connect timeout.
    ///
    /// # Errors
    ///
    /// Returns the builder error if the TLS backend cannot be initialized.
    #[instrument(level = "debug")]
    pub fn try_new(connect_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .gzip(true)
            .user_agent(user_agent::default_user_agent())
            .build()?;
        Ok(Self { client })
    }

    /// Returns a reference to the underlying reqwest client.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Fetcher for HttpClient {
    #[instrument(skip(self), fields(url = %url))]
    async fn fetch(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Request { source })?;

        let status = response.status().as_u16();
        let content_length = declared_content_length(response.headers());
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        debug!(status, ?content_length, ?content_type, "response headers received");

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|source| FetchError::Body { source }))
            .boxed();

        Ok(FetchResponse {
            status,
            content_length,
            content_type,
            body,
        })
    }
}

/// Reads the `Content-Length` header; absent or non-numeric values yield `None`.
fn declared_content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::test_support::socket_guard::{
        should_skip_socket_bound_test, start_mock_server_or_skip,
    };
    use reqwest::header::HeaderValue;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, ResponseTemplate};

    async fn collect_body(response: FetchResponse) -> Vec<u8> {
        let mut body = response.body;
        let mut out = Vec::new();
        while let Some(chunk) = body.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    #[test]
    fn test_declared_content_length_parses_numbers() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("500000"));
        assert_eq!(declared_content_length(&headers), Some(500_000));
    }

    #[test]
    fn test_declared_content_length_ignores_garbage() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("lots"));
        assert_eq!(declared_content_length(&headers), None);
        assert_eq!(declared_content_length(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn test_fetch_reads_status_type_and_body() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };

        Mock::given(method("GET"))
            .and(path("/tool.zip"))
            .and(header_exists("user-agent"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "application/zip")
                    .set_body_bytes(b"PK\x03\x04zip".to_vec()),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let url = Url::parse(&format!("{}/tool.zip", mock_server.uri())).unwrap();
        let response = client.fetch(&url).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.content_length, Some(7));
        assert_eq!(response.content_type.as_deref(), Some("application/zip"));
        assert_eq!(collect_body(response).await, b"PK\x03\x04zip");
    }

    #[tokio::test]
    async fn test_fetch_returns_error_status_without_failing() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };

        Mock::given(method("GET"))
            .and(path("/missing.zip"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = HttpClient::default();
        let url = Url::parse(&format!("{}/missing.zip", mock_server.uri())).unwrap();
        let response = client.fetch(&url).await.unwrap();

        assert_eq!(response.status, 404);
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_request_error() {
        if should_skip_socket_bound_test() {
            return;
        }
        // Bind then drop a listener so the port is very likely closed.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = HttpClient::try_new(Duration::from_secs(2)).unwrap();
        let url = Url::parse(&format!("http://127.0.0.1:{port}/file.zip")).unwrap();

        let result = client.fetch(&url).await;
        assert!(matches!(result, Err(FetchError::Request { .. })));
    }
}
