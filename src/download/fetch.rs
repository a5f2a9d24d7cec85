//! Network collaborator boundary.
//!
//! The orchestrator never talks to `reqwest` directly; it goes through the
//! [`Fetcher`] trait so the attempt/timeout state machine can be driven by a
//! scripted fetcher in tests.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use thiserror::Error;
use url::Url;

/// Response body as a stream of chunks.
pub type BodyStream = BoxStream<'static, Result<Bytes, FetchError>>;

/// Failures raised by a [`Fetcher`] before or while the body is read.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or no response headers arrived.
    #[error("request failed: {source}")]
    Request {
        /// The underlying HTTP client error.
        #[source]
        source: reqwest::Error,
    },

    /// The connection failed while the body was being read.
    #[error("response body failed: {source}")]
    Body {
        /// The underlying HTTP client error.
        #[source]
        source: reqwest::Error,
    },

    /// Transport-level I/O failure (also used by non-HTTP fetchers).
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

/// Response facets the core reads before streaming the body.
pub struct FetchResponse {
    /// HTTP status code.
    pub status: u16,
    /// Declared `Content-Length`, if present and numeric.
    pub content_length: Option<u64>,
    /// Declared `Content-Type`, verbatim.
    pub content_type: Option<String>,
    /// The response body.
    pub body: BodyStream,
}

impl FetchResponse {
    /// Whether the status code is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl std::fmt::Debug for FetchResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchResponse")
            .field("status", &self.status)
            .field("content_length", &self.content_length)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Issues one GET request per call.
///
/// Implementations must not retry on their own; retry policy belongs to the
/// orchestrator.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Sends a GET for `url` and returns once response headers are available.
    async fn fetch(&self, url: &Url) -> Result<FetchResponse, FetchError>;
}
