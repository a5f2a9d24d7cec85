//! Download core: fetch, stream, validate, count.
//!
//! # Features
//!
//! - Per-attempt deadline covering headers and body, with timeout-only retry
//! - Chunked body consumption with determinate or indeterminate progress
//! - Content-type allow-list and size cap, checked before bytes are handed out
//! - Attempt-tagged events; a superseded attempt never reports
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ghfetch_core::counter::{DownloadCounter, MemoryStore};
//! use ghfetch_core::download::{Downloader, HttpClient, NoopProgress};
//! use ghfetch_core::DownloaderConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let counter = Arc::new(DownloadCounter::load(Arc::new(MemoryStore::new())).await);
//! let downloader = Downloader::new(
//!     DownloaderConfig::default(),
//!     Arc::new(HttpClient::new()),
//!     counter,
//! )?;
//! let request = downloader.prepare("https://github.com/acme/tool/raw/main/install.sh")?;
//! let artifact = downloader.download(request, &NoopProgress).await?;
//! println!("{}", artifact.filename);
//! # Ok(())
//! # }
//! ```

mod artifact;
mod client;
mod engine;
mod error;
mod events;
mod fetch;
pub mod filename;
mod retry;
mod stream;

pub use artifact::{Artifact, ArtifactPolicy, ValidationError};
pub use client::HttpClient;
pub use engine::{DownloadHandle, DownloadRequest, Downloader};
pub use error::{
    DownloadError, ErrorKind, MSG_EMPTY_INPUT, MSG_INTERRUPTED, MSG_INVALID_INPUT,
    MSG_INVALID_TYPE, MSG_NETWORK, MSG_TIMEOUT, MSG_TOO_LARGE, MSG_UNKNOWN,
};
pub use events::{
    AttemptId, DownloadEvent, DownloadPhase, NoopProgress, PREPARING_LABEL, ProgressFraction,
    ProgressSink, StreamProgress,
};
pub use fetch::{BodyStream, FetchError, FetchResponse, Fetcher};
pub use retry::{FailureType, RetryDecision, RetryPolicy, classify_error};
pub use stream::{StreamError, consume_stream};

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
