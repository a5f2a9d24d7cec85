//! Download orchestrator: one request in, one verified artifact or typed error out.
//!
//! # Overview
//!
//! A download moves through `Requesting → Streaming → Validating → Succeeded`
//! or ends in `Failed(kind)`. Each attempt runs under a deadline covering both
//! the response headers and the whole body. When the deadline passes, the
//! in-flight future is dropped and, while retries remain, a fresh attempt is
//! issued from scratch. No other failure is retried.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ghfetch_core::counter::{DownloadCounter, MemoryStore};
//! use ghfetch_core::download::{Downloader, DownloadEvent, HttpClient};
//! use ghfetch_core::DownloaderConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let counter = Arc::new(DownloadCounter::load(Arc::new(MemoryStore::new())).await);
//! let downloader = Arc::new(Downloader::new(
//!     DownloaderConfig::default(),
//!     Arc::new(HttpClient::new()),
//!     counter,
//! )?);
//!
//! let mut handle = downloader
//!     .submit_download("https://github.com/acme/tool/releases/download/v1.0/tool.zip");
//! while let Some(event) = handle.next_event().await {
//!     if let DownloadEvent::Progress(p) = event {
//!         println!("{}", p.label());
//!     }
//! }
//! let artifact = handle.result().await?;
//! println!("{} ({} bytes)", artifact.filename, artifact.len());
//! # Ok(())
//! # }
//! ```

mod attempt;
mod error_mapping;
mod handle;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use self::attempt::DownloadAttempt;
use self::error_mapping::{from_stream_error, from_validation_error};
pub use self::handle::DownloadHandle;
use super::artifact::{Artifact, ArtifactPolicy};
use super::events::{AttemptId, DownloadPhase, ProgressSink};
use super::fetch::{FetchResponse, Fetcher};
use super::retry::{RetryDecision, RetryPolicy, classify_error};
use super::stream::consume_stream;
use super::DownloadError;
use crate::config::{
    ConfigError, DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_RETRIES,
    DownloaderConfig,
};
use crate::counter::DownloadCounter;
use crate::parser::UrlValidator;

/// One validated download submission. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    url: Url,
    max_size: u64,
    timeout: Duration,
    max_retries: u32,
}

impl DownloadRequest {
    /// Creates a request with the built-in limits.
    ///
    /// The URL is taken as-is; use [`Downloader::prepare`] to validate user input.
    #[must_use]
    pub fn new(url: Url) -> Self {
        Self {
            url,
            max_size: DEFAULT_MAX_FILE_SIZE,
            timeout: DEFAULT_ATTEMPT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Sets the per-attempt deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum artifact size in bytes.
    #[must_use]
    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    /// Sets how many times a timed-out attempt is repeated.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Target URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Maximum artifact size in bytes.
    #[must_use]
    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Per-attempt deadline.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Maximum number of timeout-driven retries.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

/// Runs downloads against a [`Fetcher`] and records completions in a
/// [`DownloadCounter`].
///
/// A `Downloader` is cheap to share behind an [`Arc`]; every call to
/// [`download`](Self::download) owns its own attempt state.
pub struct Downloader {
    config: DownloaderConfig,
    validator: UrlValidator,
    artifact_policy: ArtifactPolicy,
    fetcher: Arc<dyn Fetcher>,
    counter: Arc<DownloadCounter>,
    next_attempt: AtomicU64,
}

impl std::fmt::Debug for Downloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Downloader")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Downloader {
    /// Creates a downloader.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is out of range or its URL
    /// policy cannot be compiled.
    #[instrument(level = "debug", skip_all)]
    pub fn new(
        config: DownloaderConfig,
        fetcher: Arc<dyn Fetcher>,
        counter: Arc<DownloadCounter>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let validator = UrlValidator::new(config.url_policy().clone())?;
        let artifact_policy = ArtifactPolicy::from_config(&config);

        debug!(
            max_retries = config.max_retries(),
            attempt_timeout_secs = config.attempt_timeout().as_secs(),
            max_file_size = config.max_file_size(),
            "creating downloader"
        );

        Ok(Self {
            config,
            validator,
            artifact_policy,
            fetcher,
            counter,
            next_attempt: AtomicU64::new(1),
        })
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &DownloaderConfig {
        &self.config
    }

    /// The counter incremented on every success.
    #[must_use]
    pub fn counter(&self) -> &Arc<DownloadCounter> {
        &self.counter
    }

    /// Validates user input and builds a request with the configured limits.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InputInvalid`] for empty or unacceptable input.
    pub fn prepare(&self, input: &str) -> Result<DownloadRequest, DownloadError> {
        let url = self
            .validator
            .validate(input)
            .map_err(DownloadError::input_invalid)?;
        Ok(DownloadRequest::new(url)
            .with_max_size(self.config.max_file_size())
            .with_timeout(self.config.attempt_timeout())
            .with_max_retries(self.config.max_retries()))
    }

    /// Validates `input` and runs the download on a spawned task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit_download(self: &Arc<Self>, input: &str) -> DownloadHandle {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (result_tx, result_rx) = oneshot::channel();
        let input = input.trim().to_string();
        let this = Arc::clone(self);
        let task_input = input.clone();

        let task = tokio::spawn(async move {
            let outcome = match this.prepare(&task_input) {
                Ok(request) => this.download(request, &events_tx).await,
                Err(err) => {
                    warn!(input = %task_input, error = %err, "rejected download input");
                    Err(err)
                }
            };
            // The caller may have dropped the handle.
            let _ = result_tx.send(outcome);
        });

        DownloadHandle::new(input, events_rx, result_rx, task)
    }

    /// Runs the attempt/retry state machine for `request`.
    ///
    /// Progress and phase events go to `sink`, tagged with the attempt that
    /// produced them. The URL is not re-validated here.
    ///
    /// # Errors
    ///
    /// Returns the terminal [`DownloadError`]; see its variants for the cases.
    #[instrument(skip(self, request, sink), fields(url = %request.url()))]
    pub async fn download(
        &self,
        request: DownloadRequest,
        sink: &dyn ProgressSink,
    ) -> Result<Artifact, DownloadError> {
        let retry_policy = RetryPolicy::new(request.max_retries());
        let active = AtomicU64::new(0);
        let mut number = 0;

        loop {
            let id = self.next_attempt_id();
            active.store(id.get(), Ordering::SeqCst);
            let attempt = DownloadAttempt::new(id, number, request.timeout(), sink, &active);

            if number == 0 {
                attempt.enter(DownloadPhase::Idle);
            }
            debug!(attempt = %id, number, "issuing request");
            attempt.enter(DownloadPhase::Requesting);

            let outcome =
                tokio::time::timeout_at(attempt.deadline(), self.run_attempt(&request, &attempt))
                    .await;

            let err = match outcome {
                Ok(Ok(artifact)) => {
                    self.record_success(&request, &artifact, number + 1).await;
                    attempt.enter(DownloadPhase::Succeeded);
                    return Ok(artifact);
                }
                Ok(Err(err)) => err,
                Err(_elapsed) => {
                    debug!(
                        attempt = %id,
                        received = attempt.received(),
                        expected_total = attempt.expected_total(),
                        "attempt deadline passed"
                    );
                    DownloadError::timeout(request.url().as_str(), number + 1)
                }
            };

            match retry_policy.should_retry(classify_error(&err), number) {
                RetryDecision::Retry { attempt: next } => {
                    warn!(
                        attempt = number + 1,
                        max_attempts = retry_policy.max_attempts(),
                        error = %err,
                        "attempt timed out, retrying"
                    );
                    attempt.enter(DownloadPhase::Retrying);
                    number = next;
                }
                RetryDecision::DoNotRetry { reason } => {
                    error!(
                        url = %request.url(),
                        attempts = number + 1,
                        kind = err.kind().as_str(),
                        error = %err,
                        reason = %reason,
                        "download failed"
                    );
                    attempt.enter(DownloadPhase::Failed(err.kind()));
                    return Err(err);
                }
            }
        }
    }

    async fn run_attempt(
        &self,
        request: &DownloadRequest,
        attempt: &DownloadAttempt<'_>,
    ) -> Result<Artifact, DownloadError> {
        let url = request.url();
        let FetchResponse {
            status,
            content_length,
            content_type,
            body,
        } = self
            .fetcher
            .fetch(url)
            .await
            .map_err(|source| DownloadError::stream_interrupted(url.as_str(), source))?;

        if !(200..300).contains(&status) {
            return Err(DownloadError::network(url.as_str(), status));
        }

        attempt.set_expected_total(content_length);
        if let Some(declared) = content_length
            && declared > request.max_size()
        {
            return Err(DownloadError::too_large(
                url.as_str(),
                declared,
                request.max_size(),
                true,
            ));
        }

        attempt.enter(DownloadPhase::Streaming);
        let bytes = consume_stream(
            body,
            content_length,
            request.max_size(),
            attempt.id(),
            attempt,
        )
        .await
        .map_err(|e| from_stream_error(url, e))?;

        attempt.enter(DownloadPhase::Validating);
        debug!(attempt = %attempt.id(), number = attempt.number(), bytes = bytes.len(), "body complete");
        self.artifact_policy
            .clone()
            .with_max_size(request.max_size())
            .validate(bytes, content_type.as_deref(), url)
            .map_err(|e| from_validation_error(url, e))
    }

    async fn record_success(&self, request: &DownloadRequest, artifact: &Artifact, attempts: u32) {
        match self.counter.increment().await {
            Ok(count) => info!(
                url = %request.url(),
                filename = %artifact.filename,
                bytes = artifact.len(),
                attempts,
                total_downloads = count,
                "download complete"
            ),
            Err(err) => warn!(
                url = %request.url(),
                filename = %artifact.filename,
                error = %err,
                "download complete but counter was not persisted"
            ),
        }
    }

    fn next_attempt_id(&self) -> AttemptId {
        AttemptId::new(self.next_attempt.fetch_add(1, Ordering::SeqCst))
    }
}
