//! Retry decisions for failed attempts.
//!
//! Only a timed-out attempt is worth repeating: a non-success status, an
//! oversized or mistyped artifact, or a broken stream would fail the same way
//! again. Retries are issued immediately; there is no backoff between attempts.
//!
//! # Example
//!
//! ```
//! use ghfetch_core::download::{
//!     DownloadError, RetryDecision, RetryPolicy, classify_error,
//! };
//!
//! let policy = RetryPolicy::new(3);
//! let error = DownloadError::timeout("https://github.com/acme/tool/raw/main/a.txt", 1);
//!
//! match policy.should_retry(classify_error(&error), 0) {
//!     RetryDecision::Retry { attempt } => println!("issuing attempt {attempt}"),
//!     RetryDecision::DoNotRetry { reason } => println!("giving up: {reason}"),
//! }
//! ```

use tracing::{debug, instrument};

use super::DownloadError;
use crate::config::DEFAULT_MAX_RETRIES;

/// Classification of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// The attempt ran out of time; a fresh attempt may succeed.
    Transient,
    /// Repeating the request would produce the same result.
    Permanent,
}

/// Decision on whether to issue another attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Issue another attempt now.
    Retry {
        /// Zero-based index of the attempt about to start.
        attempt: u32,
    },

    /// Resolve with the current error.
    DoNotRetry {
        /// Human-readable reason.
        reason: String,
    },
}

/// Bounds the number of timeout-driven retries.
///
/// A request is tried at most `max_retries + 1` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES)
    }
}

impl RetryPolicy {
    /// Creates a policy allowing `max_retries` retries after the first attempt.
    #[must_use]
    pub const fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// Maximum number of retries.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Maximum number of attempts including the first.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Decides what follows the failure of attempt `attempt` (zero-based).
    #[instrument(skip(self), fields(max_retries = self.max_retries))]
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        if failure_type == FailureType::Permanent {
            return RetryDecision::DoNotRetry {
                reason: "permanent failure - retry would not help".to_string(),
            };
        }

        if attempt >= self.max_retries {
            debug!(attempt, "retries exhausted");
            return RetryDecision::DoNotRetry {
                reason: format!("max retries ({}) exhausted", self.max_retries),
            };
        }

        debug!(attempt, next_attempt = attempt + 1, "will retry");
        RetryDecision::Retry {
            attempt: attempt + 1,
        }
    }
}

/// Classifies a failure; only [`DownloadError::Timeout`] is transient.
#[must_use]
pub fn classify_error(error: &DownloadError) -> FailureType {
    match error {
        DownloadError::Timeout { .. } => FailureType::Transient,
        DownloadError::InputInvalid { .. }
        | DownloadError::Network { .. }
        | DownloadError::TooLarge { .. }
        | DownloadError::InvalidType { .. }
        | DownloadError::StreamInterrupted { .. }
        | DownloadError::Unknown { .. } => FailureType::Permanent,
    }
}
