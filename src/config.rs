//! Immutable configuration for the download core.
//!
//! A [`DownloaderConfig`] is built once at startup and handed to the
//! [`Downloader`](crate::download::Downloader). Nothing in the core mutates it.

use std::time::Duration;

use thiserror::Error;

use crate::parser::UrlPolicy;

/// Default maximum number of timeout-driven retries.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default per-attempt timeout (2 minutes).
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(120);

/// Default maximum artifact size (1 GiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024 * 1024;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Content types accepted by default.
pub const DEFAULT_ALLOWED_CONTENT_TYPES: &[&str] = &[
    "application/pdf",
    "image/jpeg",
    "image/png",
    "text/plain",
    "application/zip",
    "application/x-tar",
    "application/gzip",
    "application/x-debian-package",
    "application/x-apple-diskimage",
    "application/x-rpm",
    "application/x-msdos-program",
    "text/x-shellscript",
];

/// Errors raised when a configuration value is unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A numeric setting is outside its accepted range.
    #[error("invalid value for `{field}`: {reason}")]
    OutOfRange {
        /// Name of the offending setting.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The URL grammar could not be compiled from the configured policy.
    #[error("invalid URL policy: {0}")]
    UrlPolicy(String),
}

/// Configuration for the download core.
///
/// # Default Values
///
/// - `max_retries`: 3
/// - `attempt_timeout`: 120 seconds
/// - `max_file_size`: 1 GiB
/// - `connect_timeout`: 30 seconds
/// - `url_policy`: GitHub release/archive/blob/raw URLs
/// - `allowed_content_types`: [`DEFAULT_ALLOWED_CONTENT_TYPES`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloaderConfig {
    max_retries: u32,
    attempt_timeout: Duration,
    max_file_size: u64,
    connect_timeout: Duration,
    url_policy: UrlPolicy,
    allowed_content_types: Vec<String>,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            url_policy: UrlPolicy::default(),
            allowed_content_types: DEFAULT_ALLOWED_CONTENT_TYPES
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

impl DownloaderConfig {
    /// Sets the maximum number of timeout-driven retries.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the per-attempt timeout.
    #[must_use]
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Sets the maximum accepted artifact size in bytes.
    #[must_use]
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Sets the HTTP connect timeout used by [`HttpClient`](crate::download::HttpClient).
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Replaces the accepted URL grammar.
    #[must_use]
    pub fn with_url_policy(mut self, policy: UrlPolicy) -> Self {
        self.url_policy = policy;
        self
    }

    /// Replaces the content-type allow-list. Entries are normalized to lower case.
    #[must_use]
    pub fn with_allowed_content_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_content_types = types
            .into_iter()
            .map(|s| s.as_ref().trim().to_ascii_lowercase())
            .collect();
        self
    }

    /// Maximum number of timeout-driven retries.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Per-attempt timeout.
    #[must_use]
    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    /// Maximum accepted artifact size in bytes.
    #[must_use]
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// HTTP connect timeout.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Accepted URL grammar.
    #[must_use]
    pub fn url_policy(&self) -> &UrlPolicy {
        &self.url_policy
    }

    /// Accepted content types (lower-case MIME essences).
    #[must_use]
    pub fn allowed_content_types(&self) -> &[String] {
        &self.allowed_content_types
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] for a zero timeout, a zero size cap,
    /// or an empty content-type allow-list.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.attempt_timeout.is_zero() {
            return Err(ConfigError::OutOfRange {
                field: "attempt_timeout",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::OutOfRange {
                field: "connect_timeout",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.max_file_size == 0 {
            return Err(ConfigError::OutOfRange {
                field: "max_file_size",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.allowed_content_types.is_empty() {
            return Err(ConfigError::OutOfRange {
                field: "allowed_content_types",
                reason: "at least one content type is required".to_string(),
            });
        }
        Ok(())
    }
}
