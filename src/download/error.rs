//! Error types for the download module.
//!
//! Every failure a download can end in maps to exactly one [`DownloadError`]
//! variant, and every variant has a fixed, user-facing message via
//! [`DownloadError::user_message`]. The `Display` output carries the technical
//! detail for logs.

use serde::Serialize;
use thiserror::Error;

use super::fetch::FetchError;
use crate::parser::{InvalidReason, UrlError};

/// Message shown when nothing more specific applies.
pub const MSG_UNKNOWN: &str = "An unknown error occurred, please try again later";
/// Message shown for an empty input.
pub const MSG_EMPTY_INPUT: &str = "Please enter a GitHub file link";
/// Message shown for a malformed or disallowed URL.
pub const MSG_INVALID_INPUT: &str = "Please enter a valid GitHub file link";
/// Message shown once every attempt timed out.
pub const MSG_TIMEOUT: &str = "Download timed out, check your network connection or try again later";
/// Message shown when the artifact exceeds the size limit.
pub const MSG_TOO_LARGE: &str = "File is too large to download. Please choose a file smaller than 1GB.";
/// Message shown when the body stream broke.
pub const MSG_INTERRUPTED: &str = "Download was interrupted, please try again later";
/// Message shown for a non-2xx response.
pub const MSG_NETWORK: &str = "Network error";
/// Message shown when the content type is not allowed.
pub const MSG_INVALID_TYPE: &str = "File type does not match, download cancelled";

/// Coarse failure category, used in phase events and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The URL failed validation.
    InputInvalid,
    /// Non-success HTTP status.
    Network,
    /// Every attempt exceeded its deadline.
    Timeout,
    /// Artifact over the size limit.
    TooLarge,
    /// Content type outside the allow-list.
    InvalidType,
    /// The body stream failed mid-transfer.
    StreamInterrupted,
    /// Anything else.
    Unknown,
}

impl ErrorKind {
    /// Snake-case name for structured logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InputInvalid => "input_invalid",
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::TooLarge => "too_large",
            Self::InvalidType => "invalid_type",
            Self::StreamInterrupted => "stream_interrupted",
            Self::Unknown => "unknown",
        }
    }
}

/// Terminal failure of a download.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The submitted URL was rejected before any network action.
    #[error("{source}")]
    InputInvalid {
        /// Whether the input was empty or malformed.
        reason: InvalidReason,
        /// Detailed validation error.
        #[source]
        source: UrlError,
    },

    /// The server answered with a non-2xx status.
    #[error("HTTP {status} downloading {url}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Every attempt timed out.
    #[error("timeout downloading {url} after {attempts} attempt(s)")]
    Timeout {
        /// The URL that timed out.
        url: String,
        /// Number of attempts issued.
        attempts: u32,
    },

    /// The artifact exceeds the size limit.
    #[error("{url} is {size} bytes, limit is {limit} (declared: {declared})")]
    TooLarge {
        /// The URL that was downloaded.
        url: String,
        /// Declared or observed size in bytes.
        size: u64,
        /// Configured limit in bytes.
        limit: u64,
        /// Whether `size` came from `Content-Length` rather than the body.
        declared: bool,
    },

    /// The artifact's content type is not on the allow-list.
    #[error("content type {content_type:?} not allowed for {url}")]
    InvalidType {
        /// The URL that was downloaded.
        url: String,
        /// The declared content type, if any.
        content_type: Option<String>,
    },

    /// The connection or body stream failed mid-transfer.
    #[error("download of {url} interrupted: {source}")]
    StreamInterrupted {
        /// The URL being downloaded.
        url: String,
        /// The underlying transport error.
        #[source]
        source: FetchError,
    },

    /// Any failure not covered above.
    #[error("unexpected failure downloading {url}: {message}")]
    Unknown {
        /// The URL being downloaded, if known.
        url: String,
        /// Description of what went wrong.
        message: String,
    },
}

impl DownloadError {
    /// Creates an input validation error.
    pub fn input_invalid(source: UrlError) -> Self {
        Self::InputInvalid {
            reason: source.reason(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn network(url: impl Into<String>, status: u16) -> Self {
        Self::Network {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>, attempts: u32) -> Self {
        Self::Timeout {
            url: url.into(),
            attempts,
        }
    }

    /// Creates a size limit error.
    pub fn too_large(url: impl Into<String>, size: u64, limit: u64, declared: bool) -> Self {
        Self::TooLarge {
            url: url.into(),
            size,
            limit,
            declared,
        }
    }

    /// Creates a content type error.
    pub fn invalid_type(url: impl Into<String>, content_type: Option<String>) -> Self {
        Self::InvalidType {
            url: url.into(),
            content_type,
        }
    }

    /// Creates a stream interruption error.
    pub fn stream_interrupted(url: impl Into<String>, source: FetchError) -> Self {
        Self::StreamInterrupted {
            url: url.into(),
            source,
        }
    }

    /// Creates a catch-all error.
    pub fn unknown(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unknown {
            url: url.into(),
            message: message.into(),
        }
    }

    /// The coarse category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InputInvalid { .. } => ErrorKind::InputInvalid,
            Self::Network { .. } => ErrorKind::Network,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::TooLarge { .. } => ErrorKind::TooLarge,
            Self::InvalidType { .. } => ErrorKind::InvalidType,
            Self::StreamInterrupted { .. } => ErrorKind::StreamInterrupted,
            Self::Unknown { .. } => ErrorKind::Unknown,
        }
    }

    /// The fixed message to show an end user.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InputInvalid {
                reason: InvalidReason::Empty,
                ..
            } => MSG_EMPTY_INPUT,
            Self::InputInvalid {
                reason: InvalidReason::Malformed,
                ..
            } => MSG_INVALID_INPUT,
            Self::Network { .. } => MSG_NETWORK,
            Self::Timeout { .. } => MSG_TIMEOUT,
            Self::TooLarge { .. } => MSG_TOO_LARGE,
            Self::InvalidType { .. } => MSG_INVALID_TYPE,
            Self::StreamInterrupted { .. } => MSG_INTERRUPTED,
            Self::Unknown { .. } => MSG_UNKNOWN,
        }
    }
}
