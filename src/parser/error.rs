//! Error types for URL input validation.

use serde::Serialize;
use thiserror::Error;

/// Maximum URL length to accept (standard browser limit).
/// URLs longer than this are rejected before pattern matching.
pub const MAX_URL_LENGTH: usize = 2000;

/// Why a candidate URL was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    /// Nothing left after trimming whitespace.
    Empty,
    /// Does not match the accepted URL grammar.
    Malformed,
}

impl InvalidReason {
    /// Stable label for logs and serialized events.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Malformed => "malformed",
        }
    }
}

/// Errors produced by [`UrlValidator::validate`](super::UrlValidator::validate).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    /// Input was empty or whitespace only.
    #[error("no URL provided\n  Suggestion: Paste a GitHub file link")]
    Empty,

    /// Input is not an accepted URL.
    #[error("unsupported URL '{url}': {reason}\n  Suggestion: {suggestion}")]
    Malformed {
        /// The trimmed input (truncated for very long values).
        url: String,
        /// What failed to match.
        reason: String,
        /// How to fix the issue.
        suggestion: &'static str,
    },
}

impl UrlError {
    /// Creates a `Malformed` error for input that is not a URL at all.
    #[must_use]
    pub fn unparseable(url: &str, parse_error: &str) -> Self {
        Self::malformed(
            url,
            parse_error.to_string(),
            "Check the URL format and try again",
        )
    }

    /// Creates a `Malformed` error for a non-https scheme.
    #[must_use]
    pub fn insecure_scheme(url: &str, scheme: &str) -> Self {
        Self::malformed(
            url,
            format!("scheme '{scheme}' is not accepted"),
            "Use an https:// link",
        )
    }

    /// Creates a `Malformed` error for a host outside the allow-list.
    #[must_use]
    pub fn host_not_allowed(url: &str, host: &str) -> Self {
        Self::malformed(
            url,
            format!("host '{host}' is not accepted"),
            "Use a github.com or gist.githubusercontent.com link",
        )
    }

    /// Creates a `Malformed` error for a path that matches no known file shape.
    #[must_use]
    pub fn unrecognized_path(url: &str) -> Self {
        Self::malformed(
            url,
            "path is not a release asset, tag archive, blob, or raw file".to_string(),
            "Copy the link of a release asset or a file view",
        )
    }

    /// Creates a `Malformed` error for input longer than [`MAX_URL_LENGTH`].
    #[must_use]
    pub fn too_long(url: &str) -> Self {
        Self::malformed(
            url,
            format!("URL too long ({} chars, max {MAX_URL_LENGTH})", url.len()),
            "Check for extraneous content pasted with the link",
        )
    }

    fn malformed(url: &str, reason: String, suggestion: &'static str) -> Self {
        Self::Malformed {
            url: url.chars().take(120).collect(),
            reason,
            suggestion,
        }
    }

    /// Coarse classification used by the download error taxonomy.
    #[must_use]
    pub fn reason(&self) -> InvalidReason {
        match self {
            Self::Empty => InvalidReason::Empty,
            Self::Malformed { .. } => InvalidReason::Malformed,
        }
    }
}
