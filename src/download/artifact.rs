//! Post-download checks on a completed body.

use thiserror::Error;
use tracing::debug;
use url::Url;

use super::filename::filename_from_url;
use crate::config::DownloaderConfig;

/// A verified download, owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// The complete body.
    pub bytes: Vec<u8>,
    /// Declared content type, verbatim from the response.
    pub content_type: String,
    /// Percent-decoded final path segment of the URL.
    pub filename: String,
}

impl Artifact {
    /// Body length in bytes.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Whether the body is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Why a completed body was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Content type missing or not allowed.
    #[error("content type {content_type:?} is not allowed")]
    InvalidType {
        /// The declared type, if any.
        content_type: Option<String>,
    },

    /// Body larger than the configured maximum.
    #[error("artifact is {size} bytes, limit is {limit}")]
    TooLarge {
        /// Body length.
        size: u64,
        /// Configured limit.
        limit: u64,
    },
}

/// Content-type and size policy applied to every completed body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPolicy {
    allowed_types: Vec<String>,
    max_size: u64,
}

impl ArtifactPolicy {
    /// Creates a policy; `allowed_types` are compared by lower-cased essence.
    #[must_use]
    pub fn new<I, S>(allowed_types: I, max_size: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed_types: allowed_types
                .into_iter()
                .map(|t| mime_essence(t.as_ref()))
                .collect(),
            max_size,
        }
    }

    /// Builds the policy from a [`DownloaderConfig`].
    #[must_use]
    pub fn from_config(config: &DownloaderConfig) -> Self {
        Self::new(config.allowed_content_types(), config.max_file_size())
    }

    /// Replaces the size limit.
    #[must_use]
    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    /// The size limit in bytes.
    #[must_use]
    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Whether `content_type` (parameters ignored) is on the allow-list.
    #[must_use]
    pub fn allows_type(&self, content_type: &str) -> bool {
        let essence = mime_essence(content_type);
        self.allowed_types.iter().any(|t| *t == essence)
    }

    /// Checks type, then size, and wraps the buffer into an [`Artifact`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidType`] when the type is missing or not
    /// allowed, and [`ValidationError::TooLarge`] when the buffer exceeds the
    /// limit.
    pub fn validate(
        &self,
        bytes: Vec<u8>,
        content_type: Option<&str>,
        url: &Url,
    ) -> Result<Artifact, ValidationError> {
        let content_type = match content_type {
            Some(ct) if self.allows_type(ct) => ct.to_string(),
            other => {
                debug!(content_type = ?other, "rejecting content type");
                return Err(ValidationError::InvalidType {
                    content_type: other.map(str::to_string),
                });
            }
        };

        let size = bytes.len() as u64;
        if size > self.max_size {
            return Err(ValidationError::TooLarge {
                size,
                limit: self.max_size,
            });
        }

        Ok(Artifact {
            bytes,
            content_type,
            filename: filename_from_url(url),
        })
    }
}

impl Default for ArtifactPolicy {
    fn default() -> Self {
        Self::from_config(&DownloaderConfig::default())
    }
}

/// `Text/Plain; charset=utf-8` becomes `text/plain`.
fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
