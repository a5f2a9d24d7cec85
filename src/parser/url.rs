//! Accepted-URL grammar and validation.
//!
//! A URL is accepted when it is `https`, its host is on the allow-list, and its
//! path has the shape `/<owner>/<repo><marker>/<version>[/<file>]` optionally
//! followed by a query string. Validation is pure pattern matching; nothing here
//! touches the network.

use regex::Regex;
use tracing::{debug, trace};
use url::Url;

use super::error::{MAX_URL_LENGTH, UrlError};
use crate::config::ConfigError;

/// Hosts accepted by default.
pub const DEFAULT_ALLOWED_HOSTS: &[&str] = &["github.com", "gist.githubusercontent.com"];

/// Path-shape markers accepted by default.
pub const DEFAULT_PATH_MARKERS: &[&str] = &[
    "/releases/download",
    "/archive/refs/tags",
    "/archive/refs/heads",
    "/blob",
    "/raw",
];

/// Owner and repository name segment.
const NAME_SEGMENT: &str = "[A-Za-z0-9_-]+";

/// Version/tag and file segment.
const FILE_SEGMENT: &str = "[A-Za-z0-9_.-]+";

/// Hosts and path markers that make up the accepted URL grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlPolicy {
    hosts: Vec<String>,
    path_markers: Vec<String>,
}

impl Default for UrlPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_HOSTS, DEFAULT_PATH_MARKERS)
    }
}

impl UrlPolicy {
    /// Creates a policy from host names and path markers.
    ///
    /// Hosts are compared case-insensitively; markers must start with `/`.
    #[must_use]
    pub fn new<H, M>(hosts: &[H], path_markers: &[M]) -> Self
    where
        H: AsRef<str>,
        M: AsRef<str>,
    {
        Self {
            hosts: hosts
                .iter()
                .map(|h| h.as_ref().trim().to_ascii_lowercase())
                .collect(),
            path_markers: path_markers
                .iter()
                .map(|m| m.as_ref().trim_end_matches('/').to_string())
                .collect(),
        }
    }

    /// Accepted host names.
    #[must_use]
    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    /// Accepted path markers.
    #[must_use]
    pub fn path_markers(&self) -> &[String] {
        &self.path_markers
    }

    fn allows_host(&self, host: &str) -> bool {
        self.hosts.iter().any(|h| h.eq_ignore_ascii_case(host))
    }

    fn path_pattern(&self) -> Result<Regex, ConfigError> {
        if self.path_markers.is_empty() || self.path_markers.iter().any(|m| !m.starts_with('/')) {
            return Err(ConfigError::UrlPolicy(
                "path markers must be non-empty and start with '/'".to_string(),
            ));
        }
        let markers = self
            .path_markers
            .iter()
            .map(|m| regex::escape(m))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = format!(
            r"^/{NAME_SEGMENT}/{NAME_SEGMENT}(?:{markers})/{FILE_SEGMENT}(?:/{FILE_SEGMENT})?$"
        );
        Regex::new(&pattern).map_err(|e| ConfigError::UrlPolicy(e.to_string()))
    }
}

/// Compiled URL grammar.
///
/// # Examples
///
/// ```
/// use ghfetch_core::parser::UrlValidator;
///
/// let validator = UrlValidator::default();
/// assert!(validator
///     .validate("https://github.com/acme/tool/releases/download/v1.0/tool.zip")
///     .is_ok());
/// assert!(validator.validate("https://example.com/tool.zip").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct UrlValidator {
    policy: UrlPolicy,
    path_pattern: Regex,
}

impl Default for UrlValidator {
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        // Static policy, safe to panic
        Self::new(UrlPolicy::default()).expect("default URL policy compiles")
    }
}

impl UrlValidator {
    /// Compiles the grammar for `policy`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UrlPolicy`] when the policy has no usable markers.
    pub fn new(policy: UrlPolicy) -> Result<Self, ConfigError> {
        if policy.hosts.is_empty() {
            return Err(ConfigError::UrlPolicy(
                "at least one host is required".to_string(),
            ));
        }
        let path_pattern = policy.path_pattern()?;
        Ok(Self {
            policy,
            path_pattern,
        })
    }

    /// The policy this validator was compiled from.
    #[must_use]
    pub fn policy(&self) -> &UrlPolicy {
        &self.policy
    }

    /// Classifies `input` as an accepted URL or an [`UrlError`].
    ///
    /// Leading and trailing whitespace is ignored.
    ///
    /// # Errors
    ///
    /// - [`UrlError::Empty`] when nothing is left after trimming
    /// - [`UrlError::Malformed`] for anything outside the grammar
    #[tracing::instrument(level = "debug", skip(self, input), fields(input_len = input.len()))]
    pub fn validate(&self, input: &str) -> Result<Url, UrlError> {
        let candidate = input.trim();
        if candidate.is_empty() {
            debug!("empty URL input");
            return Err(UrlError::Empty);
        }
        if candidate.len() > MAX_URL_LENGTH {
            return Err(UrlError::too_long(candidate));
        }

        let mut parsed =
            Url::parse(candidate).map_err(|e| UrlError::unparseable(candidate, &e.to_string()))?;

        if parsed.scheme() != "https" {
            return Err(UrlError::insecure_scheme(candidate, parsed.scheme()));
        }

        // The authority must be spelled as a bare allowed host: no userinfo and
        // no port, not even the default one the url crate would drop.
        let (raw_authority, raw_rest) = split_authority(candidate);
        let host = parsed.host_str().unwrap_or_default();
        if !self.policy.allows_host(raw_authority)
            || !self.policy.allows_host(host)
            || parsed.port().is_some()
            || !parsed.username().is_empty()
            || parsed.password().is_some()
        {
            return Err(UrlError::host_not_allowed(candidate, raw_authority));
        }

        // The url crate normalizes the path, so both the caller's spelling and
        // the path that will actually be requested must match.
        let raw_path = raw_path_of(raw_rest);
        let has_dot_segment = raw_path.split('/').any(|s| s == "." || s == "..");
        if has_dot_segment
            || !self.path_pattern.is_match(raw_path)
            || !self.path_pattern.is_match(parsed.path())
        {
            return Err(UrlError::unrecognized_path(candidate));
        }

        // A fragment is only tolerated as part of a query string.
        if parsed.fragment().is_some() {
            if parsed.query().is_none() {
                return Err(UrlError::unrecognized_path(candidate));
            }
            parsed.set_fragment(None);
        }

        trace!(url = %parsed, "URL accepted");
        Ok(parsed)
    }

    /// Convenience predicate over [`validate`](Self::validate).
    #[must_use]
    pub fn is_valid(&self, input: &str) -> bool {
        self.validate(input).is_ok()
    }
}

/// Splits an absolute URL into its authority as written and everything after it.
fn split_authority(url: &str) -> (&str, &str) {
    let after_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let end = after_scheme
        .find(['/', '\\', '?', '#'])
        .unwrap_or(after_scheme.len());
    after_scheme.split_at(end)
}

/// Returns the path portion of the text following the authority.
fn raw_path_of(rest: &str) -> &str {
    let path_end = rest.find(['?', '#']).unwrap_or(rest.len());
    &rest[..path_end]
}
