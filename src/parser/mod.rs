//! Input validation for user-submitted URLs.
//!
//! The download core only accepts links to files hosted on an allow-listed set
//! of hosts (GitHub release assets, tag/branch archives, blob and raw views).
//! Everything else is rejected here, before any network action.
//!
//! # Example
//!
//! ```
//! use ghfetch_core::parser::{InvalidReason, UrlValidator};
//!
//! let validator = UrlValidator::default();
//! let err = validator.validate("   ").unwrap_err();
//! assert_eq!(err.reason(), InvalidReason::Empty);
//! ```

mod error;
mod url;

pub use error::{InvalidReason, MAX_URL_LENGTH, UrlError};
pub use url::{DEFAULT_ALLOWED_HOSTS, DEFAULT_PATH_MARKERS, UrlPolicy, UrlValidator};
