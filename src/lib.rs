//! ghfetch core library
//!
//! Retrieves files hosted on GitHub as complete, verified in-memory artifacts,
//! reporting progress while the body streams and retrying attempts that time out.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`parser`] - URL validation against the accepted link grammar
//! - [`download`] - Fetching, stream consumption, artifact checks and the
//!   attempt/retry orchestrator
//! - [`counter`] - Persisted count of completed downloads
//! - [`db`] - SQLite connection and schema management
//! - [`config`] - Immutable core configuration

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod counter;
pub mod db;
pub mod download;
pub mod parser;
#[cfg(test)]
pub(crate) mod test_support;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use config::{ConfigError, DownloaderConfig};
pub use counter::{DownloadCounter, KeyValueStore, MemoryStore, SqliteStore};
pub use db::{Database, DbError};
pub use download::{
    Artifact, DownloadError, DownloadEvent, DownloadHandle, DownloadPhase, DownloadRequest,
    Downloader, HttpClient, ProgressSink, StreamProgress,
};
pub use parser::{InvalidReason, UrlError, UrlValidator};
