//! Drains a response body into memory while reporting progress.

use futures_util::{Stream, StreamExt};
use thiserror::Error;
use tracing::{debug, trace};

use super::events::{AttemptId, ProgressSink, StreamProgress};
use super::fetch::FetchError;

/// Upper bound on the up-front buffer reservation.
const MAX_PREALLOCATION: u64 = 64 * 1024 * 1024;

/// Why draining a body stopped early.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Reading a chunk failed.
    #[error("stream read failed after {received} bytes: {source}")]
    Read {
        /// Bytes accepted before the failure.
        received: u64,
        /// The transport error.
        #[source]
        source: FetchError,
    },

    /// The body grew past the hard byte limit.
    #[error("stream exceeded {limit} bytes (received {received})")]
    LimitExceeded {
        /// The configured limit.
        limit: u64,
        /// Bytes received including the offending chunk.
        received: u64,
    },
}

/// Consumes `body` chunk by chunk and returns the concatenated bytes.
///
/// After every chunk, one [`StreamProgress`] is handed to `sink`. A known
/// `expected_total` yields determinate fractions; `None` or `Some(0)` yields
/// indeterminate progress. Consumption stops with [`StreamError::LimitExceeded`]
/// as soon as more than `limit` bytes have arrived.
///
/// # Errors
///
/// Returns [`StreamError::Read`] when a chunk fails, and
/// [`StreamError::LimitExceeded`] when the body is over `limit`.
pub async fn consume_stream<S>(
    body: S,
    expected_total: Option<u64>,
    limit: u64,
    attempt: AttemptId,
    sink: &dyn ProgressSink,
) -> Result<Vec<u8>, StreamError>
where
    S: Stream<Item = Result<bytes::Bytes, FetchError>> + Unpin,
{
    let expected_total = expected_total.filter(|t| *t > 0);
    let reserve = expected_total.map_or(0, |t| t.min(limit).min(MAX_PREALLOCATION));
    let mut buffer = Vec::with_capacity(usize::try_from(reserve).unwrap_or(0));
    let mut received: u64 = 0;
    let mut body = body;

    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|source| StreamError::Read { received, source })?;
        received = received.saturating_add(chunk.len() as u64);
        if received > limit {
            debug!(attempt = %attempt, limit, received, "body exceeded size limit");
            return Err(StreamError::LimitExceeded { limit, received });
        }
        buffer.extend_from_slice(&chunk);

        let progress = StreamProgress::new(attempt, received, expected_total);
        trace!(attempt = %attempt, received, label = %progress.label(), "chunk received");
        sink.on_progress(&progress);
    }

    Ok(buffer)
}
