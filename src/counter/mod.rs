//! Persisted count of completed downloads.
//!
//! The count lives in a [`KeyValueStore`] under [`COUNTER_KEY`]. Reads are
//! forgiving: a missing, unparsable, or unreadable value counts as zero. Writes
//! are serialized so concurrent completions never lose an increment.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use ghfetch_core::counter::{DownloadCounter, MemoryStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let counter = DownloadCounter::load(Arc::new(MemoryStore::new())).await;
//! assert_eq!(counter.increment().await?, 1);
//! assert_eq!(counter.current_count().await, 1);
//! # Ok(())
//! # }
//! ```

mod store;

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

pub use store::{KeyValueStore, MemoryStore, SqliteStore, StoreError};

/// Storage key of the counter.
pub const COUNTER_KEY: &str = "download_count";

/// Counter failures.
#[derive(Debug, Error)]
pub enum CounterError {
    /// The new value could not be written. The in-memory count still advanced.
    #[error("failed to persist download count {count}: {source}")]
    Persist {
        /// The count after the increment.
        count: u64,
        /// The storage error.
        #[source]
        source: StoreError,
    },
}

impl CounterError {
    /// The count after the increment that failed to persist.
    #[must_use]
    pub fn count(&self) -> u64 {
        match self {
            Self::Persist { count, .. } => *count,
        }
    }
}

/// Monotonic, persisted download counter.
pub struct DownloadCounter {
    store: Arc<dyn KeyValueStore>,
    count: Mutex<u64>,
}

impl std::fmt::Debug for DownloadCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadCounter").finish_non_exhaustive()
    }
}

impl DownloadCounter {
    /// Reads the stored count, treating anything unusable as zero.
    #[instrument(skip(store))]
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let count = read_count(store.as_ref()).await;
        debug!(count, "download counter loaded");
        Self {
            store,
            count: Mutex::new(count),
        }
    }

    /// Current count.
    pub async fn current_count(&self) -> u64 {
        *self.count.lock().await
    }

    /// Adds one and persists the result before returning it.
    ///
    /// # Errors
    ///
    /// Returns [`CounterError::Persist`] if the store write fails. The in-memory
    /// count keeps the increment so later increments stay monotonic.
    #[instrument(skip(self))]
    pub async fn increment(&self) -> Result<u64, CounterError> {
        let mut count = self.count.lock().await;
        *count = count.saturating_add(1);
        let next = *count;

        self.store
            .set(COUNTER_KEY, &next.to_string())
            .await
            .map_err(|source| CounterError::Persist {
                count: next,
                source,
            })?;

        debug!(count = next, "download counter incremented");
        Ok(next)
    }
}

async fn read_count(store: &dyn KeyValueStore) -> u64 {
    match store.get(COUNTER_KEY).await {
        Ok(None) => 0,
        Ok(Some(raw)) => raw.trim().parse::<u64>().unwrap_or_else(|_| {
            warn!(value = %raw, "stored download count is not a number; starting from 0");
            0
        }),
        Err(error) => {
            warn!(%error, "failed to read download count; starting from 0");
            0
        }
    }
}
