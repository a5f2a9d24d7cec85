use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::download::{Artifact, DownloadError, DownloadEvent};

/// A download running on the Tokio runtime.
///
/// Events arrive on an unbounded channel that closes when the download ends;
/// the terminal outcome is delivered exactly once through [`result`](Self::result).
#[derive(Debug)]
pub struct DownloadHandle {
    url: String,
    events: mpsc::UnboundedReceiver<DownloadEvent>,
    result: oneshot::Receiver<Result<Artifact, DownloadError>>,
    task: JoinHandle<()>,
}

impl DownloadHandle {
    pub(super) fn new(
        url: String,
        events: mpsc::UnboundedReceiver<DownloadEvent>,
        result: oneshot::Receiver<Result<Artifact, DownloadError>>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            url,
            events,
            result,
            task,
        }
    }

    /// The submitted input, trimmed.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Waits for the next event; `None` once the download has ended and every
    /// buffered event was consumed.
    pub async fn next_event(&mut self) -> Option<DownloadEvent> {
        self.events.recv().await
    }

    /// Returns a buffered event without waiting.
    pub fn try_next_event(&mut self) -> Option<DownloadEvent> {
        self.events.try_recv().ok()
    }

    /// Cancels the download. [`result`](Self::result) then reports
    /// [`DownloadError::Unknown`].
    pub fn abort(&self) {
        self.task.abort();
    }

    /// Waits for the terminal outcome. Unread events are discarded.
    ///
    /// # Errors
    ///
    /// Returns the download's [`DownloadError`], or [`DownloadError::Unknown`]
    /// if the task ended without reporting (aborted or panicked).
    pub async fn result(self) -> Result<Artifact, DownloadError> {
        match self.result.await {
            Ok(outcome) => outcome,
            Err(_) => Err(DownloadError::unknown(
                self.url,
                "download task ended without a result",
            )),
        }
    }
}
