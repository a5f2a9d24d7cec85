use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::Instant;

/// Deadline used when `now + timeout` does not fit in an [`Instant`].
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

use crate::download::events::{
    AttemptId, AttemptScopedSink, DownloadPhase, ProgressSink, StreamProgress,
};

/// State of one request/response cycle, owned by the orchestrator.
///
/// Progress flows through the attempt so it can track bytes received, and from
/// there through an [`AttemptScopedSink`] that drops it once a newer attempt
/// has become active.
pub(super) struct DownloadAttempt<'a> {
    id: AttemptId,
    number: u32,
    deadline: Instant,
    received: AtomicU64,
    expected_total: AtomicU64,
    sink: AttemptScopedSink<'a>,
}

impl<'a> DownloadAttempt<'a> {
    /// Arms a fresh attempt; `active` must already hold `id`.
    pub(super) fn new(
        id: AttemptId,
        number: u32,
        timeout: Duration,
        sink: &'a dyn ProgressSink,
        active: &'a AtomicU64,
    ) -> Self {
        Self {
            id,
            number,
            deadline: deadline_after(timeout),
            received: AtomicU64::new(0),
            expected_total: AtomicU64::new(0),
            sink: AttemptScopedSink::new(sink, id, active),
        }
    }

    pub(super) fn id(&self) -> AttemptId {
        self.id
    }

    /// Zero-based attempt number within the request.
    pub(super) fn number(&self) -> u32 {
        self.number
    }

    pub(super) fn deadline(&self) -> Instant {
        self.deadline
    }

    pub(super) fn received(&self) -> u64 {
        self.received.load(Ordering::SeqCst)
    }

    /// Declared body size, `0` when unknown.
    pub(super) fn expected_total(&self) -> u64 {
        self.expected_total.load(Ordering::SeqCst)
    }

    pub(super) fn set_expected_total(&self, total: Option<u64>) {
        self.expected_total
            .store(total.unwrap_or(0), Ordering::SeqCst);
    }

    pub(super) fn enter(&self, phase: DownloadPhase) {
        self.sink.on_phase(self.id, phase);
    }
}

fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

impl ProgressSink for DownloadAttempt<'_> {
    fn on_progress(&self, progress: &StreamProgress) {
        self.received.store(progress.received, Ordering::SeqCst);
        self.sink.on_progress(progress);
    }

    fn on_phase(&self, attempt: AttemptId, phase: DownloadPhase) {
        self.sink.on_phase(attempt, phase);
    }
}
