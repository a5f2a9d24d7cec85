//! Progress and phase events emitted while a download runs.
//!
//! Callers observe a download through a [`ProgressSink`]. Every event carries the
//! [`AttemptId`] that produced it, and the orchestrator forwards events through an
//! attempt-scoped guard so a superseded attempt can never report into a newer one.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::trace;

use super::error::ErrorKind;

/// Indeterminate-progress label shown when the total size is unknown.
pub const PREPARING_LABEL: &str = "Preparing download...";

/// Monotonically increasing identifier of one request/response cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct AttemptId(u64);

impl AttemptId {
    /// Creates an id from its raw value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// States of the download state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "kind", rename_all = "snake_case")]
pub enum DownloadPhase {
    /// Nothing issued yet.
    Idle,
    /// GET issued, waiting for response headers.
    Requesting,
    /// Headers accepted, draining the body.
    Streaming,
    /// Body complete, checking type and size.
    Validating,
    /// The attempt timed out and a fresh one is about to start.
    Retrying,
    /// Artifact delivered.
    Succeeded,
    /// Terminal failure.
    Failed(ErrorKind),
}

impl DownloadPhase {
    /// Whether no further transitions follow.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed(_))
    }
}

/// How far along the body is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum ProgressFraction {
    /// Fraction of the declared total in `[0, 1]`.
    Determinate(f64),
    /// Total size unknown.
    Indeterminate,
}

/// One progress observation. Never stored by the core.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamProgress {
    /// Attempt that produced this observation.
    pub attempt: AttemptId,
    /// Bytes received so far in this attempt.
    pub received: u64,
    /// Declared total, if known.
    pub total: Option<u64>,
    /// Derived fraction.
    pub fraction: ProgressFraction,
}

impl StreamProgress {
    /// Builds an observation, deriving the fraction from `received` and `total`.
    ///
    /// A zero total counts as unknown. The fraction is clamped to `1.0` when a
    /// server sends more than it declared.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn new(attempt: AttemptId, received: u64, total: Option<u64>) -> Self {
        let total = total.filter(|t| *t > 0);
        let fraction = match total {
            Some(total) => ProgressFraction::Determinate((received as f64 / total as f64).min(1.0)),
            None => ProgressFraction::Indeterminate,
        };
        Self {
            attempt,
            received,
            total,
            fraction,
        }
    }

    /// Rounded percentage, when the total is known.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn percentage(&self) -> Option<u8> {
        match self.fraction {
            ProgressFraction::Determinate(f) => Some((f * 100.0).round().clamp(0.0, 100.0) as u8),
            ProgressFraction::Indeterminate => None,
        }
    }

    /// Human-readable label: `"42%"` or [`PREPARING_LABEL`].
    #[must_use]
    pub fn label(&self) -> String {
        self.percentage()
            .map_or_else(|| PREPARING_LABEL.to_string(), |p| format!("{p}%"))
    }
}

/// Everything a subscribed UI receives before the terminal result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DownloadEvent {
    /// The state machine moved.
    Phase {
        /// Attempt the transition belongs to.
        attempt: AttemptId,
        /// New phase.
        phase: DownloadPhase,
    },
    /// Body progress.
    Progress(StreamProgress),
}

impl DownloadEvent {
    /// Attempt the event belongs to.
    #[must_use]
    pub fn attempt(&self) -> AttemptId {
        match self {
            Self::Phase { attempt, .. } => *attempt,
            Self::Progress(p) => p.attempt,
        }
    }
}

/// Receives progress and phase notifications.
///
/// Implementations must not block; they are called from inside the download
/// future between chunk reads.
pub trait ProgressSink: Send + Sync {
    /// Called after every body chunk.
    fn on_progress(&self, progress: &StreamProgress);

    /// Called on every state transition.
    fn on_phase(&self, _attempt: AttemptId, _phase: DownloadPhase) {}
}

/// A sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn on_progress(&self, _progress: &StreamProgress) {}
}

impl ProgressSink for mpsc::UnboundedSender<DownloadEvent> {
    fn on_progress(&self, progress: &StreamProgress) {
        // A dropped receiver only means nobody is watching.
        let _ = self.send(DownloadEvent::Progress(progress.clone()));
    }

    fn on_phase(&self, attempt: AttemptId, phase: DownloadPhase) {
        let _ = self.send(DownloadEvent::Phase { attempt, phase });
    }
}

/// Forwards events only while its attempt is the active one.
pub(crate) struct AttemptScopedSink<'a> {
    inner: &'a dyn ProgressSink,
    attempt: AttemptId,
    active: &'a AtomicU64,
}

impl<'a> AttemptScopedSink<'a> {
    pub(crate) fn new(inner: &'a dyn ProgressSink, attempt: AttemptId, active: &'a AtomicU64) -> Self {
        Self {
            inner,
            attempt,
            active,
        }
    }

    fn is_current(&self) -> bool {
        self.active.load(Ordering::SeqCst) == self.attempt.get()
    }
}

impl ProgressSink for AttemptScopedSink<'_> {
    fn on_progress(&self, progress: &StreamProgress) {
        if progress.attempt == self.attempt && self.is_current() {
            self.inner.on_progress(progress);
        } else {
            trace!(attempt = %progress.attempt, "discarding progress from stale attempt");
        }
    }

    fn on_phase(&self, attempt: AttemptId, phase: DownloadPhase) {
        if attempt == self.attempt && self.is_current() {
            self.inner.on_phase(attempt, phase);
        } else {
            trace!(attempt = %attempt, ?phase, "discarding phase from stale attempt");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        progress: Mutex<Vec<StreamProgress>>,
        phases: Mutex<Vec<(AttemptId, DownloadPhase)>>,
    }

    impl ProgressSink for Recorder {
        fn on_progress(&self, progress: &StreamProgress) {
            self.progress.lock().unwrap().push(progress.clone());
        }

        fn on_phase(&self, attempt: AttemptId, phase: DownloadPhase) {
            self.phases.lock().unwrap().push((attempt, phase));
        }
    }

    #[test]
    fn test_progress_fraction_known_total() {
        let p = StreamProgress::new(AttemptId::new(1), 250, Some(1000));
        assert_eq!(p.fraction, ProgressFraction::Determinate(0.25));
        assert_eq!(p.percentage(), Some(25));
        assert_eq!(p.label(), "25%");
    }

    #[test]
    fn test_progress_zero_total_is_indeterminate() {
        let p = StreamProgress::new(AttemptId::new(1), 10, Some(0));
        assert_eq!(p.fraction, ProgressFraction::Indeterminate);
        assert_eq!(p.total, None);
        assert_eq!(p.label(), PREPARING_LABEL);
    }

    #[test]
    fn test_progress_clamps_overshoot() {
        let p = StreamProgress::new(AttemptId::new(1), 1500, Some(1000));
        assert_eq!(p.fraction, ProgressFraction::Determinate(1.0));
        assert_eq!(p.percentage(), Some(100));
    }

    #[test]
    fn test_phase_terminality() {
        assert!(DownloadPhase::Succeeded.is_terminal());
        assert!(DownloadPhase::Failed(ErrorKind::Timeout).is_terminal());
        assert!(!DownloadPhase::Retrying.is_terminal());
    }

    #[test]
    fn test_scoped_sink_forwards_current_attempt() {
        let recorder = Recorder::default();
        let active = AtomicU64::new(1);
        let sink = AttemptScopedSink::new(&recorder, AttemptId::new(1), &active);

        sink.on_phase(AttemptId::new(1), DownloadPhase::Requesting);
        sink.on_progress(&StreamProgress::new(AttemptId::new(1), 1, Some(2)));

        assert_eq!(recorder.phases.lock().unwrap().len(), 1);
        assert_eq!(recorder.progress.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_scoped_sink_discards_after_supersede() {
        let recorder = Recorder::default();
        let active = AtomicU64::new(1);
        let stale = AttemptScopedSink::new(&recorder, AttemptId::new(1), &active);

        active.store(2, Ordering::SeqCst);
        stale.on_progress(&StreamProgress::new(AttemptId::new(1), 1, Some(2)));
        stale.on_phase(AttemptId::new(1), DownloadPhase::Streaming);

        assert!(recorder.progress.lock().unwrap().is_empty());
        assert!(recorder.phases.lock().unwrap().is_empty());
    }

    #[test]
    fn test_scoped_sink_discards_foreign_attempt_id() {
        let recorder = Recorder::default();
        let active = AtomicU64::new(2);
        let sink = AttemptScopedSink::new(&recorder, AttemptId::new(2), &active);

        sink.on_progress(&StreamProgress::new(AttemptId::new(1), 1, None));
        assert!(recorder.progress.lock().unwrap().is_empty());
    }

    #[test]
    fn test_channel_sink_delivers_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.on_phase(AttemptId::new(3), DownloadPhase::Requesting);
        tx.on_progress(&StreamProgress::new(AttemptId::new(3), 5, None));

        let first = rx.try_recv().unwrap();
        assert_eq!(first.attempt(), AttemptId::new(3));
        assert!(matches!(first, DownloadEvent::Phase { .. }));
        assert!(matches!(rx.try_recv().unwrap(), DownloadEvent::Progress(_)));
    }

    #[test]
    fn test_channel_sink_ignores_closed_receiver() {
        let (tx, rx) = mpsc::unbounded_channel::<DownloadEvent>();
        drop(rx);
        tx.on_progress(&StreamProgress::new(AttemptId::new(1), 1, None));
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = DownloadEvent::Phase {
            attempt: AttemptId::new(1),
            phase: DownloadPhase::Failed(ErrorKind::TooLarge),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "phase");
        assert_eq!(json["attempt"], 1);
        assert_eq!(json["phase"]["phase"], "failed");
        assert_eq!(json["phase"]["kind"], "too_large");
    }
}
