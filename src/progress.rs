//! Progress bar driven by download events.

use std::time::Duration;

use ghfetch_core::download::PREPARING_LABEL;
use ghfetch_core::{DownloadEvent, DownloadPhase, StreamProgress};
use indicatif::{ProgressBar, ProgressStyle};

const BAR_TEMPLATE: &str = "{bar:40.cyan/blue} {msg} ({bytes}/{total_bytes})";
const SPINNER_TEMPLATE: &str = "{spinner} {msg} {bytes}";

/// Renders one download: a spinner until the size is known, then a bar.
pub(crate) struct DownloadProgress {
    bar: ProgressBar,
    determinate: bool,
}

impl DownloadProgress {
    /// Creates the display. A hidden display still tracks state.
    pub(crate) fn new(visible: bool) -> Self {
        let bar = if visible {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(spinner_style());
        bar.set_message(PREPARING_LABEL);
        if visible {
            bar.enable_steady_tick(Duration::from_millis(100));
        }
        Self {
            bar,
            determinate: false,
        }
    }

    pub(crate) fn apply(&mut self, event: &DownloadEvent) {
        match event {
            DownloadEvent::Phase { phase, .. } => self.on_phase(*phase),
            DownloadEvent::Progress(progress) => self.on_progress(progress),
        }
    }

    pub(crate) fn finish(&self) {
        self.bar.finish_and_clear();
    }

    fn on_phase(&mut self, phase: DownloadPhase) {
        match phase {
            // Each attempt restarts from zero bytes.
            DownloadPhase::Requesting => {
                self.determinate = false;
                self.bar.set_style(spinner_style());
                self.bar.set_position(0);
                self.bar.set_message(PREPARING_LABEL);
            }
            DownloadPhase::Retrying => self.bar.set_message("Timed out, retrying..."),
            DownloadPhase::Validating => self.bar.set_message("Verifying..."),
            DownloadPhase::Idle
            | DownloadPhase::Streaming
            | DownloadPhase::Succeeded
            | DownloadPhase::Failed(_) => {}
        }
    }

    fn on_progress(&mut self, progress: &StreamProgress) {
        if let Some(total) = progress.total
            && !self.determinate
        {
            self.determinate = true;
            self.bar.set_style(bar_style());
            self.bar.set_length(total);
        }
        self.bar.set_position(progress.received);
        self.bar.set_message(progress.label());
    }

    #[cfg(test)]
    fn bar(&self) -> &ProgressBar {
        &self.bar
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template(SPINNER_TEMPLATE).unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(BAR_TEMPLATE).unwrap_or_else(|_| ProgressStyle::default_bar())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghfetch_core::download::AttemptId;

    fn progress(attempt: u64, received: u64, total: Option<u64>) -> DownloadEvent {
        DownloadEvent::Progress(StreamProgress::new(
            AttemptId::new(attempt),
            received,
            total,
        ))
    }

    fn phase(attempt: u64, phase: DownloadPhase) -> DownloadEvent {
        DownloadEvent::Phase {
            attempt: AttemptId::new(attempt),
            phase,
        }
    }

    #[test]
    fn test_starts_with_preparing_label() {
        let display = DownloadProgress::new(false);
        assert_eq!(display.bar().message(), PREPARING_LABEL);
        assert!(!display.determinate);
    }

    #[test]
    fn test_known_total_switches_to_percentage() {
        let mut display = DownloadProgress::new(false);
        display.apply(&phase(1, DownloadPhase::Requesting));
        display.apply(&phase(1, DownloadPhase::Streaming));
        display.apply(&progress(1, 250, Some(1000)));

        assert!(display.determinate);
        assert_eq!(display.bar().length(), Some(1000));
        assert_eq!(display.bar().position(), 250);
        assert_eq!(display.bar().message(), "25%");
    }

    #[test]
    fn test_unknown_total_keeps_preparing_label() {
        let mut display = DownloadProgress::new(false);
        display.apply(&progress(1, 4096, None));

        assert!(!display.determinate);
        assert_eq!(display.bar().position(), 4096);
        assert_eq!(display.bar().message(), PREPARING_LABEL);
    }

    #[test]
    fn test_new_attempt_resets_position() {
        let mut display = DownloadProgress::new(false);
        display.apply(&progress(1, 600, Some(1000)));
        display.apply(&phase(1, DownloadPhase::Retrying));
        assert_eq!(display.bar().message(), "Timed out, retrying...");

        display.apply(&phase(2, DownloadPhase::Requesting));
        assert!(!display.determinate);
        assert_eq!(display.bar().position(), 0);
        assert_eq!(display.bar().message(), PREPARING_LABEL);
    }

    #[test]
    fn test_validating_phase_message() {
        let mut display = DownloadProgress::new(false);
        display.apply(&progress(1, 10, Some(10)));
        display.apply(&phase(1, DownloadPhase::Validating));
        assert_eq!(display.bar().message(), "Verifying...");
    }
}
