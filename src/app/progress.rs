//! Progress bar for harvest runs.

use harvester_core::{FetchOutcome, HarvestEvent, HarvestObserver};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

/// Drives an indicatif bar from engine events.
pub(crate) struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Creates a reporter; a hidden bar when `visible` is false.
    pub(crate) fn new(visible: bool) -> Self {
        let bar = if visible {
            let bar = ProgressBar::new(0);
            bar.set_style(
                ProgressStyle::with_template(
                    "{spinner} [{bar:30}] {pos}/{len} {msg} ({elapsed_precise})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
            );
            bar
        } else {
            ProgressBar::hidden()
        };
        Self { bar }
    }

    #[cfg(test)]
    fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl HarvestObserver for ProgressReporter {
    fn on_event(&self, event: &HarvestEvent) {
        match event {
            HarvestEvent::Started { total } => {
                self.bar.set_length(u64::try_from(*total).unwrap_or(u64::MAX));
                self.bar.set_position(0);
            }
            HarvestEvent::ItemFinished {
                result,
                succeeded,
                failed,
            } => {
                if let FetchOutcome::Failure(failure) = &result.outcome {
                    self.bar
                        .println(format!("failed #{}: {}", result.id, failure.message));
                }
                self.bar.set_message(format!("ok {succeeded}, failed {failed}"));
                self.bar.inc(1);
            }
            HarvestEvent::CheckpointWritten {
                succeeded, is_final, ..
            } => {
                debug!(succeeded, is_final, "progress: checkpoint");
            }
            HarvestEvent::Finished(_) => {
                self.bar.finish_and_clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvester_core::{FetchError, FetchResult, WorkItem};

    #[test]
    fn test_hidden_reporter_tracks_position() {
        let reporter = ProgressReporter::new(false);
        reporter.on_event(&HarvestEvent::Started { total: 3 });
        let item = WorkItem::direct(0, 1, "ftp://nope");
        let failure = FetchResult::from_error(&item, &FetchError::invalid_url("ftp://nope"));
        reporter.on_event(&HarvestEvent::ItemFinished {
            result: failure,
            succeeded: 0,
            failed: 1,
        });
        assert_eq!(reporter.position(), 1);
    }
}
