//! Harvest engine: bounded-concurrency fetching with periodic checkpoints.
//!
//! This module provides the `HarvestEngine` which fans work items out to
//! fetch tasks using a semaphore-based concurrency limit and fans their
//! results back in through a channel to a single aggregator.
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use std::sync::Arc;
//! use harvester_core::engine::HarvestEngine;
//! use harvester_core::fetch::{FetchSettings, HttpClient, HttpFetcher};
//! use harvester_core::manifest::CheckpointWriter;
//! use harvester_core::source::{SourceKind, api_items};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let endpoint = "https://nekos.best/api/v2/neko";
//! let fetcher = Arc::new(HttpFetcher::new(
//!     HttpClient::new()?,
//!     FetchSettings {
//!         output_dir: PathBuf::from("static"),
//!         filename_prefix: "neko".to_string(),
//!         index_width: 3,
//!         public_url_prefix: "https://example.com/static/".to_string(),
//!     },
//! ));
//! let writer = CheckpointWriter::new("static", "https://example.com/", SourceKind::Api)
//!     .with_source("nekos.best", endpoint);
//! let engine = HarvestEngine::new(10, 10)?;
//! let report = engine.run(api_items(endpoint, 50), fetcher, &writer).await?;
//! println!("Saved: {}, Failed: {}", report.succeeded, report.failed);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, info, instrument, warn};

use crate::fetch::{FailureKind, Fetch, FetchOutcome, FetchResult};
use crate::manifest::{CheckpointError, CheckpointPaths, CheckpointWriter, ResultSet};
use crate::source::WorkItem;

/// Minimum allowed concurrency value.
const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
const MAX_CONCURRENCY: usize = 100;

/// Default concurrency if not specified.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Default number of completions between checkpoints.
pub const DEFAULT_CHECKPOINT_INTERVAL: usize = 10;

/// Prefix of the failure message recorded for a panicked fetch task.
pub const PANIC_MESSAGE_PREFIX: &str = "internal error:";

/// Error type for harvest engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Checkpoint interval of zero.
    #[error("invalid checkpoint interval {value}: must be at least 1")]
    InvalidCheckpointInterval {
        /// The invalid value that was provided.
        value: usize,
    },

    /// The final checkpoint could not be written.
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// Semaphore was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,
}

/// Progress notifications emitted during a run.
#[derive(Debug, Clone)]
pub enum HarvestEvent {
    /// The run is starting.
    Started {
        /// Number of items submitted.
        total: usize,
    },
    /// One item finished.
    ItemFinished {
        /// The item's result.
        result: FetchResult,
        /// Successes so far.
        succeeded: usize,
        /// Failures so far.
        failed: usize,
    },
    /// A checkpoint was written.
    CheckpointWritten {
        /// Written artifacts.
        paths: CheckpointPaths,
        /// Successes at the time of writing.
        succeeded: usize,
        /// Failures at the time of writing.
        failed: usize,
        /// Whether this is the end-of-run checkpoint.
        is_final: bool,
    },
    /// All items are done and the final checkpoint is written.
    Finished(HarvestReport),
}

/// Receives [`HarvestEvent`]s. Observers must not block for long; they run on
/// the aggregator between results.
pub trait HarvestObserver: Send + Sync {
    /// Handles one event.
    fn on_event(&self, event: &HarvestEvent);
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestReport {
    /// Items saved.
    pub succeeded: usize,
    /// Items that failed.
    pub failed: usize,
    /// Checkpoints written, including the final one.
    pub checkpoints: usize,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
    /// Artifacts of the final checkpoint.
    pub paths: CheckpointPaths,
}

impl HarvestReport {
    /// Returns the number of items processed (succeeded + failed).
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Bounded-concurrency harvest engine.
///
/// # Concurrency Model
///
/// - A producer acquires a semaphore permit per item, in submission order,
///   before spawning that item's fetch task
/// - Permits are released when the task completes (RAII), after the optional
///   request delay
/// - Each task sends exactly one [`FetchResult`] over a channel; a panicking
///   fetch is reported as a failure for its item
/// - One aggregator owns the [`ResultSet`] and writes checkpoints between
///   results, so no lock guards the set
pub struct HarvestEngine {
    concurrency: usize,
    checkpoint_interval: usize,
    request_delay: Duration,
    observer: Option<Arc<dyn HarvestObserver>>,
}

impl std::fmt::Debug for HarvestEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HarvestEngine")
            .field("concurrency", &self.concurrency)
            .field("checkpoint_interval", &self.checkpoint_interval)
            .field("request_delay", &self.request_delay)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl HarvestEngine {
    /// Creates an engine.
    ///
    /// # Arguments
    ///
    /// * `concurrency` - Maximum number of concurrent fetches (1-100)
    /// * `checkpoint_interval` - Completions between checkpoint writes (>= 1)
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConcurrency`] or
    /// [`EngineError::InvalidCheckpointInterval`] for out-of-range values.
    ///
    /// # Example
    ///
    /// ```
    /// use harvester_core::engine::HarvestEngine;
    ///
    /// let engine = HarvestEngine::new(10, 10).unwrap();
    /// assert_eq!(engine.concurrency(), 10);
    /// ```
    #[instrument(level = "debug")]
    pub fn new(concurrency: usize, checkpoint_interval: usize) -> Result<Self, EngineError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(EngineError::InvalidConcurrency { value: concurrency });
        }
        if checkpoint_interval == 0 {
            return Err(EngineError::InvalidCheckpointInterval {
                value: checkpoint_interval,
            });
        }

        debug!(concurrency, checkpoint_interval, "creating harvest engine");

        Ok(Self {
            concurrency,
            checkpoint_interval,
            request_delay: Duration::ZERO,
            observer: None,
        })
    }

    /// Sets a fixed delay each worker waits after its fetch before releasing
    /// its slot.
    #[must_use]
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    /// Attaches a progress observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn HarvestObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Returns the configured checkpoint interval.
    #[must_use]
    pub fn checkpoint_interval(&self) -> usize {
        self.checkpoint_interval
    }

    /// Returns the configured per-worker delay.
    #[must_use]
    pub fn request_delay(&self) -> Duration {
        self.request_delay
    }

    /// Fetches every item and writes checkpoints along the way.
    ///
    /// A checkpoint is written whenever the number of finished items is a
    /// multiple of the checkpoint interval, and once more at the end.
    ///
    /// Note: individual fetch failures do NOT cause this method to error.
    /// They are counted in the report. A failed mid-run checkpoint is logged
    /// and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Checkpoint`] if the final checkpoint fails, and
    /// [`EngineError::SemaphoreClosed`] if the permit semaphore is closed.
    #[instrument(skip(self, items, fetcher, writer), fields(items = items.len()))]
    pub async fn run(
        &self,
        items: Vec<WorkItem>,
        fetcher: Arc<dyn Fetch>,
        writer: &CheckpointWriter,
    ) -> Result<HarvestReport, EngineError> {
        let started = Instant::now();
        let total = items.len();
        self.emit(&HarvestEvent::Started { total });
        info!(total, concurrency = self.concurrency, "starting harvest");

        let (tx, mut rx) = mpsc::channel::<FetchResult>(self.concurrency);
        let producer = tokio::spawn(submit_all(
            items,
            fetcher,
            Arc::new(Semaphore::new(self.concurrency)),
            tx,
            self.request_delay,
        ));

        let mut results = ResultSet::with_capacity(total);
        let mut succeeded = 0usize;
        let mut failed = 0usize;
        let mut checkpoints = 0usize;

        while let Some(result) = rx.recv().await {
            match &result.outcome {
                FetchOutcome::Success(image) => {
                    succeeded += 1;
                    info!(
                        index = result.index,
                        id = result.id,
                        filename = %image.filename,
                        "[{}/{}] saved",
                        succeeded + failed,
                        total
                    );
                }
                FetchOutcome::Failure(failure) => {
                    failed += 1;
                    warn!(
                        index = result.index,
                        id = result.id,
                        kind = %failure.kind,
                        error = %failure.message,
                        "[{}/{}] failed",
                        succeeded + failed,
                        total
                    );
                }
            }
            results.push(result.clone());
            self.emit(&HarvestEvent::ItemFinished {
                result,
                succeeded,
                failed,
            });

            if (succeeded + failed) % self.checkpoint_interval == 0 {
                info!(succeeded, failed, "progress checkpoint");
                match writer.write(&results).await {
                    Ok(paths) => {
                        checkpoints += 1;
                        self.emit(&HarvestEvent::CheckpointWritten {
                            paths,
                            succeeded,
                            failed,
                            is_final: false,
                        });
                    }
                    Err(e) => warn!(error = %e, "checkpoint failed; continuing"),
                }
            }
        }

        match producer.await {
            Ok(submitted) => submitted?,
            Err(e) => warn!(error = %e, "submission task panicked"),
        }

        let paths = writer.write(&results).await?;
        checkpoints += 1;
        self.emit(&HarvestEvent::CheckpointWritten {
            paths: paths.clone(),
            succeeded,
            failed,
            is_final: true,
        });

        let report = HarvestReport {
            succeeded,
            failed,
            checkpoints,
            elapsed: started.elapsed(),
            paths,
        };
        info!(
            succeeded,
            failed,
            checkpoints,
            elapsed_ms = report.elapsed.as_millis(),
            "harvest complete"
        );
        self.emit(&HarvestEvent::Finished(report.clone()));
        Ok(report)
    }

    fn emit(&self, event: &HarvestEvent) {
        if let Some(observer) = &self.observer {
            observer.on_event(event);
        }
    }
}

/// Spawns one fetch task per item, in submission order, under the semaphore.
async fn submit_all(
    items: Vec<WorkItem>,
    fetcher: Arc<dyn Fetch>,
    semaphore: Arc<Semaphore>,
    tx: mpsc::Sender<FetchResult>,
    request_delay: Duration,
) -> Result<(), EngineError> {
    for item in items {
        // Acquire semaphore permit (blocks if at concurrency limit)
        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .map_err(|_| EngineError::SemaphoreClosed)?;

        debug!(index = item.index, locator = %item.locator, "submitting item");

        let tx = tx.clone();
        let fetcher = Arc::clone(&fetcher);
        tokio::spawn(async move {
            // Permit is dropped when this block exits (RAII)
            let _permit = permit;

            let task_item = item.clone();
            let result = match tokio::spawn(async move { fetcher.fetch(&task_item).await }).await
            {
                Ok(result) => result,
                Err(e) => {
                    warn!(index = item.index, error = %e, "fetch task panicked");
                    FetchResult::failure(
                        &item,
                        format!("{PANIC_MESSAGE_PREFIX} fetch task panicked: {e}"),
                        FailureKind::Network,
                    )
                }
            };

            if !request_delay.is_zero() {
                tokio::time::sleep(request_delay).await;
            }

            if tx.send(result).await.is_err() {
                warn!(index = item.index, "result receiver dropped");
            }
        });
    }
    Ok(())
}
