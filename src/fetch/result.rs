//! Per-item fetch outcomes.

use std::collections::BTreeMap;

use super::error::{FailureKind, FetchError};
use crate::source::WorkItem;

/// A successfully downloaded and saved image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedImage {
    /// Identifier from the work item.
    pub id: u64,
    /// Name of the saved file inside the output directory.
    pub filename: String,
    /// Public URL the file will be served from.
    pub public_url: String,
    /// URL the content was downloaded from.
    pub original_url: String,
    /// Auxiliary metadata (description, artist fields); may be empty.
    pub metadata: BTreeMap<String, String>,
}

/// Why an item could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    /// Human-readable error message.
    pub message: String,
    /// Coarse classification.
    pub kind: FailureKind,
}

impl From<&FetchError> for FetchFailure {
    fn from(error: &FetchError) -> Self {
        Self {
            message: error.to_string(),
            kind: error.kind(),
        }
    }
}

/// Success or failure for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The image was saved.
    Success(DownloadedImage),
    /// The item failed; the failure is final for the run.
    Failure(FetchFailure),
}

/// The outcome of processing one [`WorkItem`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    /// Submission index of the item.
    pub index: usize,
    /// Identifier of the item.
    pub id: u64,
    /// What happened.
    pub outcome: FetchOutcome,
}

impl FetchResult {
    /// Creates a successful result for `item`.
    #[must_use]
    pub fn success(item: &WorkItem, image: DownloadedImage) -> Self {
        Self {
            index: item.index,
            id: item.id,
            outcome: FetchOutcome::Success(image),
        }
    }

    /// Creates a failed result for `item`.
    #[must_use]
    pub fn failure(item: &WorkItem, message: impl Into<String>, kind: FailureKind) -> Self {
        Self {
            index: item.index,
            id: item.id,
            outcome: FetchOutcome::Failure(FetchFailure {
                message: message.into(),
                kind,
            }),
        }
    }

    /// Creates a failed result from a fetch error.
    #[must_use]
    pub fn from_error(item: &WorkItem, error: &FetchError) -> Self {
        Self {
            index: item.index,
            id: item.id,
            outcome: FetchOutcome::Failure(FetchFailure::from(error)),
        }
    }

    /// Returns true if the item was saved.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, FetchOutcome::Success(_))
    }

    /// Returns the saved image, if any.
    #[must_use]
    pub fn image(&self) -> Option<&DownloadedImage> {
        match &self.outcome {
            FetchOutcome::Success(image) => Some(image),
            FetchOutcome::Failure(_) => None,
        }
    }

    /// Returns the failure, if any.
    #[must_use]
    pub fn failure_info(&self) -> Option<&FetchFailure> {
        match &self.outcome {
            FetchOutcome::Success(_) => None,
            FetchOutcome::Failure(failure) => Some(failure),
        }
    }
}
