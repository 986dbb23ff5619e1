//! Error types for checkpoint writes.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while writing the manifest or the table export.
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// Writing or renaming an artifact failed.
    #[error("I/O error writing checkpoint {path}: {source}")]
    Io {
        /// The artifact path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error (shouldn't occur for well-formed structs).
    #[error("JSON serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CheckpointError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
