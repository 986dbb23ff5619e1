//! Error types for record sources.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building the work list. All of them abort the run
/// before any fetch starts.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The catalog file could not be read.
    #[error("cannot read catalog {path}: {source}")]
    Io {
        /// The catalog path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The catalog has no header line.
    #[error("catalog is empty: expected a header naming id, description and url")]
    EmptyCatalog,

    /// A required column is absent from the header.
    #[error("catalog header is missing the `{column}` column")]
    MissingColumn {
        /// The missing column name.
        column: &'static str,
    },

    /// A data row could not be split into the expected fields.
    #[error("malformed catalog row on line {line}: {reason}")]
    MalformedRow {
        /// 1-based line number in the catalog.
        line: usize,
        /// What was wrong with the row.
        reason: String,
    },

    /// Two rows share one id, which would make their filenames collide.
    #[error("duplicate catalog id {id} on line {line}")]
    DuplicateId {
        /// The repeated id.
        id: u64,
        /// 1-based line number of the second occurrence.
        line: usize,
    },
}
