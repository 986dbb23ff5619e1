//! Result collection and checkpoint artifacts.
//!
//! - [`ResultSet`] - every per-item result of a run
//! - [`CheckpointWriter`] - renders `directory.json` and `directory.csv` from a
//!   result set and replaces both files wholesale

mod checkpoint;
mod error;
mod result_set;

pub use checkpoint::{
    CheckpointPaths, CheckpointWriter, DEFAULT_MANIFEST_NAME, DEFAULT_TABLE_NAME, Manifest,
    ManifestEntry,
};
pub use error::CheckpointError;
pub use result_set::ResultSet;
