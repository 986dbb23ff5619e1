//! Image Harvester Core Library
//!
//! This library fetches images listed in a local catalog or served one at a
//! time by a remote API, saves each under a deterministic filename, and keeps a
//! JSON/CSV directory of everything saved.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`source`] - Work items from a catalog file or an API endpoint
//! - [`fetch`] - Metadata lookup, streaming download and atomic save per item
//! - [`engine`] - Bounded-concurrency worker pool with periodic checkpoints
//! - [`manifest`] - Result collection and `directory.json` / `directory.csv` output

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod engine;
pub mod fetch;
pub mod manifest;
pub mod source;
pub mod user_agent;

// Re-export commonly used types
pub use engine::{
    DEFAULT_CHECKPOINT_INTERVAL, DEFAULT_CONCURRENCY, EngineError, HarvestEngine, HarvestEvent,
    HarvestObserver, HarvestReport,
};
pub use fetch::{
    DownloadedImage, FailureKind, Fetch, FetchError, FetchOutcome, FetchResult, FetchSettings,
    HttpClient, HttpFetcher,
};
pub use manifest::{CheckpointError, CheckpointPaths, CheckpointWriter, Manifest, ResultSet};
pub use source::{Locator, SourceError, SourceKind, WorkItem, api_items, read_catalog};
