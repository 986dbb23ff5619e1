//! Fetching images and saving them under deterministic names.
//!
//! # Features
//!
//! - Optional metadata lookup against a one-result-per-call API
//! - Streaming downloads written to a `.part` file and renamed on completion
//! - `{prefix}_{id}{ext}` filenames that never collide across workers
//! - Every failure folded into a per-item [`FetchResult`]
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use harvester_core::fetch::{Fetch, FetchSettings, HttpClient, HttpFetcher};
//! use harvester_core::source::WorkItem;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = HttpFetcher::new(
//!     HttpClient::new()?,
//!     FetchSettings {
//!         output_dir: PathBuf::from("static"),
//!         filename_prefix: "neko".to_string(),
//!         index_width: 3,
//!         public_url_prefix: "https://example.com/static/".to_string(),
//!     },
//! );
//! let result = fetcher
//!     .fetch(&WorkItem::api(1, "https://nekos.best/api/v2/neko"))
//!     .await;
//! println!("saved: {}", result.is_success());
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod error;
mod fetcher;
mod filename;
mod result;

pub use client::HttpClient;
pub use constants::{CONNECT_TIMEOUT_SECS, REQUEST_TIMEOUT_SECS};
pub use error::{FailureKind, FetchError};
pub use fetcher::{Fetch, FetchSettings, HttpFetcher, UNKNOWN_ARTIST};
pub use filename::{build_filename, extension_from_content_type, extension_from_url};
pub use result::{DownloadedImage, FetchFailure, FetchOutcome, FetchResult};
