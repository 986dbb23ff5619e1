//! The two-step fetch: resolve metadata (API items only), then download and save.
//!
//! [`HttpFetcher::fetch`] never fails: every error is folded into a
//! [`FetchResult`] carrying a failure outcome.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::client::{HttpClient, content_type, stream_to_file};
use super::error::FetchError;
use super::filename::{build_filename, extension_from_content_type, extension_from_url};
use super::result::{DownloadedImage, FetchResult};
use crate::source::{Locator, WorkItem};

/// Artist name recorded when the API omits one.
pub const UNKNOWN_ARTIST: &str = "Unknown";

/// Turns one work item into exactly one result.
///
/// Implementations must not panic or drop items; the engine relies on a
/// one-to-one mapping between submitted items and results.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetches and saves `item`.
    async fn fetch(&self, item: &WorkItem) -> FetchResult;
}

/// Where and how fetched images are stored.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Shared output directory; must exist before fetching.
    pub output_dir: PathBuf,
    /// Filename prefix, e.g. `neko`.
    pub filename_prefix: String,
    /// Zero-padding width for the id (0 disables padding).
    pub index_width: usize,
    /// Prefix joined with the filename to form the public URL.
    pub public_url_prefix: String,
}

impl FetchSettings {
    /// Returns the public URL of a saved file.
    #[must_use]
    pub fn public_url(&self, filename: &str) -> String {
        format!("{}{filename}", self.public_url_prefix)
    }
}

/// Body shape returned by the metadata endpoint.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    results: Vec<ApiResult>,
}

#[derive(Debug, Deserialize)]
struct ApiResult {
    url: Option<String>,
    artist_name: Option<String>,
    artist_href: Option<String>,
    source_url: Option<String>,
}

/// Content location plus metadata resolved for one item.
#[derive(Debug)]
struct ResolvedContent {
    url: String,
    metadata: BTreeMap<String, String>,
}

/// HTTP-backed [`Fetch`] implementation.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: HttpClient,
    settings: FetchSettings,
}

impl HttpFetcher {
    /// Creates a fetcher sharing `client` across all workers.
    #[must_use]
    pub fn new(client: HttpClient, settings: FetchSettings) -> Self {
        Self { client, settings }
    }

    async fn try_fetch(&self, item: &WorkItem) -> Result<DownloadedImage, FetchError> {
        let resolved = match &item.locator {
            Locator::Direct(url) => ResolvedContent {
                url: url.clone(),
                metadata: item.metadata.clone(),
            },
            Locator::Api(endpoint) => {
                let mut resolved = self.resolve_metadata(endpoint).await?;
                for (key, value) in &item.metadata {
                    resolved
                        .metadata
                        .entry(key.clone())
                        .or_insert_with(|| value.clone());
                }
                resolved
            }
        };

        debug!(url = %resolved.url, "downloading content");
        let response = self.client.get(&resolved.url).await?;

        let extension = extension_from_url(&resolved.url)
            .or_else(|| {
                content_type(&response)
                    .as_deref()
                    .and_then(extension_from_content_type)
                    .map(ToString::to_string)
            })
            .unwrap_or_default();
        let filename = build_filename(
            &self.settings.filename_prefix,
            item.id,
            self.settings.index_width,
            &extension,
        );

        let final_path = self.settings.output_dir.join(&filename);
        let part_path = self.settings.output_dir.join(format!(".{filename}.part"));
        let bytes = save_atomically(response, &resolved.url, &part_path, &final_path).await?;

        info!(id = item.id, filename = %filename, bytes, "image saved");

        Ok(DownloadedImage {
            id: item.id,
            public_url: self.settings.public_url(&filename),
            filename,
            original_url: resolved.url,
            metadata: resolved.metadata,
        })
    }

    /// Queries the metadata endpoint and extracts the first result.
    async fn resolve_metadata(&self, endpoint: &str) -> Result<ResolvedContent, FetchError> {
        let body: ApiResponse = self.client.get_json(endpoint).await?;
        let first = body
            .results
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::malformed(endpoint, "response has no results"))?;
        let url = first
            .url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| FetchError::malformed(endpoint, "first result has no url"))?;

        let mut metadata = BTreeMap::new();
        metadata.insert(
            "artist_name".to_string(),
            first.artist_name.unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
        );
        metadata.insert(
            "artist_href".to_string(),
            first.artist_href.unwrap_or_default(),
        );
        metadata.insert("source_url".to_string(), first.source_url.unwrap_or_default());

        Ok(ResolvedContent { url, metadata })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    #[instrument(skip(self, item), fields(index = item.index, id = item.id, locator = %item.locator))]
    async fn fetch(&self, item: &WorkItem) -> FetchResult {
        match self.try_fetch(item).await {
            Ok(image) => FetchResult::success(item, image),
            Err(error) => {
                warn!(error = %error, kind = %error.kind(), "fetch failed");
                FetchResult::from_error(item, &error)
            }
        }
    }
}

/// Streams into `part_path` and renames it to `final_path` once complete.
///
/// On error the partial file is removed so the final name never points at
/// truncated content.
async fn save_atomically(
    response: reqwest::Response,
    url: &str,
    part_path: &Path,
    final_path: &Path,
) -> Result<u64, FetchError> {
    let written = match stream_to_file(response, url, part_path).await {
        Ok(bytes) => bytes,
        Err(error) => {
            debug!(path = %part_path.display(), "cleaning up partial file after error");
            let _ = tokio::fs::remove_file(part_path).await;
            return Err(error);
        }
    };

    if let Err(e) = tokio::fs::rename(part_path, final_path).await {
        let _ = tokio::fs::remove_file(part_path).await;
        return Err(FetchError::io(final_path, e));
    }
    Ok(written)
}
