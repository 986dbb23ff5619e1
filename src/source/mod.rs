//! Record sources that turn a catalog file or an API endpoint into work items.
//!
//! - [`read_catalog`] / [`parse_catalog`] - catalog rows (`id,description,url`)
//! - [`api_items`] - `1..=N` items that each query the same metadata endpoint

mod catalog;
mod error;

pub use catalog::{parse_catalog, read_catalog};
pub use error::SourceError;

use std::collections::BTreeMap;
use std::fmt;

/// Where the content for an item comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Direct content URL; no metadata lookup.
    Direct(String),
    /// Metadata endpoint returning one result per call.
    Api(String),
}

impl Locator {
    /// Returns the URL behind the locator.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Direct(url) | Self::Api(url) => url,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(url) => write!(f, "{url}"),
            Self::Api(url) => write!(f, "api:{url}"),
        }
    }
}

/// The kind of record source a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Local catalog file of direct URLs.
    Catalog,
    /// Remote metadata API.
    Api,
}

impl SourceKind {
    /// Metadata columns emitted in the tabular export, in order.
    #[must_use]
    pub fn metadata_columns(self) -> &'static [&'static str] {
        match self {
            Self::Catalog => &["description"],
            Self::Api => &["artist_name", "artist_href", "source_url"],
        }
    }
}

/// One image to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// 1-based submission position, dense and unique within a run.
    pub index: usize,
    /// Identifier used in filenames and the manifest.
    pub id: u64,
    /// Where to fetch from.
    pub locator: Locator,
    /// Metadata known before fetching (catalog description).
    pub metadata: BTreeMap<String, String>,
}

impl WorkItem {
    /// Creates an item pointing at a direct content URL.
    #[must_use]
    pub fn direct(index: usize, id: u64, url: impl Into<String>) -> Self {
        Self {
            index,
            id,
            locator: Locator::Direct(url.into()),
            metadata: BTreeMap::new(),
        }
    }

    /// Creates an item that resolves its content URL through `endpoint`.
    #[must_use]
    pub fn api(index: usize, endpoint: impl Into<String>) -> Self {
        Self {
            index,
            id: index as u64,
            locator: Locator::Api(endpoint.into()),
            metadata: BTreeMap::new(),
        }
    }

    /// Adds a seed metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Synthesizes `count` items that all query `endpoint`.
#[must_use]
pub fn api_items(endpoint: &str, count: usize) -> Vec<WorkItem> {
    (1..=count).map(|index| WorkItem::api(index, endpoint)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_items_are_dense_and_ordered() {
        let items = api_items("https://nekos.best/api/v2/neko", 4);
        assert_eq!(items.len(), 4);
        for (position, item) in items.iter().enumerate() {
            assert_eq!(item.index, position + 1);
            assert_eq!(item.id, (position + 1) as u64);
            assert_eq!(
                item.locator,
                Locator::Api("https://nekos.best/api/v2/neko".to_string())
            );
            assert!(item.metadata.is_empty());
        }
    }

    #[test]
    fn test_api_items_zero_count_is_empty() {
        assert!(api_items("https://example.com/api", 0).is_empty());
    }

    #[test]
    fn test_work_item_direct_with_metadata() {
        let item = WorkItem::direct(2, 17, "https://example.com/a.png")
            .with_metadata("description", "Teemo");
        assert_eq!(item.locator.as_str(), "https://example.com/a.png");
        assert_eq!(item.metadata.get("description").map(String::as_str), Some("Teemo"));
    }

    #[test]
    fn test_source_kind_metadata_columns() {
        assert_eq!(SourceKind::Catalog.metadata_columns(), &["description"]);
        assert_eq!(
            SourceKind::Api.metadata_columns(),
            &["artist_name", "artist_href", "source_url"]
        );
    }

    #[test]
    fn test_locator_display() {
        assert_eq!(
            Locator::Api("https://x.test/api".into()).to_string(),
            "api:https://x.test/api"
        );
        assert_eq!(Locator::Direct("https://x.test/a".into()).to_string(), "https://x.test/a");
    }
}
