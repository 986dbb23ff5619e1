//! Append-only collection of per-item results for one run.

use crate::fetch::{DownloadedImage, FetchResult};

/// Every [`FetchResult`] produced so far, in completion order.
///
/// The engine's aggregator is the only writer; checkpoints borrow it.
#[derive(Debug, Default, Clone)]
pub struct ResultSet {
    results: Vec<FetchResult>,
}

impl ResultSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty set with room for `capacity` results.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            results: Vec::with_capacity(capacity),
        }
    }

    /// Appends a result.
    pub fn push(&mut self, result: FetchResult) {
        self.results.push(result);
    }

    /// Number of results collected.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns true when no result has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Results in completion order.
    #[must_use]
    pub fn results(&self) -> &[FetchResult] {
        &self.results
    }

    /// Number of successful results.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    /// Number of failed results.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.len() - self.success_count()
    }

    /// Successful images sorted by submission index.
    #[must_use]
    pub fn successes_by_index(&self) -> Vec<&DownloadedImage> {
        let mut successes: Vec<(usize, &DownloadedImage)> = self
            .results
            .iter()
            .filter_map(|r| r.image().map(|image| (r.index, image)))
            .collect();
        successes.sort_by_key(|(index, _)| *index);
        successes.into_iter().map(|(_, image)| image).collect()
    }
}

impl Extend<FetchResult> for ResultSet {
    fn extend<T: IntoIterator<Item = FetchResult>>(&mut self, iter: T) {
        self.results.extend(iter);
    }
}

impl FromIterator<FetchResult> for ResultSet {
    fn from_iter<T: IntoIterator<Item = FetchResult>>(iter: T) -> Self {
        Self {
            results: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::fetch::FailureKind;
    use crate::source::WorkItem;

    fn success(index: usize) -> FetchResult {
        let item = WorkItem::direct(index, index as u64, "https://e.test/x.png");
        FetchResult::success(
            &item,
            DownloadedImage {
                id: index as u64,
                filename: format!("neko_{index:03}.png"),
                public_url: String::new(),
                original_url: String::new(),
                metadata: BTreeMap::new(),
            },
        )
    }

    fn failure(index: usize) -> FetchResult {
        let item = WorkItem::direct(index, index as u64, "https://e.test/x.png");
        FetchResult::failure(&item, "boom", FailureKind::Network)
    }

    #[test]
    fn test_result_set_counts() {
        let set: ResultSet = vec![success(1), failure(2), success(3)].into_iter().collect();
        assert_eq!(set.len(), 3);
        assert_eq!(set.success_count(), 2);
        assert_eq!(set.failure_count(), 1);
        assert!(!set.is_empty());
    }

    #[test]
    fn test_successes_by_index_sorts_and_excludes_failures() {
        let mut set = ResultSet::with_capacity(4);
        set.extend([success(4), failure(2), success(1), success(3)]);
        let ids: Vec<u64> = set.successes_by_index().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 3, 4]);
        assert_eq!(set.results()[0].index, 4, "completion order is kept");
    }

    #[test]
    fn test_empty_result_set() {
        let set = ResultSet::new();
        assert!(set.is_empty());
        assert!(set.successes_by_index().is_empty());
    }
}
