//! Error types for the fetch module.
//!
//! Every variant carries the URL or path it concerns so the message stored in a
//! failed [`FetchResult`](super::FetchResult) is useful on its own.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while resolving, downloading or saving one image.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request did not complete within the configured timeout.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Non-success HTTP response.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The URL is malformed or uses an unsupported scheme.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The metadata endpoint answered, but not with a usable result.
    #[error("malformed response from {url}: {reason}")]
    MalformedResponse {
        /// The metadata endpoint.
        url: String,
        /// What was missing or unparseable.
        reason: String,
    },

    /// File system error while writing the image.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Coarse failure taxonomy reported alongside each failed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Connection, timeout, status or URL problems. A fetch task that panics
    /// is also reported under this kind, with a message prefixed
    /// `internal error:` so it can be told apart from transport failures.
    Network,
    /// Metadata response missing expected fields.
    MalformedResponse,
    /// Writing the image to disk failed.
    Filesystem,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::MalformedResponse => write!(f, "malformed_response"),
            Self::Filesystem => write!(f, "filesystem"),
        }
    }
}

impl FetchError {
    /// Creates a network error from a reqwest error, promoting timeouts.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            return Self::timeout(url);
        }
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a malformed response error.
    pub fn malformed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Maps the error onto the reported failure taxonomy.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Network { .. }
            | Self::Timeout { .. }
            | Self::HttpStatus { .. }
            | Self::InvalidUrl { .. } => FailureKind::Network,
            Self::MalformedResponse { .. } => FailureKind::MalformedResponse,
            Self::Io { .. } => FailureKind::Filesystem,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_timeout_display() {
        let error = FetchError::timeout("https://example.com/neko.png");
        assert!(error.to_string().contains("timeout"));
        assert!(error.to_string().contains("https://example.com/neko.png"));
        assert_eq!(error.kind(), FailureKind::Network);
    }

    #[test]
    fn test_fetch_error_http_status_display() {
        let error = FetchError::http_status("https://example.com/neko.png", 404);
        let msg = error.to_string();
        assert!(msg.contains("404"), "Expected '404' in: {msg}");
        assert!(msg.contains("https://example.com/neko.png"));
        assert_eq!(error.kind(), FailureKind::Network);
    }

    #[test]
    fn test_fetch_error_malformed_display_and_kind() {
        let error = FetchError::malformed("https://api.example.com/neko", "empty results");
        let msg = error.to_string();
        assert!(msg.contains("malformed response"), "got: {msg}");
        assert!(msg.contains("empty results"), "got: {msg}");
        assert_eq!(error.kind(), FailureKind::MalformedResponse);
    }

    #[test]
    fn test_fetch_error_io_kind_is_filesystem() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error = FetchError::io("/tmp/static/neko_001.png", io_error);
        assert!(error.to_string().contains("/tmp/static/neko_001.png"));
        assert_eq!(error.kind(), FailureKind::Filesystem);
    }

    #[test]
    fn test_failure_kind_display_labels() {
        assert_eq!(FailureKind::Network.to_string(), "network");
        assert_eq!(
            FailureKind::MalformedResponse.to_string(),
            "malformed_response"
        );
        assert_eq!(FailureKind::Filesystem.to_string(), "filesystem");
    }
}
