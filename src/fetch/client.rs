//! HTTP client wrapper for metadata lookups and image downloads.
//!
//! This module provides the `HttpClient` struct which applies the shared
//! timeout and User-Agent policy and maps transport failures to [`FetchError`].

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, REQUEST_TIMEOUT_SECS};
use super::error::FetchError;
use crate::user_agent::DEFAULT_USER_AGENT;

/// HTTP client shared by every worker of a run.
///
/// Cloning is cheap; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a client with the default timeout and User-Agent.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Network`] if the underlying client cannot be built.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_settings(Duration::from_secs(REQUEST_TIMEOUT_SECS), DEFAULT_USER_AGENT)
    }

    /// Creates a client with an explicit request timeout and User-Agent.
    ///
    /// The timeout bounds each whole request (connect, headers and body).
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Network`] if the underlying client cannot be built.
    #[instrument(level = "debug", skip(user_agent))]
    pub fn with_settings(request_timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(request_timeout))
            .timeout(request_timeout)
            .gzip(true)
            .user_agent(user_agent)
            .build()
            .map_err(|e| FetchError::network("<client builder>", e))?;
        Ok(Self { client })
    }

    /// Sends a GET request and returns the response if its status is a success.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] for unparseable or non-HTTP URLs,
    /// [`FetchError::Timeout`]/[`FetchError::Network`] for transport failures and
    /// [`FetchError::HttpStatus`] for non-2xx responses.
    pub async fn get(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let parsed = Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::invalid_url(url));
        }

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| FetchError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url, status.as_u16()));
        }
        Ok(response)
    }

    /// Fetches `url` and decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Transport and status errors as for [`get`](Self::get); an undecodable
    /// body is reported as [`FetchError::MalformedResponse`].
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self.get(url).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::network(url, e))?;
        serde_json::from_slice(&body)
            .map_err(|e| FetchError::malformed(url, format!("invalid JSON body: {e}")))
    }
}

/// Returns the response `Content-Type` header, if it is valid text.
pub(crate) fn content_type(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

/// Streams a response body to `file_path`, returning bytes written.
///
/// The caller owns cleanup of `file_path` when this fails.
pub(crate) async fn stream_to_file(
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, FetchError> {
    let file = File::create(file_path)
        .await
        .map_err(|e| FetchError::io(file_path, e))?;
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| FetchError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| FetchError::io(file_path, e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| FetchError::io(file_path, e))?;

    debug!(path = %file_path.display(), bytes = bytes_written, "body streamed");
    Ok(bytes_written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_new_builds() {
        assert!(HttpClient::new().is_ok());
    }

    #[tokio::test]
    async fn test_get_rejects_invalid_url() {
        let client = HttpClient::new().unwrap();
        let result = client.get("not a url").await;
        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_get_rejects_non_http_scheme() {
        let client = HttpClient::new().unwrap();
        let result = client.get("ftp://example.com/neko.png").await;
        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
    }
}
