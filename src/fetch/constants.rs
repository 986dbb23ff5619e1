//! Constants for the fetch module (timeouts).

/// HTTP connect timeout (10 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default whole-request timeout for metadata and content requests (30 seconds).
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
