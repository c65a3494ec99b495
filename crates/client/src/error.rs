//! Client error types.
//!
//! These never reach UI callers: the resilient entry points log them and
//! return empty results.

use thiserror::Error;

/// Failure talking to the Geobooker API.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {path}")]
    Status { status: u16, path: String },

    #[error("Invalid response from {path}: {message}")]
    Decode { path: String, message: String },

    #[error("Invalid client configuration: {0}")]
    Config(String),
}

/// Failure of a local persistent store (geo-cache or flags).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Persistent store is not available")]
    Unavailable,
}
