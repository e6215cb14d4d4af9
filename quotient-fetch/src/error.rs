//! Fetch error types.

use std::time::Duration;
use thiserror::Error;

/// Transport-level failure for a single HTTP exchange.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Request error (connect, TLS, body read).
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Build(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A header name or value could not be encoded.
    #[error("Invalid header {name}: {reason}")]
    InvalidHeader {
        /// Header name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The per-request timeout elapsed.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The caller's deadline passed before the exchange finished.
    #[error("Context deadline exceeded")]
    DeadlineExceeded,

    /// The caller cancelled the context.
    #[error("Request cancelled")]
    Cancelled,
}

impl HttpError {
    /// Returns true if the caller's context ended the exchange.
    ///
    /// Probing further endpoints is pointless once this is true.
    pub fn is_context_done(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    /// Returns true for any timeout, per-request or context deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::DeadlineExceeded)
    }
}
