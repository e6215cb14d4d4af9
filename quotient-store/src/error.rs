//! Store error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A token file could not be used.
    #[error("Invalid token file {path}: {reason}")]
    InvalidToken {
        /// File path.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// The token directory does not exist.
    #[error("Token directory not found: {0}")]
    TokenDirNotFound(PathBuf),
}

impl StoreError {
    /// Returns true if the error means the file simply is not there.
    pub fn is_not_found(&self) -> bool {
        match self {
            StoreError::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            StoreError::TokenDirNotFound(_) => true,
            _ => false,
        }
    }
}
