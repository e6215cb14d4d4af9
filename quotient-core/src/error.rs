//! Core error types for Quotient.

use thiserror::Error;

/// Core error type for Quotient model operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A quota record holds values outside their valid range.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Unknown account kind tag.
    #[error("Unknown account kind: {0}")]
    UnknownAccountKind(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
