//! # Error Types
//!
//! Errors raised by the core value types. Store, fetch and handshake
//! failures have their own enums in the crates that own those boundaries.

use thiserror::Error;

/// Top-level error type for core value parsing and serialization.
#[derive(Error, Debug)]
pub enum ArchiverError {
    /// A digest string is not 64 hex characters.
    #[error("invalid content digest: {0}")]
    InvalidDigest(String),

    /// A timestamp failed validation.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
