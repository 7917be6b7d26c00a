//! Error types for KYC storage.

use kyc_core::DocumentStatus;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
///
/// Store operations carry no retry logic; retryability is decided by the
/// caller's error classifier.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind, e.g. `document` or `user`.
        entity: &'static str,
        /// The missing id.
        id: String,
    },

    /// A put-if-absent hit an existing record.
    #[error("{entity} already exists: {id}")]
    AlreadyExists {
        /// Entity kind.
        entity: &'static str,
        /// The conflicting id.
        id: String,
    },

    /// A conditional update found a different stored status than expected.
    ///
    /// This is the losing side of a concurrent-decision race.
    #[error("precondition failed: expected status {expected}, found {actual}")]
    PreconditionFailed {
        /// Status the caller expected.
        expected: DocumentStatus,
        /// Status actually stored.
        actual: DocumentStatus,
    },

    /// The backend is throttling writes.
    #[error("store throttled: {0}")]
    Throttled(String),

    /// A continuation token could not be decoded.
    #[error("invalid page token: {0}")]
    InvalidPageToken(String),
}
