//! Object-store failure taxonomy shared by every `StorageClient` backend.

use thiserror::Error;

/// Failure of a single object-store request.
///
/// Backends map their native errors onto these variants. Providers branch
/// only on `NotFound`; everything else is surfaced or logged as is.
#[derive(Error, Debug, Clone)]
pub enum StorageError {
    /// The key is absent from the bucket.
    #[error("s3://{bucket}/{key} does not exist")]
    NotFound { bucket: String, key: String },

    #[error("Permission denied for s3://{bucket}/{key}: {message}")]
    AccessDenied {
        bucket: String,
        key: String,
        message: String,
    },

    /// Transport or service-side failure.
    #[error("Object store unavailable: {message}")]
    NetworkError { message: String, retryable: bool },

    /// Client settings rejected before any request was sent.
    #[error("Invalid storage settings: {message}")]
    InvalidConfig { message: String },

    #[error("{message}")]
    Other { message: String },
}

impl StorageError {
    /// Build a `NotFound` for a bucket and key.
    pub fn not_found(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        StorageError::NotFound {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}
