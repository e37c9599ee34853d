//! Error types for CDN provider operations.

use s3_providers_common::PathError;
use s3_providers_storage::StorageError;
use thiserror::Error;

/// Errors surfaced by CDN providers.
///
/// Only `upload` and construction return these; `delete`, `exists` and
/// `get_metadata` fold failures into their result values.
#[derive(Debug, Error, Clone)]
pub enum CdnError {
    /// Invalid provider configuration.
    #[error("Invalid CDN configuration: {message}")]
    Config { message: String },

    /// URL does not address an object in this provider's bucket.
    #[error("URL does not map to an object in this bucket: {url}")]
    InvalidUrl { url: String },

    /// Requested object key is not usable.
    #[error("Invalid object key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// Failure reported by the object store.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl CdnError {
    /// Create a configuration error.
    ///
    /// # Arguments
    /// * `message` - Description naming the offending field
    pub fn config(message: impl Into<String>) -> Self {
        CdnError::Config {
            message: message.into(),
        }
    }
}

impl From<PathError> for CdnError {
    fn from(err: PathError) -> Self {
        match err {
            PathError::PathTraversal { path } => CdnError::InvalidKey {
                key: path,
                reason: "climbs above the bucket root".into(),
            },
            PathError::InvalidPath { path, reason } => CdnError::InvalidKey { key: path, reason },
        }
    }
}
