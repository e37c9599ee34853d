//! Error types for filesystem provider operations.

use s3_providers_common::PathError;
use s3_providers_storage::StorageError;
use thiserror::Error;

/// Errors returned by filesystem providers.
#[derive(Debug, Error, Clone)]
pub enum FsError {
    /// Path climbs above the bucket root.
    #[error("Path traversal outside of the bucket root: {path}")]
    PathTraversal { path: String },

    /// Path is not valid for this operation.
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// Target does not exist.
    #[error("No such file or directory: {path}")]
    NotFound { path: String },

    /// Destination already exists and overwrite was not requested.
    #[error("Destination already exists: {path}")]
    AlreadyExists { path: String },

    /// Operation has no object-store equivalent.
    #[error("Operation '{operation}' is not supported by the S3 filesystem")]
    Unsupported { operation: &'static str },

    /// Content could not be decoded with the requested encoding.
    #[error("Cannot decode {path} as {encoding}: {reason}")]
    Decode {
        path: String,
        encoding: String,
        reason: String,
    },

    /// Unknown encoding name.
    #[error("Unknown encoding: {name}")]
    UnknownEncoding { name: String },

    /// Invalid ignore pattern.
    #[error("Invalid ignore pattern '{pattern}': {reason}")]
    InvalidIgnorePattern { pattern: String, reason: String },

    /// Invalid provider configuration.
    #[error("Invalid filesystem configuration: {message}")]
    Config { message: String },

    /// Failure reported by the object store.
    #[error(transparent)]
    Storage(StorageError),
}

impl FsError {
    /// Create a configuration error.
    ///
    /// # Arguments
    /// * `message` - Description naming the offending field
    pub fn config(message: impl Into<String>) -> Self {
        FsError::Config {
            message: message.into(),
        }
    }

    /// Check if this error means the target is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FsError::NotFound { .. })
    }
}

impl From<PathError> for FsError {
    fn from(err: PathError) -> Self {
        match err {
            PathError::PathTraversal { path } => FsError::PathTraversal { path },
            PathError::InvalidPath { path, reason } => FsError::InvalidPath { path, reason },
        }
    }
}

impl From<StorageError> for FsError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { key, .. } => FsError::NotFound { path: key },
            other => FsError::Storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_not_found_becomes_not_found() {
        let err: FsError = StorageError::not_found("bucket", "notes/a.txt").into();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "No such file or directory: notes/a.txt");
    }

    #[test]
    fn test_other_storage_errors_are_wrapped() {
        let err: FsError = StorageError::NetworkError {
            message: "connection reset".into(),
            retryable: true,
        }
        .into();
        assert!(matches!(err, FsError::Storage(_)));
        assert_eq!(err.to_string(), "Object store unavailable: connection reset");
    }

    #[test]
    fn test_path_errors_convert() {
        let err: FsError = PathError::PathTraversal {
            path: "../x".into(),
        }
        .into();
        assert!(matches!(err, FsError::PathTraversal { .. }));
    }
}
