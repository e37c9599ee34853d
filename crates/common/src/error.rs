//! Shared error types used across the S3 provider crates.

use thiserror::Error;

/// Path-related errors shared across crates.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    /// Path climbs above the namespace root.
    #[error("Path traversal outside of the bucket root: {path}")]
    PathTraversal {
        /// The offending input path.
        path: String,
    },

    /// Path is invalid for the requested operation.
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath {
        /// The invalid path.
        path: String,
        /// Why the path was rejected.
        reason: String,
    },
}

impl PathError {
    /// Create an InvalidPath error.
    ///
    /// # Arguments
    /// * `path` - The rejected path
    /// * `reason` - Human readable reason
    pub fn invalid(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
