//! Failures raised while talking to S3 through the AWS SDK.

use s3_providers_storage::StorageError;
use thiserror::Error;

/// SDK-level failure, classified before it leaves this crate.
#[derive(Error, Debug)]
pub enum CrtError {
    /// Request failed in transport or at the service.
    #[error("S3 request failed: {message}")]
    SdkError { message: String, retryable: bool },

    /// The service returned `AccessDenied`.
    #[error("S3 denied access to s3://{bucket}/{key}: {message}")]
    AccessDenied {
        bucket: String,
        key: String,
        message: String,
    },

    /// Settings could not produce an SDK client.
    #[error("Cannot build S3 client: {0}")]
    ConfigError(String),
}

impl From<CrtError> for StorageError {
    fn from(err: CrtError) -> Self {
        match err {
            CrtError::SdkError { message, retryable } => {
                StorageError::NetworkError { message, retryable }
            }
            CrtError::AccessDenied {
                bucket,
                key,
                message,
            } => StorageError::AccessDenied {
                bucket,
                key,
                message,
            },
            CrtError::ConfigError(message) => StorageError::InvalidConfig { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_maps_to_invalid_config() {
        let err: StorageError = CrtError::ConfigError("region must not be empty".into()).into();
        assert!(matches!(err, StorageError::InvalidConfig { .. }));
        assert_eq!(err.to_string(), "Invalid storage settings: region must not be empty");
    }

    #[test]
    fn test_sdk_error_keeps_retryable_flag() {
        let err: StorageError = CrtError::SdkError {
            message: "timeout".into(),
            retryable: true,
        }
        .into();
        assert!(matches!(err, StorageError::NetworkError { retryable: true, .. }));
    }

    #[test]
    fn test_access_denied_keeps_location() {
        let err: StorageError = CrtError::AccessDenied {
            bucket: "b".into(),
            key: "k".into(),
            message: "no".into(),
        }
        .into();
        assert!(matches!(err, StorageError::AccessDenied { ref key, .. } if key == "k"));
    }
}
