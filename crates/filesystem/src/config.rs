//! Configuration for the S3 filesystem provider.

use s3_providers_storage::StorageSettings;
use serde::{Deserialize, Serialize};

use crate::error::FsError;

/// Construction parameters for [`crate::S3FileSystem`].
///
/// ```json
/// { "bucket": "my-bucket", "clientConfig": { "region": "eu-west-1" } }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSystemConfig {
    /// Bucket the provider is bound to.
    #[serde(default, alias = "namespace")]
    pub bucket: String,
    /// Passed through to the S3 client. SDK defaults apply when absent.
    #[serde(default, alias = "storeClientConfig")]
    pub client_config: Option<StorageSettings>,
}

impl FileSystemConfig {
    /// Create a configuration for a bucket with default client settings.
    ///
    /// # Arguments
    /// * `bucket` - Bucket name
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            client_config: None,
        }
    }

    /// Check required fields before any network access.
    ///
    /// # Errors
    /// Returns `FsError::Config` naming the first missing field.
    pub fn validate(&self) -> Result<(), FsError> {
        if self.bucket.trim().is_empty() {
            return Err(FsError::config("bucket is required"));
        }
        if let Some(ref client) = self.client_config {
            if client.region.trim().is_empty() {
                return Err(FsError::config("clientConfig.region must not be empty"));
            }
        }
        Ok(())
    }
}
