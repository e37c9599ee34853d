//! The object-store primitives the providers are built from.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::types::{ListObjectsPage, ListObjectsRequest, ObjectMetadata};

/// One method per object-store request, addressed by bucket and key.
///
/// Every call is a single independent request. Implementations hold no
/// mutable per-call state and are safe to share across tasks.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Size of an object, or `None` when the key is absent.
    async fn head_object(&self, bucket: &str, key: &str) -> Result<Option<u64>, StorageError> {
        Ok(self
            .head_object_with_metadata(bucket, key)
            .await?
            .map(|meta| meta.size))
    }

    /// Attributes of an object, or `None` when the key is absent.
    async fn head_object_with_metadata(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<ObjectMetadata>, StorageError>;

    /// Create or replace an object.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
        content_type: Option<&str>,
        metadata: Option<&HashMap<String, String>>,
    ) -> Result<(), StorageError>;

    /// Read a whole object. Absent keys fail with `StorageError::NotFound`.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Delete an object. Deleting an absent key is not an error.
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StorageError>;

    /// Server-side copy within one bucket. Fails with `NotFound` if the source is absent.
    async fn copy_object(
        &self,
        bucket: &str,
        source_key: &str,
        destination_key: &str,
    ) -> Result<(), StorageError>;

    /// Fetch a single page of a list-by-prefix call.
    async fn list_objects_page(
        &self,
        bucket: &str,
        request: &ListObjectsRequest,
    ) -> Result<ListObjectsPage, StorageError>;
}
