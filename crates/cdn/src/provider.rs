//! Generic CDN provider contract.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CdnError;

/// Options for [`CdnProvider::upload`].
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    /// Object key to use. A unique key is generated when absent.
    pub filename: Option<String>,
    /// MIME type; `application/octet-stream` when absent.
    pub content_type: Option<String>,
    /// User metadata stored with the object.
    pub metadata: Option<HashMap<String, String>>,
}

impl UploadOptions {
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Outcome of a successful upload. Not retained by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    /// Public URL of the object.
    pub url: String,
    /// Object key.
    pub id: String,
    /// Metadata as supplied by the caller.
    pub metadata: HashMap<String, String>,
}

/// Outcome of [`CdnProvider::delete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteResult {
    pub success: bool,
    /// Failure detail, or a confirmation on success.
    pub message: String,
}

impl DeleteResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Object attributes returned by [`CdnProvider::get_metadata`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdnObjectMetadata {
    pub size: u64,
    pub content_type: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
    pub etag: Option<String>,
    /// User metadata stored with the object.
    pub metadata: HashMap<String, String>,
}

/// Capability set every CDN backend exposes to the host.
///
/// Only `upload` reports errors. The URL-addressed operations are advisory
/// and resolve to a value even when the store fails.
#[async_trait]
pub trait CdnProvider: Send + Sync {
    /// Store content and return its public URL.
    async fn upload(&self, data: &[u8], options: UploadOptions) -> Result<UploadResult, CdnError>;

    /// Delete the object a URL points to.
    async fn delete(&self, url: &str) -> DeleteResult;

    /// Check whether the object a URL points to exists.
    async fn exists(&self, url: &str) -> bool;

    /// Fetch attributes of the object a URL points to.
    async fn get_metadata(&self, url: &str) -> Option<CdnObjectMetadata>;
}
