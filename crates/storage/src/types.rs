//! Shared data structures for storage operations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Configuration settings for the S3 client.
///
/// Passed through to the underlying SDK client at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageSettings {
    /// AWS region.
    pub region: String,
    /// Static credentials. When absent the SDK default credential chain is used.
    pub credentials: Option<AwsCredentials>,
    /// Custom endpoint for S3-compatible stores.
    pub endpoint_url: Option<String>,
    /// Use path-style addressing instead of virtual-hosted style.
    pub force_path_style: bool,
    /// Expected bucket owner for security validation.
    pub expected_bucket_owner: Option<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            region: "us-east-1".into(),
            credentials: None,
            endpoint_url: None,
            force_path_style: false,
            expected_bucket_owner: None,
        }
    }
}

/// AWS credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default)]
    pub session_token: Option<String>,
}

/// Information about an S3 object from list operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    /// S3 object key.
    pub key: String,
    /// Object size in bytes.
    pub size: u64,
    /// Last modified timestamp (Unix epoch seconds).
    pub last_modified: Option<i64>,
    /// ETag (usually MD5 hash for non-multipart uploads).
    pub etag: Option<String>,
}

/// Object attributes returned by a HEAD request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMetadata {
    /// Object size in bytes.
    pub size: u64,
    /// Last modified timestamp (Unix epoch seconds).
    pub last_modified: Option<i64>,
    /// Content type stored with the object.
    pub content_type: Option<String>,
    /// ETag.
    pub etag: Option<String>,
    /// User-defined metadata (`x-amz-meta-*`).
    pub user_metadata: HashMap<String, String>,
}

/// Parameters for a single page of a list-by-prefix call.
#[derive(Debug, Clone, Default)]
pub struct ListObjectsRequest {
    /// Key prefix to match.
    pub prefix: String,
    /// Groups keys sharing a prefix up to this delimiter into common prefixes.
    pub delimiter: Option<String>,
    /// Opaque token from the previous page.
    pub continuation_token: Option<String>,
    /// Upper bound on entries returned in this page.
    pub max_keys: Option<i32>,
}

impl ListObjectsRequest {
    /// Create a request for the first page under a prefix.
    ///
    /// # Arguments
    /// * `prefix` - Key prefix to match
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Default::default()
        }
    }

    /// Set the delimiter.
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    /// Set the continuation token.
    pub fn with_continuation_token(mut self, token: Option<String>) -> Self {
        self.continuation_token = token;
        self
    }

    /// Set the maximum number of entries.
    pub fn with_max_keys(mut self, max_keys: i32) -> Self {
        self.max_keys = Some(max_keys);
        self
    }
}

/// One page of list results.
#[derive(Debug, Clone, Default)]
pub struct ListObjectsPage {
    /// Objects in this page, in store order.
    pub objects: Vec<ObjectInfo>,
    /// Common prefixes when a delimiter was given.
    pub common_prefixes: Vec<String>,
    /// Token for the next page, `None` when the listing is complete.
    pub next_continuation_token: Option<String>,
}

impl ListObjectsPage {
    /// Check whether the page holds no objects and no common prefixes.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.common_prefixes.is_empty()
    }
}
