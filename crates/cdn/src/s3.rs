//! S3-backed CDN provider.
//!
//! Objects are addressed by public URL. A URL is either the configured base
//! URL followed by the key, or the bucket's virtual-hosted S3 URL. Both forms
//! map back to the key so that `delete`, `exists` and `get_metadata` accept
//! the URLs `upload` hands out.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use s3_providers_common::{normalize_file_key, DEFAULT_CONTENT_TYPE, KEY_SEPARATOR};
use s3_providers_storage::{ObjectMetadata, StorageClient, StorageError};
use s3_providers_storage_crt::CrtStorageClient;
use uuid::Uuid;

use crate::config::CdnConfig;
use crate::error::CdnError;
use crate::provider::{CdnObjectMetadata, CdnProvider, DeleteResult, UploadOptions, UploadResult};

/// Matches `{bucket}.s3.{region}.amazonaws.com/{key}` along with the legacy
/// `{bucket}.s3.amazonaws.com` and `{bucket}.s3-{region}.amazonaws.com` hosts.
const VIRTUAL_HOSTED_PATTERN: &str =
    r"^https?://(?P<bucket>[^/]+?)\.s3(?:[.-](?P<region>[a-z0-9-]+))?\.amazonaws\.com/(?P<key>.+)$";

/// Length of the random suffix in generated keys.
const KEY_SUFFIX_LEN: usize = 8;

/// CDN provider bound to one S3 bucket.
pub struct S3CdnProvider {
    client: Arc<dyn StorageClient>,
    bucket: String,
    region: String,
    /// Public URL prefix without a trailing `/`.
    base_url: Option<String>,
    url_pattern: Regex,
}

impl S3CdnProvider {
    /// Create a provider over an existing storage client.
    ///
    /// # Arguments
    /// * `client` - Storage client
    /// * `bucket` - Bucket name
    /// * `region` - Bucket region, used to build default URLs
    /// * `base_url` - Optional public URL prefix
    ///
    /// # Errors
    /// Returns `CdnError::Config` if the bucket or region is empty.
    pub fn new(
        client: Arc<dyn StorageClient>,
        bucket: impl Into<String>,
        region: impl Into<String>,
        base_url: Option<String>,
    ) -> Result<Self, CdnError> {
        let bucket: String = bucket.into();
        let region: String = region.into();
        if bucket.trim().is_empty() {
            return Err(CdnError::config("bucket is required"));
        }
        if region.trim().is_empty() {
            return Err(CdnError::config("region is required"));
        }

        let base_url: Option<String> = base_url
            .map(|url: String| url.trim_end_matches('/').to_string())
            .filter(|url: &String| !url.is_empty());
        let url_pattern: Regex =
            Regex::new(VIRTUAL_HOSTED_PATTERN).map_err(|e| CdnError::config(e.to_string()))?;

        Ok(Self {
            client,
            bucket,
            region,
            base_url,
            url_pattern,
        })
    }

    /// Create a provider with an AWS SDK client using the configured keys.
    ///
    /// # Errors
    /// Returns `CdnError::Config` if the configuration is incomplete.
    pub async fn from_config(config: CdnConfig) -> Result<Self, CdnError> {
        config.validate()?;
        let client: CrtStorageClient = CrtStorageClient::new(config.storage_settings())
            .await
            .map_err(|e: StorageError| CdnError::config(e.to_string()))?;
        Self::new(Arc::new(client), config.bucket, config.region, config.base_url)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Public URL for a key, with each key segment percent-encoded.
    pub fn url_for_key(&self, key: &str) -> String {
        let path: String = encode_key(key);
        match &self.base_url {
            Some(base) => format!("{}/{}", base, path),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, path
            ),
        }
    }

    /// Recover the key from a URL produced by this provider.
    ///
    /// Query strings and fragments are ignored and the path is decoded and
    /// normalized the same way an upload filename is. Returns `None` for URLs
    /// of other hosts or buckets, and for paths that are not valid keys.
    pub fn key_from_url(&self, url: &str) -> Option<String> {
        let url: &str = url
            .split(|c: char| c == '?' || c == '#')
            .next()
            .unwrap_or_default();

        let base_path: Option<&str> = self.base_url.as_ref().and_then(|base: &String| {
            url.strip_prefix(base.as_str())
                .and_then(|rest: &str| rest.strip_prefix('/'))
                .filter(|rest: &&str| !rest.is_empty())
        });
        let path: &str = match base_path {
            Some(path) => path,
            None => {
                let captures = self.url_pattern.captures(url)?;
                if &captures["bucket"] != self.bucket {
                    return None;
                }
                captures.name("key")?.as_str()
            }
        };

        let key: String = decode_key(path)?;
        normalize_file_key(&key).ok()
    }

    fn resolve_key(&self, url: &str) -> Result<String, CdnError> {
        self.key_from_url(url).ok_or_else(|| CdnError::InvalidUrl {
            url: url.to_string(),
        })
    }
}

/// Percent-encode each `/`-separated segment of a key.
fn encode_key(key: &str) -> String {
    key.split(KEY_SEPARATOR)
        .map(|segment: &str| urlencoding::encode(segment).into_owned())
        .collect::<Vec<String>>()
        .join("/")
}

/// Decode a URL path back into a key. `None` if it is not valid UTF-8.
fn decode_key(path: &str) -> Option<String> {
    urlencoding::decode(path).ok().map(|key| key.into_owned())
}

/// Generate a unique-enough object key: `{epoch_millis}-{random hex}`.
///
/// Not unguessable; collisions need two uploads in the same millisecond
/// drawing the same 32-bit suffix.
fn generate_key() -> String {
    let suffix: String = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}",
        Utc::now().timestamp_millis(),
        &suffix[..KEY_SUFFIX_LEN]
    )
}

fn to_cdn_metadata(meta: ObjectMetadata) -> CdnObjectMetadata {
    CdnObjectMetadata {
        size: meta.size,
        content_type: meta.content_type,
        last_modified: meta
            .last_modified
            .and_then(|secs: i64| DateTime::<Utc>::from_timestamp(secs, 0)),
        etag: meta.etag,
        metadata: meta.user_metadata,
    }
}

impl std::fmt::Debug for S3CdnProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3CdnProvider")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CdnProvider for S3CdnProvider {
    async fn upload(&self, data: &[u8], options: UploadOptions) -> Result<UploadResult, CdnError> {
        let key: String = match options.filename {
            Some(ref filename) => normalize_file_key(filename)?,
            None => generate_key(),
        };
        let content_type: &str = options
            .content_type
            .as_deref()
            .unwrap_or(DEFAULT_CONTENT_TYPE);
        let metadata: HashMap<String, String> = options.metadata.unwrap_or_default();

        self.client
            .put_object(
                &self.bucket,
                &key,
                data,
                Some(content_type),
                Some(&metadata).filter(|m| !m.is_empty()),
            )
            .await?;

        let url: String = self.url_for_key(&key);
        log::debug!("Uploaded {} bytes as {}", data.len(), url);
        Ok(UploadResult {
            url,
            id: key,
            metadata,
        })
    }

    async fn delete(&self, url: &str) -> DeleteResult {
        let key: String = match self.resolve_key(url) {
            Ok(key) => key,
            Err(err) => {
                log::warn!("CDN delete skipped: {}", err);
                return DeleteResult::failure(err.to_string());
            }
        };

        // S3 deletes of absent keys succeed silently.
        match self.client.head_object(&self.bucket, &key).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                log::debug!("CDN delete of missing object {}", key);
                return DeleteResult::failure(format!("Object not found: {}", key));
            }
            Err(err) => {
                log::warn!("CDN delete of {} failed: {}", key, err);
                return DeleteResult::failure(err.to_string());
            }
        }

        match self.client.delete_object(&self.bucket, &key).await {
            Ok(()) => DeleteResult::success(format!("Deleted {}", key)),
            Err(err) => {
                log::warn!("CDN delete of {} failed: {}", key, err);
                DeleteResult::failure(err.to_string())
            }
        }
    }

    async fn exists(&self, url: &str) -> bool {
        self.get_metadata(url).await.is_some()
    }

    async fn get_metadata(&self, url: &str) -> Option<CdnObjectMetadata> {
        let key: String = match self.resolve_key(url) {
            Ok(key) => key,
            Err(err) => {
                log::warn!("CDN lookup skipped: {}", err);
                return None;
            }
        };

        match self.client.head_object_with_metadata(&self.bucket, &key).await {
            Ok(meta) => meta.map(to_cdn_metadata),
            Err(err) => {
                log::warn!("CDN lookup of {} treated as absent: {}", key, err);
                None
            }
        }
    }
}
