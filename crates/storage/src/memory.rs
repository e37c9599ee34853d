//! In-memory `StorageClient` implementation.
//!
//! Behaves like S3 for the operations the providers use: keys are kept in
//! lexicographic order, listings honor prefix, delimiter, `max_keys` and
//! continuation tokens, and deleting an absent key succeeds. The page size
//! can be lowered to exercise pagination.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

use crate::error::StorageError;
use crate::traits::StorageClient;
use crate::types::{ListObjectsPage, ListObjectsRequest, ObjectInfo, ObjectMetadata};

/// Default page size, matching the S3 `ListObjectsV2` limit.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Token prefix marking a resume-after-key position.
const TOKEN_KEY: &str = "k:";
/// Token prefix marking a resume-after-common-prefix position.
const TOKEN_PREFIX: &str = "p:";

/// A stored object.
#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    content_type: Option<String>,
    user_metadata: HashMap<String, String>,
    last_modified: i64,
    etag: String,
}

/// One listing entry before pagination.
enum ListEntry {
    Object(ObjectInfo),
    CommonPrefix(String),
}

/// Storage client that keeps objects in process memory.
#[derive(Debug)]
pub struct MemoryStorageClient {
    /// Objects keyed by `(bucket, key)`.
    buckets: RwLock<HashMap<String, BTreeMap<String, StoredObject>>>,
    /// Maximum entries per list page.
    page_size: usize,
    /// When set, every call fails with a retryable network error.
    unavailable: AtomicBool,
    /// Number of list requests served.
    list_calls: AtomicUsize,
}

impl Default for MemoryStorageClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorageClient {
    /// Create an empty store with the default page size.
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Create an empty store returning at most `page_size` entries per list page.
    ///
    /// # Arguments
    /// * `page_size` - Page size, clamped to at least 1
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            page_size: page_size.max(1),
            unavailable: AtomicBool::new(false),
            list_calls: AtomicUsize::new(0),
        }
    }

    /// Simulate an outage: all subsequent calls fail until reset.
    ///
    /// # Arguments
    /// * `unavailable` - Whether calls should fail
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of list requests served so far.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// All keys currently stored in a bucket, in order.
    ///
    /// # Arguments
    /// * `bucket` - Bucket name
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.read()
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, BTreeMap<String, StoredObject>>> {
        self.buckets
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, BTreeMap<String, StoredObject>>> {
        self.buckets
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::NetworkError {
                message: "memory store is unavailable".into(),
                retryable: true,
            });
        }
        Ok(())
    }

    /// Decide whether a key comes after the position encoded in a token.
    fn is_after_token(key: &str, token: Option<&str>) -> bool {
        match token {
            None => true,
            Some(token) => {
                if let Some(last_key) = token.strip_prefix(TOKEN_KEY) {
                    key > last_key
                } else if let Some(last_prefix) = token.strip_prefix(TOKEN_PREFIX) {
                    key > last_prefix && !key.starts_with(last_prefix)
                } else {
                    true
                }
            }
        }
    }
}

fn epoch_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Quoted content hash, stable across runs and toolchains.
fn compute_etag(data: &[u8]) -> String {
    let hash: u128 = xxhash_rust::xxh3::xxh3_128(data);
    format!("\"{:032x}\"", hash)
}

#[async_trait]
impl StorageClient for MemoryStorageClient {
    async fn head_object_with_metadata(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<ObjectMetadata>, StorageError> {
        self.check_available()?;
        let buckets = self.read();
        Ok(buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .map(|object| ObjectMetadata {
                size: object.data.len() as u64,
                last_modified: Some(object.last_modified),
                content_type: object.content_type.clone(),
                etag: Some(object.etag.clone()),
                user_metadata: object.user_metadata.clone(),
            }))
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
        content_type: Option<&str>,
        metadata: Option<&HashMap<String, String>>,
    ) -> Result<(), StorageError> {
        self.check_available()?;
        let object: StoredObject = StoredObject {
            data: data.to_vec(),
            content_type: content_type.map(str::to_string),
            user_metadata: metadata.cloned().unwrap_or_default(),
            last_modified: epoch_seconds(),
            etag: compute_etag(data),
        };
        self.write()
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), object);
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        self.check_available()?;
        self.read()
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .map(|object| object.data.clone())
            .ok_or_else(|| StorageError::not_found(bucket, key))
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.check_available()?;
        if let Some(objects) = self.write().get_mut(bucket) {
            objects.remove(key);
        }
        Ok(())
    }

    async fn copy_object(
        &self,
        bucket: &str,
        source_key: &str,
        destination_key: &str,
    ) -> Result<(), StorageError> {
        self.check_available()?;
        let mut buckets = self.write();
        let objects: &mut BTreeMap<String, StoredObject> =
            buckets.entry(bucket.to_string()).or_default();
        let mut object: StoredObject = objects
            .get(source_key)
            .cloned()
            .ok_or_else(|| StorageError::not_found(bucket, source_key))?;
        object.last_modified = epoch_seconds();
        objects.insert(destination_key.to_string(), object);
        Ok(())
    }

    async fn list_objects_page(
        &self,
        bucket: &str,
        request: &ListObjectsRequest,
    ) -> Result<ListObjectsPage, StorageError> {
        self.check_available()?;
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let limit: usize = request
            .max_keys
            .map(|max| max.max(0) as usize)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(self.page_size);
        let token: Option<&str> = request.continuation_token.as_deref();

        let buckets = self.read();
        let Some(objects) = buckets.get(bucket) else {
            return Ok(ListObjectsPage::default());
        };

        let mut entries: Vec<ListEntry> = Vec::new();
        let mut more: bool = false;

        for (key, object) in objects.range(request.prefix.clone()..) {
            if !key.starts_with(&request.prefix) {
                break;
            }
            if !Self::is_after_token(key, token) {
                continue;
            }

            let grouped: Option<String> = request.delimiter.as_deref().and_then(|delimiter| {
                let rest: &str = &key[request.prefix.len()..];
                rest.find(delimiter).map(|index| {
                    format!("{}{}", request.prefix, &rest[..index + delimiter.len()])
                })
            });

            if let Some(common) = &grouped {
                if let Some(ListEntry::CommonPrefix(last)) = entries.last() {
                    if last == common {
                        continue;
                    }
                }
            }

            if entries.len() >= limit {
                more = true;
                break;
            }

            match grouped {
                Some(common) => entries.push(ListEntry::CommonPrefix(common)),
                None => entries.push(ListEntry::Object(ObjectInfo {
                    key: key.clone(),
                    size: object.data.len() as u64,
                    last_modified: Some(object.last_modified),
                    etag: Some(object.etag.clone()),
                })),
            }
        }

        let next_continuation_token: Option<String> = if more {
            entries.last().map(|entry| match entry {
                ListEntry::Object(info) => format!("{}{}", TOKEN_KEY, info.key),
                ListEntry::CommonPrefix(prefix) => format!("{}{}", TOKEN_PREFIX, prefix),
            })
        } else {
            None
        };

        let mut page: ListObjectsPage = ListObjectsPage {
            next_continuation_token,
            ..Default::default()
        };
        for entry in entries {
            match entry {
                ListEntry::Object(info) => page.objects.push(info),
                ListEntry::CommonPrefix(prefix) => page.common_prefixes.push(prefix),
            }
        }

        Ok(page)
    }
}
