//! Directory emulation over the flat S3 key namespace.
//!
//! S3 has no directories, only keys. A "directory" is a prefix ending in
//! `/`, optionally backed by a zero-byte marker object at exactly that key.
//! This module lists the children of such a prefix as a lazy stream that
//! issues one paginated list call per page, and infers whether a prefix
//! exists as a directory.

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use s3_providers_common::{directory_prefix, relative_to_prefix, KEY_SEPARATOR};

use crate::error::StorageError;
use crate::traits::StorageClient;
use crate::types::{ListObjectsPage, ListObjectsRequest, ObjectInfo};

/// Decides which listed keys to drop.
pub trait KeyFilter: Send + Sync {
    /// Check whether a key should be skipped.
    ///
    /// # Arguments
    /// * `relative_path` - Key relative to the listed prefix
    fn is_ignored(&self, relative_path: &str) -> bool;
}

/// Options for [`list_children`].
#[derive(Clone, Copy, Default)]
pub struct ListOptions<'a> {
    /// Include keys nested below the immediate children.
    pub recursive: bool,
    /// Optional filter; matching keys are skipped.
    pub ignore: Option<&'a dyn KeyFilter>,
}

impl<'a> ListOptions<'a> {
    /// Options listing only the immediate children.
    pub fn shallow() -> Self {
        Self::default()
    }

    /// Options listing every descendant.
    pub fn recursive() -> Self {
        Self {
            recursive: true,
            ignore: None,
        }
    }

    /// Attach an ignore filter.
    pub fn with_ignore(mut self, ignore: &'a dyn KeyFilter) -> Self {
        self.ignore = Some(ignore);
        self
    }
}

/// Pagination state carried between pages.
enum Cursor {
    Start,
    Next(String),
    Done,
}

/// List the keys below a directory key.
///
/// The returned stream fetches pages on demand. Keys are yielded in the
/// order the store returns them within each page; no global sort is applied.
/// The stream cannot be rewound; call again to restart from the first page.
///
/// # Arguments
/// * `client` - Storage client
/// * `bucket` - Bucket name
/// * `key` - Normalized directory key (empty for the bucket root)
/// * `options` - Recursion and ignore settings
///
/// # Returns
/// A stream of absolute keys.
pub fn list_children<'a>(
    client: &'a dyn StorageClient,
    bucket: &'a str,
    key: &str,
    options: ListOptions<'a>,
) -> BoxStream<'a, Result<String, StorageError>> {
    let prefix: String = directory_prefix(key);

    stream::try_unfold(Cursor::Start, move |cursor: Cursor| {
        fetch_page(client, bucket, prefix.clone(), cursor, options)
    })
    .map_ok(|keys: Vec<String>| stream::iter(keys.into_iter().map(Ok::<String, StorageError>)))
    .try_flatten()
    .boxed()
}

/// Fetch and filter the page at `cursor`, returning the keys and the next cursor.
async fn fetch_page(
    client: &dyn StorageClient,
    bucket: &str,
    prefix: String,
    cursor: Cursor,
    options: ListOptions<'_>,
) -> Result<Option<(Vec<String>, Cursor)>, StorageError> {
    let token: Option<String> = match cursor {
        Cursor::Done => return Ok(None),
        Cursor::Start => None,
        Cursor::Next(token) => Some(token),
    };

    let request: ListObjectsRequest =
        ListObjectsRequest::new(prefix.as_str()).with_continuation_token(token);
    let page: ListObjectsPage = client.list_objects_page(bucket, &request).await?;
    log::debug!(
        "Listed {} objects under s3://{}/{}",
        page.objects.len(),
        bucket,
        prefix
    );

    let keys: Vec<String> = filter_children(&prefix, page.objects, options);
    let next: Cursor = match page.next_continuation_token {
        Some(token) => Cursor::Next(token),
        None => Cursor::Done,
    };
    Ok(Some((keys, next)))
}

/// Apply the child selection rules to one page of objects.
fn filter_children(prefix: &str, objects: Vec<ObjectInfo>, options: ListOptions<'_>) -> Vec<String> {
    objects
        .into_iter()
        .filter_map(|object: ObjectInfo| {
            // The directory's own marker object.
            if object.key == prefix && object.key.ends_with(KEY_SEPARATOR) {
                return None;
            }

            let relative: &str = relative_to_prefix(&object.key, prefix)?;
            if !options.recursive && relative.contains(KEY_SEPARATOR) {
                return None;
            }
            if let Some(filter) = options.ignore {
                if filter.is_ignored(relative) {
                    return None;
                }
            }
            Some(object.key)
        })
        .collect()
}

/// Infer whether a key names a directory.
///
/// The root always exists. Otherwise the directory exists if at least one
/// object or common prefix lives under `key/`.
///
/// # Arguments
/// * `client` - Storage client
/// * `bucket` - Bucket name
/// * `key` - Normalized key
pub async fn directory_exists(
    client: &dyn StorageClient,
    bucket: &str,
    key: &str,
) -> Result<bool, StorageError> {
    let prefix: String = directory_prefix(key);
    if prefix.is_empty() {
        return Ok(true);
    }

    let request: ListObjectsRequest = ListObjectsRequest::new(prefix)
        .with_delimiter(KEY_SEPARATOR.to_string())
        .with_max_keys(1);
    let page: ListObjectsPage = client.list_objects_page(bucket, &request).await?;
    Ok(!page.is_empty())
}
