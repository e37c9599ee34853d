//! S3-backed filesystem provider.
//!
//! Maps the generic filesystem contract onto object-store primitives. Paths
//! are normalized to keys relative to the bucket root; directories are
//! emulated with key prefixes and zero-byte `key/` marker objects.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use s3_providers_common::{directory_prefix, normalize_file_key, normalize_key};
use s3_providers_storage::{
    directory_exists, list_children, KeyFilter, ListOptions, ObjectMetadata, StorageClient,
    StorageError,
};
use s3_providers_storage_crt::CrtStorageClient;

use crate::config::FileSystemConfig;
use crate::error::FsError;
use crate::provider::{
    CopyOptions, CreateDirectoryOptions, DirectoryTreeOptions, Encoding, FileContents,
    FileSystemProvider, StatRecord,
};

/// Filesystem provider bound to one S3 bucket.
///
/// The bucket and client are fixed at construction.
pub struct S3FileSystem {
    /// Object-store client, shared with any other provider built from it.
    client: Arc<dyn StorageClient>,
    /// Bucket all keys live in.
    bucket: String,
}

impl S3FileSystem {
    /// Create a provider over an existing storage client.
    ///
    /// # Arguments
    /// * `client` - Storage client
    /// * `bucket` - Bucket name
    ///
    /// # Errors
    /// Returns `FsError::Config` if the bucket name is empty.
    pub fn new(client: Arc<dyn StorageClient>, bucket: impl Into<String>) -> Result<Self, FsError> {
        let bucket: String = bucket.into();
        if bucket.trim().is_empty() {
            return Err(FsError::config("bucket is required"));
        }
        Ok(Self { client, bucket })
    }

    /// Create a provider with an AWS SDK client built from configuration.
    ///
    /// # Arguments
    /// * `config` - Provider configuration
    ///
    /// # Errors
    /// Returns `FsError::Config` if the configuration is incomplete.
    pub async fn from_config(config: FileSystemConfig) -> Result<Self, FsError> {
        config.validate()?;
        let client: CrtStorageClient = CrtStorageClient::new(config.client_config.unwrap_or_default())
            .await
            .map_err(|e: StorageError| FsError::config(e.to_string()))?;
        Self::new(Arc::new(client), config.bucket)
    }

    /// The bucket this provider is bound to.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn absolute_path(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }

    fn file_record(&self, key: String, meta: ObjectMetadata) -> StatRecord {
        let modified: Option<SystemTime> = meta
            .last_modified
            .and_then(|secs: i64| u64::try_from(secs).ok())
            .map(|secs: u64| UNIX_EPOCH + Duration::from_secs(secs));

        StatRecord {
            absolute_path: self.absolute_path(&key),
            path: key,
            is_file: true,
            is_directory: false,
            is_symbolic_link: false,
            size: meta.size,
            modified,
            created: modified,
            accessed: modified,
        }
    }

    fn directory_record(&self, key: String) -> StatRecord {
        StatRecord {
            absolute_path: self.absolute_path(&directory_prefix(&key)),
            path: key,
            is_file: false,
            is_directory: true,
            is_symbolic_link: false,
            size: 0,
            modified: None,
            created: None,
            accessed: None,
        }
    }
}

impl std::fmt::Debug for S3FileSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3FileSystem")
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl FileSystemProvider for S3FileSystem {
    async fn write_file(&self, path: &str, content: &[u8]) -> Result<(), FsError> {
        let key: String = normalize_file_key(path)?;
        self.client
            .put_object(&self.bucket, &key, content, None, None)
            .await?;
        log::debug!("Wrote {} bytes to {}", content.len(), self.absolute_path(&key));
        Ok(())
    }

    async fn append_file(&self, path: &str, content: &[u8]) -> Result<(), FsError> {
        let key: String = normalize_file_key(path)?;

        let mut data: Vec<u8> = match self.client.get_object(&self.bucket, &key).await {
            Ok(existing) => existing,
            Err(err) if err.is_not_found() => {
                log::debug!("Append target {} missing, creating it", key);
                Vec::new()
            }
            Err(err) => return Err(err.into()),
        };
        data.extend_from_slice(content);

        self.client
            .put_object(&self.bucket, &key, &data, None, None)
            .await?;
        Ok(())
    }

    async fn read_file(&self, path: &str, encoding: Encoding) -> Result<FileContents, FsError> {
        let key: String = normalize_file_key(path)?;
        let data: Vec<u8> = self.client.get_object(&self.bucket, &key).await?;
        encoding.decode(&key, data)
    }

    async fn delete_file(&self, path: &str) -> Result<(), FsError> {
        let key: String = normalize_file_key(path)?;

        // S3 deletes of absent keys succeed silently.
        if self.client.head_object(&self.bucket, &key).await?.is_none() {
            return Err(FsError::NotFound { path: key });
        }

        self.client.delete_object(&self.bucket, &key).await?;
        log::debug!("Deleted {}", self.absolute_path(&key));
        Ok(())
    }

    async fn exists(&self, path: &str) -> bool {
        let key: String = match normalize_key(path) {
            Ok(key) => key,
            Err(err) => {
                log::warn!("exists({}) rejected: {}", path, err);
                return false;
            }
        };
        if key.is_empty() {
            return true;
        }

        match self.client.head_object(&self.bucket, &key).await {
            Ok(size) => size.is_some(),
            Err(err) => {
                log::warn!("exists({}) treated as absent: {}", path, err);
                false
            }
        }
    }

    async fn stat(&self, path: &str) -> Result<StatRecord, FsError> {
        let key: String = normalize_key(path)?;
        if key.is_empty() {
            return Ok(self.directory_record(key));
        }

        if let Some(meta) = self
            .client
            .head_object_with_metadata(&self.bucket, &key)
            .await?
        {
            return Ok(self.file_record(key, meta));
        }

        if directory_exists(self.client.as_ref(), &self.bucket, &key).await? {
            return Ok(self.directory_record(key));
        }

        Err(FsError::NotFound { path: key })
    }

    async fn copy(
        &self,
        source: &str,
        destination: &str,
        options: CopyOptions,
    ) -> Result<(), FsError> {
        let source_key: String = normalize_file_key(source)?;
        let destination_key: String = normalize_file_key(destination)?;

        if !options.overwrite && self.exists(&destination_key).await {
            return Err(FsError::AlreadyExists {
                path: destination_key,
            });
        }

        self.client
            .copy_object(&self.bucket, &source_key, &destination_key)
            .await?;
        log::debug!("Copied {} to {}", source_key, destination_key);
        Ok(())
    }

    async fn rename(&self, old_path: &str, new_path: &str) -> Result<(), FsError> {
        let old_key: String = normalize_file_key(old_path)?;
        let new_key: String = normalize_file_key(new_path)?;

        // Copy-then-delete onto the same key would remove the only copy.
        if old_key == new_key {
            return match self.client.head_object(&self.bucket, &old_key).await? {
                Some(_) => Ok(()),
                None => Err(FsError::NotFound { path: old_key }),
            };
        }

        self.copy(&old_key, &new_key, CopyOptions::overwrite())
            .await?;
        // A failure here leaves both keys present.
        self.client.delete_object(&self.bucket, &old_key).await?;
        Ok(())
    }

    async fn create_directory(
        &self,
        path: &str,
        _options: CreateDirectoryOptions,
    ) -> Result<(), FsError> {
        let key: String = normalize_key(path)?;
        if key.is_empty() {
            return Ok(());
        }

        match self.stat(&key).await {
            Ok(record) if record.is_directory => return Ok(()),
            Ok(_) => {}
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(err),
        }

        let marker: String = directory_prefix(&key);
        self.client
            .put_object(&self.bucket, &marker, &[], None, None)
            .await?;
        log::debug!("Created directory marker {}", self.absolute_path(&marker));
        Ok(())
    }

    fn get_directory_tree<'a>(
        &'a self,
        path: &str,
        options: &'a DirectoryTreeOptions,
    ) -> BoxStream<'a, Result<String, FsError>> {
        let key: String = match normalize_key(path) {
            Ok(key) => key,
            Err(err) => return stream::once(async move { Err(FsError::from(err)) }).boxed(),
        };

        let list_options: ListOptions<'a> = ListOptions {
            recursive: options.recursive,
            ignore: options
                .ignore
                .as_ref()
                .map(|filter| filter as &dyn KeyFilter),
        };

        list_children(self.client.as_ref(), &self.bucket, &key, list_options)
            .map_err(FsError::from)
            .boxed()
    }

    async fn chmod(&self, _path: &str, _mode: u32) -> Result<(), FsError> {
        Err(FsError::Unsupported { operation: "chmod" })
    }

    async fn watch(&self, _path: &str) -> Result<(), FsError> {
        Err(FsError::Unsupported { operation: "watch" })
    }

    async fn execute_command(&self, _command: &str) -> Result<String, FsError> {
        Err(FsError::Unsupported {
            operation: "executeCommand",
        })
    }

    async fn glob(&self, _pattern: &str) -> Result<Vec<String>, FsError> {
        Err(FsError::Unsupported { operation: "glob" })
    }

    async fn grep(&self, _pattern: &str, _path: &str) -> Result<Vec<String>, FsError> {
        Err(FsError::Unsupported { operation: "grep" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use s3_providers_storage::MemoryStorageClient;

    const BUCKET: &str = "test-bucket";

    fn create_fs() -> (S3FileSystem, Arc<MemoryStorageClient>) {
        let client: Arc<MemoryStorageClient> = Arc::new(MemoryStorageClient::new());
        let fs: S3FileSystem = S3FileSystem::new(client.clone(), BUCKET).unwrap();
        (fs, client)
    }

    #[test]
    fn test_new_rejects_empty_bucket() {
        let client: Arc<MemoryStorageClient> = Arc::new(MemoryStorageClient::new());
        let err: FsError = S3FileSystem::new(client, " ").unwrap_err();
        assert_eq!(err.to_string(), "Invalid filesystem configuration: bucket is required");
    }

    #[tokio::test]
    async fn test_write_read_text_round_trip() {
        let (fs, _) = create_fs();
        fs.write_file("notes/a.txt", "héllo".as_bytes()).await.unwrap();
        let contents: FileContents = fs.read_file("notes/a.txt", Encoding::Utf8).await.unwrap();
        assert_eq!(contents, FileContents::Text("héllo".into()));
    }

    #[tokio::test]
    async fn test_write_read_binary_round_trip() {
        let (fs, _) = create_fs();
        let data: Vec<u8> = vec![0, 159, 146, 150, 255];
        fs.write_file("/bin/blob", &data).await.unwrap();
        let contents: FileContents = fs.read_file("bin/blob", Encoding::Binary).await.unwrap();
        assert_eq!(contents, FileContents::Bytes(data));
    }

    #[tokio::test]
    async fn test_write_normalizes_key() {
        let (fs, client) = create_fs();
        fs.write_file(r"\notes\.\sub\..\a.txt", b"x").await.unwrap();
        assert_eq!(client.keys(BUCKET), vec!["notes/a.txt"]);
    }

    #[tokio::test]
    async fn test_write_rejects_root_and_traversal() {
        let (fs, client) = create_fs();
        assert!(matches!(
            fs.write_file("/", b"x").await,
            Err(FsError::InvalidPath { .. })
        ));
        assert!(matches!(
            fs.write_file("../escape.txt", b"x").await,
            Err(FsError::PathTraversal { .. })
        ));
        assert!(client.keys(BUCKET).is_empty());
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let (fs, _) = create_fs();
        let err: FsError = fs.read_file("missing.txt", Encoding::Utf8).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_append_creates_then_extends() {
        let (fs, _) = create_fs();
        fs.append_file("log.txt", b"one\n").await.unwrap();
        fs.append_file("log.txt", b"two\n").await.unwrap();
        let contents: FileContents = fs.read_file("log.txt", Encoding::Utf8).await.unwrap();
        assert_eq!(contents.as_text(), Some("one\ntwo\n"));
    }

    #[tokio::test]
    async fn test_append_propagates_store_failure() {
        let (fs, client) = create_fs();
        client.set_unavailable(true);
        let err: FsError = fs.append_file("log.txt", b"x").await.unwrap_err();
        assert!(matches!(err, FsError::Storage(_)));
    }

    #[tokio::test]
    async fn test_exists_tracks_write_and_delete() {
        let (fs, _) = create_fs();
        assert!(!fs.exists("a.txt").await);
        fs.write_file("a.txt", b"x").await.unwrap();
        assert!(fs.exists("a.txt").await);
        fs.delete_file("a.txt").await.unwrap();
        assert!(!fs.exists("a.txt").await);
    }

    #[tokio::test]
    async fn test_exists_never_fails() {
        let (fs, client) = create_fs();
        fs.write_file("a.txt", b"x").await.unwrap();
        client.set_unavailable(true);
        assert!(!fs.exists("a.txt").await);
        assert!(!fs.exists("../outside").await);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let (fs, _) = create_fs();
        let err: FsError = fs.delete_file("missing.txt").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_root_rejected_before_store_call() {
        let (fs, client) = create_fs();
        client.set_unavailable(true);
        let err: FsError = fs.delete_file("").await.unwrap_err();
        assert!(matches!(err, FsError::InvalidPath { .. }));
    }

    #[tokio::test]
    async fn test_stat_file() {
        let (fs, _) = create_fs();
        fs.write_file("notes/a.txt", b"hi").await.unwrap();
        let record: StatRecord = fs.stat("notes/a.txt").await.unwrap();
        assert!(record.is_file);
        assert!(!record.is_directory);
        assert!(!record.is_symbolic_link);
        assert_eq!(record.size, 2);
        assert_eq!(record.path, "notes/a.txt");
        assert_eq!(record.absolute_path, "s3://test-bucket/notes/a.txt");
        assert!(record.modified.is_some());
        assert_eq!(record.created, record.modified);
        assert_eq!(record.accessed, record.modified);
    }

    #[tokio::test]
    async fn test_stat_directory_from_descendant() {
        let (fs, _) = create_fs();
        fs.write_file("notes/deep/a.txt", b"hi").await.unwrap();
        for path in ["notes", "notes/", "notes/deep"] {
            let record: StatRecord = fs.stat(path).await.unwrap();
            assert!(record.is_directory, "{} should be a directory", path);
            assert!(!record.is_file);
            assert_eq!(record.size, 0);
            assert!(record.modified.is_none());
        }
    }

    #[tokio::test]
    async fn test_stat_root_and_missing() {
        let (fs, _) = create_fs();
        assert!(fs.stat("/").await.unwrap().is_directory);
        assert!(fs.stat("nothing").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_copy_respects_overwrite() {
        let (fs, _) = create_fs();
        fs.write_file("src.txt", b"new").await.unwrap();
        fs.write_file("dst.txt", b"old").await.unwrap();

        let err: FsError = fs
            .copy("src.txt", "dst.txt", CopyOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FsError::AlreadyExists { .. }));
        let contents: FileContents = fs.read_file("dst.txt", Encoding::Utf8).await.unwrap();
        assert_eq!(contents.as_text(), Some("old"));

        fs.copy("src.txt", "dst.txt", CopyOptions::overwrite())
            .await
            .unwrap();
        let contents: FileContents = fs.read_file("dst.txt", Encoding::Utf8).await.unwrap();
        assert_eq!(contents.as_text(), Some("new"));
        assert!(fs.exists("src.txt").await);
    }

    #[tokio::test]
    async fn test_copy_missing_source() {
        let (fs, _) = create_fs();
        let err: FsError = fs
            .copy("missing.txt", "dst.txt", CopyOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_rename_moves_object() {
        let (fs, client) = create_fs();
        fs.write_file("old.txt", b"data").await.unwrap();
        fs.write_file("new.txt", b"stale").await.unwrap();
        fs.rename("old.txt", "new.txt").await.unwrap();
        assert_eq!(client.keys(BUCKET), vec!["new.txt"]);
        let contents: FileContents = fs.read_file("new.txt", Encoding::Utf8).await.unwrap();
        assert_eq!(contents.as_text(), Some("data"));
    }

    #[tokio::test]
    async fn test_rename_onto_same_key_keeps_object() {
        let (fs, client) = create_fs();
        fs.write_file("a.txt", b"data").await.unwrap();
        fs.rename("a.txt", "./a.txt").await.unwrap();
        fs.rename("/a.txt", r"sub\..\a.txt").await.unwrap();
        assert_eq!(client.keys(BUCKET), vec!["a.txt"]);
        assert!(fs.exists("a.txt").await);
        let contents: FileContents = fs.read_file("a.txt", Encoding::Utf8).await.unwrap();
        assert_eq!(contents.as_text(), Some("data"));
    }

    #[tokio::test]
    async fn test_rename_missing_onto_itself_is_not_found() {
        let (fs, _) = create_fs();
        let err: FsError = fs.rename("ghost.txt", "./ghost.txt").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_create_directory_writes_marker_once() {
        let (fs, client) = create_fs();
        fs.create_directory("photos", CreateDirectoryOptions::default())
            .await
            .unwrap();
        assert_eq!(client.keys(BUCKET), vec!["photos/"]);
        assert!(fs.stat("photos").await.unwrap().is_directory);

        // Already present: no second write, no error.
        fs.create_directory("photos/", CreateDirectoryOptions { recursive: true })
            .await
            .unwrap();
        assert_eq!(client.keys(BUCKET), vec!["photos/"]);
    }

    #[tokio::test]
    async fn test_create_directory_implicit_is_noop() {
        let (fs, client) = create_fs();
        fs.write_file("docs/readme.md", b"x").await.unwrap();
        fs.create_directory("docs", CreateDirectoryOptions::default())
            .await
            .unwrap();
        assert_eq!(client.keys(BUCKET), vec!["docs/readme.md"]);
    }

    #[tokio::test]
    async fn test_directory_tree_shallow_and_recursive() {
        let (fs, _) = create_fs();
        fs.write_file("notes/a.txt", b"1").await.unwrap();
        fs.write_file("notes/sub/b.txt", b"2").await.unwrap();

        let shallow: Vec<String> = fs
            .get_directory_tree("notes", &DirectoryTreeOptions::default())
            .try_collect()
            .await
            .unwrap();
        assert_eq!(shallow, vec!["notes/a.txt"]);

        let options: DirectoryTreeOptions = DirectoryTreeOptions::recursive();
        let deep: Vec<String> = fs
            .get_directory_tree("notes", &options)
            .try_collect()
            .await
            .unwrap();
        assert_eq!(deep, vec!["notes/a.txt", "notes/sub/b.txt"]);
    }

    #[tokio::test]
    async fn test_directory_tree_traversal_error() {
        let (fs, _) = create_fs();
        let options: DirectoryTreeOptions = DirectoryTreeOptions::default();
        let result: Result<Vec<String>, FsError> = fs
            .get_directory_tree("../up", &options)
            .try_collect()
            .await;
        assert!(matches!(result, Err(FsError::PathTraversal { .. })));
    }

    #[tokio::test]
    async fn test_unsupported_operations() {
        let (fs, _) = create_fs();
        assert!(matches!(
            fs.chmod("a", 0o644).await,
            Err(FsError::Unsupported { operation: "chmod" })
        ));
        assert!(matches!(
            fs.watch("a").await,
            Err(FsError::Unsupported { operation: "watch" })
        ));
        assert!(matches!(
            fs.execute_command("ls").await,
            Err(FsError::Unsupported { .. })
        ));
        assert!(matches!(
            fs.glob("*.txt").await,
            Err(FsError::Unsupported { operation: "glob" })
        ));
        assert!(matches!(
            fs.grep("needle", "a").await,
            Err(FsError::Unsupported { operation: "grep" })
        ));
    }
}
