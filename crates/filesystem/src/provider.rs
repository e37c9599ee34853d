//! Generic filesystem provider contract.
//!
//! Hosts program against [`FileSystemProvider`] and never against a concrete
//! backend. The S3 implementation lives in [`crate::s3`].

use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

use async_trait::async_trait;
use base64::Engine;
use futures::stream::BoxStream;

use crate::error::FsError;
use crate::ignore::IgnoreFilter;

/// Encoding used when reading a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// UTF-8 text; invalid sequences are an error.
    #[default]
    Utf8,
    /// ISO-8859-1 text; every byte maps to one char.
    Latin1,
    /// Standard base64 text.
    Base64,
    /// Lowercase hex text.
    Hex,
    /// Raw bytes.
    Binary,
}

impl Encoding {
    /// Canonical name of the encoding.
    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf8",
            Encoding::Latin1 => "latin1",
            Encoding::Base64 => "base64",
            Encoding::Hex => "hex",
            Encoding::Binary => "binary",
        }
    }

    /// Decode raw object bytes.
    ///
    /// # Arguments
    /// * `path` - Path being read, for error context
    /// * `data` - Object body
    ///
    /// # Errors
    /// Returns `FsError::Decode` if the bytes are not valid UTF-8 under `Utf8`.
    pub fn decode(&self, path: &str, data: Vec<u8>) -> Result<FileContents, FsError> {
        let text: String = match self {
            Encoding::Binary => return Ok(FileContents::Bytes(data)),
            Encoding::Utf8 => String::from_utf8(data).map_err(|e| FsError::Decode {
                path: path.to_string(),
                encoding: self.name().to_string(),
                reason: e.utf8_error().to_string(),
            })?,
            Encoding::Latin1 => data.iter().map(|&byte| byte as char).collect(),
            Encoding::Base64 => base64::engine::general_purpose::STANDARD.encode(&data),
            Encoding::Hex => hex::encode(&data),
        };
        Ok(FileContents::Text(text))
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Encoding::Utf8),
            "latin1" | "binary-string" | "iso-8859-1" => Ok(Encoding::Latin1),
            "base64" => Ok(Encoding::Base64),
            "hex" => Ok(Encoding::Hex),
            "binary" | "buffer" | "bytes" => Ok(Encoding::Binary),
            _ => Err(FsError::UnknownEncoding {
                name: s.to_string(),
            }),
        }
    }
}

/// Result of [`FileSystemProvider::read_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContents {
    /// Decoded text.
    Text(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
}

impl FileContents {
    /// Borrow the text, if this is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FileContents::Text(text) => Some(text),
            FileContents::Bytes(_) => None,
        }
    }

    /// Consume into raw bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            FileContents::Text(text) => text.into_bytes(),
            FileContents::Bytes(bytes) => bytes,
        }
    }
}

/// File attributes computed on demand by `stat`.
///
/// Object stores only track a last-modified time, so `created` and
/// `accessed` mirror `modified`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatRecord {
    /// Normalized key.
    pub path: String,
    /// Fully qualified location (`s3://bucket/key`).
    pub absolute_path: String,
    pub is_file: bool,
    pub is_directory: bool,
    /// Always false; object stores have no links.
    pub is_symbolic_link: bool,
    /// Size in bytes (0 for directories).
    pub size: u64,
    pub modified: Option<SystemTime>,
    pub created: Option<SystemTime>,
    pub accessed: Option<SystemTime>,
}

/// Options for [`FileSystemProvider::copy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyOptions {
    /// Replace an existing destination.
    pub overwrite: bool,
}

impl CopyOptions {
    /// Options that replace an existing destination.
    pub fn overwrite() -> Self {
        Self { overwrite: true }
    }
}

/// Options for [`FileSystemProvider::create_directory`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateDirectoryOptions {
    /// Accepted for contract compatibility. Ancestors always exist
    /// implicitly in a prefix namespace.
    pub recursive: bool,
}

/// Options for [`FileSystemProvider::get_directory_tree`].
#[derive(Debug, Clone, Default)]
pub struct DirectoryTreeOptions {
    /// Include nested keys, not just immediate children.
    pub recursive: bool,
    /// Keys matching this filter are skipped.
    pub ignore: Option<IgnoreFilter>,
}

impl DirectoryTreeOptions {
    /// Options listing every descendant.
    pub fn recursive() -> Self {
        Self {
            recursive: true,
            ignore: None,
        }
    }

    /// Attach an ignore filter.
    ///
    /// # Arguments
    /// * `ignore` - Filter applied to keys relative to the listed directory
    pub fn with_ignore(mut self, ignore: IgnoreFilter) -> Self {
        self.ignore = Some(ignore);
        self
    }
}

/// Capability set every filesystem backend exposes to the host.
///
/// Composite operations (`append_file`, `copy` without overwrite, `rename`,
/// `create_directory`) are short sequences of independent requests with no
/// isolation between them.
#[async_trait]
pub trait FileSystemProvider: Send + Sync {
    /// Create or replace a file.
    async fn write_file(&self, path: &str, content: &[u8]) -> Result<(), FsError>;

    /// Append to a file, creating it if absent. Not atomic.
    async fn append_file(&self, path: &str, content: &[u8]) -> Result<(), FsError>;

    /// Read a file with the given encoding.
    async fn read_file(&self, path: &str, encoding: Encoding) -> Result<FileContents, FsError>;

    /// Delete a file.
    async fn delete_file(&self, path: &str) -> Result<(), FsError>;

    /// Advisory existence check. Never fails; errors count as absent.
    async fn exists(&self, path: &str) -> bool;

    /// Describe a file or directory.
    async fn stat(&self, path: &str) -> Result<StatRecord, FsError>;

    /// Copy a file.
    async fn copy(&self, source: &str, destination: &str, options: CopyOptions)
        -> Result<(), FsError>;

    /// Move a file. Not atomic.
    async fn rename(&self, old_path: &str, new_path: &str) -> Result<(), FsError>;

    /// Create a directory.
    async fn create_directory(
        &self,
        path: &str,
        options: CreateDirectoryOptions,
    ) -> Result<(), FsError>;

    /// Lazily list the keys below a directory.
    fn get_directory_tree<'a>(
        &'a self,
        path: &str,
        options: &'a DirectoryTreeOptions,
    ) -> BoxStream<'a, Result<String, FsError>>;

    /// Change permission bits.
    async fn chmod(&self, path: &str, mode: u32) -> Result<(), FsError>;

    /// Watch a path for changes.
    async fn watch(&self, path: &str) -> Result<(), FsError>;

    /// Run a command on the backing host.
    async fn execute_command(&self, command: &str) -> Result<String, FsError>;

    /// Find paths matching a glob pattern.
    async fn glob(&self, pattern: &str) -> Result<Vec<String>, FsError>;

    /// Search file contents.
    async fn grep(&self, pattern: &str, path: &str) -> Result<Vec<String>, FsError>;
}
