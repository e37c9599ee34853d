//! S3-backed virtual filesystem provider.
//!
//! This crate exposes an S3 bucket through the generic filesystem contract:
//! - `FileSystemProvider` - The capability set hosts program against
//! - `S3FileSystem` - Implementation over any `StorageClient`
//! - `IgnoreFilter` - Glob patterns skipped by directory listings
//! - `FileSystemConfig` / `FileSystemRegistry` - Config-driven construction
//!
//! Directories are emulated over key prefixes. `chmod`, `watch`,
//! `execute_command`, `glob` and `grep` have no object-store equivalent and
//! always fail with `FsError::Unsupported`.

pub mod config;
pub mod error;
pub mod ignore;
pub mod provider;
pub mod registry;
pub mod s3;

// Re-export main types
pub use config::FileSystemConfig;
pub use error::FsError;
pub use ignore::IgnoreFilter;
pub use provider::{
    CopyOptions, CreateDirectoryOptions, DirectoryTreeOptions, Encoding, FileContents,
    FileSystemProvider, StatRecord,
};
pub use registry::FileSystemRegistry;
pub use s3::S3FileSystem;
