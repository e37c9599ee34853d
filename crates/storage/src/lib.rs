//! Storage abstraction for the S3 providers.
//!
//! This crate provides a backend-agnostic interface over the object-store
//! primitives the providers need (head, put, get, delete, copy, paginated
//! list), plus the directory emulation built on top of them:
//!
//! - **`StorageClient`** - One async method per S3 primitive
//! - **`listing`** - Lazy child listing and directory inference over key prefixes
//! - **`MemoryStorageClient`** - In-process backend for tests and local hosts
//!
//! The AWS SDK backend lives in the `s3-providers-storage-crt` crate.

mod error;
pub mod listing;
pub mod memory;
mod traits;
mod types;

pub use error::StorageError;
pub use listing::{directory_exists, list_children, KeyFilter, ListOptions};
pub use memory::MemoryStorageClient;
pub use traits::StorageClient;
pub use types::{
    AwsCredentials, ListObjectsPage, ListObjectsRequest, ObjectInfo, ObjectMetadata,
    StorageSettings,
};
