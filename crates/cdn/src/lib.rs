//! S3-backed content-delivery provider.
//!
//! This crate exposes an S3 bucket through the generic CDN contract:
//! - `CdnProvider` - Upload plus URL-addressed delete, exists and metadata
//! - `S3CdnProvider` - Implementation over any `StorageClient`
//! - `CdnConfig` / `CdnRegistry` - Config-driven construction
//!
//! Only `upload` returns errors. The URL-addressed operations treat the
//! store as advisory and fold failures into `false`, `None` or a failed
//! `DeleteResult`, logging the cause.

pub mod config;
pub mod error;
pub mod provider;
pub mod registry;
pub mod s3;

pub use config::CdnConfig;
pub use error::CdnError;
pub use provider::{CdnObjectMetadata, CdnProvider, DeleteResult, UploadOptions, UploadResult};
pub use registry::CdnRegistry;
pub use s3::S3CdnProvider;
