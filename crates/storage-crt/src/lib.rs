//! AWS SDK backend for the S3 providers.
//!
//! `CrtStorageClient` implements `StorageClient` on top of `aws-sdk-s3`.
//! Static credentials, custom endpoints and path-style addressing are taken
//! from `StorageSettings`, so S3-compatible stores work as well.
//!
//! ```ignore
//! use s3_providers_storage::StorageSettings;
//! use s3_providers_storage_crt::CrtStorageClient;
//!
//! let settings = StorageSettings {
//!     region: "eu-west-1".into(),
//!     endpoint_url: Some("http://localhost:9000".into()),
//!     force_path_style: true,
//!     ..Default::default()
//! };
//! let client = CrtStorageClient::new(settings).await?;
//! ```

mod client;
mod error;

pub use client::CrtStorageClient;
pub use error::CrtError;
