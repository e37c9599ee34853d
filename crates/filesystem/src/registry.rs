//! Named filesystem provider registry.
//!
//! A host loads a configuration map keyed by provider name; each entry is
//! deserialized and validated before its provider is constructed.

use std::collections::BTreeMap;
use std::sync::Arc;

use s3_providers_storage::StorageClient;
use serde_json::{Map, Value};

use crate::config::FileSystemConfig;
use crate::error::FsError;
use crate::provider::FileSystemProvider;
use crate::s3::S3FileSystem;

/// Filesystem providers by name.
#[derive(Default, Clone)]
pub struct FileSystemRegistry {
    providers: BTreeMap<String, Arc<dyn FileSystemProvider>>,
}

impl FileSystemRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build S3 providers from a configuration map, each with its own SDK client.
    ///
    /// # Arguments
    /// * `configs` - Provider name to configuration object
    ///
    /// # Errors
    /// Fails on the first entry that does not parse or validate.
    pub async fn from_config_map(configs: &Map<String, Value>) -> Result<Self, FsError> {
        let mut registry: FileSystemRegistry = Self::new();
        for (name, value) in configs {
            let config: FileSystemConfig = parse_config(name, value)?;
            let provider: S3FileSystem = S3FileSystem::from_config(config).await?;
            registry.register(name.clone(), Arc::new(provider));
        }
        Ok(registry)
    }

    /// Build S3 providers from a configuration map over one shared client.
    ///
    /// Any `clientConfig` in the entries is ignored.
    ///
    /// # Arguments
    /// * `configs` - Provider name to configuration object
    /// * `client` - Storage client used by every provider
    pub fn from_config_map_with_client(
        configs: &Map<String, Value>,
        client: Arc<dyn StorageClient>,
    ) -> Result<Self, FsError> {
        let mut registry: FileSystemRegistry = Self::new();
        for (name, value) in configs {
            let config: FileSystemConfig = parse_config(name, value)?;
            let provider: S3FileSystem = S3FileSystem::new(client.clone(), config.bucket)?;
            registry.register(name.clone(), Arc::new(provider));
        }
        Ok(registry)
    }

    /// Register a provider, replacing any previous one with the same name.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn FileSystemProvider>) {
        let name: String = name.into();
        if self.providers.insert(name.clone(), provider).is_some() {
            log::warn!("Replaced filesystem provider '{}'", name);
        }
    }

    /// Look up a provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn FileSystemProvider>> {
        self.providers.get(name).cloned()
    }

    /// Registered provider names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

fn parse_config(name: &str, value: &Value) -> Result<FileSystemConfig, FsError> {
    let config: FileSystemConfig = serde_json::from_value(value.clone())
        .map_err(|e| FsError::config(format!("provider '{}': {}", name, e)))?;
    config.validate().map_err(|e| match e {
        FsError::Config { message } => FsError::config(format!("provider '{}': {}", name, message)),
        other => other,
    })?;
    Ok(config)
}
