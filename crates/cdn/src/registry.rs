//! Named CDN provider registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use s3_providers_storage::StorageClient;
use serde_json::{Map, Value};

use crate::config::CdnConfig;
use crate::error::CdnError;
use crate::provider::CdnProvider;
use crate::s3::S3CdnProvider;

/// CDN providers by name.
#[derive(Default, Clone)]
pub struct CdnRegistry {
    providers: BTreeMap<String, Arc<dyn CdnProvider>>,
}

impl CdnRegistry {
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
    pub async fn from_config_map(configs: &Map<String, Value>) -> Result<Self, CdnError> {
        let mut registry: CdnRegistry = Self::new();
        for (name, value) in configs {
            let config: CdnConfig = parse_config(name, value)?;
            let provider: S3CdnProvider = S3CdnProvider::from_config(config).await?;
            registry.register(name.clone(), Arc::new(provider));
        }
        Ok(registry)
    }

    /// Build S3 providers from a configuration map over one shared client.
    ///
    /// Credentials in the entries are still validated but not used.
    pub fn from_config_map_with_client(
        configs: &Map<String, Value>,
        client: Arc<dyn StorageClient>,
    ) -> Result<Self, CdnError> {
        let mut registry: CdnRegistry = Self::new();
        for (name, value) in configs {
            let config: CdnConfig = parse_config(name, value)?;
            let provider: S3CdnProvider =
                S3CdnProvider::new(client.clone(), config.bucket, config.region, config.base_url)?;
            registry.register(name.clone(), Arc::new(provider));
        }
        Ok(registry)
    }

    /// Register a provider, replacing any previous one with the same name.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn CdnProvider>) {
        let name: String = name.into();
        if self.providers.insert(name.clone(), provider).is_some() {
            log::warn!("Replaced CDN provider '{}'", name);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn CdnProvider>> {
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

fn parse_config(name: &str, value: &Value) -> Result<CdnConfig, CdnError> {
    let config: CdnConfig = serde_json::from_value(value.clone())
        .map_err(|e| CdnError::config(format!("provider '{}': {}", name, e)))?;
    if let Err(CdnError::Config { message }) = config.validate() {
        return Err(CdnError::config(format!("provider '{}': {}", name, message)));
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use s3_providers_storage::MemoryStorageClient;
    use serde_json::json;

    fn config_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_registry_with_shared_client() {
        let client: Arc<MemoryStorageClient> = Arc::new(MemoryStorageClient::new());
        let configs: Map<String, Value> = config_map(json!({
            "images": {
                "namespace": "img-bucket",
                "region": "us-east-1",
                "accessKey": "ak",
                "secretKey": "sk",
                "baseUrl": "https://img.example.com"
            }
        }));
        let registry: CdnRegistry =
            CdnRegistry::from_config_map_with_client(&configs, client).unwrap();
        assert_eq!(registry.names(), vec!["images"]);
        assert_eq!(registry.len(), 1);
        assert!(registry.get("images").is_some());
        assert!(registry.get("video").is_none());
    }

    #[test]
    fn test_missing_secret_is_named() {
        let client: Arc<MemoryStorageClient> = Arc::new(MemoryStorageClient::new());
        let configs: Map<String, Value> = config_map(json!({
            "images": {"bucket": "b", "region": "us-east-1", "accessKey": "ak"}
        }));
        let err: CdnError =
            CdnRegistry::from_config_map_with_client(&configs, client).err().expect("expected error");
        let message: String = err.to_string();
        assert!(message.contains("images"));
        assert!(message.contains("secretKey is required"));
    }

    #[tokio::test]
    async fn test_from_config_map_validates_before_construction() {
        let configs: Map<String, Value> = config_map(json!({"broken": {"bucket": "b"}}));
        let result: Result<CdnRegistry, CdnError> = CdnRegistry::from_config_map(&configs).await;
        assert!(matches!(result, Err(CdnError::Config { .. })));
    }
}
