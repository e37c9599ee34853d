//! Configuration for the S3 CDN provider.

use std::fmt;

use s3_providers_storage::{AwsCredentials, StorageSettings};
use serde::{Deserialize, Serialize};

use crate::error::CdnError;

/// Construction parameters for [`crate::S3CdnProvider`].
///
/// ```json
/// {
///   "bucket": "assets",
///   "region": "eu-west-1",
///   "accessKey": "AKIA...",
///   "secretKey": "...",
///   "baseUrl": "https://cdn.example.com"
/// }
/// ```
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CdnConfig {
    #[serde(default, alias = "namespace")]
    pub bucket: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub secret_key: String,
    /// Public URL prefix. The virtual-hosted S3 URL is used when absent.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Endpoint override for S3-compatible stores.
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

impl CdnConfig {
    /// Check required fields before any network access.
    ///
    /// # Errors
    /// Returns `CdnError::Config` naming the first missing field.
    pub fn validate(&self) -> Result<(), CdnError> {
        let required: [(&str, &str); 4] = [
            ("bucket", self.bucket.as_str()),
            ("region", self.region.as_str()),
            ("accessKey", self.access_key.as_str()),
            ("secretKey", self.secret_key.as_str()),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(CdnError::config(format!("{} is required", name)));
            }
        }
        Ok(())
    }

    /// Client settings with the configured static credentials.
    pub fn storage_settings(&self) -> StorageSettings {
        StorageSettings {
            region: self.region.clone(),
            credentials: Some(AwsCredentials {
                access_key_id: self.access_key.clone(),
                secret_access_key: self.secret_key.clone(),
                session_token: None,
            }),
            endpoint_url: self.endpoint_url.clone(),
            force_path_style: self.endpoint_url.is_some(),
            expected_bucket_owner: None,
        }
    }
}

impl fmt::Debug for CdnConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CdnConfig")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> CdnConfig {
        serde_json::from_str(
            r#"{"namespace": "assets", "region": "eu-west-1", "accessKey": "ak", "secretKey": "sk"}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_complete_config_validates() {
        let config: CdnConfig = complete();
        assert_eq!(config.bucket, "assets");
        assert!(config.base_url.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_each_missing_field_is_named() {
        for (field, expected) in [
            ("bucket", "bucket is required"),
            ("region", "region is required"),
            ("access_key", "accessKey is required"),
            ("secret_key", "secretKey is required"),
        ] {
            let mut config: CdnConfig = complete();
            match field {
                "bucket" => config.bucket.clear(),
                "region" => config.region = " ".into(),
                "access_key" => config.access_key.clear(),
                _ => config.secret_key.clear(),
            }
            let err: CdnError = config.validate().unwrap_err();
            assert!(err.to_string().contains(expected), "{}", err);
        }
    }

    #[test]
    fn test_storage_settings_carry_credentials() {
        let settings: StorageSettings = complete().storage_settings();
        assert_eq!(settings.region, "eu-west-1");
        let credentials: AwsCredentials = settings.credentials.unwrap();
        assert_eq!(credentials.access_key_id, "ak");
        assert_eq!(credentials.secret_access_key, "sk");
        assert!(!settings.force_path_style);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered: String = format!("{:?}", complete());
        assert!(!rendered.contains("\"sk\""));
        assert!(rendered.contains("<redacted>"));
    }
}
