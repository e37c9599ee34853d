//! `StorageClient` over the AWS SDK for Rust.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, ConfigLoader, SdkConfig};
use aws_credential_types::Credentials;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;

use s3_providers_storage::{
    ListObjectsPage, ListObjectsRequest, ObjectInfo, ObjectMetadata, StorageClient, StorageError,
    StorageSettings,
};

use crate::error::CrtError;

/// Provider name attached to static credentials.
const CREDENTIALS_PROVIDER: &str = "s3-providers-static";
/// Service error codes that mean the key is absent.
const NOT_FOUND_CODES: [&str; 2] = ["NoSuchKey", "NotFound"];
/// Service error codes worth retrying.
const RETRYABLE_CODES: [&str; 4] = [
    "SlowDown",
    "InternalError",
    "ServiceUnavailable",
    "RequestTimeout",
];

/// S3 access through `aws-sdk-s3`.
///
/// Cloning is cheap and clones share the SDK connection pool. Retries of
/// transient failures happen inside the SDK before an error surfaces here.
#[derive(Debug, Clone)]
pub struct CrtStorageClient {
    s3_client: S3Client,
    /// Sent as `x-amz-expected-bucket-owner` on every request when set.
    expected_bucket_owner: Option<String>,
}

impl CrtStorageClient {
    /// Build a client from provider settings.
    ///
    /// Static credentials in `settings` take precedence over the SDK default
    /// chain (environment, profile, instance metadata).
    ///
    /// # Arguments
    /// * `settings` - Region, credentials and endpoint overrides
    ///
    /// # Errors
    /// Returns `StorageError::InvalidConfig` if the region is blank.
    pub async fn new(settings: StorageSettings) -> Result<Self, StorageError> {
        if settings.region.trim().is_empty() {
            return Err(CrtError::ConfigError("region must not be empty".into()).into());
        }

        let sdk_config: SdkConfig = config_loader(&settings).load().await;
        let s3_config: aws_sdk_s3::Config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(settings.force_path_style)
            .build();

        log::debug!(
            "Created S3 client for region {} (endpoint: {:?}, path style: {})",
            settings.region,
            settings.endpoint_url,
            settings.force_path_style
        );

        Ok(Self::from_sdk_client(
            S3Client::from_conf(s3_config),
            settings.expected_bucket_owner,
        ))
    }

    /// Wrap an already configured SDK client.
    ///
    /// # Arguments
    /// * `s3_client` - SDK client
    /// * `expected_bucket_owner` - Account id every bucket must belong to
    pub fn from_sdk_client(s3_client: S3Client, expected_bucket_owner: Option<String>) -> Self {
        Self {
            s3_client,
            expected_bucket_owner,
        }
    }
}

/// Shared SDK configuration for the given settings.
fn config_loader(settings: &StorageSettings) -> ConfigLoader {
    let mut loader: ConfigLoader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(settings.region.clone()));

    if let Some(creds) = &settings.credentials {
        loader = loader.credentials_provider(Credentials::new(
            creds.access_key_id.clone(),
            creds.secret_access_key.clone(),
            creds.session_token.clone(),
            None,
            CREDENTIALS_PROVIDER,
        ));
    }
    if let Some(endpoint) = &settings.endpoint_url {
        loader = loader.endpoint_url(endpoint.clone());
    }
    loader
}

/// Build the `x-amz-copy-source` value for a key in a bucket.
///
/// Each key segment is percent-encoded; the `/` separators are kept.
fn copy_source(bucket: &str, key: &str) -> String {
    let encoded: Vec<String> = key
        .split('/')
        .map(|segment: &str| urlencoding::encode(segment).into_owned())
        .collect();
    format!("{}/{}", bucket, encoded.join("/"))
}

/// Check whether an SDK error means the key does not exist.
///
/// HEAD responses carry no body, so a bare 404 without an error code is
/// also treated as a missing key.
fn is_not_found<E>(err: &SdkError<E, HttpResponse>) -> bool
where
    E: ProvideErrorMetadata,
{
    match err.code() {
        Some(code) => NOT_FOUND_CODES.contains(&code),
        None => err
            .raw_response()
            .map(|response: &HttpResponse| response.status().as_u16() == 404)
            .unwrap_or(false),
    }
}

/// Translate an SDK error into a `CrtError`.
fn classify<E>(err: SdkError<E, HttpResponse>, bucket: &str, key: &str) -> CrtError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let code: Option<String> = err.code().map(str::to_string);
    let message: String = DisplayErrorContext(&err).to_string();

    if code.as_deref() == Some("AccessDenied") {
        return CrtError::AccessDenied {
            bucket: bucket.to_string(),
            key: key.to_string(),
            message,
        };
    }

    let retryable: bool = match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            true
        }
        _ => code
            .as_deref()
            .map(|c: &str| RETRYABLE_CODES.contains(&c))
            .unwrap_or(false),
    };

    CrtError::SdkError { message, retryable }
}

/// Translate an SDK error, mapping missing keys to `StorageError::NotFound`.
fn to_storage_error<E>(err: SdkError<E, HttpResponse>, bucket: &str, key: &str) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    if is_not_found(&err) {
        return StorageError::not_found(bucket, key);
    }
    classify(err, bucket, key).into()
}

#[async_trait]
impl StorageClient for CrtStorageClient {
    async fn head_object_with_metadata(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<ObjectMetadata>, StorageError> {
        let mut request = self.s3_client.head_object().bucket(bucket).key(key);

        if let Some(ref owner) = self.expected_bucket_owner {
            request = request.expected_bucket_owner(owner);
        }

        match request.send().await {
            Ok(output) => {
                let user_metadata: HashMap<String, String> = output
                    .metadata()
                    .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                    .unwrap_or_default();

                let last_modified: Option<i64> = output
                    .last_modified()
                    .and_then(|dt| dt.to_millis().ok())
                    .map(|ms| ms / 1000);

                Ok(Some(ObjectMetadata {
                    size: output.content_length().map(|l| l as u64).unwrap_or(0),
                    last_modified,
                    content_type: output.content_type().map(|s| s.to_string()),
                    etag: output.e_tag().map(|s| s.to_string()),
                    user_metadata,
                }))
            }
            Err(err) => {
                if is_not_found(&err) {
                    Ok(None)
                } else {
                    Err(classify(err, bucket, key).into())
                }
            }
        }
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
        content_type: Option<&str>,
        metadata: Option<&HashMap<String, String>>,
    ) -> Result<(), StorageError> {
        let body = ByteStream::from(data.to_vec());

        let mut request = self
            .s3_client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body);

        if let Some(ref owner) = self.expected_bucket_owner {
            request = request.expected_bucket_owner(owner);
        }

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        if let Some(meta) = metadata {
            for (k, v) in meta {
                request = request.metadata(k, v);
            }
        }

        request
            .send()
            .await
            .map_err(|err| StorageError::from(classify(err, bucket, key)))?;

        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let mut request = self.s3_client.get_object().bucket(bucket).key(key);

        if let Some(ref owner) = self.expected_bucket_owner {
            request = request.expected_bucket_owner(owner);
        }

        let response = request
            .send()
            .await
            .map_err(|err| to_storage_error(err, bucket, key))?;

        let data: Vec<u8> = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::NetworkError {
                message: e.to_string(),
                retryable: true,
            })?
            .into_bytes()
            .to_vec();

        Ok(data)
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        let mut request = self.s3_client.delete_object().bucket(bucket).key(key);

        if let Some(ref owner) = self.expected_bucket_owner {
            request = request.expected_bucket_owner(owner);
        }

        request
            .send()
            .await
            .map_err(|err| StorageError::from(classify(err, bucket, key)))?;

        Ok(())
    }

    async fn copy_object(
        &self,
        bucket: &str,
        source_key: &str,
        destination_key: &str,
    ) -> Result<(), StorageError> {
        let mut request = self
            .s3_client
            .copy_object()
            .copy_source(copy_source(bucket, source_key))
            .bucket(bucket)
            .key(destination_key);

        if let Some(ref owner) = self.expected_bucket_owner {
            request = request
                .expected_bucket_owner(owner)
                .expected_source_bucket_owner(owner);
        }

        request
            .send()
            .await
            .map_err(|err| to_storage_error(err, bucket, source_key))?;

        Ok(())
    }

    async fn list_objects_page(
        &self,
        bucket: &str,
        request: &ListObjectsRequest,
    ) -> Result<ListObjectsPage, StorageError> {
        let mut sdk_request = self
            .s3_client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(&request.prefix);

        if let Some(ref owner) = self.expected_bucket_owner {
            sdk_request = sdk_request.expected_bucket_owner(owner);
        }

        if let Some(ref delimiter) = request.delimiter {
            sdk_request = sdk_request.delimiter(delimiter);
        }

        if let Some(ref token) = request.continuation_token {
            sdk_request = sdk_request.continuation_token(token);
        }

        if let Some(max_keys) = request.max_keys {
            sdk_request = sdk_request.max_keys(max_keys);
        }

        let response = sdk_request
            .send()
            .await
            .map_err(|err| StorageError::from(classify(err, bucket, &request.prefix)))?;

        let objects: Vec<ObjectInfo> = response
            .contents()
            .iter()
            .map(|obj| ObjectInfo {
                key: obj.key().unwrap_or_default().to_string(),
                size: obj.size().map(|s| s as u64).unwrap_or(0),
                last_modified: obj
                    .last_modified()
                    .and_then(|dt| dt.to_millis().ok())
                    .map(|ms| ms / 1000),
                etag: obj.e_tag().map(|s| s.to_string()),
            })
            .collect();

        let common_prefixes: Vec<String> = response
            .common_prefixes()
            .iter()
            .filter_map(|p| p.prefix().map(|s| s.to_string()))
            .collect();

        let next_continuation_token: Option<String> = if response.is_truncated() == Some(true) {
            response.next_continuation_token().map(|s| s.to_string())
        } else {
            None
        };

        Ok(ListObjectsPage {
            objects,
            common_prefixes,
            next_continuation_token,
        })
    }
}
