//! End-to-end scenarios for the S3 CDN provider over the in-memory store.

use std::sync::Arc;

use s3_providers_cdn::{CdnProvider, CdnRegistry, DeleteResult, UploadOptions, UploadResult};
use s3_providers_storage::MemoryStorageClient;
use serde_json::{json, Map, Value};

fn registry(client: Arc<MemoryStorageClient>) -> CdnRegistry {
    let configs: Map<String, Value> = match json!({
        "public": {
            "bucket": "site-assets",
            "region": "ap-southeast-2",
            "accessKey": "ak",
            "secretKey": "sk"
        },
        "branded": {
            "bucket": "site-assets",
            "region": "ap-southeast-2",
            "accessKey": "ak",
            "secretKey": "sk",
            "baseUrl": "https://static.example.com/"
        }
    }) {
        Value::Object(map) => map,
        _ => unreachable!(),
    };
    CdnRegistry::from_config_map_with_client(&configs, client).unwrap()
}

#[tokio::test]
async fn test_upload_delete_exists_scenario() {
    let client: Arc<MemoryStorageClient> = Arc::new(MemoryStorageClient::new());
    let cdn: Arc<dyn CdnProvider> = registry(client.clone()).get("public").unwrap();

    let result: UploadResult = cdn.upload(b"hello", UploadOptions::default()).await.unwrap();
    assert!(result
        .url
        .starts_with("https://site-assets.s3.ap-southeast-2.amazonaws.com/"));
    assert!(result.url.ends_with(&result.id));
    assert!(cdn.exists(&result.url).await);

    let first: DeleteResult = cdn.delete(&result.url).await;
    assert!(first.success);
    assert!(!cdn.exists(&result.url).await);

    let second: DeleteResult = cdn.delete(&result.url).await;
    assert!(!second.success);
    assert!(client.keys("site-assets").is_empty());
}

#[tokio::test]
async fn test_base_url_provider_shares_bucket() {
    let client: Arc<MemoryStorageClient> = Arc::new(MemoryStorageClient::new());
    let registry: CdnRegistry = registry(client);
    let branded: Arc<dyn CdnProvider> = registry.get("branded").unwrap();
    let public: Arc<dyn CdnProvider> = registry.get("public").unwrap();

    let result: UploadResult = branded
        .upload(
            b"body{}",
            UploadOptions::default()
                .with_filename("css/site.css")
                .with_content_type("text/css"),
        )
        .await
        .unwrap();
    assert_eq!(result.url, "https://static.example.com/css/site.css");

    // The branded URL belongs to the other provider's host only.
    assert!(!public.exists(&result.url).await);
    assert!(public
        .exists("https://site-assets.s3.ap-southeast-2.amazonaws.com/css/site.css")
        .await);

    let metadata = branded.get_metadata(&result.url).await.unwrap();
    assert_eq!(metadata.size, 6);
    assert_eq!(metadata.content_type.as_deref(), Some("text/css"));
}
