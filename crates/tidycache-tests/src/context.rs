//! Test context providing access to a running MinIO server.

use crate::containers::{MinioContainer, MinioCredentials};
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use std::sync::Arc;
use tidycache_s3::{AwsObjectStore, ResolvedConfig, S3Cache};

/// Test context with MinIO running.
///
/// Drop this to stop the container.
pub struct TestContext {
    pub minio: MinioContainer,
    pub client: Client,
}

impl TestContext {
    /// Start MinIO with no buckets.
    pub async fn new() -> anyhow::Result<Self> {
        Self::with_buckets(&[]).await
    }

    /// Start MinIO with `buckets` already created.
    pub async fn with_buckets(buckets: &[&str]) -> anyhow::Result<Self> {
        crate::init_test_logging();

        let minio = MinioContainer::start_with(MinioCredentials::default(), buckets).await?;
        let client = minio.admin().clone();

        Ok(Self { minio, client })
    }

    /// Get MinIO endpoint.
    pub fn endpoint(&self) -> &str {
        self.minio.endpoint()
    }

    /// Create a bucket through the admin client.
    pub async fn create_bucket(&self, bucket: &str) -> anyhow::Result<()> {
        self.minio.create_bucket(bucket).await
    }

    /// Resolved configuration pointing at this MinIO instance.
    pub fn config(&self, bucket: &str) -> ResolvedConfig {
        ResolvedConfig {
            region: Some("us-east-1".to_string()),
            force_path_style: true,
            ..ResolvedConfig::new(self.endpoint(), bucket)
        }
    }

    /// Open a cache on `bucket` using the admin credentials.
    pub async fn cache(&self, bucket: &str) -> tidycache_core::Result<S3Cache> {
        self.cache_with_client(self.client.clone(), bucket).await
    }

    /// Open a cache on `bucket` with a custom client.
    pub async fn cache_with_client(
        &self,
        client: Client,
        bucket: &str,
    ) -> tidycache_core::Result<S3Cache> {
        let store = AwsObjectStore::from_client(client);
        S3Cache::with_store(Arc::new(store), self.config(bucket)).await
    }
}

/// Build a path-style S3 client with static credentials.
pub fn s3_client(endpoint: &str, access_key: &str, secret_key: &str) -> Client {
    let config = aws_sdk_s3::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .endpoint_url(endpoint)
        .credentials_provider(Credentials::new(
            access_key, secret_key, None, None, "tidycache-tests",
        ))
        .force_path_style(true)
        .build();
    Client::from_conf(config)
}
