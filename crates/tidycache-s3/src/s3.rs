//! AWS SDK backed object store.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client;
use aws_sdk_s3::config::timeout::TimeoutConfig;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use tidycache_core::ports::{ObjectBody, ObjectStore, StoreResult};
use tidycache_core::{StoreError, StoreErrorKind};
use tracing::debug;

use crate::config::ResolvedConfig;

/// Object store talking to any S3-compatible endpoint.
#[derive(Clone)]
pub struct AwsObjectStore {
    client: Client,
}

impl AwsObjectStore {
    /// Build a client for the resolved endpoint.
    ///
    /// Credentials come from the standard AWS provider chain. No request is
    /// sent here.
    pub async fn connect(config: &ResolvedConfig) -> Self {
        debug!(endpoint = %config.endpoint, "Loading AWS configuration");

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config)
            .endpoint_url(config.endpoint.as_str())
            .force_path_style(config.force_path_style);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(timeout)
                    .build(),
            );
        }

        Self::from_client(Client::from_conf(builder.build()))
    }

    /// Wrap an already configured client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl ObjectStore for AwsObjectStore {
    async fn head_bucket(&self, bucket: &str) -> StoreResult<()> {
        self.client
            .head_bucket()
            .bucket(bucket)
            .send()
            .await
            .map(|_| ())
            .map_err(translate)
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StoreResult<ObjectBody> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(translate)?;

        Ok(Box::pin(output.body.into_async_read()))
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> StoreResult<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map(|_| ())
            .map_err(translate)
    }

    fn name(&self) -> &str {
        "s3"
    }
}

/// Translate an SDK error into a [`StoreError`], keeping the full error
/// chain in the message.
fn translate<E>(err: SdkError<E>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let status = err.raw_response().map(|r| r.status().as_u16());
    let code = err.as_service_error().and_then(|e| e.code());
    let kind = classify(status, code);
    StoreError::new(kind, DisplayErrorContext(&err).to_string())
}

/// Map an S3 error code and HTTP status to an error kind.
///
/// A missing bucket during an object request is not a cache miss, so
/// `NoSuchBucket` stays a transport failure.
fn classify(status: Option<u16>, code: Option<&str>) -> StoreErrorKind {
    match code {
        Some("NoSuchKey" | "NotFound") => return StoreErrorKind::NotFound,
        Some("NoSuchBucket") => return StoreErrorKind::Transport,
        Some(
            "AccessDenied"
            | "Forbidden"
            | "InvalidAccessKeyId"
            | "SignatureDoesNotMatch"
            | "ExpiredToken"
            | "InvalidToken",
        ) => return StoreErrorKind::AccessDenied,
        _ => {}
    }

    match status {
        Some(404) => StoreErrorKind::NotFound,
        Some(401 | 403) => StoreErrorKind::AccessDenied,
        _ => StoreErrorKind::Transport,
    }
}
