//! Digest-keyed cache on top of an object store.

use async_trait::async_trait;
use std::sync::Arc;
use tidycache_core::ports::{CacheBackend, ObjectBody, ObjectStore};
use tidycache_core::{CallContext, Digest, Error, ObjectKey, Result, StoreError, StoreErrorKind};
use tokio::io::AsyncReadExt;
use tracing::{Level, debug, error, info, warn};

use crate::config::{ResolvedConfig, S3Configuration, process_env};
use crate::s3::AwsObjectStore;
use crate::stats::{CacheMetrics, CacheStats};

/// Remote cache backend storing one object per digest.
///
/// An `S3Cache` only exists once its bucket has been validated successfully.
/// It holds no per-entry state, so a single instance can be shared across
/// any number of concurrent callers.
pub struct S3Cache {
    store: Arc<dyn ObjectStore>,
    config: ResolvedConfig,
    metrics: Arc<CacheMetrics>,
}

impl S3Cache {
    /// Connect using `config`, falling back to the process environment.
    pub async fn new(config: &S3Configuration) -> Result<Self> {
        Self::from_env(config, process_env).await
    }

    /// Connect using `config`, falling back to `lookup` for missing values.
    ///
    /// Configuration errors are reported before any client is built.
    pub async fn from_env<F>(config: &S3Configuration, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let resolved = config.resolve(lookup)?;
        info!(
            endpoint = %resolved.endpoint,
            bucket = %resolved.bucket,
            "Connecting to S3 cache"
        );
        let store = AwsObjectStore::connect(&resolved).await;
        Self::with_store(Arc::new(store), resolved).await
    }

    /// Validate the bucket on an existing store.
    pub async fn with_store(store: Arc<dyn ObjectStore>, config: ResolvedConfig) -> Result<Self> {
        Self::open(store, config, &CallContext::new()).await
    }

    /// Validate the bucket on an existing store, bounding the check by `ctx`.
    pub async fn open(
        store: Arc<dyn ObjectStore>,
        config: ResolvedConfig,
        ctx: &CallContext,
    ) -> Result<Self> {
        validate_bucket(store.as_ref(), &config.bucket, ctx).await?;
        Ok(Self {
            store,
            config,
            metrics: Arc::new(CacheMetrics::new()),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// Get a snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        self.metrics.snapshot()
    }

    /// Fetch the content stored for `digest`.
    ///
    /// Returns [`Error::CacheMiss`] when no object exists for the digest.
    pub async fn find(&self, digest: &Digest, ctx: &CallContext) -> Result<Vec<u8>> {
        let key = digest.object_key();

        match self.fetch(&key, ctx).await {
            Ok(content) => {
                debug!(key = %key, bytes = content.len(), "Cache hit");
                self.metrics.record_hit(content.len() as u64);
                Ok(content)
            }
            Err(err) if err.is_cache_miss() => {
                debug!(key = %key, "Cache miss");
                self.metrics.record_miss();
                Err(err)
            }
            Err(err) => {
                log_failure(&self.config.bucket, &key, &err, "Couldn't get object");
                self.metrics.record_error();
                Err(err)
            }
        }
    }

    /// Store `content` for `digest`.
    ///
    /// Existing objects are overwritten without being read first.
    pub async fn save(&self, digest: &Digest, content: &[u8], ctx: &CallContext) -> Result<()> {
        let key = digest.object_key();

        let outcome = ctx
            .run(
                key.as_str(),
                self.store
                    .put_object(&self.config.bucket, key.as_str(), content.to_vec()),
            )
            .await
            .and_then(|res| res.map_err(|e| transport_error(&key, e)));

        match outcome {
            Ok(()) => {
                debug!(key = %key, bytes = content.len(), "Uploaded cache entry");
                self.metrics.record_upload(content.len() as u64);
                Ok(())
            }
            Err(err) => {
                log_failure(&self.config.bucket, &key, &err, "Couldn't upload object");
                self.metrics.record_error();
                Err(err)
            }
        }
    }

    async fn fetch(&self, key: &ObjectKey, ctx: &CallContext) -> Result<Vec<u8>> {
        let body = ctx
            .run(
                key.as_str(),
                self.store.get_object(&self.config.bucket, key.as_str()),
            )
            .await?
            .map_err(|e| {
                if e.is_not_found() {
                    Error::CacheMiss {
                        key: key.to_string(),
                    }
                } else {
                    transport_error(key, e)
                }
            })?;

        ctx.run(key.as_str(), read_to_end(body))
            .await?
            .map_err(|e| transport_error(key, e))
    }
}

#[async_trait]
impl CacheBackend for S3Cache {
    async fn find(&self, digest: &Digest, ctx: &CallContext) -> Result<Vec<u8>> {
        S3Cache::find(self, digest, ctx).await
    }

    async fn save(&self, digest: &Digest, content: &[u8], ctx: &CallContext) -> Result<()> {
        S3Cache::save(self, digest, content, ctx).await
    }
}

/// Check `bucket` once. Both a missing bucket and any other failure abort
/// construction, as distinct errors.
async fn validate_bucket(store: &dyn ObjectStore, bucket: &str, ctx: &CallContext) -> Result<()> {
    let outcome = match ctx.run(bucket, store.head_bucket(bucket)).await {
        Ok(outcome) => outcome,
        Err(interrupted) => Err(StoreError::transport(interrupted.to_string())),
    };

    match outcome {
        Ok(()) => {
            info!(bucket = %bucket, store = store.name(), "Bucket exists and is accessible");
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            warn!(bucket = %bucket, error = %e, "Bucket does not exist");
            Err(Error::BucketNotFound {
                bucket: bucket.to_string(),
            })
        }
        Err(e) => {
            error!(
                bucket = %bucket,
                kind = %e.kind,
                error = %e.message,
                "Either the bucket is not accessible or another error occurred"
            );
            Err(Error::BucketUnavailable {
                bucket: bucket.to_string(),
                kind: e.kind,
                message: e.message,
            })
        }
    }
}

/// Drain a response body. The body is dropped on every exit path.
async fn read_to_end(mut body: ObjectBody) -> std::result::Result<Vec<u8>, StoreError> {
    let mut content = Vec::new();
    body.read_to_end(&mut content)
        .await
        .map_err(|e| StoreError::transport(format!("failed to read object body: {}", e)))?;
    Ok(content)
}

/// Level a failed `find`/`save` is logged at. Access and cancellation are
/// operator or caller conditions; everything else is unexpected.
fn failure_level(err: &Error) -> Level {
    match err {
        Error::Transport {
            kind: StoreErrorKind::AccessDenied,
            ..
        }
        | Error::Cancelled { .. } => Level::WARN,
        _ => Level::ERROR,
    }
}

fn log_failure(bucket: &str, key: &ObjectKey, err: &Error, message: &str) {
    if failure_level(err) == Level::WARN {
        warn!(bucket = %bucket, key = %key, error = %err, "{}", message);
    } else {
        error!(bucket = %bucket, key = %key, error = %err, "{}", message);
    }
}

fn transport_error(key: &ObjectKey, err: StoreError) -> Error {
    Error::Transport {
        key: key.to_string(),
        kind: err.kind,
        message: err.message,
    }
}
