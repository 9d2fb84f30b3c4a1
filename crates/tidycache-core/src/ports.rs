//! Port traits.
//!
//! `ObjectStore` is the boundary to the remote object-storage service;
//! `CacheBackend` is what the higher-level cache orchestrator consumes.

use crate::{CallContext, Digest, Result, StoreError};
use async_trait::async_trait;
use std::pin::Pin;
use tokio::io::AsyncRead;

/// Streamed body of a retrieved object. Dropping it releases the transport.
pub type ObjectBody = Pin<Box<dyn AsyncRead + Send>>;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Minimal object-storage client.
///
/// Implementations must be safe for concurrent use and must translate their
/// native errors into [`StoreError`].
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Metadata-only existence check for a bucket.
    async fn head_bucket(&self, bucket: &str) -> StoreResult<()>;

    /// Open the body of an object for reading.
    async fn get_object(&self, bucket: &str, key: &str) -> StoreResult<ObjectBody>;

    /// Upload an object, overwriting any existing one.
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> StoreResult<()>;

    /// Store name for logging.
    fn name(&self) -> &str;
}

/// Digest-keyed cache storage backend.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Look up the content stored for `digest`.
    ///
    /// An absent entry is reported as [`Error::CacheMiss`](crate::Error::CacheMiss).
    async fn find(&self, digest: &Digest, ctx: &CallContext) -> Result<Vec<u8>>;

    /// Store `content` for `digest`, overwriting any existing entry.
    async fn save(&self, digest: &Digest, content: &[u8], ctx: &CallContext) -> Result<()>;
}
