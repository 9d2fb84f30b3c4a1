//! Filesystem-backed object store for local development.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tidycache_core::StoreError;
use tidycache_core::ports::{ObjectBody, ObjectStore, StoreResult};

/// Object store keeping each bucket as a directory under `root_dir`.
///
/// Buckets are never created implicitly, mirroring S3. Writes go to a
/// temporary file that is renamed into place, so readers see either the old
/// object or the new one.
pub struct FilesystemStore {
    root_dir: PathBuf,
    next_tmp: AtomicU64,
}

impl FilesystemStore {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            next_tmp: AtomicU64::new(0),
        }
    }

    /// Create the directory backing `bucket`.
    pub async fn create_bucket(&self, bucket: &str) -> StoreResult<()> {
        tokio::fs::create_dir_all(self.bucket_path(bucket)).await?;
        Ok(())
    }

    fn bucket_path(&self, bucket: &str) -> PathBuf {
        self.root_dir.join(sanitize(bucket))
    }

    fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        self.bucket_path(bucket).join(sanitize(key))
    }

    async fn ensure_bucket(&self, bucket: &str) -> StoreResult<()> {
        match tokio::fs::metadata(self.bucket_path(bucket)).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(StoreError::transport(format!(
                "bucket path for {} is not a directory",
                bucket
            ))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::not_found(format!("bucket {} does not exist", bucket)))
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn sanitize(name: &str) -> String {
    name.replace(['/', '\\', ':'], "_")
}

#[async_trait]
impl ObjectStore for FilesystemStore {
    async fn head_bucket(&self, bucket: &str) -> StoreResult<()> {
        if bucket.is_empty() {
            return Err(StoreError::not_found("bucket name is empty"));
        }
        self.ensure_bucket(bucket).await
    }

    async fn get_object(&self, bucket: &str, key: &str) -> StoreResult<ObjectBody> {
        let path = self.object_path(bucket, key);
        match tokio::fs::File::open(&path).await {
            Ok(file) => Ok(Box::pin(file)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // A vanished bucket is not a miss
                if let Err(bucket_err) = self.ensure_bucket(bucket).await {
                    return Err(StoreError::transport(bucket_err.message));
                }
                Err(StoreError::not_found(format!("object {} not found", key)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> StoreResult<()> {
        if let Err(e) = self.ensure_bucket(bucket).await {
            return Err(StoreError::transport(e.message));
        }

        let path = self.object_path(bucket, key);
        let tmp = self.bucket_path(bucket).join(format!(
            ".{}.{}.{}.tmp",
            sanitize(key),
            std::process::id(),
            self.next_tmp.fetch_add(1, Ordering::Relaxed)
        ));

        if let Err(e) = tokio::fs::write(&tmp, &body).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StoreError::transport(format!("failed to write object: {}", e)));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StoreError::transport(format!("failed to commit object: {}", e)));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "filesystem"
    }
}
