//! Remote cache backend for clang-tidy results (S3/R2/MinIO compatible).
//!
//! [`S3Cache`] resolves its configuration, validates the bucket once, and
//! then serves digest-keyed `find`/`save` requests.

pub mod cache;
pub mod config;
pub mod filesystem;
pub mod s3;
pub mod stats;

pub use cache::S3Cache;
pub use config::{BUCKET_ENV, ENDPOINT_ENV, ResolvedConfig, S3Configuration, process_env};
pub use filesystem::FilesystemStore;
pub use s3::AwsObjectStore;
pub use stats::{CacheMetrics, CacheStats};
