//! Integration test infrastructure for the remote cache.
//!
//! This crate provides testcontainers-based infrastructure for running
//! the S3 backend against a real MinIO server.
//!
//! # Usage
//!
//! ```ignore
//! use tidycache_tests::TestContext;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let ctx = TestContext::new().await.unwrap();
//!     ctx.create_bucket("test-bucket").await.unwrap();
//!     let cache = ctx.cache("test-bucket").await.unwrap();
//! }
//! ```

pub mod containers;
pub mod context;
pub mod fixtures;

pub use context::TestContext;
pub use fixtures::*;

/// Initialize test logging (call once per test binary).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,tidycache_s3=debug,tidycache_tests=debug")),
        )
        .with_test_writer()
        .try_init();
}
