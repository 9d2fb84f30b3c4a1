//! Error types for the remote cache.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Construction errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Bucket {bucket} does not exist")]
    BucketNotFound { bucket: String },

    #[error("Bucket {bucket} is not accessible ({kind}): {message}")]
    BucketUnavailable {
        bucket: String,
        kind: StoreErrorKind,
        message: String,
    },

    // Per-call errors
    #[error("Cache miss for key: {key}")]
    CacheMiss { key: String },

    #[error("Store request for {key} failed ({kind}): {message}")]
    Transport {
        key: String,
        kind: StoreErrorKind,
        message: String,
    },

    #[error("Store request for {key} timed out after {after:?}")]
    Timeout { key: String, after: Duration },

    #[error("Store request for {key} was cancelled")]
    Cancelled { key: String },

    #[error("Invalid digest: {0}")]
    InvalidDigest(String),

    // Infrastructure errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Construction failed because the bucket could not be validated.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            Error::BucketNotFound { .. } | Error::BucketUnavailable { .. }
        )
    }

    /// The requested object is absent. Callers treat this as a cache miss.
    pub fn is_cache_miss(&self) -> bool {
        matches!(self, Error::CacheMiss { .. })
    }

    /// A per-call failure unrelated to key absence.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Transport { .. } | Error::Timeout { .. } | Error::Cancelled { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Classification of a failed object-store request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreErrorKind {
    /// The bucket or object does not exist.
    NotFound,
    /// Credentials were rejected or lack permission.
    AccessDenied,
    /// Network, throttling, or any other store-side failure.
    Transport,
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StoreErrorKind::NotFound => "not found",
            StoreErrorKind::AccessDenied => "access denied",
            StoreErrorKind::Transport => "transport",
        };
        f.write_str(s)
    }
}

/// Error returned by an [`ObjectStore`](crate::ports::ObjectStore).
///
/// Store implementations translate their native errors into this shape so
/// the adapter never has to inspect SDK error types.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::NotFound, message)
    }

    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::AccessDenied, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Transport, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == StoreErrorKind::NotFound
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => StoreError::not_found(err.to_string()),
            std::io::ErrorKind::PermissionDenied => StoreError::access_denied(err.to_string()),
            _ => StoreError::transport(err.to_string()),
        }
    }
}
