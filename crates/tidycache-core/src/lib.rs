//! Tidy Cache Core
//!
//! Core types, ports, and error handling for the clang-tidy remote cache.
//! Storage adapters depend on this crate; it has no knowledge of any
//! particular object store.

pub mod context;
pub mod digest;
pub mod error;
pub mod ports;

pub use context::CallContext;
pub use digest::{Digest, ObjectKey};
pub use error::{Error, Result, StoreError, StoreErrorKind};
