//! FirestoreX Storage Library
//!
//! This crate provides the object storage abstraction consumed by the upload pipeline,
//! plus a local filesystem backend for development and tests. The hosted storage API
//! adapter lives in `firestorex-client`.
//!
//! # Object addressing
//!
//! Objects are addressed by `(bucket, path)`. Buckets are flat names; paths are
//! `/`-separated relative keys. Paths must not be empty, start with `/`, or contain
//! `..` segments. Validation is centralized in the `keys` module so all backends agree.

pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use firestorex_core::StorageBackend;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use traits::{ObjectHandle, ObjectStore, StorageError, StorageResult};
