//! FirestoreX Core Library
//!
//! This crate provides the domain models, error types, configuration, and validation
//! shared by every FirestoreX component. It has no knowledge of the hosted backend's
//! transport; adapters live in the storage, db, and client crates.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod session;
pub mod validation;

// Re-export commonly used types
pub use config::{BackendConfig, Config, DatabaseBackend, StorageBackend, TableNames};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{ActorId, AuditAction, CandidateFile, FileMetadata, NewFileMetadata, Severity};
pub use session::{SessionError, SessionProvider, StaticSession};
pub use validation::upload::{validate, RejectionReason, UploadGuard, Verdict};
