//! FirestoreX Services Layer
//!
//! This crate is the business service layer: the security auditor, the file upload
//! orchestrator, and the account flows. Services depend only on the ports
//! (`ObjectStore`, `RelationalStore`, `SessionProvider`, `AuthBackend`); `setup`
//! wires concrete backends from [`Config`](firestorex_core::Config).

pub mod account;
pub mod audit;
pub mod setup;
pub mod telemetry;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
pub mod upload;

pub use account::AccountService;
pub use audit::{AuditOutcome, SecurityAuditor};
pub use setup::{create_relational_store, create_storage, Services};
pub use upload::{FileUploadService, UploadError, UploadReceipt};
