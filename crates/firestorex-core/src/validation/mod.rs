//! Validation modules

pub mod identifier;
pub mod upload;

pub use identifier::{validate_identifier, InvalidIdentifier};
pub use upload::{validate, RejectionReason, UploadGuard, Verdict};
