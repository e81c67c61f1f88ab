//! File upload pipeline: validate → store → record metadata → audit

mod error;
mod service;

pub use error::UploadError;
pub use service::{FileUploadService, UploadReceipt};
