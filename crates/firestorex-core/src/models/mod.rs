//! Data models for the application
//!
//! This module contains the data structures shared across FirestoreX,
//! organized by domain. Each sub-module represents a specific feature area.

mod actor;
mod audit;
mod auth;
mod file;
mod profile;

// Re-export all models for convenient imports
pub use actor::*;
pub use audit::*;
pub use auth::*;
pub use file::*;
pub use profile::*;
