//! Test helpers for service tests
//!
//! In-memory doubles for the storage, relational, and session ports, plus
//! builders that wire them into services. No network or database is needed.

pub mod fixtures;
pub mod mock_auth;
pub mod mock_storage;

pub use firestorex_db::test_helpers::MemoryStore;
pub use fixtures::*;
pub use mock_auth::StubAuth;
pub use mock_storage::RecordingObjectStore;
