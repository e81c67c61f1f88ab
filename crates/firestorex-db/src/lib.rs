//! FirestoreX relational data access
//!
//! The hosted backend exposes its database as tables of JSON-shaped rows. This crate
//! defines the [`RelationalStore`] trait over that model, a direct Postgres backend,
//! and typed repositories for the tables the application writes.

#[cfg(feature = "postgres")]
pub mod postgres;
pub mod repositories;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
pub mod traits;

#[cfg(feature = "postgres")]
pub use postgres::PgStore;
pub use repositories::{ActivityLogRepository, FileMetadataRepository, ProfileRepository};
pub use traits::{from_record, to_record, DbError, DbResult, Filters, Record, RelationalStore};
