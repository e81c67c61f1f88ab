//! Typed repositories over a [`RelationalStore`](crate::RelationalStore).

mod activity_log;
mod file_metadata;
mod profile;

pub use activity_log::ActivityLogRepository;
pub use file_metadata::FileMetadataRepository;
pub use profile::ProfileRepository;
