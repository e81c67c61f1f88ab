//! Application-wide constants.

/// Upload size cap: 50 MiB. A file of exactly this size is accepted.
pub const MAX_UPLOAD_SIZE_BYTES: u64 = 50 * 1024 * 1024;

/// File name suffixes that are never accepted for upload (matched lower-cased).
pub const BLOCKED_EXTENSIONS: &[&str] = &[
    ".exe", ".sh", ".bat", ".cmd", ".vbs", ".js", ".php", ".pl", ".py", ".dll",
];

/// Content type recorded when the caller declares none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Default object storage bucket.
pub const DEFAULT_BUCKET: &str = "files";

/// Default relational table names.
pub const FILES_TABLE: &str = "files";
pub const ACTIVITY_LOG_TABLE: &str = "activity_logs";
pub const PROFILES_TABLE: &str = "profiles";
