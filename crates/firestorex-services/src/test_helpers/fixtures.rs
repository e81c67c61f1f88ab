//! Fixtures: sessions, candidate files, and a fully wired service harness

use std::sync::Arc;

use async_trait::async_trait;
use firestorex_core::{ActorId, CandidateFile, SessionError, SessionProvider};
use firestorex_db::{ActivityLogRepository, FileMetadataRepository};

use super::{MemoryStore, RecordingObjectStore};
use crate::audit::SecurityAuditor;
use crate::upload::FileUploadService;

/// Session whose actor lookup always fails
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingSession;

#[async_trait]
impl SessionProvider for FailingSession {
    async fn current_actor(&self) -> Result<Option<ActorId>, SessionError> {
        Err(SessionError::Lookup("auth service unreachable".to_string()))
    }
}

/// Candidate with a zero-filled payload of `size` bytes
pub fn sized_candidate(name: &str, size: u64) -> CandidateFile {
    CandidateFile::new(name, None, vec![0u8; size as usize])
}

/// Upload service over in-memory doubles, with handles to inspect them
pub struct UploadHarness {
    pub storage: Arc<RecordingObjectStore>,
    pub db: Arc<MemoryStore>,
    pub service: FileUploadService,
}

impl UploadHarness {
    pub fn new() -> Self {
        Self::with_storage(RecordingObjectStore::new())
    }

    pub fn with_storage(storage: RecordingObjectStore) -> Self {
        let storage = Arc::new(storage);
        let db = Arc::new(MemoryStore::new());
        let service = FileUploadService::new(
            storage.clone(),
            FileMetadataRepository::new(db.clone(), "files"),
            SecurityAuditor::new(ActivityLogRepository::new(db.clone(), "activity_logs")),
        );

        Self {
            storage,
            db,
            service,
        }
    }

    /// `action` column of every activity log row, in insertion order
    pub fn audit_actions(&self) -> Vec<String> {
        self.db
            .rows("activity_logs")
            .iter()
            .filter_map(|row| row.get("action").and_then(|a| a.as_str()).map(String::from))
            .collect()
    }
}

impl Default for UploadHarness {
    fn default() -> Self {
        Self::new()
    }
}
