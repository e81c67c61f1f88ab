//! File upload orchestrator
//!
//! One upload is a straight sequence of awaited steps:
//! validate → write object → resolve actor → write metadata → audit.
//! Nothing is spawned and no state outlives the call, so concurrent uploads
//! share nothing but the backends.

use std::sync::Arc;

use firestorex_core::models::{audit_details, AuditAction, CandidateFile, FileMetadata, NewFileMetadata, Severity};
use firestorex_core::{ActorId, SessionProvider, UploadGuard, Verdict};
use firestorex_db::FileMetadataRepository;
use firestorex_storage::{ObjectHandle, ObjectStore};
use serde_json::json;

use super::UploadError;
use crate::audit::SecurityAuditor;

/// What a successful upload produced.
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    pub object: ObjectHandle,
    pub metadata: FileMetadata,
}

/// Orchestrates validation, storage, metadata, and audit for file uploads.
#[derive(Clone)]
pub struct FileUploadService {
    storage: Arc<dyn ObjectStore>,
    files: FileMetadataRepository,
    auditor: SecurityAuditor,
    guard: UploadGuard,
}

impl FileUploadService {
    pub fn new(
        storage: Arc<dyn ObjectStore>,
        files: FileMetadataRepository,
        auditor: SecurityAuditor,
    ) -> Self {
        Self {
            storage,
            files,
            auditor,
            guard: UploadGuard::default(),
        }
    }

    /// Upload `candidate` to `bucket`/`path` and record it for the session's actor.
    ///
    /// A rejected file never reaches storage. A failed object write never produces
    /// a metadata row. If the metadata row cannot be written the object is removed
    /// again and the upload fails.
    #[tracing::instrument(
        skip(self, session, candidate),
        fields(bucket = %bucket, path = %path, file_name = %candidate.name, size = candidate.size())
    )]
    pub async fn upload(
        &self,
        session: &dyn SessionProvider,
        bucket: &str,
        path: &str,
        candidate: CandidateFile,
    ) -> Result<UploadReceipt, UploadError> {
        // 1. Validate
        if let Verdict::Rejected(reason) = self.guard.validate(&candidate) {
            tracing::warn!(reason = %reason, "Upload rejected by validation");
            // Best-effort: audit outcome does not affect the upload result
            let _ = self
                .auditor
                .log_event(
                    session,
                    AuditAction::SuspiciousUploadAttempt,
                    audit_details([
                        ("fileName", json!(candidate.name)),
                        ("reason", json!(reason.to_string())),
                    ]),
                    Severity::Danger,
                )
                .await;
            return Err(UploadError::ValidationRejected(reason));
        }

        // 2. Write the object
        let content_type = candidate.effective_content_type().to_string();
        let object = match self
            .storage
            .put(bucket, path, candidate.data.clone(), &content_type)
            .await
        {
            Ok(object) => object,
            Err(e) => {
                tracing::error!(error = %e, "Failed to upload to storage");
                let _ = self
                    .auditor
                    .log_event(
                        session,
                        AuditAction::UploadFailed,
                        audit_details([("path", json!(path)), ("error", json!(e.to_string()))]),
                        Severity::Warning,
                    )
                    .await;
                return Err(UploadError::StorageWriteFailed(e));
            }
        };

        // 3. Resolve the owner and write metadata
        let owner = match session.current_actor().await {
            Ok(Some(actor)) => actor,
            Ok(None) => {
                tracing::warn!("No authenticated actor for uploaded object");
                self.discard_object(bucket, path).await;
                return Err(UploadError::Unauthenticated);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Session lookup failed after object write");
                self.discard_object(bucket, path).await;
                return Err(UploadError::Unauthenticated);
            }
        };

        let new_metadata = NewFileMetadata {
            name: candidate.name.clone(),
            size: i64::try_from(candidate.size()).unwrap_or(i64::MAX),
            content_type,
            storage_path: path.to_string(),
            user_id: owner,
        };

        let metadata = match self.files.create(&new_metadata).await {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::error!(error = %e, "Failed to write file metadata");
                self.discard_object(bucket, path).await;
                let _ = self
                    .auditor
                    .log_event(
                        session,
                        AuditAction::MetadataWriteFailed,
                        audit_details([("path", json!(path)), ("error", json!(e.to_string()))]),
                        Severity::Warning,
                    )
                    .await;
                return Err(UploadError::MetadataWriteFailed(e));
            }
        };

        // 4. Audit success
        let _ = self
            .auditor
            .log_event(
                session,
                AuditAction::FileUploaded,
                audit_details([("fileName", json!(candidate.name)), ("path", json!(path))]),
                Severity::Info,
            )
            .await;

        tracing::info!(file_id = %metadata.id, "Upload complete");

        Ok(UploadReceipt { object, metadata })
    }

    /// Immediate entries under `prefix` in `bucket`.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectHandle>, UploadError> {
        Ok(self.storage.list(bucket, prefix).await?)
    }

    /// Remove an object and, for a signed-in actor, its metadata row.
    #[tracing::instrument(skip(self, session))]
    pub async fn remove(
        &self,
        session: &dyn SessionProvider,
        bucket: &str,
        path: &str,
    ) -> Result<(), UploadError> {
        self.storage.remove(bucket, &[path.to_string()]).await?;

        match session.current_actor().await {
            Ok(Some(actor)) => self.forget_metadata(&actor, path).await,
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Session lookup failed, metadata left in place"),
        }

        let _ = self
            .auditor
            .log_event(
                session,
                AuditAction::FileDeleted,
                audit_details([("path", json!(path))]),
                Severity::Info,
            )
            .await;

        Ok(())
    }

    /// Metadata rows owned by the session's actor, newest first.
    pub async fn files_for(
        &self,
        session: &dyn SessionProvider,
    ) -> Result<Vec<FileMetadata>, UploadError> {
        let owner = session
            .current_actor()
            .await?
            .ok_or(UploadError::Unauthenticated)?;

        Ok(self.files.list_for_owner(&owner).await?)
    }

    /// Compensate for a half-finished upload. Failure leaves an orphaned object.
    async fn discard_object(&self, bucket: &str, path: &str) {
        if let Err(e) = self.storage.remove(bucket, &[path.to_string()]).await {
            tracing::error!(
                error = %e,
                bucket = %bucket,
                path = %path,
                "Failed to remove object after incomplete upload"
            );
        }
    }

    async fn forget_metadata(&self, owner: &ActorId, path: &str) {
        if let Err(e) = self.files.delete_for_path(owner, path).await {
            tracing::warn!(error = %e, path = %path, "Failed to delete file metadata");
        }
    }
}
