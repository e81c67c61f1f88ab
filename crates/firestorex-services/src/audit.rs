//! Security audit logging
//!
//! Every security-relevant outcome is appended to the remote activity log,
//! attributed to the session's actor. Logging is best-effort: it never fails
//! the operation that triggered it and is never retried.

use firestorex_core::models::{AuditAction, AuditDetails, AuditEvent, NewAuditEvent, Severity};
use firestorex_core::{AppError, SessionProvider};
use firestorex_db::ActivityLogRepository;

/// Result of a single audit attempt. Callers may ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "audit outcomes are best-effort; discard explicitly with `let _ =`"]
pub enum AuditOutcome {
    /// One event was appended to the activity log.
    Recorded,
    /// No authenticated actor; nothing was written.
    Skipped,
    /// Actor resolution or submission failed; reported through tracing.
    Failed,
}

#[derive(Clone)]
pub struct SecurityAuditor {
    log: ActivityLogRepository,
}

impl SecurityAuditor {
    pub fn new(log: ActivityLogRepository) -> Self {
        Self { log }
    }

    /// Record a security event for the session's actor.
    #[tracing::instrument(skip(self, session, details), fields(action = action.as_str(), severity = ?severity))]
    pub async fn log_event(
        &self,
        session: &dyn SessionProvider,
        action: AuditAction,
        details: AuditDetails,
        severity: Severity,
    ) -> AuditOutcome {
        let user_id = match session.current_actor().await {
            Ok(Some(actor)) => actor,
            Ok(None) => {
                tracing::debug!("No authenticated actor, security event not recorded");
                return AuditOutcome::Skipped;
            }
            Err(e) => {
                tracing::error!(
                    target: "firestorex::audit",
                    error = %e,
                    action = action.as_str(),
                    "Error logging security event"
                );
                return AuditOutcome::Failed;
            }
        };

        let event = NewAuditEvent {
            user_id,
            action,
            details,
            severity,
        };

        match self.log.append(&event).await {
            Ok(()) => AuditOutcome::Recorded,
            Err(e) => {
                tracing::error!(
                    target: "firestorex::audit",
                    error = %e,
                    action = action.as_str(),
                    user_id = %event.user_id,
                    "Error logging security event"
                );
                AuditOutcome::Failed
            }
        }
    }

    /// Events recorded for the session's actor, newest first.
    pub async fn recent_events(
        &self,
        session: &dyn SessionProvider,
    ) -> Result<Vec<AuditEvent>, AppError> {
        let actor = session
            .current_actor()
            .await?
            .ok_or_else(|| AppError::Unauthorized("Not signed in".to_string()))?;

        self.log
            .list_for_actor(&actor)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FailingSession, MemoryStore};
    use firestorex_core::models::audit_details;
    use firestorex_core::StaticSession;
    use serde_json::json;
    use std::sync::Arc;

    fn auditor(store: &Arc<MemoryStore>) -> SecurityAuditor {
        SecurityAuditor::new(ActivityLogRepository::new(store.clone(), "activity_logs"))
    }

    #[tokio::test]
    async fn records_event_for_actor() {
        let store = Arc::new(MemoryStore::new());
        let outcome = auditor(&store)
            .log_event(
                &StaticSession::authenticated("u1"),
                AuditAction::SuspiciousUploadAttempt,
                audit_details([("fileName", json!("tool.exe"))]),
                Severity::Danger,
            )
            .await;

        assert_eq!(outcome, AuditOutcome::Recorded);
        let rows = store.rows("activity_logs");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["user_id"], "u1");
        assert_eq!(rows[0]["action"], "SUSPICIOUS_UPLOAD_ATTEMPT");
        assert_eq!(rows[0]["severity"], "danger");
        assert_eq!(rows[0]["details"]["fileName"], "tool.exe");
    }

    #[tokio::test]
    async fn anonymous_session_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let outcome = auditor(&store)
            .log_event(
                &StaticSession::anonymous(),
                AuditAction::FileUploaded,
                AuditDetails::new(),
                Severity::Info,
            )
            .await;

        assert_eq!(outcome, AuditOutcome::Skipped);
        assert_eq!(store.insert_count(), 0);
    }

    #[tokio::test]
    async fn failures_are_absorbed() {
        let store = Arc::new(MemoryStore::new());
        store.fail_inserts("activity_logs");
        let outcome = auditor(&store)
            .log_event(
                &StaticSession::authenticated("u1"),
                AuditAction::UploadFailed,
                AuditDetails::new(),
                Severity::Warning,
            )
            .await;
        assert_eq!(outcome, AuditOutcome::Failed);

        let store = Arc::new(MemoryStore::new());
        let outcome = auditor(&store)
            .log_event(
                &FailingSession,
                AuditAction::UploadFailed,
                AuditDetails::new(),
                Severity::Warning,
            )
            .await;
        assert_eq!(outcome, AuditOutcome::Failed);
        assert_eq!(store.insert_count(), 0);
    }

    #[tokio::test]
    async fn recent_events_requires_actor() {
        let store = Arc::new(MemoryStore::new());
        let auditor = auditor(&store);
        let session = StaticSession::authenticated("u1");
        let _ = auditor
            .log_event(&session, AuditAction::Logout, AuditDetails::new(), Severity::Info)
            .await;

        let events = auditor.recent_events(&session).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, AuditAction::Logout);

        assert!(matches!(
            auditor.recent_events(&StaticSession::anonymous()).await,
            Err(AppError::Unauthorized(_))
        ));
    }
}
