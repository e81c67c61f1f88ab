//! Audit events recorded to the remote activity log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::ActorId;

/// Structured detail payload attached to an audit event.
pub type AuditDetails = serde_json::Map<String, Value>;

/// Build an [`AuditDetails`] map from literal key/value pairs.
pub fn audit_details<const N: usize>(pairs: [(&str, Value); N]) -> AuditDetails {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

/// Security-relevant action tags, written to the log as SCREAMING_SNAKE_CASE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    FileUploaded,
    SuspiciousUploadAttempt,
    UploadFailed,
    MetadataWriteFailed,
    FileDeleted,
    AccessDenied,
    LoginSucceeded,
    LoginFailed,
    Logout,
    AccountCreated,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::FileUploaded => "FILE_UPLOADED",
            AuditAction::SuspiciousUploadAttempt => "SUSPICIOUS_UPLOAD_ATTEMPT",
            AuditAction::UploadFailed => "UPLOAD_FAILED",
            AuditAction::MetadataWriteFailed => "METADATA_WRITE_FAILED",
            AuditAction::FileDeleted => "FILE_DELETED",
            AuditAction::AccessDenied => "ACCESS_DENIED",
            AuditAction::LoginSucceeded => "LOGIN_SUCCEEDED",
            AuditAction::LoginFailed => "LOGIN_FAILED",
            AuditAction::Logout => "LOGOUT",
            AuditAction::AccountCreated => "ACCOUNT_CREATED",
        }
    }
}

/// Risk level of an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Danger,
}

/// Audit event as submitted by the client. The store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAuditEvent {
    pub user_id: ActorId,
    pub action: AuditAction,
    pub details: AuditDetails,
    pub severity: Severity,
}

/// Audit event as stored in the activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: Uuid,
    pub user_id: ActorId,
    pub action: AuditAction,
    #[serde(default)]
    pub details: AuditDetails,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn action_serializes_as_screaming_snake_case() {
        let value = serde_json::to_value(AuditAction::SuspiciousUploadAttempt).unwrap();
        assert_eq!(value, json!("SUSPICIOUS_UPLOAD_ATTEMPT"));
        assert_eq!(
            AuditAction::SuspiciousUploadAttempt.as_str(),
            "SUSPICIOUS_UPLOAD_ATTEMPT"
        );
    }

    #[test]
    fn new_event_wire_shape() {
        let event = NewAuditEvent {
            user_id: ActorId::new("user-1"),
            action: AuditAction::FileUploaded,
            details: audit_details([("fileName", json!("a.pdf")), ("path", json!("u/a.pdf"))]),
            severity: Severity::Info,
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "user_id": "user-1",
                "action": "FILE_UPLOADED",
                "details": { "fileName": "a.pdf", "path": "u/a.pdf" },
                "severity": "info"
            })
        );
    }
}
