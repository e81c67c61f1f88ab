//! Account flows: registration, sign-in, sign-out

use std::sync::Arc;

use chrono::Utc;
use firestorex_client::{AuthBackend, ClientError};
use firestorex_core::models::{
    audit_details, AuditAction, AuthSession, Credentials, ProfileUpsert, RegistrationRequest,
    Severity, SignUpOutcome,
};
use firestorex_core::{AppError, SessionProvider, StaticSession};
use firestorex_db::ProfileRepository;
use serde_json::json;

use crate::audit::SecurityAuditor;

#[derive(Clone)]
pub struct AccountService {
    auth: Arc<dyn AuthBackend>,
    profiles: ProfileRepository,
    auditor: SecurityAuditor,
}

impl AccountService {
    pub fn new(
        auth: Arc<dyn AuthBackend>,
        profiles: ProfileRepository,
        auditor: SecurityAuditor,
    ) -> Self {
        Self {
            auth,
            profiles,
            auditor,
        }
    }

    /// Create an account and its profile row.
    ///
    /// Form validation runs first and reports the first failing field. A profile
    /// write failure is logged but does not fail registration.
    #[tracing::instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: &RegistrationRequest) -> Result<SignUpOutcome, AppError> {
        if let Some(message) = request.first_error() {
            return Err(AppError::InvalidInput(message));
        }

        let username = request.username.trim().to_string();
        let credentials = Credentials {
            email: request.email.trim().to_string(),
            password: request.password.clone(),
        };

        let outcome = self
            .auth
            .sign_up(&credentials, json!({ "username": username }))
            .await?;

        let profile = ProfileUpsert {
            id: outcome.user.id.clone(),
            username: username.clone(),
            email: Some(credentials.email.clone()),
            updated_at: Utc::now(),
        };
        if let Err(e) = self.profiles.upsert(&profile).await {
            tracing::error!(error = %e, user_id = %profile.id, "Error creating profile");
        }

        let session = StaticSession::authenticated(outcome.user.id.clone());
        let _ = self
            .auditor
            .log_event(
                &session,
                AuditAction::AccountCreated,
                audit_details([
                    ("username", json!(username)),
                    ("email", json!(credentials.email)),
                ]),
                Severity::Info,
            )
            .await;

        tracing::info!(user_id = %outcome.user.id, "Account created");
        Ok(outcome)
    }

    /// Password sign-in. A failure is only traced: with no actor there is
    /// nobody to attribute an audit row to.
    #[tracing::instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<AuthSession, AppError> {
        let session = match self.auth.sign_in_with_password(credentials).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "Sign-in failed");
                return Err(sign_in_error(e));
            }
        };

        let actor = StaticSession::authenticated(session.user.id.clone());
        let _ = self
            .auditor
            .log_event(
                &actor,
                AuditAction::LoginSucceeded,
                audit_details([("email", json!(credentials.email))]),
                Severity::Info,
            )
            .await;

        Ok(session)
    }

    /// Audit the sign-out while the actor is still resolvable, then revoke the token.
    #[tracing::instrument(skip(self, session, access_token))]
    pub async fn sign_out(
        &self,
        session: &dyn SessionProvider,
        access_token: &str,
    ) -> Result<(), AppError> {
        let _ = self
            .auditor
            .log_event(
                session,
                AuditAction::Logout,
                Default::default(),
                Severity::Info,
            )
            .await;

        self.auth.sign_out(access_token).await?;
        Ok(())
    }
}

/// Bad credentials come back as a client error; present them as unauthorized.
fn sign_in_error(err: ClientError) -> AppError {
    match err {
        ClientError::Status { status, message } if status.is_client_error() => {
            AppError::Unauthorized(message)
        }
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{MemoryStore, StubAuth};
    use firestorex_db::ActivityLogRepository;

    fn service(auth: StubAuth, db: &Arc<MemoryStore>) -> AccountService {
        AccountService::new(
            Arc::new(auth),
            ProfileRepository::new(db.clone(), "profiles"),
            SecurityAuditor::new(ActivityLogRepository::new(db.clone(), "activity_logs")),
        )
    }

    fn registration(username: &str, password: &str, confirm: &str) -> RegistrationRequest {
        RegistrationRequest {
            username: username.to_string(),
            email: "alice@example.com".to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    #[tokio::test]
    async fn register_creates_profile_and_audits() {
        let db = Arc::new(MemoryStore::new());
        let auth = StubAuth::new("u1");
        let accounts = service(auth.clone(), &db);

        let outcome = accounts
            .register(&registration(" alice ", "secret1", "secret1"))
            .await
            .unwrap();
        assert_eq!(outcome.user.id.as_str(), "u1");
        assert_eq!(auth.sign_ups(), 1);

        let profiles = db.rows("profiles");
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0]["username"], "alice");

        let logs = db.rows("activity_logs");
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0]["action"], "ACCOUNT_CREATED");
        assert_eq!(logs[0]["user_id"], "u1");
    }

    #[tokio::test]
    async fn invalid_registration_never_calls_auth() {
        let db = Arc::new(MemoryStore::new());
        let auth = StubAuth::new("u1");
        let accounts = service(auth.clone(), &db);

        let err = accounts
            .register(&registration("alice", "secret1", "secret2"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(ref m) if m == "Passwords do not match"));
        assert_eq!(auth.sign_ups(), 0);
    }

    #[tokio::test]
    async fn profile_failure_does_not_fail_registration() {
        let db = Arc::new(MemoryStore::new());
        db.fail_inserts("profiles");
        let accounts = service(StubAuth::new("u1"), &db);

        let outcome = accounts
            .register(&registration("alice", "secret1", "secret1"))
            .await;
        assert!(outcome.is_ok());
        assert!(db.rows("profiles").is_empty());
    }

    #[tokio::test]
    async fn sign_in_audits_success_only() {
        let db = Arc::new(MemoryStore::new());
        let accounts = service(StubAuth::new("u1"), &db);

        let good = Credentials {
            email: "alice@example.com".to_string(),
            password: StubAuth::PASSWORD.to_string(),
        };
        let session = accounts.sign_in(&good).await.unwrap();
        assert_eq!(session.user.id.as_str(), "u1");

        let bad = Credentials {
            email: "alice@example.com".to_string(),
            password: "wrong".to_string(),
        };
        assert!(matches!(
            accounts.sign_in(&bad).await,
            Err(AppError::Unauthorized(_))
        ));

        let logs = db.rows("activity_logs");
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0]["action"], "LOGIN_SUCCEEDED");
    }

    #[tokio::test]
    async fn sign_out_audits_then_revokes() {
        let db = Arc::new(MemoryStore::new());
        let auth = StubAuth::new("u1");
        let accounts = service(auth.clone(), &db);

        accounts
            .sign_out(&StaticSession::authenticated("u1"), "token")
            .await
            .unwrap();

        assert_eq!(auth.sign_outs(), 1);
        assert_eq!(db.rows("activity_logs")[0]["action"], "LOGOUT");
    }
}
