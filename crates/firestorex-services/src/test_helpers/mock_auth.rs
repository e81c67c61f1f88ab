//! Stub auth backend for account flow tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use firestorex_client::{AuthBackend, ClientError, StatusCode};
use firestorex_core::models::{AuthSession, AuthUser, Credentials, SignUpOutcome};
use firestorex_core::ActorId;
use serde_json::{json, Value};

/// Auth backend that knows a single user and one password
#[derive(Clone)]
pub struct StubAuth {
    user_id: ActorId,
    sign_ups: Arc<AtomicUsize>,
    sign_outs: Arc<AtomicUsize>,
}

impl StubAuth {
    pub const PASSWORD: &'static str = "secret1";

    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: ActorId::new(user_id),
            sign_ups: Arc::new(AtomicUsize::new(0)),
            sign_outs: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn sign_ups(&self) -> usize {
        self.sign_ups.load(Ordering::SeqCst)
    }

    pub fn sign_outs(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }

    fn make_user(&self, email: &str, metadata: Value) -> AuthUser {
        AuthUser {
            id: self.user_id.clone(),
            email: Some(email.to_string()),
            user_metadata: metadata,
        }
    }

    fn session(&self, user: AuthUser) -> AuthSession {
        AuthSession {
            access_token: format!("token-{}", self.user_id),
            refresh_token: None,
            expires_in: Some(3600),
            user,
        }
    }
}

#[async_trait]
impl AuthBackend for StubAuth {
    async fn sign_up(
        &self,
        credentials: &Credentials,
        metadata: Value,
    ) -> Result<SignUpOutcome, ClientError> {
        self.sign_ups.fetch_add(1, Ordering::SeqCst);
        let user = self.make_user(&credentials.email, metadata);
        Ok(SignUpOutcome {
            session: Some(self.session(user.clone())),
            user,
        })
    }

    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthSession, ClientError> {
        if credentials.password != Self::PASSWORD {
            return Err(ClientError::Status {
                status: StatusCode::BAD_REQUEST,
                message: "Invalid login credentials".to_string(),
            });
        }
        Ok(self.session(self.make_user(&credentials.email, json!({}))))
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), ClientError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn user(&self, access_token: &str) -> Result<AuthUser, ClientError> {
        if access_token == format!("token-{}", self.user_id) {
            Ok(self.make_user("stub@example.com", json!({})))
        } else {
            Err(ClientError::Status {
                status: StatusCode::UNAUTHORIZED,
                message: "invalid JWT".to_string(),
            })
        }
    }
}
