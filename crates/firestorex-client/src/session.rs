use std::sync::Arc;

use async_trait::async_trait;
use firestorex_core::models::ActorId;
use firestorex_core::{SessionError, SessionProvider};
use tokio::sync::OnceCell;

use crate::auth::AuthBackend;

/// Session backed by a user access token, resolved once through the auth API.
///
/// With no token the session is anonymous. A token the auth service rejects is
/// an error, not an anonymous session.
#[derive(Clone)]
pub struct TokenSession {
    auth: Arc<dyn AuthBackend>,
    access_token: Option<String>,
    resolved: Arc<OnceCell<ActorId>>,
}

impl TokenSession {
    pub fn new(auth: Arc<dyn AuthBackend>, access_token: Option<String>) -> Self {
        Self {
            auth,
            access_token: access_token.filter(|t| !t.trim().is_empty()),
            resolved: Arc::new(OnceCell::new()),
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }
}

#[async_trait]
impl SessionProvider for TokenSession {
    async fn current_actor(&self) -> Result<Option<ActorId>, SessionError> {
        let Some(token) = self.access_token.as_deref() else {
            return Ok(None);
        };

        let actor = self
            .resolved
            .get_or_try_init(|| async {
                let user = self.auth.user(token).await.map_err(|e| {
                    if e.is_unauthorized() {
                        SessionError::TokenRejected(e.to_string())
                    } else {
                        SessionError::Lookup(e.to_string())
                    }
                })?;
                Ok::<_, SessionError>(user.id)
            })
            .await?;

        Ok(Some(actor.clone()))
    }
}
