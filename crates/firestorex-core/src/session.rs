//! Session context passed explicitly into every upload and audit call.
//!
//! There is no ambient "current user": callers hand a [`SessionProvider`] to the
//! services, which resolve the actor at the point they need it.

use async_trait::async_trait;

use crate::models::ActorId;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session lookup failed: {0}")]
    Lookup(String),

    #[error("Session token rejected: {0}")]
    TokenRejected(String),
}

/// Resolves the authenticated actor for the current session.
///
/// `Ok(None)` means nobody is signed in; `Err` means resolution itself failed.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn current_actor(&self) -> Result<Option<ActorId>, SessionError>;
}

/// Session with a fixed actor, or an anonymous one.
#[derive(Debug, Clone, Default)]
pub struct StaticSession {
    actor: Option<ActorId>,
}

impl StaticSession {
    pub fn authenticated(actor: impl Into<ActorId>) -> Self {
        Self {
            actor: Some(actor.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self { actor: None }
    }
}

#[async_trait]
impl SessionProvider for StaticSession {
    async fn current_actor(&self) -> Result<Option<ActorId>, SessionError> {
        Ok(self.actor.clone())
    }
}
