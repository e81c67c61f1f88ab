//! Account operations against the hosted auth API (`/auth/v1/...`).

use async_trait::async_trait;
use firestorex_core::models::{AuthSession, AuthUser, Credentials, SignUpOutcome};
use reqwest::Method;
use serde_json::{json, Value};

use crate::{BackendClient, ClientError};

/// Hosted authentication operations used by the account flows.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Create an account. `metadata` is stored as the user's `user_metadata`.
    async fn sign_up(
        &self,
        credentials: &Credentials,
        metadata: Value,
    ) -> Result<SignUpOutcome, ClientError>;

    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthSession, ClientError>;

    /// Revoke the session behind `access_token`.
    async fn sign_out(&self, access_token: &str) -> Result<(), ClientError>;

    /// Resolve the user that owns `access_token`.
    async fn user(&self, access_token: &str) -> Result<AuthUser, ClientError>;
}

/// [`AuthBackend`] for the hosted auth service.
#[derive(Clone)]
pub struct HostedAuth {
    client: BackendClient,
}

impl HostedAuth {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

/// Sign-up answers with a session when the account is usable immediately, or
/// with the bare user (possibly wrapped in `user`) when email confirmation is pending.
fn parse_sign_up(body: Value) -> Result<SignUpOutcome, ClientError> {
    if body.get("access_token").is_some() {
        let session: AuthSession =
            serde_json::from_value(body).map_err(|e| ClientError::Decode(e.to_string()))?;
        return Ok(SignUpOutcome {
            user: session.user.clone(),
            session: Some(session),
        });
    }

    let user_value = match body.get("user") {
        Some(user) if user.is_object() => user.clone(),
        _ => body,
    };
    let user: AuthUser =
        serde_json::from_value(user_value).map_err(|e| ClientError::Decode(e.to_string()))?;

    Ok(SignUpOutcome {
        user,
        session: None,
    })
}

#[async_trait]
impl AuthBackend for HostedAuth {
    #[tracing::instrument(skip(self, credentials, metadata))]
    async fn sign_up(
        &self,
        credentials: &Credentials,
        metadata: Value,
    ) -> Result<SignUpOutcome, ClientError> {
        let request = self
            .client
            .request(Method::POST, "/auth/v1/signup")
            .json(&json!({
                "email": credentials.email,
                "password": credentials.password,
                "data": metadata,
            }));

        let body: Value = self.client.send_json(request).await?;
        parse_sign_up(body)
    }

    #[tracing::instrument(skip(self, credentials))]
    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthSession, ClientError> {
        let request = self
            .client
            .request(Method::POST, "/auth/v1/token")
            .query(&[("grant_type", "password")])
            .json(credentials);

        self.client.send_json(request).await
    }

    #[tracing::instrument(skip(self, access_token))]
    async fn sign_out(&self, access_token: &str) -> Result<(), ClientError> {
        let client = self.client.with_access_token(access_token);
        let request = client.request(Method::POST, "/auth/v1/logout");

        client.send(request).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, access_token))]
    async fn user(&self, access_token: &str) -> Result<AuthUser, ClientError> {
        let client = self.client.with_access_token(access_token);
        let request = client.request(Method::GET, "/auth/v1/user");

        client.send_json(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_up_with_session() {
        let outcome = parse_sign_up(json!({
            "access_token": "jwt",
            "refresh_token": "r",
            "expires_in": 3600,
            "user": { "id": "u1", "email": "a@example.com", "user_metadata": {"username": "alice"} }
        }))
        .unwrap();

        assert_eq!(outcome.user.id.as_str(), "u1");
        assert_eq!(outcome.session.unwrap().access_token, "jwt");
    }

    #[test]
    fn sign_up_pending_confirmation() {
        let outcome = parse_sign_up(json!({
            "id": "u2",
            "email": "b@example.com",
            "user_metadata": {"username": "bob"}
        }))
        .unwrap();

        assert_eq!(outcome.user.username(), Some("bob"));
        assert!(outcome.session.is_none());

        let wrapped = parse_sign_up(json!({ "user": { "id": "u3" }, "session": null })).unwrap();
        assert_eq!(wrapped.user.id.as_str(), "u3");
    }
}
