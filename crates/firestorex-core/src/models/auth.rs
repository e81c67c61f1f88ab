//! Account models: registration input and hosted-auth session payloads.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::ActorId;

/// Request DTO for creating an account
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegistrationRequest {
    #[validate(custom(function = "validate_username"))]
    pub username: String,
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Please enter a valid email")
    )]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
}

impl RegistrationRequest {
    /// Validate and return the first failure in form order, as a user-facing message.
    pub fn first_error(&self) -> Option<String> {
        let errors = self.validate().err()?;
        let fields = errors.field_errors();

        ["username", "email", "password", "confirm_password"]
            .iter()
            .filter_map(|field| fields.get(*field))
            .flat_map(|errs| errs.iter())
            .map(|err| {
                err.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string())
            })
            .next()
    }
}

fn validate_username(username: &str) -> Result<(), ValidationError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(ValidationError::new("required").with_message("Username is required".into()));
    }
    if username.chars().count() < 3 {
        return Err(ValidationError::new("length")
            .with_message("Username must be at least 3 characters".into()));
    }
    Ok(())
}

/// Email/password pair for password sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Authenticated user as reported by the hosted auth service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: ActorId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

impl AuthUser {
    pub fn username(&self) -> Option<&str> {
        self.user_metadata.get("username").and_then(|v| v.as_str())
    }
}

/// Token bundle returned by sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: AuthUser,
}

/// Result of sign-up. When email confirmation is enabled the service returns
/// the user without a session.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub user: AuthUser,
    pub session: Option<AuthSession>,
}
