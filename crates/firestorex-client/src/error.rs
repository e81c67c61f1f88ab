use firestorex_core::AppError;
use firestorex_db::DbError;
use firestorex_storage::StorageError;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Client configuration error: {0}")]
    Config(String),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Http(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self.status(),
            Some(StatusCode::UNAUTHORIZED) | Some(StatusCode::FORBIDDEN)
        )
    }
}

/// Pull a human-readable message out of an error body. The hosted services use
/// `message`, `msg`, `error_description`, or `error` depending on the API.
pub(crate) fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_string();
    };

    ["message", "msg", "error_description", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(String::from)
        .unwrap_or_else(|| body.trim().to_string())
}

fn is_duplicate(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("duplicate") || message.contains("already exists")
}

impl From<ClientError> for StorageError {
    fn from(err: ClientError) -> Self {
        match &err {
            ClientError::Status { status, message } => match *status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    StorageError::PermissionDenied(message.clone())
                }
                StatusCode::NOT_FOUND => StorageError::NotFound(message.clone()),
                StatusCode::CONFLICT => StorageError::AlreadyExists(message.clone()),
                // The storage API reports duplicates as 400 with a "Duplicate" error
                StatusCode::BAD_REQUEST if is_duplicate(message) => {
                    StorageError::AlreadyExists(message.clone())
                }
                _ => StorageError::BackendError(err.to_string()),
            },
            _ => StorageError::BackendError(err.to_string()),
        }
    }
}

impl From<ClientError> for DbError {
    fn from(err: ClientError) -> Self {
        match &err {
            ClientError::Status { status, message } => match *status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    DbError::PermissionDenied(message.clone())
                }
                StatusCode::NOT_FOUND => DbError::NotFound(message.clone()),
                StatusCode::CONFLICT => DbError::Conflict(message.clone()),
                StatusCode::BAD_REQUEST => DbError::InvalidRecord(message.clone()),
                _ => DbError::Query(err.to_string()),
            },
            ClientError::Decode(message) => DbError::InvalidRecord(message.clone()),
            _ => DbError::Backend(err.to_string()),
        }
    }
}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Status { status, message } => match status {
                StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                    AppError::InvalidInput(message)
                }
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Unauthorized(message),
                StatusCode::NOT_FOUND => AppError::NotFound(message),
                _ => AppError::Backend(format!("{}: {}", status, message)),
            },
            ClientError::Config(message) => AppError::Config(message),
            other => AppError::Backend(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: StatusCode, message: &str) -> ClientError {
        ClientError::Status {
            status: code,
            message: message.to_string(),
        }
    }

    #[test]
    fn error_message_prefers_known_fields() {
        assert_eq!(error_message(r#"{"message":"row violates policy"}"#), "row violates policy");
        assert_eq!(error_message(r#"{"msg":"Invalid login credentials"}"#), "Invalid login credentials");
        assert_eq!(error_message("plain text\n"), "plain text");
    }

    #[test]
    fn storage_mapping() {
        assert!(matches!(
            StorageError::from(status(StatusCode::BAD_REQUEST, "Duplicate")),
            StorageError::AlreadyExists(_)
        ));
        assert!(matches!(
            StorageError::from(status(StatusCode::FORBIDDEN, "nope")),
            StorageError::PermissionDenied(_)
        ));
        assert!(matches!(
            StorageError::from(status(StatusCode::INTERNAL_SERVER_ERROR, "boom")),
            StorageError::BackendError(_)
        ));
    }

    #[test]
    fn db_mapping() {
        assert!(matches!(
            DbError::from(status(StatusCode::CONFLICT, "dup")),
            DbError::Conflict(_)
        ));
        assert!(matches!(
            DbError::from(status(StatusCode::UNAUTHORIZED, "jwt expired")),
            DbError::PermissionDenied(_)
        ));
        assert!(status(StatusCode::UNAUTHORIZED, "x").is_unauthorized());
    }
}
