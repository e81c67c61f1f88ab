use firestorex_core::{AppError, RejectionReason, SessionError};
use firestorex_db::DbError;
use firestorex_storage::StorageError;
use thiserror::Error;

/// Errors returned by [`FileUploadService`](super::FileUploadService).
#[derive(Debug, Error)]
pub enum UploadError {
    /// The file failed validation. Displays the user-facing rejection message.
    #[error("{0}")]
    ValidationRejected(RejectionReason),

    #[error("Storage write failed: {0}")]
    StorageWriteFailed(#[source] StorageError),

    /// The object was written but its metadata row was not.
    #[error("Metadata write failed: {0}")]
    MetadataWriteFailed(#[source] DbError),

    #[error("Not signed in")]
    Unauthenticated,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Database(#[from] DbError),
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::ValidationRejected(reason @ RejectionReason::TooLarge { .. }) => {
                AppError::PayloadTooLarge(reason.to_string())
            }
            UploadError::ValidationRejected(reason) => AppError::UploadRejected(reason.to_string()),
            UploadError::StorageWriteFailed(e) => AppError::Storage(e.to_string()),
            UploadError::MetadataWriteFailed(e) => AppError::Database(e.to_string()),
            UploadError::Unauthenticated => AppError::Unauthorized("Not signed in".to_string()),
            UploadError::Session(e) => e.into(),
            UploadError::Storage(StorageError::NotFound(msg)) => AppError::NotFound(msg),
            UploadError::Storage(StorageError::InvalidKey(msg)) => AppError::InvalidInput(msg),
            UploadError::Storage(e) => AppError::Storage(e.to_string()),
            UploadError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firestorex_core::ErrorMetadata;

    #[test]
    fn rejection_displays_verbatim_message() {
        let err = UploadError::ValidationRejected(RejectionReason::BlockedExtension {
            extension: ".exe",
        });
        assert_eq!(
            err.to_string(),
            "Security Alert: File type not allowed. This attempt has been logged."
        );

        let err = UploadError::ValidationRejected(RejectionReason::TooLarge {
            size: 60_000_000,
            max: 52_428_800,
        });
        assert_eq!(err.to_string(), "File size exceeds the 50MB limit.");
    }

    #[test]
    fn converts_to_app_error() {
        let app: AppError = UploadError::ValidationRejected(RejectionReason::TooLarge {
            size: 60_000_000,
            max: 52_428_800,
        })
        .into();
        assert_eq!(app.http_status_code(), 413);

        let app: AppError = UploadError::Unauthenticated.into();
        assert!(matches!(app, AppError::Unauthorized(_)));

        let app: AppError = UploadError::Session(SessionError::Lookup("timeout".into())).into();
        assert!(matches!(app, AppError::Backend(_)));

        let app: AppError =
            UploadError::StorageWriteFailed(StorageError::UploadFailed("down".into())).into();
        assert!(matches!(app, AppError::Storage(_)));
    }
}
