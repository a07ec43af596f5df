//! Unified error handling with Sentry integration.

use farmacia_client::{AiError, ApiError, ConfigError, StorageError};
use thiserror::Error;

use crate::prescription::UploadError;

/// Alert text for failures the user cannot act on.
pub const GENERIC_ERROR_MESSAGE: &str = "Ocurrio un error, intenta nuevamente";

/// Application-level error type for the customer app.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("AI error: {0}")]
    Ai(#[from] AiError),

    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),
}

impl AppError {
    /// Text for the alert body.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Upload(UploadError::Api(e)) | Self::Api(e) => e.to_string(),
            Self::Upload(e) => e.to_string(),
            Self::Ai(AiError::SearchFailed) => AiError::SearchFailed.to_string(),
            Self::Config(_) | Self::Storage(_) | Self::Ai(_) => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }

    /// Capture backend and device failures to Sentry, then return the alert
    /// text.
    pub fn report(&self) -> String {
        let reportable = match self {
            Self::Api(ApiError::Status(code)) | Self::Upload(UploadError::Api(ApiError::Status(code))) => {
                *code >= 500
            }
            Self::Api(ApiError::Http(_))
            | Self::Upload(UploadError::Api(ApiError::Http(_)) | UploadError::Picker(_))
            | Self::Config(_)
            | Self::Storage(_)
            | Self::Ai(_) => true,
            _ => false,
        };
        if reportable {
            let event_id = sentry::capture_error(self);
            tracing::error!(error = %self, sentry_event_id = %event_id, "Customer app error");
        }
        self.user_message()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        assert_eq!(
            AppError::from(UploadError::PermissionDenied).user_message(),
            "Necesitamos acceso a la camara para fotografiar tu receta"
        );
        assert_eq!(
            AppError::from(UploadError::Api(ApiError::Status(413))).user_message(),
            "API Error: 413"
        );
        assert_eq!(AppError::from(AiError::SearchFailed).report(), "search failed");
        assert_eq!(
            AppError::from(AiError::MissingTenant).user_message(),
            GENERIC_ERROR_MESSAGE
        );
    }
}
