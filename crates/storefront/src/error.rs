//! Unified error handling with Sentry integration.

use farmacia_client::{AiError, ApiError, ConfigError, StorageError};
use thiserror::Error;

use crate::cart::CartError;
use crate::search::SEARCH_ERROR_TITLE;

/// Text for failures the shopper cannot act on.
pub const GENERIC_ERROR_MESSAGE: &str = "Ocurrio un error, intenta nuevamente";

/// Application-level error type for the web store.
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

    #[error("Cart error: {0}")]
    Cart(#[from] CartError),
}

impl AppError {
    /// Text shown to the shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Cart(CartError::Storage(_)) | Self::Config(_) | Self::Storage(_) => {
                GENERIC_ERROR_MESSAGE.to_string()
            }
            Self::Cart(e) => e.to_string(),
            Self::Api(e) => e.to_string(),
            Self::Ai(_) => SEARCH_ERROR_TITLE.to_string(),
        }
    }

    const fn is_reportable(&self) -> bool {
        match self {
            Self::Api(ApiError::Status(code)) => *code >= 500,
            Self::Api(ApiError::Http(_))
            | Self::Config(_)
            | Self::Storage(_)
            | Self::Cart(CartError::Storage(_))
            | Self::Ai(AiError::Http(_) | AiError::Status(_)) => true,
            _ => false,
        }
    }

    /// Capture server and storage failures to Sentry, then return the text
    /// for the shopper.
    pub fn report(&self) -> String {
        if self.is_reportable() {
            let event_id = sentry::capture_error(self);
            tracing::error!(error = %self, sentry_event_id = %event_id, "Storefront error");
        }
        self.user_message()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
