//! Unified error handling with Sentry integration.
//!
//! Screens turn any failure into an [`AppError`] and show
//! [`AppError::user_message`] in an alert. Failures that point at the backend
//! or the device are captured to Sentry first.

use farmacia_client::{AiError, ApiError, ConfigError, StorageError};
use thiserror::Error;

use crate::hardware::{PrinterError, ScannerError};
use crate::payroll::{ACCESS_DENIED_MESSAGE, PayrollError};
use crate::picking::PickingError;
use crate::register::RegisterError;

/// Alert text for failures the user cannot act on.
pub const GENERIC_ERROR_MESSAGE: &str = "Ocurrio un error, intente nuevamente";

/// Alert text after the backend rejected the stored token.
pub const SESSION_EXPIRED_MESSAGE: &str = "Sesion expirada, ingrese nuevamente";

/// Application-level error type for the staff app.
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

    #[error("Register error: {0}")]
    Register(#[from] RegisterError),

    #[error("Picking error: {0}")]
    Picking(#[from] PickingError),

    #[error("Payroll error: {0}")]
    Payroll(#[from] PayrollError),

    #[error("Printer error: {0}")]
    Printer(#[from] PrinterError),

    #[error("Scanner error: {0}")]
    Scanner(#[from] ScannerError),
}

impl AppError {
    /// Text for the alert body.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(ApiError::Unauthorized)
            | Self::Register(RegisterError::Api(ApiError::Unauthorized))
            | Self::Payroll(PayrollError::Api(ApiError::Unauthorized)) => {
                SESSION_EXPIRED_MESSAGE.to_string()
            }
            Self::Api(e) => e.to_string(),
            Self::Register(e) => e.to_string(),
            Self::Picking(e) => e.to_string(),
            Self::Payroll(PayrollError::Denied(reason)) if reason.is_empty() => {
                ACCESS_DENIED_MESSAGE.to_string()
            }
            Self::Payroll(e) => e.to_string(),
            Self::Printer(PrinterError::NotConnected) => "Impresora no conectada".to_string(),
            Self::Scanner(ScannerError::NotConnected) => "Escaner no conectado".to_string(),
            Self::Ai(AiError::SearchFailed) => AiError::SearchFailed.to_string(),
            Self::Config(_) | Self::Storage(_) | Self::Ai(_) | Self::Printer(_) => {
                GENERIC_ERROR_MESSAGE.to_string()
            }
        }
    }

    /// `true` for failures worth an error report.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        match self {
            Self::Api(ApiError::Status(code)) => *code >= 500,
            Self::Register(RegisterError::Api(ApiError::Status(code))) => *code >= 500,
            Self::Api(ApiError::Http(_))
            | Self::Register(RegisterError::Api(ApiError::Http(_)))
            | Self::Config(_)
            | Self::Storage(_)
            | Self::Ai(_)
            | Self::Printer(PrinterError::Transport(_)) => true,
            _ => false,
        }
    }

    /// Capture to Sentry when reportable, then return the alert text.
    pub fn report(&self) -> String {
        if self.is_reportable() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Staff app error"
            );
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
            AppError::from(ApiError::Status(503)).user_message(),
            "API Error: 503"
        );
        assert_eq!(
            AppError::from(RegisterError::MissingPrescriptionData).user_message(),
            "Complete los datos de la receta"
        );
        assert_eq!(
            AppError::from(PayrollError::Denied("user_cancel".to_string())).user_message(),
            "user_cancel"
        );
        assert_eq!(
            AppError::from(PickingError::NotVerified).user_message(),
            "Escanee el producto antes de confirmar"
        );
        assert_eq!(
            AppError::from(AiError::SearchFailed).user_message(),
            "search failed"
        );
    }

    #[test]
    fn test_reportable() {
        assert!(AppError::from(ApiError::Status(502)).is_reportable());
        assert!(!AppError::from(ApiError::Status(404)).is_reportable());
        assert!(!AppError::from(ApiError::Unauthorized).is_reportable());
        assert!(!AppError::from(PickingError::NotVerified).is_reportable());
        assert!(
            AppError::from(RegisterError::Api(ApiError::Status(500))).is_reportable()
        );
    }

    #[test]
    fn test_report_without_sentry_returns_message() {
        assert_eq!(
            AppError::from(ApiError::Status(500)).report(),
            "API Error: 500"
        );
    }
}
