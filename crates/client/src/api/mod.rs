//! Backend REST API client.
//!
//! Every request carries the stored bearer token and tenant header. A 401
//! response deletes the stored token so the app falls back to the login
//! screen on its next navigation.

pub mod client;
pub mod types;

pub use client::ApiClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when calling the backend API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure, timeout, or undecodable body.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected the credentials; the stored token was deleted.
    #[error("API Error: 401")]
    Unauthorized,

    /// Any other non-success status.
    #[error("API Error: {0}")]
    Status(u16),
}

impl ApiError {
    /// HTTP status code, if the backend answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Status(code) => Some(*code),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(ApiError::Unauthorized.to_string(), "API Error: 401");
        assert_eq!(ApiError::Status(503).to_string(), "API Error: 503");
        assert_eq!(ApiError::Status(404).status(), Some(404));
    }
}
