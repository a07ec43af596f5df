//! AI service client: semantic product search, bioequivalent lookup and
//! warehouse picking routes.

pub mod client;
pub mod types;

pub use client::AiClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when calling the AI service.
#[derive(Debug, Error)]
pub enum AiError {
    /// Semantic search failed for any reason; the cause is logged.
    #[error("search failed")]
    SearchFailed,

    #[error("AI service HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI service error: {0}")]
    Status(u16),

    /// No tenant was given and none is stored.
    #[error("tenant ID required")]
    MissingTenant,
}
