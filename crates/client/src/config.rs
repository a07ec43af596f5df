//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional; the defaults point at a local development
//! stack.
//!
//! - `FARMACIA_API_URL` - Backend REST base URL (default: `http://localhost:8080/api`)
//! - `FARMACIA_AI_URL` - AI service base URL (default: `http://localhost:8000`)
//! - `FARMACIA_TENANT_ID` - Tenant used by the web store before login (default: `demo-tenant`)
//! - `FARMACIA_HTTP_TIMEOUT_SECS` - Request timeout in seconds (default: 10)
//! - `FARMACIA_DATA_DIR` - Directory for locally persisted state (default: `.farmacia`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use farmacia_core::TenantId;
use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:8080/api";
const DEFAULT_AI_URL: &str = "http://localhost:8000";
const DEFAULT_TENANT: &str = "demo-tenant";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_DATA_DIR: &str = ".farmacia";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Configuration shared by every client app.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend REST base URL, without trailing slash
    pub api_base_url: String,
    /// AI service base URL, without trailing slash
    pub ai_base_url: String,
    /// Tenant used when no tenant is stored yet
    pub default_tenant: TenantId,
    /// Timeout applied to every HTTP request
    pub http_timeout: Duration,
    /// Directory for locally persisted state
    pub data_dir: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            ai_base_url: DEFAULT_AI_URL.to_string(),
            default_tenant: TenantId::from(DEFAULT_TENANT),
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_base_url = base_url(
            "FARMACIA_API_URL",
            get("FARMACIA_API_URL").as_deref().unwrap_or(DEFAULT_API_URL),
        )?;
        let ai_base_url = base_url(
            "FARMACIA_AI_URL",
            get("FARMACIA_AI_URL").as_deref().unwrap_or(DEFAULT_AI_URL),
        )?;
        let default_tenant =
            TenantId::from(get("FARMACIA_TENANT_ID").unwrap_or_else(|| DEFAULT_TENANT.into()));
        let timeout_secs = get("FARMACIA_HTTP_TIMEOUT_SECS")
            .map_or(Ok(DEFAULT_TIMEOUT_SECS), |raw| {
                raw.trim().parse::<u64>().map_err(|e| {
                    ConfigError::InvalidEnvVar(
                        "FARMACIA_HTTP_TIMEOUT_SECS".to_string(),
                        e.to_string(),
                    )
                })
            })?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "FARMACIA_HTTP_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let data_dir = PathBuf::from(get("FARMACIA_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.into()));

        Ok(Self {
            api_base_url,
            ai_base_url,
            default_tenant,
            http_timeout: Duration::from_secs(timeout_secs),
            data_dir,
            sentry_dsn: get("SENTRY_DSN"),
            sentry_environment: get("SENTRY_ENVIRONMENT"),
        })
    }

    /// Point both services at the given base URLs (used by tests and demos).
    #[must_use]
    pub fn with_base_urls(mut self, api: &str, ai: &str) -> Self {
        self.api_base_url = api.trim_end_matches('/').to_string();
        self.ai_base_url = ai.trim_end_matches('/').to_string();
        self
    }
}

/// Validate a base URL and strip any trailing slash.
fn base_url(key: &str, raw: &str) -> Result<String, ConfigError> {
    let parsed = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme {}", parsed.scheme()),
        ));
    }
    Ok(raw.trim().trim_end_matches('/').to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_map(vars: &[(&str, &str)]) -> Result<ClientConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ClientConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_map(&[]).unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8080/api");
        assert_eq!(config.ai_base_url, "http://localhost:8000");
        assert_eq!(config.default_tenant.as_str(), "demo-tenant");
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_overrides_and_trailing_slash() {
        let config = from_map(&[
            ("FARMACIA_API_URL", "https://api.farmacia.cl/api/"),
            ("FARMACIA_HTTP_TIMEOUT_SECS", "30"),
            ("FARMACIA_TENANT_ID", "tenant-42"),
        ])
        .unwrap();
        assert_eq!(config.api_base_url, "https://api.farmacia.cl/api");
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.default_tenant.as_str(), "tenant-42");
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = from_map(&[("FARMACIA_AI_URL", "  ")]).unwrap();
        assert_eq!(config.ai_base_url, "http://localhost:8000");
    }

    #[test]
    fn test_invalid_url() {
        let err = from_map(&[("FARMACIA_AI_URL", "not a url")]).unwrap_err();
        assert!(err.to_string().contains("FARMACIA_AI_URL"));

        assert!(from_map(&[("FARMACIA_API_URL", "ftp://files.example")]).is_err());
    }

    #[test]
    fn test_invalid_timeout() {
        assert!(from_map(&[("FARMACIA_HTTP_TIMEOUT_SECS", "soon")]).is_err());
        assert!(from_map(&[("FARMACIA_HTTP_TIMEOUT_SECS", "0")]).is_err());
    }
}
