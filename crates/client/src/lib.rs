//! Farmacia client services library.
//!
//! Everything the three client apps share lives here so each app crate only
//! holds its own screen flows:
//!
//! - [`config`] - Environment-driven configuration
//! - [`telemetry`] - Tracing subscriber and Sentry setup
//! - [`storage`] - Local key-value persistence (cart, preferences)
//! - [`credentials`] - Secure token/tenant/profile storage
//! - [`api`] - Backend REST client (bearer + tenant headers, 401 handling)
//! - [`ai`] - AI service client (semantic search, picking routes)
//! - [`lifecycle`] - Foreground/background event source
//! - [`privacy`] - Privacy overlay driven by lifecycle events
//! - [`biometric`] - Biometric challenge gate over the platform API

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod ai;
pub mod api;
pub mod biometric;
pub mod config;
pub mod credentials;
pub mod lifecycle;
pub mod privacy;
pub mod storage;
pub mod telemetry;

pub use ai::{AiClient, AiError};
pub use api::{ApiClient, ApiError};
pub use biometric::{BiometricAuthenticator, BiometricGate, BiometricOutcome, StaticAuthenticator};
pub use config::{ClientConfig, ConfigError};
pub use credentials::{CredentialStore, MemorySecureStore, SecureStore, UserData};
pub use lifecycle::{LifecycleEvents, LifecycleSubscription};
pub use privacy::PrivacyScreen;
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
