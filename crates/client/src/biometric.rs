//! Biometric challenge before showing sensitive screens.
//!
//! [`BiometricAuthenticator`] is implemented by the platform binding
//! (fingerprint/face APIs). [`BiometricGate`] turns its raw results into the
//! user-facing outcome shown by the apps.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Default prompt shown by the OS dialog.
pub const DEFAULT_PROMPT: &str = "Confirma tu identidad";
/// Label of the passcode fallback button.
pub const FALLBACK_LABEL: &str = "Usar contraseña";

pub const MSG_UNAVAILABLE: &str = "Biometria no disponible";
pub const MSG_CANCELLED: &str = "Autenticacion cancelada";
pub const MSG_ERROR: &str = "Error de autenticacion";

/// Authentication method as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthenticationType {
    Fingerprint,
    FacialRecognition,
    Iris,
    /// Platform code with no known mapping.
    Other(u8),
}

/// Normalized biometric kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BiometricKind {
    Fingerprint,
    Face,
    Iris,
    Unknown,
}

impl BiometricKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fingerprint => "fingerprint",
            Self::Face => "face",
            Self::Iris => "iris",
            Self::Unknown => "unknown",
        }
    }
}

impl From<AuthenticationType> for BiometricKind {
    fn from(value: AuthenticationType) -> Self {
        match value {
            AuthenticationType::Fingerprint => Self::Fingerprint,
            AuthenticationType::FacialRecognition => Self::Face,
            AuthenticationType::Iris => Self::Iris,
            AuthenticationType::Other(_) => Self::Unknown,
        }
    }
}

/// Options passed to the OS prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptOptions {
    pub prompt_message: String,
    pub fallback_label: String,
    pub disable_device_fallback: bool,
}

impl PromptOptions {
    #[must_use]
    pub fn new(prompt_message: impl Into<String>) -> Self {
        Self {
            prompt_message: prompt_message.into(),
            fallback_label: FALLBACK_LABEL.to_string(),
            disable_device_fallback: false,
        }
    }
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self::new(DEFAULT_PROMPT)
    }
}

/// Raw result of the OS prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformAuthResult {
    Success,
    /// The user dismissed the prompt or it failed verification.
    Cancelled { reason: Option<String> },
}

/// The platform call itself failed.
#[derive(Debug, Error)]
#[error("biometric platform error: {0}")]
pub struct PlatformAuthError(pub String);

/// Platform biometric API.
#[async_trait]
pub trait BiometricAuthenticator: Send + Sync {
    async fn has_hardware(&self) -> bool;
    async fn is_enrolled(&self) -> bool;
    async fn authenticate(
        &self,
        options: &PromptOptions,
    ) -> Result<PlatformAuthResult, PlatformAuthError>;
    async fn supported_types(&self) -> Vec<AuthenticationType>;
}

/// Outcome shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BiometricOutcome {
    Success,
    Failed(String),
}

impl BiometricOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Reason for a failed outcome.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Success => None,
            Self::Failed(reason) => Some(reason),
        }
    }
}

/// Wraps a platform authenticator with availability checks and messages.
#[derive(Debug)]
pub struct BiometricGate<A> {
    authenticator: A,
    authenticating: AtomicBool,
}

/// Clears the in-progress flag on every exit path.
struct InProgress<'a>(&'a AtomicBool);

impl Drop for InProgress<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<A: BiometricAuthenticator> BiometricGate<A> {
    pub const fn new(authenticator: A) -> Self {
        Self {
            authenticator,
            authenticating: AtomicBool::new(false),
        }
    }

    /// Hardware present and at least one biometric enrolled.
    pub async fn is_available(&self) -> bool {
        self.authenticator.has_hardware().await && self.authenticator.is_enrolled().await
    }

    /// `true` while a prompt is on screen.
    pub fn is_authenticating(&self) -> bool {
        self.authenticating.load(Ordering::SeqCst)
    }

    /// Show the OS prompt; `None` uses [`DEFAULT_PROMPT`].
    #[instrument(skip(self))]
    pub async fn authenticate(&self, prompt: Option<&str>) -> BiometricOutcome {
        self.authenticating.store(true, Ordering::SeqCst);
        let _in_progress = InProgress(&self.authenticating);

        if !self.is_available().await {
            debug!("Biometrics unavailable");
            return BiometricOutcome::Failed(MSG_UNAVAILABLE.to_string());
        }

        let options = PromptOptions::new(prompt.unwrap_or(DEFAULT_PROMPT));
        match self.authenticator.authenticate(&options).await {
            Ok(PlatformAuthResult::Success) => BiometricOutcome::Success,
            Ok(PlatformAuthResult::Cancelled { reason }) => {
                debug!(reason = ?reason, "Biometric prompt cancelled");
                BiometricOutcome::Failed(
                    reason
                        .filter(|r| !r.is_empty())
                        .unwrap_or_else(|| MSG_CANCELLED.to_string()),
                )
            }
            Err(e) => {
                warn!(error = %e, "Biometric authentication error");
                BiometricOutcome::Failed(MSG_ERROR.to_string())
            }
        }
    }

    /// Supported biometric kinds.
    pub async fn supported_types(&self) -> Vec<BiometricKind> {
        self.authenticator
            .supported_types()
            .await
            .into_iter()
            .map(BiometricKind::from)
            .collect()
    }
}

/// Authenticator with fixed answers.
///
/// Used on platforms without a biometric binding (desktop builds report no
/// hardware) and in tests.
#[derive(Debug, Clone)]
pub struct StaticAuthenticator {
    pub hardware: bool,
    pub enrolled: bool,
    pub result: Result<PlatformAuthResult, String>,
    pub types: Vec<AuthenticationType>,
}

impl StaticAuthenticator {
    /// No biometric hardware.
    #[must_use]
    pub const fn unavailable() -> Self {
        Self {
            hardware: false,
            enrolled: false,
            result: Ok(PlatformAuthResult::Cancelled { reason: None }),
            types: Vec::new(),
        }
    }

    /// Enrolled fingerprint reader answering with `result`.
    #[must_use]
    pub fn enrolled(result: Result<PlatformAuthResult, String>) -> Self {
        Self {
            hardware: true,
            enrolled: true,
            result,
            types: vec![AuthenticationType::Fingerprint],
        }
    }
}

#[async_trait]
impl BiometricAuthenticator for StaticAuthenticator {
    async fn has_hardware(&self) -> bool {
        self.hardware
    }

    async fn is_enrolled(&self) -> bool {
        self.enrolled
    }

    async fn authenticate(
        &self,
        _options: &PromptOptions,
    ) -> Result<PlatformAuthResult, PlatformAuthError> {
        self.result.clone().map_err(PlatformAuthError)
    }

    async fn supported_types(&self) -> Vec<AuthenticationType> {
        self.types.clone()
    }
}
