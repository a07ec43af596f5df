//! Customer app bootstrap.

use std::sync::Arc;

use farmacia_client::telemetry::{self, TelemetryGuard};
use farmacia_client::{
    AiClient, ApiClient, BiometricAuthenticator, BiometricGate, BiometricOutcome, ClientConfig,
    CredentialStore, FileStore, KeyValueStore, LifecycleEvents, PrivacyScreen, SecureStore,
};
use farmacia_core::TenantId;
use tracing::{debug, info};

use crate::error::Result;
use crate::prescription::{ImagePicker, PrescriptionUpload};
use crate::profile::ProfileSettings;
use crate::search::BioequivalentSearch;

/// Name reported to Sentry and in logs.
pub const APP_NAME: &str = "farmacia-customer";

/// Prompt shown when the app is unlocked with biometrics.
pub const UNLOCK_PROMPT: &str = "Desbloquea Farmacia Nordic";

/// Process-wide services of the customer app.
#[derive(Debug)]
pub struct CustomerApp {
    config: ClientConfig,
    credentials: CredentialStore,
    api: ApiClient,
    ai: AiClient,
    lifecycle: LifecycleEvents,
    privacy: PrivacyScreen,
    profile: ProfileSettings,
}

impl CustomerApp {
    /// Build the services, load preferences and mount the privacy screen.
    ///
    /// # Errors
    ///
    /// Returns `AppError` if a client cannot be built or the preferences
    /// cannot be read.
    pub fn new(
        config: ClientConfig,
        credentials: CredentialStore,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self> {
        let api = ApiClient::new(&config, credentials.clone())?;
        let ai = AiClient::new(&config, credentials.clone())?;
        let profile = ProfileSettings::load(store)?;
        let lifecycle = LifecycleEvents::new();
        let privacy = PrivacyScreen::mount(&lifecycle);

        Ok(Self {
            config,
            credentials,
            api,
            ai,
            lifecycle,
            privacy,
            profile,
        })
    }

    /// Load configuration from the environment, start telemetry and open
    /// local storage under the data directory.
    ///
    /// # Errors
    ///
    /// Returns `AppError` if configuration is invalid, the data directory
    /// cannot be created or a client cannot be built.
    pub fn start(secure_store: impl SecureStore + 'static) -> Result<(Self, TelemetryGuard)> {
        let config = ClientConfig::from_env()?;
        let guard = telemetry::init(&config, APP_NAME);
        let store = FileStore::open(&config.data_dir)?;
        let app = Self::new(config, CredentialStore::new(secure_store), Arc::new(store))?;
        info!(data_dir = %app.config.data_dir.display(), "Customer app started");
        Ok((app, guard))
    }

    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub const fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    #[must_use]
    pub const fn lifecycle(&self) -> &LifecycleEvents {
        &self.lifecycle
    }

    /// Whether the privacy overlay covers the app.
    #[must_use]
    pub fn content_hidden(&self) -> bool {
        self.privacy.content_hidden()
    }

    #[must_use]
    pub const fn profile(&self) -> &ProfileSettings {
        &self.profile
    }

    pub const fn profile_mut(&mut self) -> &mut ProfileSettings {
        &mut self.profile
    }

    /// Tenant for AI calls: the signed-in tenant, else the configured one.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Storage` if the keystore cannot be read.
    pub fn tenant(&self) -> Result<TenantId> {
        Ok(self
            .credentials
            .get_tenant_id()?
            .unwrap_or_else(|| self.config.default_tenant.clone()))
    }

    /// Bioequivalent search screen.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Storage` if the tenant cannot be read.
    pub fn bioequivalent_search(&self) -> Result<BioequivalentSearch> {
        Ok(BioequivalentSearch::new(
            self.ai.clone(),
            self.api.clone(),
            self.tenant()?,
        ))
    }

    /// Prescription upload screen.
    pub fn prescription_upload<P: ImagePicker>(&self, picker: P) -> PrescriptionUpload<P> {
        PrescriptionUpload::new(picker, self.api.clone())
    }

    /// Biometric unlock on launch, skipped when the user turned it off.
    pub async fn unlock<A: BiometricAuthenticator>(&self, gate: &BiometricGate<A>) -> BiometricOutcome {
        if !self.profile.preferences().biometric_enabled {
            debug!("Biometric unlock disabled");
            return BiometricOutcome::Success;
        }
        gate.authenticate(Some(UNLOCK_PROMPT)).await
    }

    /// Forget the session. Preferences stay on the device.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Storage` if a key cannot be deleted.
    pub fn sign_out(&self) -> Result<()> {
        telemetry::clear_sentry_user();
        self.credentials.clear_all()?;
        info!("Signed out");
        Ok(())
    }
}
