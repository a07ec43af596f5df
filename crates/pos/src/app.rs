//! Staff app bootstrap.
//!
//! [`PosApp`] owns the process-wide services and mounts the privacy screen
//! at the root, so every module (POS, WMS, HR) is covered in the app
//! switcher.

use std::collections::HashMap;

use chrono::Local;
use farmacia_client::ai::PickingRequest;
use farmacia_client::telemetry::{self, TelemetryGuard};
use farmacia_client::{
    AiClient, ApiClient, BiometricAuthenticator, BiometricGate, ClientConfig, CredentialStore,
    LifecycleEvents, PrivacyScreen, SecureStore, UserData,
};
use farmacia_core::{Module, ProductId, TenantId};
use secrecy::SecretString;
use tracing::{info, instrument, warn};

use crate::error::{AppError, Result};
use crate::hardware::{PrinterService, PrinterTransport, ScannerError, ScannerService};
use crate::payroll::PayrollViewer;
use crate::picking::{PickingSession, ProductLabel, SharedPickingSession};
use crate::register::{CheckoutSummary, Register};

/// Name reported to Sentry and in logs.
pub const APP_NAME: &str = "farmacia-pos";

/// Catalog page size loaded into the register.
pub const REGISTER_PAGE_SIZE: u32 = 50;

/// Process-wide services of the staff app.
#[derive(Debug)]
pub struct PosApp {
    config: ClientConfig,
    credentials: CredentialStore,
    api: ApiClient,
    ai: AiClient,
    lifecycle: LifecycleEvents,
    privacy: PrivacyScreen,
}

impl PosApp {
    /// Build the services and mount the privacy screen.
    ///
    /// # Errors
    ///
    /// Returns `AppError` if an HTTP client cannot be built.
    pub fn new(config: ClientConfig, credentials: CredentialStore) -> Result<Self> {
        let api = ApiClient::new(&config, credentials.clone())?;
        let ai = AiClient::new(&config, credentials.clone())?;
        let lifecycle = LifecycleEvents::new();
        let privacy = PrivacyScreen::mount(&lifecycle);

        Ok(Self {
            config,
            credentials,
            api,
            ai,
            lifecycle,
            privacy,
        })
    }

    /// Load configuration from the environment, start telemetry and build the
    /// app over the platform keystore.
    ///
    /// # Errors
    ///
    /// Returns `AppError` if configuration is invalid or a client cannot be
    /// built.
    pub fn start(secure_store: impl SecureStore + 'static) -> Result<(Self, TelemetryGuard)> {
        let config = ClientConfig::from_env()?;
        let guard = telemetry::init(&config, APP_NAME);
        let app = Self::new(config, CredentialStore::new(secure_store))?;
        info!(api = %app.config.api_base_url, "Staff app started");
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
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub const fn ai(&self) -> &AiClient {
        &self.ai
    }

    /// Event source the platform binding feeds.
    #[must_use]
    pub const fn lifecycle(&self) -> &LifecycleEvents {
        &self.lifecycle
    }

    /// Whether the privacy overlay covers the app.
    #[must_use]
    pub fn content_hidden(&self) -> bool {
        self.privacy.content_hidden()
    }

    /// Module to open for the stored user; POS when nobody is stored.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Storage` if the keystore cannot be read.
    pub fn home_module(&self) -> Result<Module> {
        Ok(self
            .credentials
            .get_user()?
            .map_or(Module::Pos, |user| user.home_module()))
    }

    /// Persist a successful login and tag error reports with the user.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Storage` if the session cannot be stored.
    #[instrument(skip(self, token, refresh_token, user), fields(user_id = %user.id))]
    pub fn sign_in(
        &self,
        token: SecretString,
        refresh_token: Option<SecretString>,
        tenant: &TenantId,
        user: &UserData,
    ) -> Result<Module> {
        self.credentials
            .save_session(token, refresh_token, tenant, user)?;
        telemetry::set_sentry_user(&user.id, Some(&user.email));
        let module = user.home_module();
        info!(route = module.route(), "Signed in");
        Ok(module)
    }

    /// Forget the session.
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

    /// Register loaded with the first catalog page.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Register` if the catalog cannot be loaded.
    pub async fn open_register(&self) -> Result<Register> {
        Ok(Register::load(&self.api, REGISTER_PAGE_SIZE).await?)
    }

    /// Charge the register and print the receipt if a printer is connected.
    ///
    /// A print failure is logged; the sale has already been recorded.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Register` if the sale is rejected.
    pub async fn charge<T: PrinterTransport>(
        &self,
        register: &mut Register,
        printer: &mut PrinterService<T>,
    ) -> Result<Option<CheckoutSummary>> {
        let Some(summary) = register.checkout(&self.api).await? else {
            return Ok(None);
        };
        let sale_id = summary.sale_id.to_string();
        telemetry::add_breadcrumb("pos", "Sale processed", Some(&[("sale_id", sale_id.as_str())]));
        if printer.is_connected() {
            if let Err(e) = summary.print(printer, Local::now()).await {
                warn!(error = %e, sale_id = %summary.sale_id, "Receipt not printed");
            }
        }
        Ok(Some(summary))
    }

    /// Plan a picking route and hand scanner reads to the new session.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Scanner` when the scanner is not connected and
    /// `AppError::Picking` if the route cannot be planned.
    #[instrument(skip_all, fields(branch_id = %request.branch_id))]
    pub async fn start_picking(
        &self,
        request: &PickingRequest,
        labels: &HashMap<ProductId, ProductLabel>,
        scanner: &ScannerService,
    ) -> Result<SharedPickingSession> {
        if !scanner.is_connected() {
            return Err(AppError::Scanner(ScannerError::NotConnected));
        }
        let session = PickingSession::plan(&self.ai, request, labels).await?;
        info!(stops = session.stops().len(), "Picking started");
        Ok(session.attach_scanner(scanner))
    }

    /// Payroll viewer for the signed-in employee.
    pub fn payroll_viewer<A: BiometricAuthenticator>(&self, authenticator: A) -> PayrollViewer<A> {
        PayrollViewer::new(BiometricGate::new(authenticator), self.api.clone(), None)
    }
}
