//! Web store bootstrap.

use std::sync::Arc;

use farmacia_client::telemetry::{self, TelemetryGuard};
use farmacia_client::{
    AiClient, ApiClient, ClientConfig, CredentialStore, FileStore, KeyValueStore, SecureStore,
};
use farmacia_core::TenantId;
use tracing::info;

use crate::cart::CartStore;
use crate::catalog::Catalog;
use crate::error::Result;
use crate::product_page::ProductPage;
use crate::search::{SearchBar, SearchPage};

/// Name reported to Sentry and in logs.
pub const APP_NAME: &str = "farmacia-storefront";

/// Process-wide services of the web store.
#[derive(Debug)]
pub struct StorefrontApp {
    config: ClientConfig,
    credentials: CredentialStore,
    ai: AiClient,
    catalog: Catalog,
    cart: Arc<CartStore>,
}

impl StorefrontApp {
    /// Build the clients and restore the saved cart.
    ///
    /// # Errors
    ///
    /// Returns `AppError` if a client cannot be built or the cart cannot be
    /// read.
    pub fn new(
        config: ClientConfig,
        credentials: CredentialStore,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self> {
        let api = ApiClient::new(&config, credentials.clone())?;
        let ai = AiClient::new(&config, credentials.clone())?;
        let cart = Arc::new(CartStore::open(store)?);

        Ok(Self {
            config,
            credentials,
            ai,
            catalog: Catalog::new(api),
            cart,
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
        info!(
            tenant = %app.config.default_tenant.as_str(),
            cart_items = app.cart.item_count(),
            "Storefront started"
        );
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
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Shared cart.
    #[must_use]
    pub const fn cart(&self) -> &Arc<CartStore> {
        &self.cart
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

    /// Header search box.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Storage` if the tenant cannot be read.
    pub fn search_bar(&self) -> Result<SearchBar> {
        Ok(SearchBar::new(self.ai.clone(), self.tenant()?))
    }

    /// Results page for `query`, already loaded.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Storage` if the tenant cannot be read. A failed
    /// search is part of the page state.
    pub async fn search_page(&self, query: &str) -> Result<SearchPage> {
        let mut page = SearchPage::new(self.ai.clone(), self.tenant()?, query);
        page.load().await;
        Ok(page)
    }

    /// Product page for `slug`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Api` if the product cannot be fetched.
    pub async fn product_page(&self, slug: &str) -> Result<ProductPage> {
        Ok(ProductPage::load(&self.catalog, slug).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use farmacia_client::MemoryStore;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::cart::CART_STORAGE_KEY;
    use crate::error::AppError;

    fn app(server: &MockServer, store: Arc<dyn KeyValueStore>) -> StorefrontApp {
        let config = ClientConfig::default().with_base_urls(&server.uri(), &server.uri());
        StorefrontApp::new(config, CredentialStore::in_memory(), store).unwrap()
    }

    #[tokio::test]
    async fn test_restores_saved_cart() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryStore::new());
        store
            .set(
                CART_STORAGE_KEY,
                &json!([{
                    "id": uuid::Uuid::from_u128(1),
                    "name": "Paracetamol 500mg",
                    "price": 2990,
                    "quantity": 2,
                    "imageUrl": null,
                    "isControlled": false
                }])
                .to_string(),
            )
            .unwrap();

        let app = app(&server, store);
        assert_eq!(app.cart().item_count(), 2);
        assert_eq!(app.cart().total_price().display(), "$5.980");
    }

    #[tokio::test]
    async fn test_search_uses_default_tenant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(body_partial_json(json!({"tenant_id": "demo-tenant", "limit": 20})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": "omeprazol",
                "tenant_id": "demo-tenant",
                "results": [],
                "total": 0
            })))
            .expect(1)
            .mount(&server)
            .await;

        let app = app(&server, Arc::new(MemoryStore::new()));
        let page = app.search_page("omeprazol").await.unwrap();
        assert!(page.empty_message().is_some());
    }

    #[tokio::test]
    async fn test_missing_product_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products/no-existe"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let app = app(&server, Arc::new(MemoryStore::new()));
        let err = app.product_page("no-existe").await.unwrap_err();
        assert!(matches!(err, AppError::Api(_)));
        assert_eq!(err.user_message(), "API Error: 404");
    }
}
