//! HTTP client for the backend REST API.

use std::sync::Arc;

use farmacia_core::{BranchId, EmployeeId, ProductId};
use reqwest::{RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument, warn};

use super::ApiError;
use super::types::{
    BioequivalentsResponse, CreateSaleRequest, PaginatedResponse, Payroll, PrescriptionImage,
    PrescriptionReceipt, Product, Sale, StockResponse,
};
use crate::config::ClientConfig;
use crate::credentials::CredentialStore;

/// Header carrying the tenant ID on every request.
pub const TENANT_HEADER: &str = "X-Tenant-ID";

/// Backend REST client.
///
/// Cheap to clone; clones share the connection pool and credential store.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
    credentials: CredentialStore,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, credentials: CredentialStore) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_base_url.clone(),
                credentials,
            }),
        })
    }

    /// Credential store the client reads from.
    #[must_use]
    pub fn credentials(&self) -> &CredentialStore {
        &self.inner.credentials
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Attach the bearer token and tenant header when stored.
    ///
    /// A keystore failure is logged and the request goes out without them.
    fn authorize(&self, mut request: RequestBuilder) -> RequestBuilder {
        let credentials = &self.inner.credentials;

        match credentials.get_token() {
            Ok(Some(token)) if !token.expose_secret().is_empty() => {
                request = request.bearer_auth(token.expose_secret());
            }
            Ok(_) => {}
            Err(e) => error!(error = %e, "Error reading secure store"),
        }

        match credentials.get_tenant_id() {
            Ok(Some(tenant)) => {
                request = request.header(TENANT_HEADER, tenant.as_str());
            }
            Ok(None) => {}
            Err(e) => error!(error = %e, "Error reading secure store"),
        }

        request
    }

    /// Send an authorized request and map failure statuses.
    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            warn!("Backend returned 401, clearing stored token");
            if let Err(e) = self.inner.credentials.delete_token() {
                error!(error = %e, "Failed to delete stored token");
            }
            return Err(ApiError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Backend request failed");
            return Err(ApiError::Status(status.as_u16()));
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }

    /// List catalog products.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or non-success status.
    #[instrument(skip(self))]
    pub async fn products(&self, page: u32, size: u32) -> Result<PaginatedResponse<Product>, ApiError> {
        let request = self
            .inner
            .client
            .get(self.url("/products"))
            .query(&[("page", page), ("size", size)]);
        let products: PaginatedResponse<Product> = self.get_json(request).await?;
        debug!(count = products.data.len(), total = products.total, "Fetched products");
        Ok(products)
    }

    /// Fetch a product by slug or ID.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or non-success status.
    #[instrument(skip(self))]
    pub async fn product(&self, slug: &str) -> Result<Product, ApiError> {
        let request = self.inner.client.get(self.url(&format!("/products/{slug}")));
        self.get_json(request).await
    }

    /// Current stock of a product, optionally at one branch.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or non-success status.
    #[instrument(skip(self))]
    pub async fn product_stock(
        &self,
        product_id: ProductId,
        branch_id: Option<BranchId>,
    ) -> Result<i64, ApiError> {
        let mut request = self
            .inner
            .client
            .get(self.url(&format!("/inventory/stock/{product_id}")));
        if let Some(branch) = branch_id {
            request = request.query(&[("branchId", branch.to_string())]);
        }
        let response: StockResponse = self.get_json(request).await?;
        Ok(response.stock)
    }

    /// Products sharing the active principle of `product_id`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or non-success status.
    #[instrument(skip(self))]
    pub async fn bioequivalents(&self, product_id: ProductId) -> Result<Vec<Product>, ApiError> {
        let request = self
            .inner
            .client
            .get(self.url(&format!("/products/{product_id}/bioequivalents")));
        let response: BioequivalentsResponse = self.get_json(request).await?;
        Ok(response.bioequivalents)
    }

    /// Record a sale.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or non-success status.
    #[instrument(skip(self, sale), fields(items = sale.items.len(), prescriptions = sale.prescriptions.len()))]
    pub async fn create_sale(&self, sale: &CreateSaleRequest) -> Result<Sale, ApiError> {
        let request = self.inner.client.post(self.url("/sales")).json(sale);
        let created: Sale = self.get_json(request).await?;
        debug!(sale_id = %created.id, total = %created.total_amount, "Sale created");
        Ok(created)
    }

    /// List sales.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or non-success status.
    #[instrument(skip(self))]
    pub async fn sales(&self, page: u32, size: u32) -> Result<PaginatedResponse<Sale>, ApiError> {
        let request = self
            .inner
            .client
            .get(self.url("/sales"))
            .query(&[("page", page), ("size", size)]);
        self.get_json(request).await
    }

    /// Payroll slips, for one employee or for the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or non-success status.
    #[instrument(skip(self))]
    pub async fn payrolls(&self, employee_id: Option<EmployeeId>) -> Result<Vec<Payroll>, ApiError> {
        let mut request = self.inner.client.get(self.url("/payrolls"));
        if let Some(employee) = employee_id {
            request = request.query(&[("employeeId", employee.to_string())]);
        }
        self.get_json(request).await
    }

    /// Upload a prescription image.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on an invalid MIME type, transport failure or
    /// non-success status.
    #[instrument(skip(self, image), fields(file = %image.file_name, bytes = image.bytes.len()))]
    pub async fn upload_prescription(
        &self,
        image: &PrescriptionImage,
    ) -> Result<PrescriptionReceipt, ApiError> {
        let part = reqwest::multipart::Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.mime_type)?;
        let form = reqwest::multipart::Form::new().part("file", part);
        let request = self
            .inner
            .client
            .post(self.url("/prescriptions"))
            .multipart(form);
        self.get_json(request).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use farmacia_core::TenantId;
    use secrecy::SecretString;
    use wiremock::matchers::{header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer, credentials: CredentialStore) -> ApiClient {
        let config = ClientConfig::default().with_base_urls(&server.uri(), &server.uri());
        ApiClient::new(&config, credentials).unwrap()
    }

    fn signed_in() -> CredentialStore {
        let credentials = CredentialStore::in_memory();
        credentials
            .save_token(SecretString::from("jwt-123".to_string()))
            .unwrap();
        credentials
            .save_tenant_id(&TenantId::from("tenant-9"))
            .unwrap();
        credentials
    }

    fn product_json(id: u128, name: &str) -> serde_json::Value {
        serde_json::json!({
            "id": uuid::Uuid::from_u128(id),
            "sku": format!("SKU-{id}"),
            "name": name,
            "description": null,
            "activePrinciple": "Paracetamol",
            "isControlled": false,
            "imageUrl": null,
            "price": 2990
        })
    }

    #[tokio::test]
    async fn test_attaches_bearer_and_tenant_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products"))
            .and(query_param("page", "0"))
            .and(query_param("size", "20"))
            .and(header("authorization", "Bearer jwt-123"))
            .and(header("x-tenant-id", "tenant-9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [product_json(1, "Paracetamol 500mg")],
                "total": 1,
                "page": 0,
                "pageSize": 20
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, signed_in());
        let page = client.products(0, 20).await.unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].name, "Paracetamol 500mg");
    }

    #[tokio::test]
    async fn test_no_headers_without_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products/paracetamol"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/products/paracetamol"))
            .respond_with(ResponseTemplate::new(200).set_body_json(product_json(1, "Paracetamol")))
            .mount(&server)
            .await;

        let client = client_for(&server, CredentialStore::in_memory());
        let product = client.product("paracetamol").await.unwrap();
        assert_eq!(product.name, "Paracetamol");
    }

    #[tokio::test]
    async fn test_unauthorized_deletes_token_only() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sales"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let credentials = signed_in();
        let client = client_for(&server, credentials.clone());
        let err = client.sales(0, 20).await.unwrap_err();

        assert!(matches!(err, ApiError::Unauthorized));
        assert!(credentials.get_token().unwrap().is_none());
        assert_eq!(
            credentials.get_tenant_id().unwrap().unwrap().as_str(),
            "tenant-9"
        );
    }

    #[tokio::test]
    async fn test_other_status_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let credentials = signed_in();
        let client = client_for(&server, credentials.clone());
        let err = client.products(0, 20).await.unwrap_err();

        assert_eq!(err.to_string(), "API Error: 503");
        assert!(credentials.get_token().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_stock_with_branch() {
        let server = MockServer::start().await;
        let product = ProductId::new(uuid::Uuid::from_u128(5));
        let branch = BranchId::new(uuid::Uuid::from_u128(8));
        Mock::given(method("GET"))
            .and(path(format!("/inventory/stock/{product}")))
            .and(query_param("branchId", branch.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"stock": 42})))
            .mount(&server)
            .await;

        let client = client_for(&server, signed_in());
        assert_eq!(client.product_stock(product, Some(branch)).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_bioequivalents_unwraps_envelope() {
        let server = MockServer::start().await;
        let product = ProductId::new(uuid::Uuid::from_u128(5));
        Mock::given(method("GET"))
            .and(path(format!("/products/{product}/bioequivalents")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "bioequivalents": [product_json(6, "Paracetamol Generico"), product_json(7, "Panadol")]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, signed_in());
        let products = client.bioequivalents(product).await.unwrap();
        assert_eq!(products.len(), 2);
    }

    #[tokio::test]
    async fn test_payrolls_filter_by_employee() {
        let server = MockServer::start().await;
        let employee = EmployeeId::new(uuid::Uuid::from_u128(3));
        Mock::given(method("GET"))
            .and(path("/payrolls"))
            .and(query_param("employeeId", employee.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "id": uuid::Uuid::from_u128(9),
                "employeeId": employee,
                "periodStart": "2026-09-01",
                "periodEnd": "2026-09-30",
                "totalLiquid": 850000,
                "commissionAmount": 45000
            }])))
            .mount(&server)
            .await;

        let client = client_for(&server, signed_in());
        let payrolls = client.payrolls(Some(employee)).await.unwrap();
        assert_eq!(payrolls.len(), 1);
        assert_eq!(payrolls[0].period_label(), "09/2026");
    }

    #[tokio::test]
    async fn test_upload_prescription_multipart() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/prescriptions"))
            .and(header("x-tenant-id", "tenant-9"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(serde_json::json!({"id": "rx-1", "status": "PENDING_REVIEW"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, signed_in());
        let receipt = client
            .upload_prescription(&PrescriptionImage {
                file_name: "receta.jpg".to_string(),
                mime_type: "image/jpeg".to_string(),
                bytes: vec![0xFF, 0xD8, 0xFF],
            })
            .await
            .unwrap();
        assert_eq!(receipt.id, "rx-1");
    }
}
