//! HTTP client for the AI service.

use std::sync::Arc;

use farmacia_core::{ProductId, TenantId};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument, warn};

use super::AiError;
use super::types::{
    BioequivalentsResult, HealthResponse, PickingRequest, PickingResponse, SearchRequest,
    SearchResponse, SearchResult,
};
use crate::config::ClientConfig;
use crate::credentials::CredentialStore;

/// Minimum query length before suggestions are requested.
pub const MIN_SUGGESTION_CHARS: usize = 2;
/// Number of suggestions requested.
pub const SUGGESTION_LIMIT: u32 = 5;

/// AI service client.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct AiClient {
    inner: Arc<AiClientInner>,
}

struct AiClientInner {
    client: reqwest::Client,
    base_url: String,
    credentials: CredentialStore,
}

impl std::fmt::Debug for AiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

impl AiClient {
    /// Create a client for the configured AI service.
    ///
    /// # Errors
    ///
    /// Returns `AiError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, credentials: CredentialStore) -> Result<Self, AiError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(AiClientInner {
                client,
                base_url: config.ai_base_url.clone(),
                credentials,
            }),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// The caller's tenant, or the stored one when the caller passed none.
    fn resolve_tenant(&self, tenant: &TenantId) -> Option<TenantId> {
        if !tenant.is_empty() {
            return Some(tenant.clone());
        }
        match self.inner.credentials.get_tenant_id() {
            Ok(stored) => stored,
            Err(e) => {
                error!(error = %e, "Error reading secure store");
                None
            }
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, AiError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "AI service request failed");
            return Err(AiError::Status(status.as_u16()));
        }
        Ok(response.json().await?)
    }

    /// Semantic product search.
    ///
    /// # Errors
    ///
    /// Returns `AiError::SearchFailed` on any transport, status or decode
    /// failure, and `AiError::MissingTenant` if no tenant is known.
    #[instrument(skip(self, request), fields(query = %request.query, limit = request.limit))]
    pub async fn search(&self, request: SearchRequest) -> Result<SearchResponse, AiError> {
        let tenant_id = self
            .resolve_tenant(&request.tenant_id)
            .ok_or(AiError::MissingTenant)?;
        let body = SearchRequest {
            tenant_id,
            ..request
        };

        let http = self.inner.client.post(self.url("/search")).json(&body);
        match self.send_json::<SearchResponse>(http).await {
            Ok(response) => {
                debug!(results = response.results.len(), "Search completed");
                Ok(response)
            }
            Err(e) => {
                warn!(error = %e, "Search failed");
                Err(AiError::SearchFailed)
            }
        }
    }

    /// Product names for type-ahead.
    ///
    /// Queries shorter than two characters return nothing without a request.
    /// Any failure also returns nothing.
    #[instrument(skip(self))]
    pub async fn suggestions(&self, query: &str, tenant: &TenantId) -> Vec<String> {
        if query.chars().count() < MIN_SUGGESTION_CHARS {
            return Vec::new();
        }
        let request = SearchRequest::new(query)
            .with_tenant(tenant.clone())
            .with_limit(SUGGESTION_LIMIT);
        self.search(request).await.map_or_else(
            |_| Vec::new(),
            |response| {
                response
                    .results
                    .into_iter()
                    .map(|r: SearchResult| r.name)
                    .collect()
            },
        )
    }

    /// Products sharing the active principle of `product_id`.
    ///
    /// # Errors
    ///
    /// Returns `AiError` on transport failure or non-success status.
    #[instrument(skip(self))]
    pub async fn bioequivalents(
        &self,
        product_id: ProductId,
        tenant: &TenantId,
    ) -> Result<BioequivalentsResult, AiError> {
        let tenant_id = self.resolve_tenant(tenant).ok_or(AiError::MissingTenant)?;
        let request = self
            .inner
            .client
            .get(self.url(&format!("/bioequivalents/{product_id}")))
            .query(&[("tenant_id", tenant_id.as_str())]);
        self.send_json(request).await
    }

    /// FEFO bin allocation and walking order for a pick list.
    ///
    /// # Errors
    ///
    /// Returns `AiError` on transport failure or non-success status.
    #[instrument(skip(self, request), fields(branch_id = %request.branch_id, items = request.items.len()))]
    pub async fn optimize_route(&self, request: &PickingRequest) -> Result<PickingResponse, AiError> {
        let http = self
            .inner
            .client
            .post(self.url("/wms/optimize-route"))
            .json(request);
        let response: PickingResponse = self.send_json(http).await?;
        debug!(
            stops = response.optimized_route.len(),
            eta_secs = response.estimated_time_seconds,
            "Route optimized"
        );
        Ok(response)
    }

    /// Service health.
    ///
    /// # Errors
    ///
    /// Returns `AiError` on transport failure or non-success status.
    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<HealthResponse, AiError> {
        let request = self.inner.client.get(self.url("/health"));
        self.send_json(request).await
    }
}
