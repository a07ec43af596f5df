//! AI service request and response shapes.
//!
//! The service speaks snake_case while the web clients historically expected
//! camelCase, so every multi-word response field accepts both.

use chrono::NaiveDate;
use farmacia_core::{BatchId, BinId, BranchId, ProductId, TenantId};
use serde::{Deserialize, Serialize};

/// Default number of search results.
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;

/// Body of `POST /search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    /// Filled from the credential store when left empty.
    #[serde(default)]
    pub tenant_id: TenantId,
    pub limit: u32,
}

impl SearchRequest {
    /// Search with the default limit and no explicit tenant.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            tenant_id: TenantId::default(),
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    #[must_use]
    pub fn with_tenant(mut self, tenant: TenantId) -> Self {
        self.tenant_id = tenant;
        self
    }

    #[must_use]
    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }
}

/// A product hit with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "active_principle")]
    pub active_principle: Option<String>,
    #[serde(default, alias = "is_controlled")]
    pub is_controlled: bool,
    #[serde(default, alias = "image_url")]
    pub image_url: Option<String>,
    #[serde(default, alias = "similarity_score")]
    pub similarity_score: Option<f64>,
}

/// Response of `POST /search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub query: String,
    #[serde(alias = "tenant_id")]
    pub tenant_id: TenantId,
    pub results: Vec<SearchResult>,
    pub total: u64,
}

/// Product sharing an active principle with the source product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bioequivalent {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    #[serde(default, alias = "active_principle")]
    pub active_principle: Option<String>,
    #[serde(default, alias = "is_controlled")]
    pub is_controlled: bool,
}

/// Response of `GET /bioequivalents/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BioequivalentsResult {
    #[serde(alias = "source_product_id")]
    pub source_product_id: ProductId,
    pub bioequivalents: Vec<Bioequivalent>,
    pub total: u64,
}

/// Product and quantity to pick. Sent as snake_case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickItem {
    #[serde(alias = "productId")]
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Body of `POST /wms/optimize-route`. Sent as snake_case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickingRequest {
    #[serde(alias = "branchId")]
    pub branch_id: BranchId,
    pub items: Vec<PickItem>,
}

/// Quantity taken from one batch in one bin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinAllocation {
    #[serde(alias = "batch_id")]
    pub batch_id: BatchId,
    #[serde(default, alias = "bin_id")]
    pub bin_id: Option<BinId>,
    #[serde(default, alias = "bin_code")]
    pub bin_code: Option<String>,
    #[serde(default, alias = "zone_name")]
    pub zone_name: Option<String>,
    pub quantity: u32,
    #[serde(alias = "expiry_date")]
    pub expiry_date: NaiveDate,
}

/// Allocations for one requested product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickingLine {
    #[serde(alias = "product_id")]
    pub product_id: ProductId,
    pub allocations: Vec<BinAllocation>,
    #[serde(alias = "total_picked")]
    pub total_picked: u32,
}

impl PickingLine {
    /// `true` when allocations fall short of the requested quantity.
    #[must_use]
    pub const fn is_short(&self, requested: u32) -> bool {
        self.total_picked < requested
    }
}

/// One stop on the picking walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizedRoute {
    pub sequence: u32,
    #[serde(alias = "zone_name")]
    pub zone_name: String,
    #[serde(alias = "bin_code")]
    pub bin_code: String,
    #[serde(alias = "batch_id")]
    pub batch_id: BatchId,
    #[serde(alias = "product_id")]
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Response of `POST /wms/optimize-route`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickingResponse {
    #[serde(alias = "branch_id")]
    pub branch_id: BranchId,
    pub lines: Vec<PickingLine>,
    #[serde(alias = "optimized_route")]
    pub optimized_route: Vec<OptimizedRoute>,
    #[serde(alias = "estimated_time_seconds")]
    pub estimated_time_seconds: u64,
}

/// Response of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub version: String,
    #[serde(default)]
    pub modules: Vec<String>,
}

impl HealthResponse {
    /// `true` when the service and its database report healthy.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy" && self.database == "connected"
    }
}
