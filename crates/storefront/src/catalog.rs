//! Product catalog with response caching.
//!
//! Product listings, product details and bioequivalent lists are cached for
//! five minutes using `moka`. Stock is always read live.

use std::sync::Arc;
use std::time::Duration;

use farmacia_client::api::{PaginatedResponse, Product};
use farmacia_client::{ApiClient, ApiError};
use farmacia_core::ProductId;
use moka::future::Cache;
use tracing::{debug, instrument};

/// Lifetime of a cached response.
pub const CATALOG_TTL: Duration = Duration::from_secs(300);

/// Maximum cached responses.
pub const CATALOG_CAPACITY: u64 = 1000;

/// Page size of the home page listing.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone)]
enum CacheValue {
    Product(Box<Product>),
    Products(PaginatedResponse<Product>),
    Bioequivalents(Vec<Product>),
}

/// Cached read access to the backend catalog.
#[derive(Clone)]
pub struct Catalog {
    inner: Arc<CatalogInner>,
}

struct CatalogInner {
    api: ApiClient,
    cache: Cache<String, CacheValue>,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("cached_entries", &self.inner.cache.entry_count())
            .finish_non_exhaustive()
    }
}

impl Catalog {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        let cache = Cache::builder()
            .max_capacity(CATALOG_CAPACITY)
            .time_to_live(CATALOG_TTL)
            .build();
        Self {
            inner: Arc::new(CatalogInner { api, cache }),
        }
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// One page of products.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend request fails. Failures are not
    /// cached.
    #[instrument(skip(self))]
    pub async fn products(
        &self,
        page: u32,
        size: u32,
    ) -> Result<PaginatedResponse<Product>, ApiError> {
        let cache_key = format!("products:{page}:{size}");
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products = self.inner.api.products(page, size).await?;
        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;
        Ok(products)
    }

    /// Product by slug or ID.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend request fails.
    #[instrument(skip(self))]
    pub async fn product(&self, slug: &str) -> Result<Product, ApiError> {
        let cache_key = format!("product:{slug}");
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product = self.inner.api.product(slug).await?;
        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// Products sharing the active principle of `product_id`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend request fails.
    #[instrument(skip(self))]
    pub async fn bioequivalents(&self, product_id: ProductId) -> Result<Vec<Product>, ApiError> {
        let cache_key = format!("bioequivalents:{product_id}");
        if let Some(CacheValue::Bioequivalents(products)) = self.inner.cache.get(&cache_key).await
        {
            debug!("Cache hit for bioequivalents");
            return Ok(products);
        }

        let products = self.inner.api.bioequivalents(product_id).await?;
        self.inner
            .cache
            .insert(cache_key, CacheValue::Bioequivalents(products.clone()))
            .await;
        Ok(products)
    }

    /// Live stock, never cached.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend request fails.
    pub async fn stock(&self, product_id: ProductId) -> Result<i64, ApiError> {
        self.inner.api.product_stock(product_id, None).await
    }

    /// Invalidate a cached product.
    pub async fn invalidate_product(&self, slug: &str) {
        self.inner.cache.invalidate(&format!("product:{slug}")).await;
    }

    /// Invalidate all cached data.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

/// Listing tile for a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCard {
    pub name: String,
    pub active_principle: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<String>,
    /// "Requiere Receta" badge.
    pub requires_prescription: bool,
    pub stock_label: Option<String>,
    pub href: String,
}

impl From<&Product> for ProductCard {
    fn from(product: &Product) -> Self {
        let stock_label = product.stock.map(|stock| {
            if stock > 0 {
                format!("{stock} disponibles")
            } else {
                "Agotado".to_string()
            }
        });
        Self {
            name: product.name.clone(),
            active_principle: product.active_principle.clone(),
            image_url: product.image_url.clone(),
            price: product.display_price(),
            requires_prescription: product.is_controlled,
            stock_label,
            href: format!("/product/{}", product.sku),
        }
    }
}
