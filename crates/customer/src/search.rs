//! Bioequivalent search.
//!
//! The customer types a brand-name drug; the AI service finds products with
//! the same active principle and the backend prices them. Alternatives are
//! listed cheapest first so the generic shows up on top.

use farmacia_client::ai::{SearchRequest, SearchResult};
use farmacia_client::{AiClient, AiError, ApiClient};
use farmacia_core::{Price, ProductId, TenantId};
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

/// Results requested from the AI service per search.
pub const BIOEQUIVALENT_SEARCH_LIMIT: u32 = 10;

/// Priced alternative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alternative {
    pub id: ProductId,
    pub name: String,
    pub active_principle: Option<String>,
    pub price: Decimal,
    pub is_controlled: bool,
    pub image_url: Option<String>,
}

impl Alternative {
    #[must_use]
    pub fn display_price(&self) -> String {
        Price::clp(self.price).display()
    }
}

/// Search screen state.
#[derive(Debug)]
pub struct BioequivalentSearch {
    ai: AiClient,
    api: ApiClient,
    tenant: TenantId,
    query: String,
    results: Vec<Alternative>,
    has_searched: bool,
}

impl BioequivalentSearch {
    #[must_use]
    pub fn new(ai: AiClient, api: ApiClient, tenant: TenantId) -> Self {
        Self {
            ai,
            api,
            tenant,
            query: String::new(),
            results: Vec::new(),
            has_searched: false,
        }
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// `false` until the first search completes; the screen shows a hint
    /// until then.
    #[must_use]
    pub const fn has_searched(&self) -> bool {
        self.has_searched
    }

    /// Alternatives, cheapest first.
    #[must_use]
    pub fn results(&self) -> &[Alternative] {
        &self.results
    }

    /// Cheapest alternative.
    #[must_use]
    pub fn best(&self) -> Option<&Alternative> {
        self.results.first()
    }

    /// Savings of the cheapest option against the next one.
    #[must_use]
    pub fn savings(&self) -> Option<Decimal> {
        match self.results.as_slice() {
            [best, next, ..] => Some(next.price - best.price),
            _ => None,
        }
    }

    /// Run the search for the current query.
    ///
    /// A blank query does nothing and returns `Ok(false)`. Products whose
    /// price cannot be looked up are left out.
    ///
    /// # Errors
    ///
    /// Returns `AiError` if the AI search fails; the previous results stay.
    #[instrument(skip(self), fields(query = %self.query))]
    pub async fn search(&mut self) -> Result<bool, AiError> {
        let query = self.query.trim();
        if query.is_empty() {
            return Ok(false);
        }

        let request = SearchRequest::new(query)
            .with_tenant(self.tenant.clone())
            .with_limit(BIOEQUIVALENT_SEARCH_LIMIT);
        let response = self.ai.search(request).await?;

        let mut alternatives = Vec::with_capacity(response.results.len());
        for result in response.results {
            if let Some(alternative) = self.price(result).await {
                alternatives.push(alternative);
            }
        }
        alternatives.sort_by(|a, b| a.price.cmp(&b.price));

        info!(found = alternatives.len(), "Bioequivalent search completed");
        self.results = alternatives;
        self.has_searched = true;
        Ok(true)
    }

    async fn price(&self, result: SearchResult) -> Option<Alternative> {
        let product = match self.api.product(&result.id.to_string()).await {
            Ok(product) => product,
            Err(e) => {
                warn!(product_id = %result.id, error = %e, "Price lookup failed");
                return None;
            }
        };
        let Some(price) = product.price else {
            debug!(product_id = %result.id, "Product has no price");
            return None;
        };
        Some(Alternative {
            id: result.id,
            name: result.name,
            active_principle: result.active_principle.or(product.active_principle),
            price,
            is_controlled: result.is_controlled,
            image_url: result.image_url.or(product.image_url),
        })
    }
}
