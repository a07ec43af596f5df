//! Product search: the header search bar and the results page.

use farmacia_client::ai::client::MIN_SUGGESTION_CHARS;
use farmacia_client::ai::{SearchRequest, SearchResult};
use farmacia_client::AiClient;
use farmacia_core::TenantId;
use tracing::{debug, info, instrument, warn};

/// Results requested for the search page.
pub const SEARCH_PAGE_LIMIT: u32 = 20;

/// Heading shown above a failed search.
pub const SEARCH_ERROR_TITLE: &str = "Error al buscar productos";

/// Route of the results page for a query, `None` when the query is blank.
#[must_use]
pub fn search_path(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(format!("/search?q={}", urlencoding::encode(trimmed)))
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchState {
    /// No query given.
    Idle,
    Loaded(Vec<SearchResult>),
    /// The search failed; holds the error text.
    Failed(String),
}

/// Results page at `/search?q=...`.
#[derive(Debug)]
pub struct SearchPage {
    ai: AiClient,
    tenant: TenantId,
    query: String,
    state: SearchState,
}

impl SearchPage {
    #[must_use]
    pub fn new(ai: AiClient, tenant: TenantId, query: impl Into<String>) -> Self {
        Self {
            ai,
            tenant,
            query: query.into(),
            state: SearchState::Idle,
        }
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub const fn state(&self) -> &SearchState {
        &self.state
    }

    #[must_use]
    pub fn results(&self) -> &[SearchResult] {
        match &self.state {
            SearchState::Loaded(results) => results,
            SearchState::Idle | SearchState::Failed(_) => &[],
        }
    }

    /// Error text of a failed search.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            SearchState::Failed(message) => Some(message),
            SearchState::Idle | SearchState::Loaded(_) => None,
        }
    }

    /// Text shown when the search succeeded with no matches.
    #[must_use]
    pub fn empty_message(&self) -> Option<String> {
        match &self.state {
            SearchState::Loaded(results) if results.is_empty() => Some(format!(
                "No encontramos resultados para \"{}\"",
                self.query
            )),
            _ => None,
        }
    }

    /// Run the search. An empty query stays idle without a request.
    #[instrument(skip(self), fields(query = %self.query))]
    pub async fn load(&mut self) -> &SearchState {
        if self.query.is_empty() {
            self.state = SearchState::Idle;
            return &self.state;
        }

        let request = SearchRequest::new(self.query.clone())
            .with_tenant(self.tenant.clone())
            .with_limit(SEARCH_PAGE_LIMIT);
        self.state = match self.ai.search(request).await {
            Ok(response) => {
                info!(found = response.results.len(), "Search completed");
                SearchState::Loaded(response.results)
            }
            Err(e) => {
                warn!(error = %e, "Search failed");
                SearchState::Failed(e.to_string())
            }
        };
        &self.state
    }
}

/// Header search box with type-ahead suggestions.
#[derive(Debug)]
pub struct SearchBar {
    ai: AiClient,
    tenant: TenantId,
    query: String,
    suggestions: Vec<String>,
    open: bool,
}

impl SearchBar {
    #[must_use]
    pub fn new(ai: AiClient, tenant: TenantId) -> Self {
        Self {
            ai,
            tenant,
            query: String::new(),
            suggestions: Vec::new(),
            open: false,
        }
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    /// Whether the suggestion dropdown is shown.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    /// Update the query and refresh suggestions.
    ///
    /// Under two characters the suggestions are cleared without a request.
    #[instrument(skip(self))]
    pub async fn set_query(&mut self, query: &str) -> &[String] {
        self.query = query.to_string();
        if query.chars().count() < MIN_SUGGESTION_CHARS {
            self.suggestions.clear();
            self.open = false;
            return &self.suggestions;
        }

        self.suggestions = self.ai.suggestions(query, &self.tenant).await;
        self.open = !self.suggestions.is_empty();
        debug!(count = self.suggestions.len(), "Suggestions updated");
        &self.suggestions
    }

    /// Submit the typed query. Returns the results route, or `None` for a
    /// blank query. The box is cleared after a submit.
    pub fn submit(&mut self) -> Option<String> {
        let route = search_path(&self.query)?;
        self.reset();
        Some(route)
    }

    /// Pick a suggestion from the dropdown.
    pub fn select_suggestion(&mut self, index: usize) -> Option<String> {
        let route = search_path(self.suggestions.get(index)?)?;
        self.reset();
        Some(route)
    }

    /// Hide the dropdown, keeping the typed text.
    pub const fn close(&mut self) {
        self.open = false;
    }

    fn reset(&mut self) {
        self.query.clear();
        self.suggestions.clear();
        self.open = false;
    }
}
