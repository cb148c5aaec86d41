//! The [`ShowSearcher`] facade.
//!
//! ```rust
//! use chrono::Utc;
//! use showscout::{SearchFilter, ShowSearcher};
//! use showscout_store::{InMemoryStore, test_data::{AUSTIN, sample_shows}};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let searcher = ShowSearcher::new(InMemoryStore::new(sample_shows(Utc::now())));
//! let response = searcher.search(&SearchFilter::near(AUSTIN).radius_miles(25.0)).await;
//! assert!(response.error.is_none());
//! for show in &response.data.data {
//!     println!("{} ({:.1} mi)", show.title, show.distance_miles.unwrap_or_default());
//! }
//! # });
//! ```

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use showscout_store::ShowStore;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::search::{
    PageResult, SearchConfig, SearchError, SearchFilter, SearchOutcome, SearchStrategy, run_search,
};

/// What a caller gets back from every search: always a well-formed page,
/// plus an error description when the search could not be carried out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub data: PageResult,
    pub error: Option<String>,
    /// The strategy whose rows produced `data`, if any answered.
    pub strategy: Option<SearchStrategy>,
}

impl SearchResponse {
    fn failed(filter: &SearchFilter, page_size: usize, err: &SearchError) -> Self {
        Self {
            data: PageResult::empty(filter.page, page_size),
            error: Some(err.to_string()),
            strategy: None,
        }
    }

    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

impl From<SearchOutcome> for SearchResponse {
    fn from(outcome: SearchOutcome) -> Self {
        Self {
            data: outcome.page,
            error: None,
            strategy: Some(outcome.strategy),
        }
    }
}

/// Finds shows near a point through a [`ShowStore`].
///
/// Cheap to clone; clones share the store. Each search is independent:
/// nothing is cached between calls.
#[derive(Clone)]
pub struct ShowSearcher {
    store: Arc<dyn ShowStore>,
    config: SearchConfig,
}

impl std::fmt::Debug for ShowSearcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShowSearcher")
            .field("store", &self.store.name())
            .field("config", &self.config)
            .finish()
    }
}

impl ShowSearcher {
    /// A searcher over `store` with the default configuration.
    pub fn new(store: impl ShowStore + 'static) -> Self {
        Self::with_config(store, SearchConfig::default())
    }

    pub fn with_config(store: impl ShowStore + 'static, config: SearchConfig) -> Self {
        Self::from_shared(Arc::new(store), config)
    }

    /// A searcher over an already-shared store.
    #[must_use]
    pub fn from_shared(store: Arc<dyn ShowStore>, config: SearchConfig) -> Self {
        Self { store, config }
    }

    /// A PostgREST-backed searcher configured entirely from the environment.
    #[cfg(feature = "rest")]
    #[instrument(name = "ShowSearcher from env", level = "info")]
    pub fn from_env() -> Result<Self, crate::error::ShowScoutError> {
        let store = showscout_store::PostgrestStore::from_env()?;
        let config = SearchConfig::from_env()?;
        info!(store = store.name(), "ShowSearcher initialised from environment");
        Ok(Self::with_config(store, config))
    }

    #[must_use]
    pub const fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Run a search. Never fails: problems come back in
    /// [`SearchResponse::error`] alongside an empty page.
    #[instrument(name = "Show search", skip_all, fields(page = filter.page))]
    pub async fn search(&self, filter: &SearchFilter) -> SearchResponse {
        self.respond(filter, self.try_search(filter).await)
    }

    /// As [`ShowSearcher::search`], abandoning the in-flight store call as soon
    /// as `token` is cancelled.
    #[instrument(name = "Show search (cancellable)", skip_all, fields(page = filter.page))]
    pub async fn search_with_cancellation(
        &self,
        filter: &SearchFilter,
        token: &CancellationToken,
    ) -> SearchResponse {
        let result = tokio::select! {
            biased;
            () = token.cancelled() => {
                info!("Search cancelled by caller");
                Err(SearchError::Cancelled)
            }
            result = self.try_search(filter) => result,
        };
        self.respond(filter, result)
    }

    /// The underlying search, with failures as typed errors.
    pub async fn try_search(&self, filter: &SearchFilter) -> Result<SearchOutcome, SearchError> {
        let now = Utc::now();
        let resolved = filter.resolve(&self.config, now)?;
        run_search(self.store.as_ref(), &resolved, &self.config, now).await
    }

    fn respond(
        &self,
        filter: &SearchFilter,
        result: Result<SearchOutcome, SearchError>,
    ) -> SearchResponse {
        match result {
            Ok(outcome) => outcome.into(),
            Err(err) => {
                if matches!(err, SearchError::Filter(_)) {
                    warn!(error = %err, "Rejected search filter");
                }
                let page_size = filter.page_size.unwrap_or(self.config.default_page_size);
                SearchResponse::failed(filter, page_size, &err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use showscout_store::{InMemoryStore, test_data::sample_shows};

    use super::*;

    #[tokio::test]
    async fn test_invalid_filter_returns_empty_page_with_error() {
        let searcher = ShowSearcher::new(InMemoryStore::new(sample_shows(Utc::now())));
        let response = searcher.search(&SearchFilter::new().page(0)).await;
        assert!(!response.is_ok());
        assert!(response.data.data.is_empty());
        assert_eq!(response.data.total_count, 0);
        assert!(response.strategy.is_none());
    }

    #[tokio::test]
    async fn test_already_cancelled_token() {
        let searcher = ShowSearcher::new(InMemoryStore::new(sample_shows(Utc::now())));
        let token = CancellationToken::new();
        token.cancel();
        let response = searcher
            .search_with_cancellation(&SearchFilter::new(), &token)
            .await;
        assert_eq!(response.error.as_deref(), Some("Search cancelled"));
    }

    #[test]
    fn test_searcher_debug_names_store() {
        let searcher = ShowSearcher::new(InMemoryStore::default());
        assert!(format!("{searcher:?}").contains("in-memory"));
    }
}
