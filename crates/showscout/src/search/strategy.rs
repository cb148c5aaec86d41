//! The finite set of ways to ask the store for candidate shows.

use std::fmt;

use serde::{Deserialize, Serialize};
use showscout_store::{
    RemoteFunction, ShowQuery, ShowRecord, ShowStore, StoreError,
};
use tracing::{debug, instrument};

use super::filter::ResolvedFilter;

/// One step of the fallback chain. Every variant runs through the same
/// [`SearchStrategy::execute`] signature; the orchestrator only sees rows or a
/// [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchStrategy {
    /// Center, radius and date window, evaluated remotely.
    NearbyInWindow,
    /// Center, radius, window, fee, categories and features, evaluated remotely.
    NearbyFiltered,
    /// Center and radius only.
    Nearby,
    /// Plain table scan by status and window overlap.
    StatusWindowScan,
}

impl SearchStrategy {
    /// Default order for a location-bounded search.
    pub const LOCATION_CHAIN: [Self; 4] = [
        Self::NearbyInWindow,
        Self::NearbyFiltered,
        Self::Nearby,
        Self::StatusWindowScan,
    ];

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::NearbyInWindow => "nearby_in_window",
            Self::NearbyFiltered => "nearby_filtered",
            Self::Nearby => "nearby",
            Self::StatusWindowScan => "status_window_scan",
        }
    }

    /// Whether the strategy needs a real center.
    #[must_use]
    pub const fn is_spatial(&self) -> bool {
        self.remote_function().is_some()
    }

    const fn remote_function(&self) -> Option<RemoteFunction> {
        match self {
            Self::NearbyInWindow => Some(RemoteFunction::NearbyInWindow),
            Self::NearbyFiltered => Some(RemoteFunction::NearbyFiltered),
            Self::Nearby => Some(RemoteFunction::Nearby),
            Self::StatusWindowScan => None,
        }
    }

    /// The strategies to try for `filter`, in order. Without a real center the
    /// spatial strategies are dropped and the chain starts at the scan.
    #[must_use]
    pub fn chain_for(order: &[Self], filter: &ResolvedFilter) -> Vec<Self> {
        let spatial = filter.radius.is_active();
        order
            .iter()
            .copied()
            .filter(|s| spatial || !s.is_spatial())
            .collect()
    }

    /// Fetch candidate rows. Remote functions may over- or under-filter; the
    /// caller always runs the full post-filter pipeline on what comes back.
    #[instrument(name = "Execute strategy", skip(store, filter), fields(store = store.name()), level = "debug")]
    pub async fn execute(
        &self,
        store: &dyn ShowStore,
        filter: &ResolvedFilter,
    ) -> Result<Vec<ShowRecord>, StoreError> {
        let rows = match self.remote_function() {
            Some(function) => store.call(function, &filter.remote_args()).await?,
            None => {
                store
                    .query_shows(&ShowQuery {
                        status: filter.status,
                        window: filter.window,
                    })
                    .await?
            }
        };
        debug!(rows = rows.len(), strategy = self.name(), "Strategy returned rows");
        Ok(rows)
    }
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use showscout_store::{Coordinate, InMemoryStore, StoreCall, test_data::sample_shows};

    use super::*;
    use crate::search::{SearchConfig, SearchFilter};

    fn resolved(filter: &SearchFilter) -> ResolvedFilter {
        filter.resolve(&SearchConfig::default(), Utc::now()).unwrap()
    }

    #[test]
    fn test_chain_without_center_is_scan_only() {
        let chain = SearchStrategy::chain_for(
            &SearchStrategy::LOCATION_CHAIN,
            &resolved(&SearchFilter::new()),
        );
        assert_eq!(chain, [SearchStrategy::StatusWindowScan]);

        let chain = SearchStrategy::chain_for(
            &SearchStrategy::LOCATION_CHAIN,
            &resolved(&SearchFilter::near(Coordinate::new(0.01, -0.01))),
        );
        assert_eq!(chain, [SearchStrategy::StatusWindowScan]);
    }

    #[test]
    fn test_chain_with_center_keeps_order() {
        let chain = SearchStrategy::chain_for(
            &SearchStrategy::LOCATION_CHAIN,
            &resolved(&SearchFilter::near(Coordinate::new(30.0, -97.0))),
        );
        assert_eq!(chain, SearchStrategy::LOCATION_CHAIN);
    }

    #[tokio::test]
    async fn test_execute_routes_to_store_surface() {
        let store = InMemoryStore::new(sample_shows(Utc::now()));
        let filter = resolved(&SearchFilter::near(Coordinate::new(30.0, -97.0)));

        SearchStrategy::Nearby.execute(&store, &filter).await.unwrap();
        SearchStrategy::StatusWindowScan.execute(&store, &filter).await.unwrap();
        assert_eq!(
            store.calls(),
            [StoreCall::Function(RemoteFunction::Nearby), StoreCall::Query]
        );
    }
}
