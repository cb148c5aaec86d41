//! Showscout - geospatial show discovery
//!
//! Showscout finds timed, located events ("shows") near a point, subject to
//! date, fee, category and feature filters, and returns stable paginated
//! results. It reads from any [`ShowStore`], tolerating stores whose remote
//! search functions are missing, broken or slow by falling back through an
//! ordered chain of query strategies, and applies the same filters whichever
//! strategy answered.
//!
//! # Quick Start
//!
//! ```rust
//! use chrono::Utc;
//! use showscout::{SearchFilter, ShowSearcher};
//! use showscout::store::{InMemoryStore, test_data::{AUSTIN, sample_shows}};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let searcher = ShowSearcher::new(InMemoryStore::new(sample_shows(Utc::now())));
//!
//! let filter = SearchFilter::near(AUSTIN)
//!     .radius_miles(25.0)
//!     .category("Sports Cards")
//!     .page_size(10);
//! let response = searcher.search(&filter).await;
//!
//! println!(
//!     "{} shows across {} pages",
//!     response.data.total_count, response.data.total_pages
//! );
//! # });
//! ```
//!
//! # Features
//!
//! - **Location decoding**: explicit columns, point objects, hex WKB/EWKB and
//!   WKT, with address-based inference for rows that have none
//! - **Strategy fallback**: remote search functions first, a plain table scan
//!   last, each attempt bounded by a timeout
//! - **Consistent filtering**: past shows, fee ceiling, categories, features
//!   and radius applied after every strategy
//! - **Accurate pagination**: totals computed after filtering
use once_cell::sync::OnceCell;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod config;
mod core;
pub mod distance;
pub mod error;
pub mod geometry;
pub mod resolve;
mod search;

pub use crate::core::{SearchResponse, ShowSearcher};

pub use config::{
    DEFAULT_PAGE_SIZE_ENV, DEFAULT_RADIUS_ENV, STRATEGY_TIMEOUT_ENV, SearchConfigBuilder,
};
pub use distance::{RadiusFilter, haversine_miles, within_radius};
pub use geometry::{DecodeError, GeometryField};
pub use resolve::{AddressCoordinateCache, CoordinateSource, ResolvedCoordinate};
pub use search::{
    FilterError, PageResult, PipelineStats, ResolvedFilter, SearchConfig, SearchError,
    SearchFilter, SearchOutcome, SearchStrategy, StrategyFailure, apply_post_filter, paginate,
    run_search,
};
pub use showscout_store as store;
pub use showscout_store::{Coordinate, DateWindow, ShowRecord, ShowStatus, ShowStore};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Initialize logging for the Showscout library.
///
/// Installs a `tracing` fmt subscriber filtered by `RUST_LOG` when set, or by
/// `level` otherwise. Only the first call has any effect.
///
/// # Examples
///
/// ```rust
/// use showscout::init_logging;
/// use tracing::Level;
///
/// init_logging(Level::INFO)?;
/// # Ok::<(), showscout::error::ShowScoutError>(())
/// ```
pub fn init_logging(level: impl Into<LevelFilter>) -> Result<&'static (), error::ShowScoutError> {
    LOGGER_INIT.get_or_try_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level.into().to_string()))?
            .add_directive("hyper_util=warn".parse()?)
            .add_directive("reqwest=warn".parse()?);

        tracing_subscriber::fmt::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .init();
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use showscout_store::{
        InMemoryStore,
        test_data::{AUSTIN, sample_shows},
    };

    use super::*;

    fn setup_test_env() {
        let _ = init_logging(tracing::Level::WARN);
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        setup_test_env();
        assert!(init_logging(tracing::Level::DEBUG).is_ok());
    }

    #[tokio::test]
    async fn test_basic_search() {
        setup_test_env();

        let searcher = ShowSearcher::new(InMemoryStore::new(sample_shows(Utc::now())));
        let response = searcher.search(&SearchFilter::near(AUSTIN)).await;

        assert!(response.is_ok(), "Search should succeed: {:?}", response.error);
        assert_eq!(response.strategy, Some(SearchStrategy::NearbyInWindow));
        assert!(!response.data.data.is_empty());
    }

    #[tokio::test]
    async fn test_configuration() {
        setup_test_env();

        let config = SearchConfigBuilder::fast()
            .page_sizes(1, 5)
            .unwrap()
            .build();
        let searcher =
            ShowSearcher::with_config(InMemoryStore::new(sample_shows(Utc::now())), config);
        let response = searcher.search(&SearchFilter::near(AUSTIN)).await;

        assert_eq!(response.data.page_size, 1);
        assert_eq!(response.data.data.len(), 1);
        assert_eq!(response.data.total_pages, response.data.total_count);
    }
}
