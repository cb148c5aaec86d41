//! Strategy-chain orchestration.
//!
//! A search walks `TryStrategy(0) → TryStrategy(1) → …` until one strategy
//! answers, then runs the shared post-filter pipeline and pagination. Any
//! failure, including a timeout, moves to the next strategy without retrying.
//! Running off the end of the chain is [`SearchError::StrategiesExhausted`].

use std::{fmt, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use showscout_store::{ShowRecord, ShowStore};
use tracing::{debug, info, instrument, warn};

use super::{
    Result, SearchError,
    filter::ResolvedFilter,
    pagination::{PageResult, paginate},
    post_filter::{self, PipelineStats},
    strategy::SearchStrategy,
};
use crate::SearchConfigBuilder;

/// Engine tuning. Build with [`SearchConfigBuilder`] or take the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Upper bound on a single strategy attempt.
    pub strategy_timeout: Duration,
    /// Radius used when the filter does not name one.
    pub default_radius_miles: f64,
    pub default_page_size: usize,
    pub max_page_size: usize,
    /// Length of the default date window, starting today.
    pub default_window_days: u32,
    /// Fallback order for location-bounded searches.
    pub strategy_order: Vec<SearchStrategy>,
}

impl SearchConfig {
    #[must_use]
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::default()
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            strategy_timeout: Duration::from_secs(8),
            default_radius_miles: 25.0,
            default_page_size: 20,
            max_page_size: 100,
            default_window_days: 30,
            strategy_order: SearchStrategy::LOCATION_CHAIN.to_vec(),
        }
    }
}

/// Why a single strategy attempt was abandoned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyFailure {
    pub strategy: SearchStrategy,
    pub reason: String,
}

impl fmt::Display for StrategyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.strategy, self.reason)
    }
}

/// What a completed search produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub page: PageResult,
    pub strategy: SearchStrategy,
    pub stats: PipelineStats,
    /// Strategies that failed before `strategy` answered.
    pub failures: Vec<StrategyFailure>,
}

enum SearchState {
    TryStrategy(usize),
    PostFilter {
        strategy: SearchStrategy,
        rows: Vec<ShowRecord>,
    },
    Done(SearchOutcome),
    Failed(SearchError),
}

/// Run one search against `store`. `now` is the wall clock at call time and
/// anchors the "already over" cutoff.
#[instrument(name = "Run search", skip_all, fields(store = store.name(), page = filter.page))]
pub async fn run_search(
    store: &dyn ShowStore,
    filter: &ResolvedFilter,
    config: &SearchConfig,
    now: DateTime<Utc>,
) -> Result<SearchOutcome> {
    let chain = SearchStrategy::chain_for(&config.strategy_order, filter);
    debug!(chain = ?chain, spatial = filter.radius.is_active(), "Strategy chain selected");

    let mut failures: Vec<StrategyFailure> = Vec::new();
    let mut state = SearchState::TryStrategy(0);
    loop {
        state = match state {
            SearchState::TryStrategy(i) => match chain.get(i) {
                None => SearchState::Failed(SearchError::StrategiesExhausted {
                    attempts: std::mem::take(&mut failures),
                }),
                Some(&strategy) => match attempt(strategy, store, filter, config.strategy_timeout).await {
                    Ok(rows) => SearchState::PostFilter { strategy, rows },
                    Err(reason) => {
                        warn!(
                            strategy = strategy.name(),
                            reason = %reason,
                            remaining = chain.len() - i - 1,
                            "Search strategy failed, falling back"
                        );
                        failures.push(StrategyFailure { strategy, reason });
                        SearchState::TryStrategy(i + 1)
                    }
                },
            },
            SearchState::PostFilter { strategy, rows } => {
                let (rows, stats) = post_filter::apply(rows, filter, now);
                let page = paginate(rows, filter.page, filter.page_size);
                SearchState::Done(SearchOutcome {
                    page,
                    strategy,
                    stats,
                    failures: std::mem::take(&mut failures),
                })
            }
            SearchState::Done(outcome) => {
                info!(
                    strategy = outcome.strategy.name(),
                    total = outcome.page.total_count,
                    returned = outcome.page.data.len(),
                    fallbacks = outcome.failures.len(),
                    "Search complete"
                );
                return Ok(outcome);
            }
            SearchState::Failed(err) => {
                warn!(error = %err, "Search failed");
                return Err(err);
            }
        };
    }
}

/// One bounded attempt. Every failure mode collapses to a reason string.
async fn attempt(
    strategy: SearchStrategy,
    store: &dyn ShowStore,
    filter: &ResolvedFilter,
    timeout: Duration,
) -> std::result::Result<Vec<ShowRecord>, String> {
    match tokio::time::timeout(timeout, strategy.execute(store, filter)).await {
        Ok(Ok(rows)) => Ok(rows),
        Ok(Err(err)) => Err(err.to_string()),
        Err(_) => Err(format!("timed out after {}ms", timeout.as_millis())),
    }
}
