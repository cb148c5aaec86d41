//! Show search: filter validation, the strategy fallback chain, the shared
//! post-filter pipeline and pagination.

pub use error::SearchError;
mod filter;
mod pagination;
mod post_filter;
mod search_orchestration;
mod strategy;

use error::Result;
pub use filter::{FilterError, ResolvedFilter, SearchFilter};
pub use pagination::{PageResult, paginate};
pub use post_filter::{PipelineStats, apply as apply_post_filter};
pub use search_orchestration::{SearchConfig, SearchOutcome, StrategyFailure, run_search};
pub use strategy::SearchStrategy;

mod error {
    use itertools::Itertools;
    use thiserror::Error;

    use super::{FilterError, StrategyFailure};

    #[derive(Error, Debug)]
    pub enum SearchError {
        #[error("Invalid filter: {0}")]
        Filter(#[from] FilterError),
        #[error(
            "All {} search strategies failed: {}",
            .attempts.len(),
            .attempts.iter().join("; ")
        )]
        StrategiesExhausted { attempts: Vec<StrategyFailure> },
        #[error("Search cancelled")]
        Cancelled,
    }
    pub type Result<T> = std::result::Result<T, SearchError>;
}
