use std::{str::FromStr, time::Duration};

use tracing::debug;

use crate::{
    error::ShowScoutError,
    search::{SearchConfig, SearchStrategy},
};

pub const STRATEGY_TIMEOUT_ENV: &str = "SHOWSCOUT_STRATEGY_TIMEOUT_MS";
pub const DEFAULT_RADIUS_ENV: &str = "SHOWSCOUT_DEFAULT_RADIUS_MILES";
pub const DEFAULT_PAGE_SIZE_ENV: &str = "SHOWSCOUT_DEFAULT_PAGE_SIZE";

/// Builder for creating search configurations with ergonomic defaults
#[derive(Debug, Clone, Default)]
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    /// Create a new builder with the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    /// Short timeouts and small pages, for interactive use
    #[must_use]
    pub fn fast() -> Self {
        let mut builder = Self::new();
        builder.config.strategy_timeout = Duration::from_secs(2);
        builder.config.default_page_size = 10;
        builder
    }

    /// Long timeouts and a wider default net, for slow or distant stores
    #[must_use]
    pub fn patient() -> Self {
        let mut builder = Self::new();
        builder.config.strategy_timeout = Duration::from_secs(30);
        builder.config.default_radius_miles = 50.0;
        builder.config.default_window_days = 90;
        builder
    }

    /// Upper bound on each strategy attempt
    pub fn strategy_timeout(mut self, timeout: Duration) -> Result<Self, ShowScoutError> {
        if timeout.is_zero() {
            return Err(ShowScoutError::ConfigError(
                "strategy timeout must be greater than zero".to_string(),
            ));
        }
        self.config.strategy_timeout = timeout;
        Ok(self)
    }

    /// Radius used when a filter does not name one
    pub fn default_radius_miles(mut self, miles: f64) -> Result<Self, ShowScoutError> {
        if !miles.is_finite() || miles <= 0.0 {
            return Err(ShowScoutError::ConfigError(format!(
                "default radius must be a positive number of miles, got {miles}"
            )));
        }
        self.config.default_radius_miles = miles;
        Ok(self)
    }

    /// Default and maximum page size
    pub fn page_sizes(mut self, default: usize, max: usize) -> Result<Self, ShowScoutError> {
        if default == 0 || default > max {
            return Err(ShowScoutError::ConfigError(format!(
                "page sizes must satisfy 0 < default <= max, got default={default} max={max}"
            )));
        }
        self.config.default_page_size = default;
        self.config.max_page_size = max;
        Ok(self)
    }

    /// Length of the default date window, in days from today
    pub fn default_window_days(mut self, days: u32) -> Result<Self, ShowScoutError> {
        if days == 0 {
            return Err(ShowScoutError::ConfigError(
                "default window must cover at least one day".to_string(),
            ));
        }
        self.config.default_window_days = days;
        Ok(self)
    }

    /// Fallback order for location-bounded searches. Must include the table
    /// scan, which is also the only strategy for searches without a center.
    pub fn strategies(mut self, order: &[SearchStrategy]) -> Result<Self, ShowScoutError> {
        if !order.contains(&SearchStrategy::StatusWindowScan) {
            return Err(ShowScoutError::ConfigError(
                "strategy order must include the status/window scan".to_string(),
            ));
        }
        let mut deduped: Vec<SearchStrategy> = Vec::with_capacity(order.len());
        for strategy in order {
            if !deduped.contains(strategy) {
                deduped.push(*strategy);
            }
        }
        self.config.strategy_order = deduped;
        Ok(self)
    }

    /// Build the final configuration
    #[must_use]
    pub fn build(self) -> SearchConfig {
        self.config
    }
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>, ShowScoutError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
            ShowScoutError::ConfigError(format!("{key}={raw:?} is not valid: {e}"))
        }),
        Err(_) => Ok(None),
    }
}

impl SearchConfig {
    /// Defaults overridden by `SHOWSCOUT_STRATEGY_TIMEOUT_MS`,
    /// `SHOWSCOUT_DEFAULT_RADIUS_MILES` and `SHOWSCOUT_DEFAULT_PAGE_SIZE` where
    /// set.
    pub fn from_env() -> Result<Self, ShowScoutError> {
        let mut builder = SearchConfigBuilder::new();
        if let Some(ms) = env_parse::<u64>(STRATEGY_TIMEOUT_ENV)? {
            builder = builder.strategy_timeout(Duration::from_millis(ms))?;
        }
        if let Some(miles) = env_parse::<f64>(DEFAULT_RADIUS_ENV)? {
            builder = builder.default_radius_miles(miles)?;
        }
        if let Some(size) = env_parse::<usize>(DEFAULT_PAGE_SIZE_ENV)? {
            let max = builder.config.max_page_size.max(size);
            builder = builder.page_sizes(size, max)?;
        }
        let config = builder.build();
        debug!(?config, "Search configuration loaded from environment");
        Ok(config)
    }
}
