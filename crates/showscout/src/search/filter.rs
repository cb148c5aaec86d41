//! Caller-facing search filter and its validated, defaults-applied form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use showscout_store::{Coordinate, DateWindow, RemoteArgs, ShowStatus};
use thiserror::Error;

use super::SearchConfig;
use crate::distance::RadiusFilter;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("center must be finite, got {0}")]
    NonFiniteCenter(Coordinate),
    #[error("center {0} is outside latitude/longitude bounds")]
    CenterOutOfRange(Coordinate),
    #[error("radius must be a positive finite number of miles, got {0}")]
    InvalidRadius(f64),
    #[error("max fee must be a non-negative finite amount, got {0}")]
    InvalidFee(f64),
    #[error("date window is empty: {from} is not before {to}")]
    EmptyWindow {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
    #[error("page numbers start at 1")]
    InvalidPage,
    #[error("page size must be between 1 and {max}, got {requested}")]
    InvalidPageSize { requested: usize, max: usize },
}

/// What the caller asks for. Unset fields take defaults from [`SearchConfig`].
///
/// ```rust
/// use showscout::{Coordinate, SearchFilter};
///
/// let filter = SearchFilter::near(Coordinate::new(30.2672, -97.7431))
///     .radius_miles(10.0)
///     .max_fee(20.0)
///     .category("Sports Cards")
///     .feature("parking")
///     .page(2);
/// assert_eq!(filter.page, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub center: Option<Coordinate>,
    pub radius_miles: Option<f64>,
    pub window: Option<DateWindow>,
    pub max_fee: Option<f64>,
    /// Match any. Empty means no category filter.
    pub categories: Vec<String>,
    /// Require all. Empty means no feature filter.
    pub features: Vec<String>,
    pub status: ShowStatus,
    /// 1-based.
    pub page: usize,
    pub page_size: Option<usize>,
}

impl Default for SearchFilter {
    fn default() -> Self {
        Self {
            center: None,
            radius_miles: None,
            window: None,
            max_fee: None,
            categories: Vec::new(),
            features: Vec::new(),
            status: ShowStatus::Active,
            page: 1,
            page_size: None,
        }
    }
}

impl SearchFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn near(center: Coordinate) -> Self {
        Self {
            center: Some(center),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn radius_miles(mut self, radius: f64) -> Self {
        self.radius_miles = Some(radius);
        self
    }

    #[must_use]
    pub fn window(mut self, window: DateWindow) -> Self {
        self.window = Some(window);
        self
    }

    #[must_use]
    pub fn max_fee(mut self, fee: f64) -> Self {
        self.max_fee = Some(fee);
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    #[must_use]
    pub fn feature(mut self, feature: impl Into<String>) -> Self {
        self.features.push(feature.into());
        self
    }

    #[must_use]
    pub fn status(mut self, status: ShowStatus) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    #[must_use]
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Check the filter and fill in defaults. `now` anchors the default
    /// window.
    pub fn resolve(
        &self,
        config: &SearchConfig,
        now: DateTime<Utc>,
    ) -> Result<ResolvedFilter, FilterError> {
        if let Some(center) = self.center {
            if !center.is_finite() {
                return Err(FilterError::NonFiniteCenter(center));
            }
            if !center.is_valid() {
                return Err(FilterError::CenterOutOfRange(center));
            }
        }

        let radius_miles = self.radius_miles.unwrap_or(config.default_radius_miles);
        if !radius_miles.is_finite() || radius_miles <= 0.0 {
            return Err(FilterError::InvalidRadius(radius_miles));
        }

        if let Some(fee) = self.max_fee {
            if !fee.is_finite() || fee < 0.0 {
                return Err(FilterError::InvalidFee(fee));
            }
        }

        let window = self
            .window
            .unwrap_or_else(|| DateWindow::starting_today(now, config.default_window_days));
        if window.is_empty() {
            return Err(FilterError::EmptyWindow {
                from: window.from,
                to: window.to,
            });
        }

        if self.page == 0 {
            return Err(FilterError::InvalidPage);
        }
        let page_size = self.page_size.unwrap_or(config.default_page_size);
        if page_size == 0 || page_size > config.max_page_size {
            return Err(FilterError::InvalidPageSize {
                requested: page_size,
                max: config.max_page_size,
            });
        }

        let clean = |values: &[String]| -> Vec<String> {
            let mut out: Vec<String> = values
                .iter()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect();
            out.dedup();
            out
        };

        Ok(ResolvedFilter {
            radius: RadiusFilter::new(self.center, radius_miles),
            requested_center: self.center,
            radius_miles,
            window,
            max_fee: self.max_fee,
            categories: clean(&self.categories),
            features: clean(&self.features),
            status: self.status,
            page: self.page,
            page_size,
        })
    }
}

/// A checked filter with every default applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFilter {
    /// Skipped when no center was given or the center is the (0, 0)
    /// placeholder.
    pub radius: RadiusFilter,
    pub requested_center: Option<Coordinate>,
    pub radius_miles: f64,
    pub window: DateWindow,
    pub max_fee: Option<f64>,
    pub categories: Vec<String>,
    pub features: Vec<String>,
    pub status: ShowStatus,
    pub page: usize,
    pub page_size: usize,
}

impl ResolvedFilter {
    /// The center spatial strategies should search around, if any.
    #[must_use]
    pub const fn spatial_center(&self) -> Option<Coordinate> {
        self.radius.center()
    }

    /// Arguments for a remote function call.
    #[must_use]
    pub fn remote_args(&self) -> RemoteArgs {
        RemoteArgs {
            center: self.spatial_center(),
            radius_miles: Some(self.radius_miles),
            window: Some(self.window),
            max_fee: self.max_fee,
            categories: (!self.categories.is_empty()).then(|| self.categories.clone()),
            features: (!self.features.is_empty()).then(|| self.features.clone()),
        }
    }
}
