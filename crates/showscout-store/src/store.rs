//! The narrow interface the engine uses to reach the system of record.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    Result, StoreError,
    model::{Coordinate, DateWindow, ShowRecord, ShowStatus},
};

/// Parameters of the plain, non-spatial table scan. Rows come back in start
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowQuery {
    pub status: ShowStatus,
    /// Rows whose `[start, end]` span overlaps this window.
    pub window: DateWindow,
}

/// Server-side search functions a store may (or may not) expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemoteFunction {
    /// Center, radius and date window.
    NearbyInWindow,
    /// Center, radius, date window, fee ceiling, categories and features.
    NearbyFiltered,
    /// Center and radius only.
    Nearby,
}

impl RemoteFunction {
    pub const ALL: [Self; 3] = [Self::NearbyInWindow, Self::NearbyFiltered, Self::Nearby];

    /// Name of the function on the remote side.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::NearbyInWindow => "find_shows_nearby_in_window",
            Self::NearbyFiltered => "find_shows_nearby_filtered",
            Self::Nearby => "find_shows_nearby",
        }
    }
}

impl fmt::Display for RemoteFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Uniform argument bag for every remote function. Each function reads the
/// subset it understands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteArgs {
    pub center: Option<Coordinate>,
    pub radius_miles: Option<f64>,
    pub window: Option<DateWindow>,
    pub max_fee: Option<f64>,
    pub categories: Option<Vec<String>>,
    pub features: Option<Vec<String>>,
}

/// A row store with query and remote-procedure capability.
///
/// Only [`ShowStore::query_shows`] is mandatory. Remote functions default to
/// [`StoreError::Unsupported`], which the engine treats like any other failed
/// strategy.
#[async_trait]
pub trait ShowStore: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    /// Filtered table scan: rows with `status` whose span overlaps `window`.
    async fn query_shows(&self, query: &ShowQuery) -> Result<Vec<ShowRecord>>;

    async fn call(&self, function: RemoteFunction, args: &RemoteArgs) -> Result<Vec<ShowRecord>> {
        let _ = args;
        Err(StoreError::Unsupported(function.name()))
    }
}

#[async_trait]
impl<S: ShowStore + ?Sized> ShowStore for std::sync::Arc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn query_shows(&self, query: &ShowQuery) -> Result<Vec<ShowRecord>> {
        (**self).query_shows(query).await
    }

    async fn call(&self, function: RemoteFunction, args: &RemoteArgs) -> Result<Vec<ShowRecord>> {
        (**self).call(function, args).await
    }
}
