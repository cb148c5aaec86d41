//! In-process [`ShowStore`] for tests, demos and offline use.
//!
//! Remote functions apply their non-spatial predicates the way the server
//! functions do but do not evaluate distance; they hand back a superset and
//! leave radius membership to the engine. Each function (and the table scan)
//! can be told to fail, stall or disappear so fallback paths can be exercised.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::{
    Result, StoreError,
    model::ShowRecord,
    store::{RemoteArgs, RemoteFunction, ShowQuery, ShowStore},
};

const MALFORMED_BODY: &str = r#"{"code":"PGRST202","message":"Could not find the function"}"#;

/// How a simulated remote capability responds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FunctionBehaviour {
    /// Answer normally.
    #[default]
    Serve,
    /// The function does not exist on this store.
    Unsupported,
    /// Fail with a transport-style error carrying this message.
    Fail(String),
    /// Answer with a body that cannot be decoded.
    Malformed,
    /// Sleep before answering normally.
    Delay(Duration),
}

/// One call observed by the store, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Query,
    Function(RemoteFunction),
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    shows: Arc<Vec<ShowRecord>>,
    functions: HashMap<RemoteFunction, FunctionBehaviour>,
    query: FunctionBehaviour,
    calls: Arc<Mutex<Vec<StoreCall>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new(shows: Vec<ShowRecord>) -> Self {
        Self {
            shows: Arc::new(shows),
            ..Default::default()
        }
    }

    /// A store that exposes only the table scan.
    #[must_use]
    pub fn scan_only(shows: Vec<ShowRecord>) -> Self {
        let mut store = Self::new(shows);
        for function in RemoteFunction::ALL {
            store = store.with_function(function, FunctionBehaviour::Unsupported);
        }
        store
    }

    #[must_use]
    pub fn with_function(mut self, function: RemoteFunction, behaviour: FunctionBehaviour) -> Self {
        self.functions.insert(function, behaviour);
        self
    }

    #[must_use]
    pub fn with_query(mut self, behaviour: FunctionBehaviour) -> Self {
        self.query = behaviour;
        self
    }

    #[must_use]
    pub fn shows(&self) -> &[ShowRecord] {
        &self.shows
    }

    /// Calls observed so far.
    #[must_use]
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: StoreCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    async fn behave(&self, behaviour: &FunctionBehaviour, label: &'static str) -> Result<()> {
        match behaviour {
            FunctionBehaviour::Serve => Ok(()),
            FunctionBehaviour::Unsupported => Err(StoreError::Unsupported(label)),
            FunctionBehaviour::Fail(message) => Err(StoreError::Unavailable(message.clone())),
            FunctionBehaviour::Malformed => {
                match serde_json::from_str::<Vec<ShowRecord>>(MALFORMED_BODY) {
                    Err(err) => Err(err.into()),
                    Ok(_) => Err(StoreError::Unavailable(format!("{label}: malformed body"))),
                }
            }
            FunctionBehaviour::Delay(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(())
            }
        }
    }
}

#[async_trait]
impl ShowStore for InMemoryStore {
    fn name(&self) -> &str {
        "in-memory"
    }

    #[instrument(name = "In-memory query_shows", skip_all, level = "debug")]
    async fn query_shows(&self, query: &ShowQuery) -> Result<Vec<ShowRecord>> {
        self.record(StoreCall::Query);
        self.behave(&self.query, "query_shows").await?;

        let mut rows: Vec<ShowRecord> = self
            .shows
            .iter()
            .filter(|s| s.status == query.status)
            .filter(|s| query.window.overlaps(s.start_date, s.end_date))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.start_date.cmp(&b.start_date));
        debug!(rows = rows.len(), "Table scan complete");
        Ok(rows)
    }

    #[instrument(name = "In-memory remote call", skip(self, args), level = "debug")]
    async fn call(&self, function: RemoteFunction, args: &RemoteArgs) -> Result<Vec<ShowRecord>> {
        self.record(StoreCall::Function(function));
        let behaviour = self.functions.get(&function).cloned().unwrap_or_default();
        self.behave(&behaviour, function.name()).await?;

        let window = match function {
            RemoteFunction::Nearby => None,
            RemoteFunction::NearbyInWindow | RemoteFunction::NearbyFiltered => args.window,
        };
        let filtered = function == RemoteFunction::NearbyFiltered;

        let rows: Vec<ShowRecord> = self
            .shows
            .iter()
            .filter(|s| window.is_none_or(|w| w.overlaps(s.start_date, s.end_date)))
            .filter(|s| !filtered || args.max_fee.is_none_or(|max| s.fee_or_free() <= max))
            .filter(|s| {
                !filtered
                    || args
                        .categories
                        .as_deref()
                        .is_none_or(|wanted| wanted.is_empty() || s.in_any_category(wanted))
            })
            .filter(|s| {
                !filtered
                    || args
                        .features
                        .as_deref()
                        .is_none_or(|wanted| wanted.iter().all(|f| s.has_feature(f)))
            })
            .cloned()
            .collect();
        debug!(rows = rows.len(), %function, "Remote function answered");
        Ok(rows)
    }
}
