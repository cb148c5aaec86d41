//! [`ShowStore`] over a PostgREST-style HTTP API.
//!
//! Table scans go to `GET {base}/rest/v1/{table}` with PostgREST filter
//! operators; remote functions go to `POST {base}/rest/v1/rpc/{function}` with
//! a JSON argument object. Any non-2xx status or a body that is not a JSON
//! array is returned as a [`StoreError`] so the engine can move on to its next
//! strategy. A single row that does not read as a show is dropped on its own.

use async_trait::async_trait;
use chrono::SecondsFormat;
use itertools::Itertools;
use reqwest::{Client, RequestBuilder};
use serde_json::{Map, Value, json};
use tracing::{debug, info, instrument, warn};

use crate::{
    Result, StoreError,
    model::ShowRecord,
    store::{RemoteArgs, RemoteFunction, ShowQuery, ShowStore},
};

pub const REST_URL_ENV: &str = "SHOWSCOUT_REST_URL";
pub const API_KEY_ENV: &str = "SHOWSCOUT_API_KEY";
pub const SCHEMA_ENV: &str = "SHOWSCOUT_REST_SCHEMA";
pub const DEFAULT_TABLE: &str = "shows";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgrestConfig {
    /// Project root, e.g. `https://abc.example.co`. No trailing slash needed.
    pub base_url: String,
    pub api_key: Option<String>,
    /// Sent as `Accept-Profile`/`Content-Profile` when set.
    pub schema: Option<String>,
    pub table: String,
}

impl PostgrestConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            schema: None,
            table: DEFAULT_TABLE.to_string(),
        }
    }

    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    #[must_use]
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Reads `SHOWSCOUT_REST_URL` (required), `SHOWSCOUT_API_KEY` and
    /// `SHOWSCOUT_REST_SCHEMA`.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var(REST_URL_ENV)
            .map_err(|_| StoreError::Config(format!("{REST_URL_ENV} is not set")))?;
        if base_url.trim().is_empty() {
            return Err(StoreError::Config(format!("{REST_URL_ENV} is empty")));
        }
        let mut config = Self::new(base_url.trim());
        config.api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
        config.schema = std::env::var(SCHEMA_ENV).ok().filter(|s| !s.is_empty());
        Ok(config)
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn rpc_url(&self, function: RemoteFunction) -> String {
        format!("{}/rest/v1/rpc/{}", self.base_url, function.name())
    }
}

#[derive(Debug, Clone)]
pub struct PostgrestStore {
    client: Client,
    config: PostgrestConfig,
}

impl PostgrestStore {
    pub fn new(config: PostgrestConfig) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: PostgrestConfig) -> Self {
        Self { client, config }
    }

    pub fn from_env() -> Result<Self> {
        Self::new(PostgrestConfig::from_env()?)
    }

    #[must_use]
    pub fn config(&self) -> &PostgrestConfig {
        &self.config
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let mut request = request.header("Accept", "application/json");
        if let Some(key) = &self.config.api_key {
            request = request
                .header("apikey", key)
                .header("Authorization", format!("Bearer {key}"));
        }
        if let Some(schema) = &self.config.schema {
            request = request
                .header("Accept-Profile", schema)
                .header("Content-Profile", schema);
        }
        request
    }

    async fn fetch_rows(&self, request: RequestBuilder) -> Result<Vec<ShowRecord>> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        decode_rows(&body)
    }
}

/// Rows from a response body. The body must be a JSON array; rows inside it
/// that are not shows are logged and skipped.
pub(crate) fn decode_rows(body: &[u8]) -> Result<Vec<ShowRecord>> {
    let rows: Vec<Value> = serde_json::from_slice(body)?;
    let total = rows.len();
    let records = rows
        .into_iter()
        .enumerate()
        .filter_map(|(index, row)| match serde_json::from_value::<ShowRecord>(row) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(index, error = %e, "Skipping unreadable row");
                None
            }
        })
        .collect_vec();
    if records.len() < total {
        debug!(kept = records.len(), total, "Some rows were skipped");
    }
    Ok(records)
}

fn timestamp(value: chrono::DateTime<chrono::Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// PostgREST query string for a status-scoped, window-overlapping scan.
pub(crate) fn scan_params(query: &ShowQuery) -> Vec<(&'static str, String)> {
    vec![
        ("select", "*".to_string()),
        ("status", format!("eq.{}", query.status)),
        ("start_date", format!("lt.{}", timestamp(query.window.to))),
        ("end_date", format!("gte.{}", timestamp(query.window.from))),
        ("order", "start_date.asc".to_string()),
    ]
}

/// JSON argument object for an RPC call. Only the arguments the function
/// declares are sent; PostgREST rejects unknown named arguments.
pub(crate) fn rpc_body(function: RemoteFunction, args: &RemoteArgs) -> Value {
    let mut body = Map::new();
    if let Some(center) = args.center {
        body.insert("center_lat".into(), json!(center.latitude));
        body.insert("center_lng".into(), json!(center.longitude));
    }
    if let Some(radius) = args.radius_miles {
        body.insert("radius_miles".into(), json!(radius));
    }
    if matches!(
        function,
        RemoteFunction::NearbyInWindow | RemoteFunction::NearbyFiltered
    ) {
        if let Some(window) = args.window {
            body.insert("start_date".into(), json!(timestamp(window.from)));
            body.insert("end_date".into(), json!(timestamp(window.to)));
        }
    }
    if function == RemoteFunction::NearbyFiltered {
        if let Some(fee) = args.max_fee {
            body.insert("max_entry_fee".into(), json!(fee));
        }
        if let Some(categories) = args.categories.as_ref().filter(|c| !c.is_empty()) {
            body.insert("categories".into(), json!(categories));
        }
        if let Some(features) = args.features.as_ref().filter(|f| !f.is_empty()) {
            let features: Map<String, Value> = features
                .iter()
                .map(|key| (key.clone(), Value::Bool(true)))
                .collect();
            body.insert("features".into(), Value::Object(features));
        }
    }
    Value::Object(body)
}

#[async_trait]
impl ShowStore for PostgrestStore {
    fn name(&self) -> &str {
        &self.config.base_url
    }

    #[instrument(name = "PostgREST query_shows", skip_all, level = "debug")]
    async fn query_shows(&self, query: &ShowQuery) -> Result<Vec<ShowRecord>> {
        let url = self.config.table_url();
        let params = scan_params(query);
        debug!(
            url = %url,
            params = %params.iter().map(|(k, v)| format!("{k}={v}")).join("&"),
            "Scanning shows"
        );
        let rows = self.fetch_rows(self.client.get(&url).query(&params)).await?;
        info!(rows = rows.len(), "Table scan returned");
        Ok(rows)
    }

    #[instrument(name = "PostgREST rpc", skip(self, args), level = "debug")]
    async fn call(&self, function: RemoteFunction, args: &RemoteArgs) -> Result<Vec<ShowRecord>> {
        let url = self.config.rpc_url(function);
        let body = rpc_body(function, args);
        debug!(url = %url, %body, "Calling remote function");
        let rows = self.fetch_rows(self.client.post(&url).json(&body)).await?;
        info!(rows = rows.len(), %function, "Remote function returned");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::model::{Coordinate, DateWindow, ShowStatus};

    fn window() -> DateWindow {
        DateWindow::new(
            Utc.with_ymd_and_hms(2026, 10, 16, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 11, 15, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_urls_strip_trailing_slash() {
        let config = PostgrestConfig::new("https://db.example.com/");
        assert_eq!(config.table_url(), "https://db.example.com/rest/v1/shows");
        assert_eq!(
            config.rpc_url(RemoteFunction::Nearby),
            "https://db.example.com/rest/v1/rpc/find_shows_nearby"
        );
    }

    #[test]
    fn test_scan_params_express_overlap() {
        let params = scan_params(&ShowQuery {
            status: ShowStatus::Active,
            window: window(),
        });
        assert!(params.contains(&("status", "eq.ACTIVE".to_string())));
        assert!(params.contains(&("start_date", "lt.2026-11-15T00:00:00Z".to_string())));
        assert!(params.contains(&("end_date", "gte.2026-10-16T00:00:00Z".to_string())));
        assert!(params.contains(&("order", "start_date.asc".to_string())));
    }

    #[test]
    fn test_rpc_body_sends_only_declared_arguments() {
        let args = RemoteArgs {
            center: Some(Coordinate::new(30.0, -97.0)),
            radius_miles: Some(25.0),
            window: Some(window()),
            max_fee: Some(10.0),
            categories: Some(vec!["Comics".into()]),
            features: Some(vec!["parking".into()]),
        };

        let nearby = rpc_body(RemoteFunction::Nearby, &args);
        assert_eq!(
            nearby,
            json!({"center_lat": 30.0, "center_lng": -97.0, "radius_miles": 25.0})
        );

        let in_window = rpc_body(RemoteFunction::NearbyInWindow, &args);
        assert_eq!(in_window["start_date"], "2026-10-16T00:00:00Z");
        assert!(in_window.get("max_entry_fee").is_none());

        let filtered = rpc_body(RemoteFunction::NearbyFiltered, &args);
        assert_eq!(filtered["max_entry_fee"], 10.0);
        assert_eq!(filtered["categories"], json!(["Comics"]));
        assert_eq!(filtered["features"], json!({"parking": true}));
    }

    #[test]
    fn test_mixed_geometry_body_decodes_every_row() {
        let body = br#"[
            {
                "id": 1,
                "title": "Both Encodings",
                "location": "Expo Hall",
                "start_date": "2026-11-01T10:00:00Z",
                "end_date": "2026-11-01T18:00:00Z",
                "coordinates": {"type": "Point", "coordinates": [-97.74, 30.27]},
                "geom": "0101000000000000000000F03F0000000000000040",
                "lat": 30.27,
                "latitude": 30.27
            },
            {
                "id": 2,
                "title": "Broken Geometry",
                "start_date": "2026-11-02T10:00:00Z",
                "end_date": "2026-11-02T18:00:00Z",
                "geom": "01010000",
                "longitude": "east-ish",
                "coordinates": {"coordinates": ["a", "b"]}
            },
            {
                "id": 3,
                "title": "No Geometry",
                "start_date": "2026-11-03T10:00:00Z",
                "end_date": "2026-11-03T18:00:00Z",
                "geometry": null
            }
        ]"#;

        let rows = decode_rows(body).unwrap();
        assert_eq!(rows.iter().map(|r| r.id.as_str()).collect_vec(), ["1", "2", "3"]);
        assert!(rows[0].geometry.coordinates.is_some());
        assert!(rows[0].geometry.geom.is_some());
        assert_eq!(rows[1].geometry.longitude, None);
        assert!(rows[2].geometry.is_empty());
    }

    #[test]
    fn test_unreadable_row_is_skipped_not_fatal() {
        let body = br#"[
            {"id": "ok", "title": "Fine", "start_date": "2026-11-01T10:00:00Z", "end_date": "2026-11-01T18:00:00Z"},
            {"id": "bad", "title": "No Dates"},
            {"id": null, "title": "Bad Id", "start_date": "2026-11-01T10:00:00Z", "end_date": "2026-11-01T18:00:00Z"}
        ]"#;
        let rows = decode_rows(body).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "ok");
    }

    #[test]
    fn test_non_array_body_is_an_error() {
        assert!(matches!(
            decode_rows(br#"{"message": "function not found"}"#),
            Err(StoreError::Decode(_))
        ));
    }

    #[test]
    fn test_config_builder() {
        let config = PostgrestConfig::new("http://localhost:54321")
            .api_key("anon")
            .schema("public")
            .table("shows_view");
        assert_eq!(config.api_key.as_deref(), Some("anon"));
        assert_eq!(config.table_url(), "http://localhost:54321/rest/v1/shows_view");
    }
}
