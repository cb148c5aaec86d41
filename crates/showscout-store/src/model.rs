//! Record types as they come back from the row store.
//!
//! Rows are read-only to the engine. The geometry columns are kept raw here;
//! interpreting them is the engine's job, because the same concept arrives in
//! several encodings depending on which query produced the row.

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Days, Duration, Utc};
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{IgnoredAny, MapAccess, Visitor},
};

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    #[inline]
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Finite and inside the usual degree bounds.
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.latitude, self.longitude)
    }
}

/// Lifecycle state of a show, as maintained by the management system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShowStatus {
    #[default]
    #[serde(alias = "active")]
    Active,
    #[serde(alias = "inactive")]
    Inactive,
    #[serde(alias = "cancelled", alias = "CANCELED", alias = "canceled")]
    Cancelled,
    #[serde(alias = "draft")]
    Draft,
    #[serde(alias = "completed")]
    Completed,
    #[serde(other)]
    Unknown,
}

impl ShowStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
            Self::Cancelled => "CANCELLED",
            Self::Draft => "DRAFT",
            Self::Completed => "COMPLETED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ShowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half-open time window `[from, to)`.
///
/// A show matches a window when its `[start, end]` span overlaps it, not when
/// its start alone falls inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateWindow {
    #[must_use]
    pub const fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// `days` whole days starting at midnight UTC of the day containing `now`.
    #[must_use]
    pub fn starting_today(now: DateTime<Utc>, days: u32) -> Self {
        let from = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map_or(now, |midnight| midnight.and_utc());
        let to = from
            .checked_add_days(Days::new(u64::from(days)))
            .unwrap_or(from + Duration::days(i64::from(days)));
        Self { from, to }
    }

    #[must_use]
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.to && end >= self.from
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to <= self.from
    }
}

/// Geometry columns exactly as the store returned them.
///
/// `latitude`/`longitude` are the explicit scalar columns (`lat`, `lng` and
/// `lon` are read too; the full name wins when both carry a number).
/// `coordinates` is the point-object column. `geom` is the spatial column,
/// read from `geom` or `geometry`: hex WKB/EWKB, WKT, or an object. A row may
/// carry any mix of these; nothing here decides which one is right.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawGeometry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geom: Option<serde_json::Value>,
}

impl RawGeometry {
    const LATITUDE_KEYS: [&'static str; 2] = ["latitude", "lat"];
    const LONGITUDE_KEYS: [&'static str; 3] = ["longitude", "lng", "lon"];
    const COORDINATES_KEYS: [&'static str; 1] = ["coordinates"];
    const GEOM_KEYS: [&'static str; 2] = ["geom", "geometry"];

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.latitude.is_none()
            && self.longitude.is_none()
            && self.coordinates.is_none()
            && self.geom.is_none()
    }

    fn from_columns(mut columns: GeometryColumns) -> Self {
        Self {
            latitude: first_number(&columns, &Self::LATITUDE_KEYS),
            longitude: first_number(&columns, &Self::LONGITUDE_KEYS),
            coordinates: take_first(&mut columns, &Self::COORDINATES_KEYS),
            geom: take_first(&mut columns, &Self::GEOM_KEYS),
        }
    }

    fn is_geometry_key(key: &str) -> bool {
        Self::LATITUDE_KEYS
            .iter()
            .chain(&Self::LONGITUDE_KEYS)
            .chain(&Self::COORDINATES_KEYS)
            .chain(&Self::GEOM_KEYS)
            .any(|k| *k == key)
    }
}

type GeometryColumns = BTreeMap<String, serde_json::Value>;

fn first_number(columns: &GeometryColumns, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|key| columns.get(*key))
        .find_map(number_from_value)
}

fn take_first(columns: &mut GeometryColumns, keys: &[&str]) -> Option<serde_json::Value> {
    keys.iter().find_map(|key| columns.remove(*key))
}

/// Reads the geometry columns out of whatever map the row left over. Several
/// spellings of one column may coexist, and any value shape is accepted, so a
/// row's geometry can never fail the row.
impl<'de> Deserialize<'de> for RawGeometry {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ColumnsVisitor;

        impl<'de> Visitor<'de> for ColumnsVisitor {
            type Value = RawGeometry;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of geometry columns")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut columns = GeometryColumns::new();
                while let Some(key) = map.next_key::<String>()? {
                    if RawGeometry::is_geometry_key(&key) {
                        match map.next_value::<serde_json::Value>()? {
                            serde_json::Value::Null => {}
                            value => {
                                columns.entry(key).or_insert(value);
                            }
                        }
                    } else {
                        map.next_value::<IgnoredAny>()?;
                    }
                }
                Ok(RawGeometry::from_columns(columns))
            }
        }

        deserializer.deserialize_map(ColumnsVisitor)
    }
}

/// A show as read from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    /// Venue name as free text. Not a geometry column.
    #[serde(default, deserialize_with = "text_or_absent")]
    pub location: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(alias = "start")]
    pub start_date: DateTime<Utc>,
    #[serde(alias = "end")]
    pub end_date: DateTime<Utc>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub entry_fee: Option<f64>,
    #[serde(default)]
    pub status: ShowStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub categories: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub features: BTreeMap<String, bool>,
    #[serde(default, alias = "organizer_id")]
    pub organizer: Option<String>,
    #[serde(flatten)]
    pub geometry: RawGeometry,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Filled in by the engine when a real search center was supplied; any
    /// value the store sends is overwritten.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_miles: Option<f64>,
}

impl ShowRecord {
    /// Entry fee with a missing value read as free.
    #[must_use]
    pub fn fee_or_free(&self) -> f64 {
        self.entry_fee.unwrap_or(0.0)
    }

    #[must_use]
    pub fn has_feature(&self, key: &str) -> bool {
        self.features.get(key).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn in_any_category<S: AsRef<str>>(&self, wanted: &[S]) -> bool {
        wanted
            .iter()
            .any(|w| self.categories.iter().any(|c| c.eq_ignore_ascii_case(w.as_ref())))
    }
}

/// Accepts numbers, numeric strings and null. Anything else reads as absent
/// so one odd column never sinks a whole response.
fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

fn number_from_value(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn text_or_absent<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(s)) => Some(s),
        _ => None,
    })
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_record_accepts_remote_row_shapes() {
        let row = json!({
            "id": 42,
            "title": "Spring Card Show",
            "address": "100 Main St, Austin, TX",
            "start_date": "2026-11-01T10:00:00Z",
            "end_date": "2026-11-01T18:00:00Z",
            "entry_fee": "5.00",
            "status": "active",
            "categories": null,
            "features": {"parking": true},
            "lat": 30.27,
            "lng": -97.74,
            "geom": "0101000000000000000000F03F0000000000000040"
        });

        let record: ShowRecord = serde_json::from_value(row).unwrap();
        assert_eq!(record.id, "42");
        assert_eq!(record.entry_fee, Some(5.0));
        assert_eq!(record.status, ShowStatus::Active);
        assert!(record.categories.is_empty());
        assert!(record.has_feature("parking"));
        assert_eq!(record.geometry.latitude, Some(30.27));
        assert_eq!(record.geometry.longitude, Some(-97.74));
        assert!(record.geometry.coordinates.is_none());
        assert_eq!(
            record.geometry.geom,
            Some(json!("0101000000000000000000F03F0000000000000040"))
        );
    }

    #[test]
    fn test_row_with_every_geometry_column_keeps_each_one() {
        let row = json!({
            "id": "both",
            "title": "t",
            "location": "Expo Hall B",
            "start_date": "2026-11-01T10:00:00Z",
            "end_date": "2026-11-01T18:00:00Z",
            "latitude": 30.27,
            "lat": 1.0,
            "lng": -97.74,
            "lon": 2.0,
            "coordinates": {"coordinates": [-97.74, 30.27]},
            "geom": "0101000000000000000000F03F0000000000000040",
            "geometry": "POINT(2 1)"
        });

        let record: ShowRecord = serde_json::from_value(row).unwrap();
        assert_eq!(record.location.as_deref(), Some("Expo Hall B"));
        assert_eq!(record.geometry.latitude, Some(30.27));
        assert_eq!(record.geometry.longitude, Some(-97.74));
        assert_eq!(
            record.geometry.coordinates,
            Some(json!({"coordinates": [-97.74, 30.27]}))
        );
        assert_eq!(
            record.geometry.geom,
            Some(json!("0101000000000000000000F03F0000000000000040"))
        );
    }

    #[test]
    fn test_short_column_name_fills_in_for_junk_full_name() {
        let row = json!({
            "id": "a",
            "title": "t",
            "start_date": "2026-11-01T10:00:00Z",
            "end_date": "2026-11-01T18:00:00Z",
            "latitude": "n/a",
            "lat": 30.27,
            "geometry": "POINT(-97.74 30.27)",
            "location": {"type": "Point"}
        });
        let record: ShowRecord = serde_json::from_value(row).unwrap();
        assert_eq!(record.geometry.latitude, Some(30.27));
        assert_eq!(record.geometry.geom, Some(json!("POINT(-97.74 30.27)")));
        assert!(record.location.is_none());
    }

    #[test]
    fn test_geometry_columns_survive_a_round_trip_through_json() {
        let row = json!({
            "id": "a",
            "title": "t",
            "start_date": "2026-11-01T10:00:00Z",
            "end_date": "2026-11-01T18:00:00Z",
            "lng": -97.74,
            "geometry": "POINT(-97.74 30.27)"
        });
        let record: ShowRecord = serde_json::from_value(row).unwrap();
        let back: ShowRecord = serde_json::from_value(serde_json::to_value(&record).unwrap()).unwrap();
        assert_eq!(back.geometry, record.geometry);
    }

    #[test]
    fn test_malformed_scalar_geometry_reads_as_absent() {
        let row = json!({
            "id": "a",
            "title": "t",
            "start_date": "2026-11-01T10:00:00Z",
            "end_date": "2026-11-01T18:00:00Z",
            "latitude": {"nested": true},
            "longitude": "not a number"
        });
        let record: ShowRecord = serde_json::from_value(row).unwrap();
        assert!(record.geometry.latitude.is_none());
        assert!(record.geometry.longitude.is_none());
    }

    #[test]
    fn test_unknown_status_does_not_fail() {
        let status: ShowStatus = serde_json::from_value(json!("POSTPONED")).unwrap();
        assert_eq!(status, ShowStatus::Unknown);
    }

    #[test]
    fn test_window_overlap_is_half_open() {
        let from = Utc.with_ymd_and_hms(2026, 11, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2026, 11, 2, 0, 0, 0).unwrap();
        let window = DateWindow::new(from, to);

        // Started before the window, still running inside it.
        assert!(window.overlaps(from - Duration::days(2), from + Duration::hours(1)));
        // Starts exactly at the exclusive upper bound.
        assert!(!window.overlaps(to, to + Duration::hours(3)));
        // Ended exactly at the inclusive lower bound.
        assert!(window.overlaps(from - Duration::hours(3), from));
        assert!(!window.overlaps(from - Duration::hours(3), from - Duration::seconds(1)));
    }

    #[test]
    fn test_window_starting_today_begins_at_midnight() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 15, 30, 0).unwrap();
        let window = DateWindow::starting_today(now, 30);
        assert_eq!(window.from, Utc.with_ymd_and_hms(2026, 10, 16, 0, 0, 0).unwrap());
        assert_eq!(window.to, Utc.with_ymd_and_hms(2026, 11, 15, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_category_match_ignores_case() {
        let record: ShowRecord = serde_json::from_value(json!({
            "id": "a",
            "title": "t",
            "start_date": "2026-11-01T10:00:00Z",
            "end_date": "2026-11-01T18:00:00Z",
            "categories": ["Sports Cards", "Comics"]
        }))
        .unwrap();
        assert!(record.in_any_category(&["comics"]));
        assert!(!record.in_any_category(&["coins"]));
    }
}
