//! Best-available coordinate for a show record.
//!
//! Own geometry first, in [`GeometryField::candidates`] order; failing that, a
//! coordinate borrowed from another record in the same result set that shares
//! the normalized address. Borrowed coordinates live only in the
//! per-search [`AddressCoordinateCache`] and are never written back.

use ahash::AHashMap as HashMap;
use itertools::Itertools;
use serde::Serialize;
use showscout_store::{Coordinate, ShowRecord};
use tracing::{debug, trace};

use crate::geometry::GeometryField;

/// Where a resolved coordinate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CoordinateSource {
    Explicit,
    Structured,
    Binary,
    Text,
    AddressCache,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedCoordinate {
    pub coordinate: Coordinate,
    pub source: CoordinateSource,
}

/// Lowercase, drop punctuation other than commas, collapse whitespace, trim.
#[must_use]
pub fn normalize_address(address: &str) -> String {
    address
        .chars()
        .filter(|c| *c == ',' || c.is_alphanumeric() || c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect::<String>()
        .split_whitespace()
        .join(" ")
}

/// Resolve from the record's own geometry columns only.
#[must_use]
pub fn resolve_own(record: &ShowRecord) -> Option<ResolvedCoordinate> {
    for field in GeometryField::candidates(&record.geometry) {
        let source = match field {
            GeometryField::Explicit { .. } => CoordinateSource::Explicit,
            GeometryField::Structured(_) => CoordinateSource::Structured,
            GeometryField::Binary(_) => CoordinateSource::Binary,
            GeometryField::Text(_) => CoordinateSource::Text,
            GeometryField::Absent => return None,
        };
        match field.decode() {
            Ok(coordinate) => return Some(ResolvedCoordinate { coordinate, source }),
            Err(e) => debug!(
                show_id = %record.id,
                encoding = field.kind(),
                error = %e,
                "Geometry candidate rejected"
            ),
        }
    }
    None
}

/// Normalized address → coordinate, scoped to one search.
#[derive(Debug, Clone, Default)]
pub struct AddressCoordinateCache {
    entries: HashMap<String, Coordinate>,
}

impl AddressCoordinateCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every record in `records` that has an address and resolvable own
    /// geometry. The first record seen for an address wins.
    #[must_use]
    pub fn build<'a>(records: impl IntoIterator<Item = &'a ShowRecord>) -> Self {
        let mut cache = Self::new();
        for record in records {
            let Some(address) = record.address.as_deref() else {
                continue;
            };
            if let Some(resolved) = resolve_own(record) {
                cache.insert(address, resolved.coordinate);
            }
        }
        trace!(entries = cache.len(), "Address cache built");
        cache
    }

    /// Returns `false` if the address normalizes to nothing or is already
    /// present.
    pub fn insert(&mut self, address: &str, coordinate: Coordinate) -> bool {
        let key = normalize_address(address);
        if key.is_empty() || self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, coordinate);
        true
    }

    #[must_use]
    pub fn get(&self, address: &str) -> Option<Coordinate> {
        self.entries.get(&normalize_address(address)).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Own geometry, then the address cache.
#[must_use]
pub fn resolve(record: &ShowRecord, cache: &AddressCoordinateCache) -> Option<ResolvedCoordinate> {
    resolve_own(record).or_else(|| {
        let coordinate = cache.get(record.address.as_deref()?)?;
        debug!(show_id = %record.id, "Coordinate inferred from shared address");
        Some(ResolvedCoordinate {
            coordinate,
            source: CoordinateSource::AddressCache,
        })
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;
    use showscout_store::test_data::ShowBuilder;

    use super::*;
    use crate::geometry::{Endianness, encode_point_hex};

    #[test]
    fn test_normalize_address() {
        assert_eq!(
            normalize_address("  100 Congress Ave.,   AUSTIN, TX "),
            "100 congress ave, austin, tx"
        );
        assert_eq!(normalize_address("Zürich-Straße #5"), "zürichstraße 5");
        assert_eq!(normalize_address(" ... "), "");
    }

    #[test]
    fn test_explicit_fields_win_over_conflicting_geometry() {
        let hex = encode_point_hex(Coordinate::new(10.0, 10.0), Endianness::Little, Some(4326));
        let record = ShowBuilder::new("a", Utc::now())
            .at(30.0, -97.0)
            .raw_geometry(json!(hex))
            .build();
        let resolved = resolve(&record, &AddressCoordinateCache::new()).unwrap();
        assert_eq!(resolved.coordinate, Coordinate::new(30.0, -97.0));
        assert_eq!(resolved.source, CoordinateSource::Explicit);
    }

    #[test]
    fn test_point_object_wins_over_binary_on_the_same_row() {
        let hex = encode_point_hex(Coordinate::new(10.0, 10.0), Endianness::Little, Some(4326));
        let row = json!({
            "id": "both",
            "title": "Card Show",
            "start_date": "2026-11-01T10:00:00Z",
            "end_date": "2026-11-01T18:00:00Z",
            "coordinates": {"type": "Point", "coordinates": [-97.74, 30.27]},
            "geom": hex
        });
        let record: ShowRecord = serde_json::from_value(row).unwrap();

        let resolved = resolve(&record, &AddressCoordinateCache::new()).unwrap();
        assert_eq!(resolved.coordinate, Coordinate::new(30.27, -97.74));
        assert_eq!(resolved.source, CoordinateSource::Structured);
    }

    #[test]
    fn test_broken_point_object_falls_back_to_binary() {
        let hex = encode_point_hex(Coordinate::new(10.0, 20.0), Endianness::Little, None);
        let mut record = ShowBuilder::new("a", Utc::now()).raw_geometry(json!(hex)).build();
        record.geometry.coordinates = Some(json!({"coordinates": ["x", "y"]}));

        let resolved = resolve_own(&record).unwrap();
        assert_eq!(resolved.coordinate, Coordinate::new(10.0, 20.0));
        assert_eq!(resolved.source, CoordinateSource::Binary);
    }

    #[test]
    fn test_falls_through_broken_encodings() {
        let hex = encode_point_hex(Coordinate::new(10.0, 20.0), Endianness::Big, None);
        let mut record = ShowBuilder::new("a", Utc::now()).raw_geometry(json!(hex)).build();
        // Half an explicit pair is present but unusable.
        record.geometry.latitude = Some(1.0);

        let resolved = resolve_own(&record).unwrap();
        assert_eq!(resolved.coordinate, Coordinate::new(10.0, 20.0));
        assert_eq!(resolved.source, CoordinateSource::Binary);
    }

    #[test]
    fn test_unresolvable_without_cache_hit() {
        let record = ShowBuilder::new("a", Utc::now())
            .address("1 Nowhere Rd")
            .raw_geometry(json!("0101"))
            .build();
        assert!(resolve(&record, &AddressCoordinateCache::new()).is_none());
    }

    #[test]
    fn test_address_cache_infers_coordinates() {
        let now = Utc::now();
        let located = ShowBuilder::new("located", now)
            .address("100 Congress Ave, Austin, TX")
            .at(30.27, -97.74)
            .build();
        let unlocated = ShowBuilder::new("unlocated", now)
            .address("100 CONGRESS AVE.,  Austin, TX")
            .build();

        let cache = AddressCoordinateCache::build([&located, &unlocated]);
        assert_eq!(cache.len(), 1);

        let resolved = resolve(&unlocated, &cache).unwrap();
        assert_eq!(resolved.coordinate, Coordinate::new(30.27, -97.74));
        assert_eq!(resolved.source, CoordinateSource::AddressCache);
        // The record itself is untouched.
        assert!(unlocated.geometry.is_empty());
    }

    #[test]
    fn test_first_address_wins() {
        let mut cache = AddressCoordinateCache::new();
        assert!(cache.insert("1 Main St", Coordinate::new(1.0, 1.0)));
        assert!(!cache.insert("1 main st.", Coordinate::new(2.0, 2.0)));
        assert!(!cache.insert("!!!", Coordinate::new(3.0, 3.0)));
        assert_eq!(cache.get("1 MAIN ST"), Some(Coordinate::new(1.0, 1.0)));
    }
}
