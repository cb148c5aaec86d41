use chrono::{DateTime, Duration, Utc};
use serde_json::json;

use crate::model::{Coordinate, RawGeometry, ShowRecord, ShowStatus};

/// Fluent constructor for [`ShowRecord`] fixtures.
///
/// Defaults: active, free, four hours long, no categories, features or
/// geometry.
#[derive(Debug, Clone)]
pub struct ShowBuilder {
    record: ShowRecord,
}

impl ShowBuilder {
    pub fn new(id: impl Into<String>, start: DateTime<Utc>) -> Self {
        let id = id.into();
        Self {
            record: ShowRecord {
                title: format!("Show {id}"),
                id,
                location: None,
                address: None,
                start_date: start,
                end_date: start + Duration::hours(4),
                entry_fee: None,
                status: ShowStatus::Active,
                categories: Vec::new(),
                features: Default::default(),
                organizer: None,
                geometry: RawGeometry::default(),
                created_at: None,
                updated_at: None,
                distance_miles: None,
            },
        }
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.record.title = title.into();
        self
    }

    #[must_use]
    pub fn ends(mut self, end: DateTime<Utc>) -> Self {
        self.record.end_date = end;
        self
    }

    #[must_use]
    pub fn lasting(mut self, duration: Duration) -> Self {
        self.record.end_date = self.record.start_date + duration;
        self
    }

    #[must_use]
    pub fn fee(mut self, fee: f64) -> Self {
        self.record.entry_fee = Some(fee);
        self
    }

    #[must_use]
    pub fn status(mut self, status: ShowStatus) -> Self {
        self.record.status = status;
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.record.categories.push(category.into());
        self
    }

    #[must_use]
    pub fn feature(mut self, key: impl Into<String>, enabled: bool) -> Self {
        self.record.features.insert(key.into(), enabled);
        self
    }

    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.record.address = Some(address.into());
        self
    }

    #[must_use]
    pub fn venue(mut self, location: impl Into<String>) -> Self {
        self.record.location = Some(location.into());
        self
    }

    /// Explicit `latitude`/`longitude` columns.
    #[must_use]
    pub fn at(mut self, latitude: f64, longitude: f64) -> Self {
        self.record.geometry.latitude = Some(latitude);
        self.record.geometry.longitude = Some(longitude);
        self
    }

    /// GeoJSON-style `{type: "Point", coordinates: [lng, lat]}` object.
    #[must_use]
    pub fn point_object(mut self, coordinate: Coordinate) -> Self {
        self.record.geometry.coordinates = Some(json!({
            "type": "Point",
            "coordinates": [coordinate.longitude, coordinate.latitude],
        }));
        self
    }

    /// Any raw value for the `geom` spatial column: hex WKB, WKT, junk.
    #[must_use]
    pub fn raw_geometry(mut self, value: serde_json::Value) -> Self {
        self.record.geometry.geom = Some(value);
        self
    }

    #[must_use]
    pub fn build(self) -> ShowRecord {
        self.record
    }
}

/// Reference point for fixtures: downtown Austin, TX.
pub const AUSTIN: Coordinate = Coordinate::new(30.2672, -97.7431);

/// A point `miles` due north of `origin` (one degree of latitude is
/// 69.093 miles on a 3958.8 mile sphere).
#[must_use]
pub fn north_of(origin: Coordinate, miles: f64) -> Coordinate {
    Coordinate::new(origin.latitude + miles / 69.093, origin.longitude)
}

/// A small mixed set of shows around [`AUSTIN`], relative to `now`:
/// nearby, out-of-radius, past, cancelled, and address-only records.
#[must_use]
pub fn sample_shows(now: DateTime<Utc>) -> Vec<ShowRecord> {
    let near = north_of(AUSTIN, 2.0);
    let mid = north_of(AUSTIN, 10.0);
    let far = north_of(AUSTIN, 40.0);
    vec![
        ShowBuilder::new("cards-downtown", now + Duration::days(3))
            .title("Downtown Card Show")
            .address("100 Congress Ave, Austin, TX")
            .at(near.latitude, near.longitude)
            .fee(5.0)
            .category("Sports Cards")
            .feature("parking", true)
            .feature("grading", true)
            .build(),
        ShowBuilder::new("comics-north", now + Duration::days(1))
            .title("North Austin Comic Expo")
            .address("9000 Research Blvd, Austin, TX")
            .point_object(mid)
            .fee(15.0)
            .category("Comics")
            .feature("parking", true)
            .build(),
        ShowBuilder::new("coins-georgetown", now + Duration::days(2))
            .title("Georgetown Coin Fair")
            .address("1 Main St, Georgetown, TX")
            .at(far.latitude, far.longitude)
            .category("Coins")
            .build(),
        ShowBuilder::new("cards-last-week", now - Duration::days(7))
            .title("Last Week's Card Show")
            .address("100 Congress Ave, Austin, TX")
            .at(near.latitude, near.longitude)
            .category("Sports Cards")
            .build(),
        ShowBuilder::new("cards-cancelled", now + Duration::days(4))
            .title("Cancelled Card Show")
            .at(near.latitude, near.longitude)
            .status(ShowStatus::Cancelled)
            .category("Sports Cards")
            .build(),
        ShowBuilder::new("cards-downtown-sequel", now + Duration::days(10))
            .title("Downtown Card Show II")
            .address("  100 Congress Ave.,   AUSTIN, TX ")
            .fee(5.0)
            .category("Sports Cards")
            .build(),
    ]
}
