//! Great-circle distance and radius membership.
//!
//! Everything here is in statute miles on a sphere of radius
//! [`EARTH_RADIUS_MILES`].

use showscout_store::Coordinate;

pub const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Centers closer than this (in degrees, on both axes) to (0, 0) are treated
/// as the "no location" placeholder.
pub const DEGENERATE_CENTER_DEGREES: f64 = 0.1;

/// Haversine distance between two points, in miles.
#[must_use]
pub fn haversine_miles(a: Coordinate, b: Coordinate) -> f64 {
    let (lat1, lat2) = (a.latitude.to_radians(), b.latitude.to_radians());
    let d_lat = lat2 - lat1;
    let d_lng = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);
    2.0 * EARTH_RADIUS_MILES * h.sqrt().atan2((1.0 - h).sqrt())
}

#[must_use]
pub fn is_degenerate_center(center: Coordinate) -> bool {
    center.latitude.abs() < DEGENERATE_CENTER_DEGREES
        && center.longitude.abs() < DEGENERATE_CENTER_DEGREES
}

/// Radius membership. A degenerate center admits every point: filtering
/// around the placeholder would discard every real record.
#[must_use]
pub fn within_radius(center: Coordinate, point: Coordinate, radius_miles: f64) -> bool {
    is_degenerate_center(center) || haversine_miles(center, point) <= radius_miles
}

/// Radius rule for a whole search, decided once up front.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RadiusFilter {
    /// No real center: every record passes, located or not.
    Skip,
    Active { center: Coordinate, radius_miles: f64 },
}

impl RadiusFilter {
    #[must_use]
    pub fn new(center: Option<Coordinate>, radius_miles: f64) -> Self {
        match center {
            Some(center) if !is_degenerate_center(center) => Self::Active {
                center,
                radius_miles,
            },
            _ => Self::Skip,
        }
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    #[must_use]
    pub const fn center(&self) -> Option<Coordinate> {
        match self {
            Self::Active { center, .. } => Some(*center),
            Self::Skip => None,
        }
    }

    /// Distance from the center when active and the point is known.
    #[must_use]
    pub fn distance(&self, point: Option<Coordinate>) -> Option<f64> {
        match (self, point) {
            (Self::Active { center, .. }, Some(point)) => Some(haversine_miles(*center, point)),
            _ => None,
        }
    }

    /// Unlocated records only pass when filtering is skipped.
    #[must_use]
    pub fn admits(&self, point: Option<Coordinate>) -> bool {
        match (self, point) {
            (Self::Skip, _) => true,
            (Self::Active { .. }, None) => false,
            (
                Self::Active {
                    center,
                    radius_miles,
                },
                Some(point),
            ) => within_radius(*center, point, *radius_miles),
        }
    }
}
