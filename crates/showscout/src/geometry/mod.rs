//! Interpretation of the polymorphic geometry column.
//!
//! A row can carry its location as explicit scalar columns, a point object,
//! hex WKB/EWKB, or WKT text. [`GeometryField::candidates`] lists whichever of
//! those are present, highest priority first, and each variant has exactly one
//! decoder. A present-but-broken encoding is a [`DecodeError`], never a panic;
//! callers fall through to the next candidate.

pub use error::DecodeError;
use error::Result;
use serde_json::Value;
use showscout_store::{Coordinate, RawGeometry};
mod wkb;
mod wkt;

pub use wkb::{Endianness, decode_wkb, decode_wkb_hex, encode_point_hex};
pub use wkt::decode_wkt;

/// One candidate reading of a row's geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeometryField<'a> {
    /// `latitude`/`longitude` columns. Either may be missing.
    Explicit {
        latitude: Option<f64>,
        longitude: Option<f64>,
    },
    /// `{coordinates: [lng, lat]}` object, or a bare `[lng, lat]` array.
    Structured(&'a Value),
    /// Hex WKB/EWKB.
    Binary(&'a str),
    /// WKT/EWKT, e.g. `SRID=4326;POINT(-97.7 30.2)`.
    Text(&'a str),
    Absent,
}

impl<'a> GeometryField<'a> {
    /// Encodings present on `raw`, in decode priority order: explicit
    /// columns, then point objects, then binary, then text. Both the
    /// `coordinates` and `geom` columns are classified by shape, so an object
    /// in either still outranks hex in the other. Always ends with
    /// [`GeometryField::Absent`].
    #[must_use]
    pub fn candidates(raw: &'a RawGeometry) -> Vec<Self> {
        let mut out = Vec::with_capacity(4);
        if raw.latitude.is_some() || raw.longitude.is_some() {
            out.push(Self::Explicit {
                latitude: raw.latitude,
                longitude: raw.longitude,
            });
        }
        let mut encoded: Vec<Self> = [&raw.coordinates, &raw.geom]
            .into_iter()
            .filter_map(|column| column.as_ref().and_then(Self::classify))
            .collect();
        encoded.sort_by_key(Self::rank);
        out.extend(encoded);
        out.push(Self::Absent);
        out
    }

    fn classify(value: &'a Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(s) => {
                let s = s.trim();
                if s.is_empty() {
                    None
                } else if s.bytes().all(|b| b.is_ascii_hexdigit()) {
                    Some(Self::Binary(s))
                } else {
                    Some(Self::Text(s))
                }
            }
            other => Some(Self::Structured(other)),
        }
    }

    const fn rank(&self) -> u8 {
        match self {
            Self::Explicit { .. } => 0,
            Self::Structured(_) => 1,
            Self::Binary(_) => 2,
            Self::Text(_) => 3,
            Self::Absent => 4,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Explicit { .. } => "explicit",
            Self::Structured(_) => "structured",
            Self::Binary(_) => "binary",
            Self::Text(_) => "text",
            Self::Absent => "absent",
        }
    }

    /// Decode this candidate into an in-range coordinate.
    pub fn decode(&self) -> Result<Coordinate> {
        let coordinate = match *self {
            Self::Explicit {
                latitude,
                longitude,
            } => Coordinate::new(
                latitude.ok_or(DecodeError::MissingComponent("latitude"))?,
                longitude.ok_or(DecodeError::MissingComponent("longitude"))?,
            ),
            Self::Structured(value) => decode_structured(value)?,
            Self::Binary(hex) => decode_wkb_hex(hex)?,
            Self::Text(text) => decode_wkt(text)?,
            Self::Absent => return Err(DecodeError::Absent),
        };
        if !coordinate.is_finite() {
            return Err(DecodeError::NonFinite);
        }
        if !coordinate.is_valid() {
            return Err(DecodeError::OutOfRange(coordinate));
        }
        Ok(coordinate)
    }
}

/// Accepts `{coordinates: [lng, lat], ...}` (with an optional `type` that must
/// be `Point`) or a bare `[lng, lat]` array.
pub fn decode_structured(value: &Value) -> Result<Coordinate> {
    let coordinates = match value {
        Value::Object(map) => {
            if let Some(kind) = map.get("type").and_then(Value::as_str) {
                if !kind.eq_ignore_ascii_case("point") {
                    return Err(DecodeError::MalformedObject("type is not Point"));
                }
            }
            map.get("coordinates")
                .ok_or(DecodeError::MalformedObject("missing coordinates"))?
        }
        Value::Array(_) => value,
        _ => return Err(DecodeError::MalformedObject("expected object or array")),
    };
    let pair = coordinates
        .as_array()
        .ok_or(DecodeError::MalformedObject("coordinates is not an array"))?;
    let [lng, lat, ..] = pair.as_slice() else {
        return Err(DecodeError::MalformedObject("coordinates needs two entries"));
    };
    let (Some(longitude), Some(latitude)) = (lng.as_f64(), lat.as_f64()) else {
        return Err(DecodeError::MalformedObject("coordinates are not numbers"));
    };
    if !longitude.is_finite() || !latitude.is_finite() {
        return Err(DecodeError::NonFinite);
    }
    Ok(Coordinate::new(latitude, longitude))
}

mod error {
    use showscout_store::Coordinate;
    use thiserror::Error;

    #[derive(Error, Debug, Clone, PartialEq)]
    pub enum DecodeError {
        #[error("no geometry present")]
        Absent,
        #[error("explicit coordinate is missing its {0}")]
        MissingComponent(&'static str),
        #[error("coordinate value is not finite")]
        NonFinite,
        #[error("coordinate {0} is outside valid latitude/longitude bounds")]
        OutOfRange(Coordinate),
        #[error("hex string has odd length {0}")]
        OddHexLength(usize),
        #[error("invalid hex digit at offset {0}")]
        InvalidHex(usize),
        #[error("unknown byte order flag {0:#04x}")]
        ByteOrder(u8),
        #[error("buffer truncated: needed {needed} bytes, had {available}")]
        Truncated { needed: usize, available: usize },
        #[error("geometry type {0} is not a point")]
        NotAPoint(u32),
        #[error("malformed point object: {0}")]
        MalformedObject(&'static str),
        #[error("malformed point text: {0}")]
        MalformedText(String),
    }

    pub type Result<T> = std::result::Result<T, DecodeError>;
}
