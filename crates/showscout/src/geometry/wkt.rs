use once_cell::sync::Lazy;
use regex::Regex;
use showscout_store::Coordinate;

use super::{DecodeError, error::Result};

static POINT_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?:SRID=\d+\s*;)?\s*POINT\s*(?:ZM|Z|M)?\s*\(\s*(\S+)\s+(\S+)(?:\s+\S+){0,2}\s*\)\s*$",
    )
    .expect("point WKT pattern is valid")
});

/// Decode `POINT(lng lat)`, optionally with an `SRID=n;` prefix or Z/M
/// ordinates (ignored).
pub fn decode_wkt(text: &str) -> Result<Coordinate> {
    let captures = POINT_TEXT
        .captures(text)
        .ok_or_else(|| DecodeError::MalformedText(text.chars().take(64).collect()))?;
    let parse = |i: usize| -> Result<f64> {
        let raw = &captures[i];
        raw.parse::<f64>()
            .map_err(|_| DecodeError::MalformedText(format!("'{raw}' is not a number")))
    };
    let longitude = parse(1)?;
    let latitude = parse(2)?;
    if !longitude.is_finite() || !latitude.is_finite() {
        return Err(DecodeError::NonFinite);
    }
    Ok(Coordinate::new(latitude, longitude))
}
