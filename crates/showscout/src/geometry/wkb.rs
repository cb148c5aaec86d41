//! Point-only WKB/EWKB codec.
//!
//! Layout: byte-order flag (1 = little, 0 = big), a u32 type word, an optional
//! u32 SRID when the type word carries `EWKB_SRID_FLAG`, then X (longitude) and
//! Y (latitude) as f64. Only the low 16 bits of the type word name the
//! geometry; Z/M flags are tolerated and the extra ordinates ignored.

use std::fmt::Write as _;

use showscout_store::Coordinate;

use super::{DecodeError, error::Result};

const WKB_POINT: u32 = 1;
const EWKB_SRID_FLAG: u32 = 0x2000_0000;
const GEOMETRY_TYPE_MASK: u32 = 0xFFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    const fn flag(self) -> u8 {
        match self {
            Self::Little => 1,
            Self::Big => 0,
        }
    }

    const fn from_flag(flag: u8) -> Result<Self> {
        match flag {
            1 => Ok(Self::Little),
            0 => Ok(Self::Big),
            other => Err(DecodeError::ByteOrder(other)),
        }
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    endianness: Endianness,
}

impl Reader<'_> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let end = self.pos + N;
        let chunk = self
            .bytes
            .get(self.pos..end)
            .ok_or(DecodeError::Truncated {
                needed: end,
                available: self.bytes.len(),
            })?;
        self.pos = end;
        let mut out = [0u8; N];
        out.copy_from_slice(chunk);
        Ok(out)
    }

    fn u32(&mut self) -> Result<u32> {
        let raw = self.take::<4>()?;
        Ok(match self.endianness {
            Endianness::Little => u32::from_le_bytes(raw),
            Endianness::Big => u32::from_be_bytes(raw),
        })
    }

    fn f64(&mut self) -> Result<f64> {
        let raw = self.take::<8>()?;
        let value = match self.endianness {
            Endianness::Little => f64::from_le_bytes(raw),
            Endianness::Big => f64::from_be_bytes(raw),
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(DecodeError::NonFinite)
        }
    }
}

fn decode_hex(hex: &str) -> Result<Vec<u8>> {
    let digits = hex.as_bytes();
    if digits.len() % 2 != 0 {
        return Err(DecodeError::OddHexLength(digits.len()));
    }
    digits
        .chunks_exact(2)
        .enumerate()
        .map(|(i, pair)| {
            let hi = (pair[0] as char).to_digit(16);
            let lo = (pair[1] as char).to_digit(16);
            match (hi, lo) {
                (Some(hi), Some(lo)) => Ok(((hi << 4) | lo) as u8),
                (None, _) => Err(DecodeError::InvalidHex(i * 2)),
                (_, None) => Err(DecodeError::InvalidHex(i * 2 + 1)),
            }
        })
        .collect()
}

/// Decode a hex-encoded WKB/EWKB point.
pub fn decode_wkb_hex(hex: &str) -> Result<Coordinate> {
    decode_wkb(&decode_hex(hex.trim())?)
}

/// Decode a WKB/EWKB point from raw bytes.
pub fn decode_wkb(bytes: &[u8]) -> Result<Coordinate> {
    let flag = *bytes.first().ok_or(DecodeError::Truncated {
        needed: 1,
        available: 0,
    })?;
    let mut reader = Reader {
        bytes,
        pos: 1,
        endianness: Endianness::from_flag(flag)?,
    };

    let type_word = reader.u32()?;
    if type_word & EWKB_SRID_FLAG != 0 {
        let _srid = reader.u32()?;
    }
    if type_word & GEOMETRY_TYPE_MASK != WKB_POINT {
        return Err(DecodeError::NotAPoint(type_word & GEOMETRY_TYPE_MASK));
    }

    let longitude = reader.f64()?;
    let latitude = reader.f64()?;
    Ok(Coordinate::new(latitude, longitude))
}

/// Encode a point as upper-case hex WKB, or EWKB when `srid` is given.
#[must_use]
pub fn encode_point_hex(coordinate: Coordinate, endianness: Endianness, srid: Option<u32>) -> String {
    let mut bytes = Vec::with_capacity(25);
    bytes.push(endianness.flag());

    let put_u32 = |bytes: &mut Vec<u8>, v: u32| match endianness {
        Endianness::Little => bytes.extend_from_slice(&v.to_le_bytes()),
        Endianness::Big => bytes.extend_from_slice(&v.to_be_bytes()),
    };
    let put_f64 = |bytes: &mut Vec<u8>, v: f64| match endianness {
        Endianness::Little => bytes.extend_from_slice(&v.to_le_bytes()),
        Endianness::Big => bytes.extend_from_slice(&v.to_be_bytes()),
    };

    match srid {
        Some(srid) => {
            put_u32(&mut bytes, WKB_POINT | EWKB_SRID_FLAG);
            put_u32(&mut bytes, srid);
        }
        None => put_u32(&mut bytes, WKB_POINT),
    }
    put_f64(&mut bytes, coordinate.longitude);
    put_f64(&mut bytes, coordinate.latitude);

    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02X}");
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUSTIN: Coordinate = Coordinate::new(30.2672, -97.7431);

    #[test]
    fn test_known_postgis_ewkb_little_endian() {
        // SELECT ST_AsEWKB('SRID=4326;POINT(1 2)'::geometry)
        let hex = "0101000020E6100000000000000000F03F0000000000000040";
        assert_eq!(decode_wkb_hex(hex).unwrap(), Coordinate::new(2.0, 1.0));
    }

    #[test]
    fn test_known_big_endian_wkb() {
        let hex = "00000000013FF00000000000004000000000000000";
        assert_eq!(decode_wkb_hex(hex).unwrap(), Coordinate::new(2.0, 1.0));
    }

    #[test]
    fn test_lowercase_hex_accepted() {
        let hex = encode_point_hex(AUSTIN, Endianness::Little, Some(4326)).to_lowercase();
        assert_eq!(decode_wkb_hex(&hex).unwrap(), AUSTIN);
    }

    #[test]
    fn test_round_trip_is_stable_across_encodings() {
        let points = [
            AUSTIN,
            Coordinate::new(-33.8688, 151.2093),
            Coordinate::new(89.999_999, -179.999_999),
            Coordinate::new(0.000_001, 0.0),
        ];
        for point in points {
            for endianness in [Endianness::Little, Endianness::Big] {
                for srid in [None, Some(4326)] {
                    let first = decode_wkb_hex(&encode_point_hex(point, endianness, srid)).unwrap();
                    let second =
                        decode_wkb_hex(&encode_point_hex(first, endianness, srid)).unwrap();
                    assert_eq!(first, second);
                    assert!((first.latitude - point.latitude).abs() < 1e-12);
                    assert!((first.longitude - point.longitude).abs() < 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_malformed_inputs_fail_cleanly() {
        let good = encode_point_hex(AUSTIN, Endianness::Little, None);

        assert_eq!(decode_wkb_hex("010"), Err(DecodeError::OddHexLength(3)));
        assert_eq!(decode_wkb_hex("0G"), Err(DecodeError::InvalidHex(1)));
        assert_eq!(decode_wkb_hex(""), Err(DecodeError::Truncated { needed: 1, available: 0 }));
        assert!(matches!(
            decode_wkb_hex(&good[..good.len() - 2]),
            Err(DecodeError::Truncated { .. })
        ));
        assert_eq!(
            decode_wkb_hex("02010000000000000000000000000000000000000000"),
            Err(DecodeError::ByteOrder(2))
        );
    }

    #[test]
    fn test_non_point_geometry_rejected() {
        // LINESTRING type word (2), little-endian.
        assert_eq!(
            decode_wkb_hex("010200000000000000"),
            Err(DecodeError::NotAPoint(2))
        );
    }

    #[test]
    fn test_non_finite_ordinates_rejected() {
        let hex = encode_point_hex(Coordinate::new(f64::NAN, 1.0), Endianness::Big, None);
        assert_eq!(decode_wkb_hex(&hex), Err(DecodeError::NonFinite));
    }

    #[test]
    fn test_srid_flag_skips_four_bytes() {
        let with_srid = encode_point_hex(AUSTIN, Endianness::Big, Some(3857));
        let without = encode_point_hex(AUSTIN, Endianness::Big, None);
        assert_eq!(with_srid.len(), without.len() + 8);
        assert_eq!(decode_wkb_hex(&with_srid), decode_wkb_hex(&without));
    }
}
