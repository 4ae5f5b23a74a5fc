//! Geohash cells and their integer keys.
//!
//! A point is encoded once at full precision; every prefix of that hash names
//! a coarser cell containing it. Cells are looked up by [`CellKey`], the
//! base-32 value of the prefix with a leading sentinel bit so that prefixes of
//! different lengths never collide (`"0"` and `"00"` are different cells).

use crate::config::MAX_GEOHASH_PRECISION;
use crate::error::{GeomemError, Result};
use smallvec::SmallVec;
use std::fmt;

const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Keys for every prefix of one full-precision hash, coarsest first.
pub type PrefixKeys = SmallVec<[CellKey; MAX_GEOHASH_PRECISION]>;

/// Integer key of a geohash cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellKey(u64);

impl CellKey {
    /// Decode a geohash prefix into its cell key.
    ///
    /// ```
    /// use geomem::CellKey;
    ///
    /// let key = CellKey::from_geohash("9q8").unwrap();
    /// assert_eq!(key.precision(), 3);
    /// assert_eq!(key.to_geohash(), "9q8");
    /// assert_ne!(CellKey::from_geohash("0").unwrap(), CellKey::from_geohash("00").unwrap());
    /// ```
    pub fn from_geohash(prefix: &str) -> Result<Self> {
        if prefix.is_empty() || prefix.len() > MAX_GEOHASH_PRECISION {
            return Err(GeomemError::InvalidGeohash(format!(
                "prefix length must be between 1 and {}, got {:?}",
                MAX_GEOHASH_PRECISION, prefix
            )));
        }

        let mut key = 1u64;
        for byte in prefix.bytes() {
            key = (key << 5) | base32_value(byte, prefix)?;
        }
        Ok(Self(key))
    }

    /// Length of the geohash prefix this key was decoded from.
    pub fn precision(self) -> usize {
        ((63 - self.0.leading_zeros()) / 5) as usize
    }

    /// Re-encode the key as its geohash prefix.
    pub fn to_geohash(self) -> String {
        let len = self.precision();
        (0..len)
            .map(|i| {
                let shift = 5 * (len - 1 - i);
                BASE32[((self.0 >> shift) & 0x1f) as usize] as char
            })
            .collect()
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_geohash())
    }
}

fn base32_value(byte: u8, prefix: &str) -> Result<u64> {
    BASE32
        .iter()
        .position(|&c| c == byte)
        .map(|v| v as u64)
        .ok_or_else(|| {
            GeomemError::InvalidGeohash(format!(
                "invalid character {:?} in {:?}",
                byte as char, prefix
            ))
        })
}

/// Encode `(lat, lon)` as a geohash of `precision` characters.
///
/// The only check is the encoder's own range check on the coordinates.
/// `lat == 90` and `lon == 180` are filed in the northmost and eastmost
/// cells; the encoder alone would wrap them into cell `"0"`.
pub fn encode_full_precision(lat: f64, lon: f64, precision: usize) -> Result<String> {
    let coord = geohash::Coord {
        x: below_upper_edge(lon, 180.0),
        y: below_upper_edge(lat, 90.0),
    };
    geohash::encode(coord, precision).map_err(|e| {
        GeomemError::InvalidCoordinates {
            lat,
            lon,
            reason: e.to_string(),
        }
    })
}

#[inline]
fn below_upper_edge(value: f64, edge: f64) -> f64 {
    if value == edge { edge.next_down() } else { value }
}

/// Keys of every prefix of `hash`, from length 1 up to the full hash.
pub fn prefix_keys(hash: &str) -> Result<PrefixKeys> {
    if hash.len() > MAX_GEOHASH_PRECISION {
        return Err(GeomemError::InvalidGeohash(format!(
            "hash longer than {} characters: {:?}",
            MAX_GEOHASH_PRECISION, hash
        )));
    }

    let mut keys = PrefixKeys::new();
    let mut key = 1u64;
    for byte in hash.bytes() {
        key = (key << 5) | base32_value(byte, hash)?;
        keys.push(CellKey(key));
    }
    Ok(keys)
}
