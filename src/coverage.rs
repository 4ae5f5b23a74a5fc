//! Bounding-box coverage: which geohash cells a query has to visit.
//!
//! The store only needs a set of prefixes whose cells together cover the
//! query box. [`GeohashCoverage`] is the default strategy; anything that
//! implements [`Coverage`] can replace it through
//! [`StoreBuilder::coverage`](crate::StoreBuilder::coverage).

use crate::bbox::BoundingBox;
use crate::cell::encode_full_precision;
use crate::error::{GeomemError, Result};

/// Supplies the cells a bounding-box query visits.
pub trait Coverage: Send + Sync {
    /// Return prefixes (at most `max_precision` characters long) whose cells
    /// cover `bounds`. Results are correct only if the cells do not overlap,
    /// unless the store was configured with `dedupe_results`.
    fn cover(&self, bounds: &BoundingBox, max_precision: usize) -> Result<CoverageSet>;
}

/// Geohash prefixes covering a query box.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageSet {
    hashes: Vec<String>,
    ratio: Option<f64>,
}

impl CoverageSet {
    pub fn new(hashes: Vec<String>) -> Self {
        Self {
            hashes,
            ratio: None,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Attach the ratio of covered area to query area.
    pub fn with_ratio(mut self, ratio: f64) -> Self {
        self.ratio = Some(ratio);
        self
    }

    pub fn hashes(&self) -> &[String] {
        &self.hashes
    }

    pub fn into_hashes(self) -> Vec<String> {
        self.hashes
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    /// Covered area over query area; `None` for degenerate boxes or when the
    /// strategy does not report it.
    pub fn ratio(&self) -> Option<f64> {
        self.ratio
    }
}

/// Uniform-length geohash coverage.
///
/// Picks the longest hash length whose grid needs no more than `max_hashes`
/// cells to span the box (length 1 if even that is too many) and returns
/// every cell of that grid touching the box. Cells of one length never
/// overlap, so no record is yielded twice.
#[derive(Debug, Clone, Copy)]
pub struct GeohashCoverage {
    max_hashes: usize,
}

impl GeohashCoverage {
    pub fn new(max_hashes: usize) -> Self {
        Self {
            max_hashes: max_hashes.max(1),
        }
    }

    pub fn max_hashes(&self) -> usize {
        self.max_hashes
    }
}

impl Default for GeohashCoverage {
    fn default() -> Self {
        Self::new(12)
    }
}

impl Coverage for GeohashCoverage {
    fn cover(&self, bounds: &BoundingBox, max_precision: usize) -> Result<CoverageSet> {
        if bounds.is_inverted() {
            log::debug!("Inverted bounding box {:?}, nothing to cover", bounds);
            return Ok(CoverageSet::empty());
        }

        let mut chosen: Option<(usize, GridSpan)> = None;
        for len in 1..=max_precision.max(1) {
            let span = GridSpan::for_bounds(bounds, len)?;
            if span.count() == 0 {
                log::debug!("Bounding box {:?} spans no cells at length {}", bounds, len);
                return Ok(CoverageSet::empty());
            }
            if span.count() > self.max_hashes as u64 {
                if chosen.is_none() {
                    chosen = Some((len, span));
                }
                break;
            }
            chosen = Some((len, span));
        }

        let Some((len, span)) = chosen else {
            return Ok(CoverageSet::empty());
        };

        let hashes = span.hashes(len)?;
        log::debug!(
            "Covering {:?} with {} cells of length {}",
            bounds,
            hashes.len(),
            len
        );

        let area = bounds.area();
        let set = CoverageSet::new(hashes);
        if area > 0.0 {
            Ok(set.with_ratio(span.area(len) / area))
        } else {
            Ok(set)
        }
    }
}

/// Inclusive column/row range of same-length cells touching a box.
#[derive(Debug, Clone, Copy)]
struct GridSpan {
    min_col: u64,
    max_col: u64,
    min_row: u64,
    max_row: u64,
}

impl GridSpan {
    fn for_bounds(bounds: &BoundingBox, len: usize) -> Result<Self> {
        let (min_col, min_row) = grid_position(bounds.bottom_right_lat, bounds.top_left_lon, len)?;
        let (max_col, max_row) = grid_position(bounds.top_left_lat, bounds.bottom_right_lon, len)?;
        Ok(Self {
            min_col,
            max_col,
            min_row,
            max_row,
        })
    }

    fn cols(&self) -> u64 {
        (self.max_col + 1).saturating_sub(self.min_col)
    }

    fn rows(&self) -> u64 {
        (self.max_row + 1).saturating_sub(self.min_row)
    }

    /// Zero when the corners came back crossed.
    fn count(&self) -> u64 {
        self.cols().saturating_mul(self.rows())
    }

    fn area(&self, len: usize) -> f64 {
        let (width, height) = cell_size(len);
        self.cols() as f64 * width * self.rows() as f64 * height
    }

    fn hashes(&self, len: usize) -> Result<Vec<String>> {
        let (width, height) = cell_size(len);
        let mut hashes = Vec::with_capacity(self.count().min(4096) as usize);
        for row in self.min_row..=self.max_row {
            let lat = -90.0 + (row as f64 + 0.5) * height;
            for col in self.min_col..=self.max_col {
                let lon = -180.0 + (col as f64 + 0.5) * width;
                hashes.push(encode_full_precision(lat, lon, len)?);
            }
        }
        Ok(hashes)
    }
}

/// Width and height in degrees of a cell with a hash of `len` characters.
/// Bits interleave starting with longitude, so longitude gets the odd bit.
fn cell_size(len: usize) -> (f64, f64) {
    let bits = 5 * len as u32;
    let lon_bits = bits.div_ceil(2);
    let lat_bits = bits / 2;
    (
        360.0 / (1u64 << lon_bits) as f64,
        180.0 / (1u64 << lat_bits) as f64,
    )
}

/// Column and row of the cell the encoder assigns to `(lat, lon)`.
///
/// Going through the encoder keeps edge points in the same cell that
/// `Store::add` files them under.
fn grid_position(lat: f64, lon: f64, len: usize) -> Result<(u64, u64)> {
    let hash = encode_full_precision(lat, lon, len)?;
    let rect = geohash::decode_bbox(&hash)
        .map_err(|e| GeomemError::InvalidGeohash(format!("{}: {}", hash, e)))?;
    let (width, height) = cell_size(len);
    let col = ((rect.min().x + 180.0) / width).round() as u64;
    let row = ((rect.min().y + 90.0) / height).round() as u64;
    Ok((col, row))
}
