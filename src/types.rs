//! Records and statistics shared by the index and the store.
use crate::cell::CellKey;
use geo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One stored observation, as filed under a single cell.
///
/// Every `add` produces one record per precision level and index. They share
/// the payload and the insertion sequence number `seq` but each carries the
/// key of the cell it lives in.
pub struct PointRecord<T> {
    cell_key: CellKey,
    lat: f64,
    lon: f64,
    time: i64,
    seq: u64,
    payload: Arc<T>,
}

impl<T> PointRecord<T> {
    pub fn new(cell_key: CellKey, lat: f64, lon: f64, time: i64, seq: u64, payload: Arc<T>) -> Self {
        Self {
            cell_key,
            lat,
            lon,
            time,
            seq,
            payload,
        }
    }

    pub fn cell_key(&self) -> CellKey {
        self.cell_key
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// The record's position as a `geo::Point` (x = lon, y = lat).
    pub fn point(&self) -> Point {
        Point::new(self.lon, self.lat)
    }

    pub fn time(&self) -> i64 {
        self.time
    }

    /// Store-wide insertion number, identical across the records of one `add`.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }

    pub fn shared_payload(&self) -> &Arc<T> {
        &self.payload
    }
}

impl<T> Clone for PointRecord<T> {
    fn clone(&self) -> Self {
        Self {
            cell_key: self.cell_key,
            lat: self.lat,
            lon: self.lon,
            time: self.time,
            seq: self.seq,
            payload: Arc::clone(&self.payload),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for PointRecord<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointRecord")
            .field("cell", &self.cell_key.to_geohash())
            .field("lat", &self.lat)
            .field("lon", &self.lon)
            .field("time", &self.time)
            .field("seq", &self.seq)
            .field("payload", &self.payload)
            .finish()
    }
}

/// Store statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Cells created in the primary index, across all precision levels
    pub primary_cells: usize,
    /// Records in the primary index (points added times precision)
    pub primary_records: usize,
    /// Identifiers with a secondary index
    pub identifiers: usize,
    /// Full geohash length points are stored at
    pub geohash_precision: usize,
    /// Number of `add` calls that completed
    pub points_added: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_shares_payload() {
        let key = CellKey::from_geohash("9q8").unwrap();
        let record = PointRecord::new(key, 37.77, -122.42, 5, 0, Arc::new(String::from("a")));
        let copy = record.clone();
        assert!(Arc::ptr_eq(record.shared_payload(), copy.shared_payload()));
        assert_eq!(copy.cell_key(), key);
        assert_eq!(copy.point(), Point::new(-122.42, 37.77));
    }

    #[test]
    fn test_debug_shows_cell_hash() {
        let key = CellKey::from_geohash("9q8").unwrap();
        let record = PointRecord::new(key, 1.0, 2.0, 3, 4, Arc::new(7u8));
        let text = format!("{:?}", record);
        assert!(text.contains("\"9q8\""));
        assert!(text.contains("payload: 7"));
    }
}
