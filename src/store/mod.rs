//! Spatio-temporal store.
//!
//! A [`Store`] keeps every point in a primary [`CellIndex`] once per geohash
//! precision level, and additionally in a per-identifier secondary index when
//! the point is tagged with an identifier. Queries visit only the cells the
//! coverage strategy returns, then filter on exact coordinates.

use crate::bbox::BoundingBox;
use crate::builder::StoreBuilder;
use crate::cell::{CellKey, encode_full_precision, prefix_keys};
use crate::config::Config;
use crate::coverage::Coverage;
use crate::error::Result;
use crate::index::CellIndex;
use crate::types::{PointRecord, StoreStats};
use dashmap::DashMap;
use geo::Point;
use std::hash::Hash;
use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

mod query;

pub use query::Find;

/// Concurrent in-memory spatio-temporal index.
///
/// `T` is the payload, `I` the entity identifier used for scoped queries.
/// All methods take `&self`; share the store between threads with `Arc`.
///
/// Each `add` writes `geohash_precision` records into the primary index
/// (and as many into the identifier's index), one per prefix of the point's
/// geohash. That write amplification is what lets a query of any size touch
/// only the handful of cells covering it.
///
/// Nothing is ever evicted; the store grows until it is dropped.
pub struct Store<T, I = String> {
    primary: Arc<CellIndex<T>>,
    by_id: DashMap<I, Arc<CellIndex<T>>>,
    coverage: Box<dyn Coverage>,
    config: Config,
    next_seq: AtomicU64,
    completed: AtomicU64,
}

impl<T, I> Store<T, I>
where
    T: Send + Sync + 'static,
    I: Eq + Hash + Clone,
{
    /// Create a store with default configuration.
    pub fn new() -> Self {
        Self::from_parts(
            Config::default(),
            Box::new(crate::coverage::GeohashCoverage::default()),
        )
    }

    /// Create a store with custom configuration.
    pub fn with_config(config: Config) -> Result<Self> {
        StoreBuilder::new().config(config).build()
    }

    pub fn builder() -> StoreBuilder {
        StoreBuilder::new()
    }

    pub(crate) fn from_parts(config: Config, coverage: Box<dyn Coverage>) -> Self {
        Self {
            primary: Arc::new(CellIndex::new()),
            by_id: DashMap::new(),
            coverage,
            config,
            next_seq: AtomicU64::new(0),
            completed: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Insert a point observed at `time`.
    ///
    /// Coordinates are not range-checked here; the geohash encoder rejects
    /// values outside `[-90, 90] x [-180, 180]` and nothing is written in that
    /// case. With an `id`, the point is also filed in that identifier's index,
    /// which is created on first use.
    pub fn add(&self, lat: f64, lon: f64, time: i64, payload: T, id: Option<I>) -> Result<()> {
        let hash = encode_full_precision(lat, lon, self.config.geohash_precision)?;
        let keys = prefix_keys(&hash)?;
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let payload = Arc::new(payload);

        deposit(&self.primary, &keys, lat, lon, time, seq, &payload);

        if let Some(id) = id {
            let secondary = self.secondary_or_create(id);
            deposit(&secondary, &keys, lat, lon, time, seq, &payload);
        }

        self.completed.fetch_add(1, Ordering::Release);
        Ok(())
    }

    /// Insert a `geo::Point` (x = lon, y = lat).
    pub fn add_point(&self, point: &Point, time: i64, payload: T, id: Option<I>) -> Result<()> {
        self.add(point.y(), point.x(), time, payload, id)
    }

    /// All points inside `bounds` (edges included) with `time.start <= t < time.end`.
    ///
    /// The coverage is computed up front; cells are read lazily as the
    /// iterator advances. Call again to restart.
    ///
    /// ```
    /// use geomem::{BoundingBox, Store};
    ///
    /// let store: Store<&str> = Store::new();
    /// store.add(37.7749, -122.4194, 100, "sf", None)?;
    ///
    /// let bay_area = BoundingBox::new(38.0, -123.0, 37.0, -122.0);
    /// let hits: Vec<_> = store.find(&bay_area, 100..101)?.collect();
    /// assert_eq!(hits.len(), 1);
    /// assert_eq!(*hits[0].payload(), "sf");
    /// assert_eq!(store.find(&bay_area, 100..100)?.count(), 0);
    /// # Ok::<(), geomem::GeomemError>(())
    /// ```
    pub fn find(&self, bounds: &BoundingBox, time: Range<i64>) -> Result<Find<T>> {
        self.find_in(Arc::clone(&self.primary), bounds, time)
    }

    /// Like [`find`](Self::find), restricted to points added under `id`.
    /// Yields nothing for an identifier that was never used.
    pub fn find_by_id(&self, id: &I, bounds: &BoundingBox, time: Range<i64>) -> Result<Find<T>> {
        match self.secondary(id) {
            Some(index) => self.find_in(index, bounds, time),
            None => Ok(Find::empty(*bounds, time)),
        }
    }

    fn find_in(
        &self,
        index: Arc<CellIndex<T>>,
        bounds: &BoundingBox,
        time: Range<i64>,
    ) -> Result<Find<T>> {
        let cover = self
            .coverage
            .cover(bounds, self.config.geohash_precision)?;
        let cells = cover
            .hashes()
            .iter()
            .map(|hash| CellKey::from_geohash(hash))
            .collect::<Result<Vec<_>>>()?;

        Ok(Find::new(
            index,
            cells,
            *bounds,
            time,
            self.config.dedupe_results,
        ))
    }

    fn secondary(&self, id: &I) -> Option<Arc<CellIndex<T>>> {
        self.by_id.get(id).map(|index| Arc::clone(index.value()))
    }

    fn secondary_or_create(&self, id: I) -> Arc<CellIndex<T>> {
        if let Some(index) = self.by_id.get(&id) {
            return Arc::clone(index.value());
        }

        Arc::clone(
            self.by_id
                .entry(id)
                .or_insert_with(|| {
                    log::trace!("Creating secondary index");
                    Arc::new(CellIndex::new())
                })
                .value(),
        )
    }

    pub fn contains_identifier(&self, id: &I) -> bool {
        self.by_id.contains_key(id)
    }

    /// Identifiers that have a secondary index, in no particular order.
    pub fn identifiers(&self) -> Vec<I> {
        self.by_id.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            primary_cells: self.primary.len(),
            primary_records: self.primary.record_count(),
            identifiers: self.by_id.len(),
            geohash_precision: self.config.geohash_precision,
            points_added: self.completed.load(Ordering::Acquire),
        }
    }
}

impl<T, I> Default for Store<T, I>
where
    T: Send + Sync + 'static,
    I: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// File one point under every prefix cell of its geohash.
fn deposit<T: Send + Sync + 'static>(
    index: &CellIndex<T>,
    keys: &[CellKey],
    lat: f64,
    lon: f64,
    time: i64,
    seq: u64,
    payload: &Arc<T>,
) {
    for &key in keys {
        let record = PointRecord::new(key, lat, lon, time, seq, Arc::clone(payload));
        index.insert(key, time, record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bay_area() -> BoundingBox {
        BoundingBox::new(38.0, -123.0, 37.0, -122.0)
    }

    #[test]
    fn test_add_writes_every_precision_level() -> Result<()> {
        let store: Store<&str> = Store::new();
        store.add(37.7749, -122.4194, 10, "sf", None)?;

        let stats = store.stats();
        assert_eq!(stats.primary_cells, 12);
        assert_eq!(stats.primary_records, 12);
        assert_eq!(stats.points_added, 1);

        for prefix in ["9", "9q", "9q8", "9q8y", "9q8yy"] {
            let key = CellKey::from_geohash(prefix)?;
            let records: Vec<_> = store.primary.range_query(key, 10, 11).collect();
            assert_eq!(records.len(), 1, "missing from {prefix}");
            assert_eq!(records[0].cell_key(), key);
        }
        Ok(())
    }

    #[test]
    fn test_records_share_payload_and_seq() -> Result<()> {
        let store: Store<String> = Store::new();
        store.add(37.7749, -122.4194, 10, "sf".to_string(), Some("a".to_string()))?;

        let coarse = store
            .primary
            .range_query(CellKey::from_geohash("9")?, 0, 100)
            .next()
            .unwrap();
        let fine = store
            .secondary(&"a".to_string())
            .unwrap()
            .range_query(CellKey::from_geohash("9q8yy")?, 0, 100)
            .next()
            .unwrap();
        assert!(Arc::ptr_eq(coarse.shared_payload(), fine.shared_payload()));
        assert_eq!(coarse.seq(), fine.seq());
        assert_ne!(coarse.cell_key(), fine.cell_key());
        Ok(())
    }

    #[test]
    fn test_custom_precision() -> Result<()> {
        let store: Store<u8> = Store::with_config(Config::default().with_geohash_precision(5))?;
        store.add(37.7749, -122.4194, 0, 1, None)?;
        assert_eq!(store.stats().primary_records, 5);
        assert_eq!(store.find(&bay_area(), 0..1)?.count(), 1);
        Ok(())
    }

    #[test]
    fn test_invalid_coordinates_write_nothing() {
        let store: Store<u8> = Store::new();
        assert!(store.add(91.0, 0.0, 0, 1, Some("a".to_string())).is_err());
        let stats = store.stats();
        assert_eq!(stats.primary_records, 0);
        assert_eq!(stats.identifiers, 0);
        assert_eq!(stats.points_added, 0);
    }

    #[test]
    fn test_secondary_index_created_once() -> Result<()> {
        let store: Store<u8, u32> = Store::new();
        store.add(37.7749, -122.4194, 0, 1, Some(7))?;
        let first = store.secondary(&7).unwrap();
        store.add(37.7750, -122.4195, 1, 2, Some(7))?;
        let second = store.secondary(&7).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.identifiers(), vec![7]);
        assert!(store.contains_identifier(&7));
        assert!(!store.contains_identifier(&8));
        Ok(())
    }

    #[test]
    fn test_find_is_restartable() -> Result<()> {
        let store: Store<u8> = Store::new();
        store.add(37.5, -122.5, 3, 1, None)?;
        store.add(37.6, -122.6, 4, 2, None)?;

        assert_eq!(store.find(&bay_area(), 0..10)?.count(), 2);
        assert_eq!(store.find(&bay_area(), 0..10)?.count(), 2);
        Ok(())
    }

    #[test]
    fn test_points_added_ignores_in_flight_adds() -> Result<()> {
        let store: Store<u8> = Store::new();
        store.add(37.5, -122.5, 0, 1, None)?;

        // A sequence number handed out to an add that has not deposited yet.
        store.next_seq.fetch_add(1, Ordering::Relaxed);
        assert_eq!(store.stats().points_added, 1);

        store.add(37.6, -122.6, 1, 2, None)?;
        assert_eq!(store.stats().points_added, 2);
        Ok(())
    }

    #[test]
    fn test_find_opens_cells_lazily() -> Result<()> {
        let store: Store<u8> = Store::new();
        store.add(37.5, -122.5, 3, 1, None)?;

        let cells = store.coverage.cover(&bay_area(), 12)?.len();
        let mut found = store.find(&bay_area(), 0..10)?;
        assert!(cells > 0);
        assert_eq!(found.remaining_cells(), cells);

        assert!(found.next().is_some());
        assert!(found.remaining_cells() < cells);
        assert!(found.next().is_none());
        assert_eq!(found.remaining_cells(), 0);

        let unknown = store.find_by_id(&"nobody".to_string(), &bay_area(), 0..10)?;
        assert_eq!(unknown.remaining_cells(), 0);
        Ok(())
    }
}
