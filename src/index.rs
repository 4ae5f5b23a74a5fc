//! Cell index: geohash cell key to time-ordered records.
//!
//! This is the building block of the store. Cells are created lazily on first
//! insert and never removed. Each cell is a lock-free skip list ordered by
//! `(time, seq)`, so writers and readers of one cell never block each other,
//! and records sharing a timestamp are all kept.

use crate::cell::CellKey;
use crate::types::PointRecord;
use crossbeam_skiplist::SkipMap;
use dashmap::DashMap;
use rustc_hash::FxHasher;
use std::hash::BuildHasherDefault;
use std::ops::Bound;
use std::sync::Arc;

type SeriesKey = (i64, u64);

/// Time-ordered records of a single cell.
pub struct CellSeries<T> {
    entries: SkipMap<SeriesKey, PointRecord<T>>,
}

impl<T: Send + Sync + 'static> CellSeries<T> {
    pub fn new() -> Self {
        Self {
            entries: SkipMap::new(),
        }
    }

    pub fn insert(&self, time: i64, record: PointRecord<T>) {
        self.entries.insert((time, record.seq()), record);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Earliest and latest timestamps in the cell.
    pub fn time_span(&self) -> Option<(i64, i64)> {
        let first = self.entries.front()?.key().0;
        let last = self.entries.back()?.key().0;
        Some((first, last))
    }

    /// Records with `start <= time < finish`, ascending.
    pub fn range(self: &Arc<Self>, start: i64, finish: i64) -> CellRange<T> {
        CellRange {
            series: Some(Arc::clone(self)),
            cursor: Bound::Included((start, 0)),
            finish,
        }
    }
}

impl<T: Send + Sync + 'static> Default for CellSeries<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Lazy ascending walk over one cell's time range.
///
/// The iterator holds the cell alive and re-seeks past the last key it
/// yielded, so inserts racing with the walk may or may not show up, but the
/// walk never blocks them and never yields a record twice.
pub struct CellRange<T> {
    series: Option<Arc<CellSeries<T>>>,
    cursor: Bound<SeriesKey>,
    finish: i64,
}

impl<T> CellRange<T> {
    pub fn empty() -> Self {
        Self {
            series: None,
            cursor: Bound::Unbounded,
            finish: i64::MIN,
        }
    }
}

impl<T: Send + Sync + 'static> Iterator for CellRange<T> {
    type Item = PointRecord<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = {
            let series = self.series.as_ref()?;
            series
                .entries
                .lower_bound(self.cursor.as_ref())
                .filter(|entry| entry.key().0 < self.finish)
                .map(|entry| (*entry.key(), entry.value().clone()))
        };

        match next {
            Some((key, record)) => {
                self.cursor = Bound::Excluded(key);
                Some(record)
            }
            None => {
                self.series = None;
                None
            }
        }
    }
}

type CellMap<T> = DashMap<CellKey, Arc<CellSeries<T>>, BuildHasherDefault<FxHasher>>;

/// Concurrent map from cell key to that cell's records.
///
/// Lazy cell creation goes through the map's entry API, which locks only the
/// shard owning the key, so racing inserts on a new key agree on one series
/// and inserts on other keys proceed.
pub struct CellIndex<T> {
    cells: CellMap<T>,
}

impl<T: Send + Sync + 'static> CellIndex<T> {
    pub fn new() -> Self {
        Self {
            cells: DashMap::with_hasher(BuildHasherDefault::default()),
        }
    }

    /// Series for `key`, created empty if absent.
    pub fn get_or_create(&self, key: CellKey) -> Arc<CellSeries<T>> {
        if let Some(series) = self.cells.get(&key) {
            return Arc::clone(series.value());
        }

        Arc::clone(
            self.cells
                .entry(key)
                .or_insert_with(|| {
                    log::trace!("Creating cell {}", key);
                    Arc::new(CellSeries::new())
                })
                .value(),
        )
    }

    pub fn get(&self, key: CellKey) -> Option<Arc<CellSeries<T>>> {
        self.cells.get(&key).map(|series| Arc::clone(series.value()))
    }

    pub fn insert(&self, key: CellKey, time: i64, record: PointRecord<T>) {
        // The shard guard is gone once get_or_create returns.
        self.get_or_create(key).insert(time, record);
    }

    /// Records of `key` with `start <= time < finish`, ascending; empty if the
    /// cell was never written.
    pub fn range_query(&self, key: CellKey, start: i64, finish: i64) -> CellRange<T> {
        match self.get(key) {
            Some(series) => series.range(start, finish),
            None => CellRange::empty(),
        }
    }

    pub fn contains_cell(&self, key: CellKey) -> bool {
        self.cells.contains_key(&key)
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Records across all cells.
    pub fn record_count(&self) -> usize {
        self.cells.iter().map(|cell| cell.value().len()).sum()
    }
}

impl<T: Send + Sync + 'static> Default for CellIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn key(hash: &str) -> CellKey {
        CellKey::from_geohash(hash).unwrap()
    }

    fn record(cell: CellKey, time: i64, seq: u64, payload: &str) -> PointRecord<String> {
        PointRecord::new(cell, 37.77, -122.42, time, seq, Arc::new(payload.to_string()))
    }

    fn payloads(range: CellRange<String>) -> Vec<String> {
        range.map(|r| r.payload().clone()).collect()
    }

    #[test]
    fn test_get_or_create_returns_same_series() {
        let index: CellIndex<String> = CellIndex::new();
        let a = index.get_or_create(key("9q8"));
        let b = index.get_or_create(key("9q8"));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_concurrent_creation_is_exactly_once() {
        let index: Arc<CellIndex<String>> = Arc::new(CellIndex::new());
        let cell = key("9q8yy");

        let series: Vec<_> = thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| index.get_or_create(cell)))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(series.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_range_is_half_open_and_ordered() {
        let index = CellIndex::new();
        let cell = key("9q8");
        index.insert(cell, 30, record(cell, 30, 0, "c"));
        index.insert(cell, 10, record(cell, 10, 1, "a"));
        index.insert(cell, 20, record(cell, 20, 2, "b"));

        assert_eq!(payloads(index.range_query(cell, 10, 30)), vec!["a", "b"]);
        assert_eq!(payloads(index.range_query(cell, 0, 100)), vec!["a", "b", "c"]);
        assert!(payloads(index.range_query(cell, 20, 20)).is_empty());
        assert!(payloads(index.range_query(cell, 30, 10)).is_empty());
    }

    #[test]
    fn test_equal_timestamps_are_kept() {
        let index = CellIndex::new();
        let cell = key("9q8");
        index.insert(cell, 5, record(cell, 5, 7, "first"));
        index.insert(cell, 5, record(cell, 5, 3, "second"));

        let found = payloads(index.range_query(cell, 5, 6));
        assert_eq!(found, vec!["second", "first"]);
        assert_eq!(index.record_count(), 2);
    }

    #[test]
    fn test_missing_cell_is_empty() {
        let index: CellIndex<String> = CellIndex::new();
        assert_eq!(index.range_query(key("9q8"), i64::MIN, i64::MAX).count(), 0);
        assert!(!index.contains_cell(key("9q8")));
        assert!(index.is_empty());
    }

    #[test]
    fn test_range_sees_inserts_past_cursor() {
        let index = CellIndex::new();
        let cell = key("dr5");
        index.insert(cell, 1, record(cell, 1, 0, "a"));

        let mut range = index.range_query(cell, 0, 10);
        assert_eq!(range.next().unwrap().payload(), "a");
        index.insert(cell, 2, record(cell, 2, 1, "b"));
        assert_eq!(range.next().unwrap().payload(), "b");
        assert!(range.next().is_none());
    }

    #[test]
    fn test_time_span() {
        let index = CellIndex::new();
        let cell = key("u4p");
        assert!(index.get_or_create(cell).time_span().is_none());
        index.insert(cell, -4, record(cell, -4, 0, "a"));
        index.insert(cell, 9, record(cell, 9, 1, "b"));
        assert_eq!(index.get(cell).unwrap().time_span(), Some((-4, 9)));
    }

    #[test]
    fn test_concurrent_inserts_same_cell() {
        let index: Arc<CellIndex<String>> = Arc::new(CellIndex::new());
        let cell = key("9q8");

        thread::scope(|s| {
            for t in 0..4u64 {
                let index = &index;
                s.spawn(move || {
                    for i in 0..250u64 {
                        let seq = t * 1000 + i;
                        index.insert(cell, i as i64, record(cell, i as i64, seq, "x"));
                    }
                });
            }
        });

        let times: Vec<i64> = index.range_query(cell, 0, 250).map(|r| r.time()).collect();
        assert_eq!(times.len(), 1000);
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
    }
}
