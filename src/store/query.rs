//! Lazy bounding-box query results.

use crate::bbox::BoundingBox;
use crate::cell::CellKey;
use crate::index::{CellIndex, CellRange};
use crate::types::PointRecord;
use rustc_hash::FxHashSet;
use std::ops::Range;
use std::sync::Arc;

/// Iterator returned by [`Store::find`](crate::Store::find) and
/// [`Store::find_by_id`](crate::Store::find_by_id).
///
/// Cells are opened one at a time as iteration reaches them. Records come out
/// in time order within a cell; across cells there is no particular order.
/// Every record has passed the exact bounding-box test.
pub struct Find<T> {
    index: Option<Arc<CellIndex<T>>>,
    cells: std::vec::IntoIter<CellKey>,
    bounds: BoundingBox,
    time: Range<i64>,
    current: CellRange<T>,
    seen: Option<FxHashSet<u64>>,
}

impl<T: Send + Sync + 'static> Find<T> {
    pub(crate) fn new(
        index: Arc<CellIndex<T>>,
        cells: Vec<CellKey>,
        bounds: BoundingBox,
        time: Range<i64>,
        dedupe: bool,
    ) -> Self {
        Self {
            index: Some(index),
            cells: cells.into_iter(),
            bounds,
            time,
            current: CellRange::empty(),
            seen: dedupe.then(FxHashSet::default),
        }
    }

    pub(crate) fn empty(bounds: BoundingBox, time: Range<i64>) -> Self {
        Self {
            index: None,
            cells: Vec::new().into_iter(),
            bounds,
            time,
            current: CellRange::empty(),
            seen: None,
        }
    }

    /// Cells not yet opened.
    pub fn remaining_cells(&self) -> usize {
        self.cells.len()
    }
}

impl<T: Send + Sync + 'static> Iterator for Find<T> {
    type Item = PointRecord<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.current.next() {
                if !self.bounds.contains(record.lat(), record.lon()) {
                    continue;
                }
                if let Some(seen) = self.seen.as_mut()
                    && !seen.insert(record.seq())
                {
                    continue;
                }
                return Some(record);
            }

            let index = self.index.as_ref()?;
            let cell = self.cells.next()?;
            self.current = index.range_query(cell, self.time.start, self.time.end);
        }
    }
}
