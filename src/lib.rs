//! Concurrent in-memory spatio-temporal index over multi-resolution geohash cells.
//!
//! Every point is stored once per geohash precision level, so a bounding-box
//! query of any size visits only the few cells covering it and then keeps the
//! points whose exact coordinates and timestamp match. Points may be tagged
//! with an identifier to query one entity's history on its own.
//!
//! ```rust
//! use geomem::{BoundingBox, Store};
//!
//! let store: Store<&str> = Store::new();
//! store.add(37.7749, -122.4194, 1_000, "ping", Some("truck-7".to_string()))?;
//! store.add(37.8044, -122.2712, 1_005, "ping", Some("truck-9".to_string()))?;
//!
//! let bay_area = BoundingBox::new(38.0, -123.0, 37.0, -122.0);
//! assert_eq!(store.find(&bay_area, 1_000..2_000)?.count(), 2);
//!
//! let truck_7 = store.find_by_id(&"truck-7".to_string(), &bay_area, 1_000..2_000)?;
//! assert_eq!(truck_7.count(), 1);
//! # Ok::<(), geomem::GeomemError>(())
//! ```
//!
//! ## Consistency
//! Writers never block readers. A query sees every `add` that returned before
//! it started; concurrent inserts may or may not appear, and one `add` may
//! become visible at some precision levels before others.

pub mod bbox;
pub mod builder;
pub mod cell;
pub mod config;
pub mod coverage;
pub mod error;
pub mod index;
pub mod store;
pub mod types;

pub use bbox::BoundingBox;
pub use builder::StoreBuilder;
pub use cell::CellKey;
pub use config::Config;
pub use coverage::{Coverage, CoverageSet, GeohashCoverage};
pub use error::{GeomemError, Result};
pub use index::{CellIndex, CellRange, CellSeries};
pub use store::{Find, Store};
pub use types::{PointRecord, StoreStats};

pub use geo::{Point, Rect};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{BoundingBox, Config, GeomemError, Result, Store, StoreBuilder};

    pub use crate::{Coverage, CoverageSet, GeohashCoverage};

    pub use crate::PointRecord;

    pub use geo::Point;
}
