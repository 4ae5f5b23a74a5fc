use geo::Rect;
use serde::{Deserialize, Serialize};

/// Query rectangle given by its top-left and bottom-right corners.
///
/// Latitude decreases downward (`bottom_right_lat <= top_left_lat`) and
/// longitude increases rightward (`top_left_lon <= bottom_right_lon`). A box
/// that violates this, including one crossing the antimeridian, contains
/// nothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub top_left_lat: f64,
    pub top_left_lon: f64,
    pub bottom_right_lat: f64,
    pub bottom_right_lon: f64,
}

impl BoundingBox {
    /// # Examples
    ///
    /// ```
    /// use geomem::BoundingBox;
    ///
    /// let bay_area = BoundingBox::new(38.0, -123.0, 37.0, -122.0);
    /// assert!(bay_area.contains(37.7749, -122.4194));
    /// assert!(bay_area.contains(37.0, -123.0));
    /// assert!(!bay_area.contains(36.99, -122.5));
    /// ```
    pub fn new(
        top_left_lat: f64,
        top_left_lon: f64,
        bottom_right_lat: f64,
        bottom_right_lon: f64,
    ) -> Self {
        Self {
            top_left_lat,
            top_left_lon,
            bottom_right_lat,
            bottom_right_lon,
        }
    }

    /// Box spanned by a geohash cell's bounds.
    pub fn from_rect(rect: Rect) -> Self {
        Self::new(rect.max().y, rect.min().x, rect.min().y, rect.max().x)
    }

    /// Inclusive on every edge.
    #[inline]
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.bottom_right_lat
            && lat <= self.top_left_lat
            && lon >= self.top_left_lon
            && lon <= self.bottom_right_lon
    }

    pub fn is_inverted(&self) -> bool {
        self.bottom_right_lat > self.top_left_lat || self.top_left_lon > self.bottom_right_lon
    }

    /// Area in square degrees, zero for an inverted box.
    pub fn area(&self) -> f64 {
        if self.is_inverted() {
            return 0.0;
        }
        let rect = self.to_rect();
        rect.width() * rect.height()
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(
            geo::coord! { x: self.top_left_lon, y: self.bottom_right_lat },
            geo::coord! { x: self.bottom_right_lon, y: self.top_left_lat },
        )
    }
}
