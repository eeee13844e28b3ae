//! Vector helpers: bounding boxes and the glacier R-tree

mod index;

pub use index::GlacierIndex;

use geo::BoundingRect;
use geo_types::Polygon;
use serde::{Deserialize, Serialize};

use crate::crs::LocalProjection;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Envelope of a polygon, `None` when it has no coordinates
    pub fn of_polygon(polygon: &Polygon<f64>) -> Option<Self> {
        polygon
            .bounding_rect()
            .map(|rect| Self::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Grow a WGS84 box by at least `meters` on every side.
    ///
    /// The longitude offset uses the metre length of a degree at the grown
    /// box's poleward edge, where a degree of longitude is shortest.
    pub fn expand_meters(&self, meters: f64) -> Self {
        let (cx, cy) = self.center();
        let (_, m_lat) = LocalProjection::new(cx, cy).meters_per_degree();
        let dy = meters / m_lat;
        let (min_y, max_y) = (self.min_y - dy, self.max_y + dy);

        let poleward = if min_y.abs() > max_y.abs() { min_y } else { max_y };
        let (m_lon, _) = LocalProjection::new(cx, poleward.clamp(-89.9, 89.9)).meters_per_degree();
        let dx = meters / m_lon;
        Self::new(self.min_x - dx, min_y, self.max_x + dx, max_y)
    }

    /// Corner coordinates (lower-left, lower-right, upper-right, upper-left)
    pub fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.min_x, self.min_y),
            (self.max_x, self.min_y),
            (self.max_x, self.max_y),
            (self.min_x, self.max_y),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo_types::polygon;

    #[test]
    fn test_intersects() {
        let a = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        assert!(a.intersects(&BoundingBox::new(1.0, 0.5, 2.0, 2.0)));
        assert!(!a.intersects(&BoundingBox::new(1.1, 0.5, 2.0, 2.0)));
    }

    #[test]
    fn test_expand_meters() {
        let bbox = BoundingBox::new(86.89, 28.49, 86.91, 28.51);
        let grown = bbox.expand_meters(50_000.0);
        let (_, m_lat) = LocalProjection::new(86.9, 28.5).meters_per_degree();
        assert_relative_eq!((grown.max_y - bbox.max_y) * m_lat, 50_000.0, epsilon = 1e-6);

        // 50 km east along the poleward edge stays inside the box
        let (m_lon_edge, _) = LocalProjection::new(86.9, grown.max_y).meters_per_degree();
        assert!((grown.max_x - bbox.max_x) * m_lon_edge >= 50_000.0 - 1e-6);
        let (m_lon_center, _) = LocalProjection::new(86.9, 28.5).meters_per_degree();
        assert!((grown.max_x - bbox.max_x) * m_lon_center > 50_000.0);
    }

    #[test]
    fn test_expand_meters_southern_hemisphere() {
        let bbox = BoundingBox::new(-70.01, -45.01, -69.99, -44.99);
        let grown = bbox.expand_meters(50_000.0);
        let (m_lon_edge, _) = LocalProjection::new(-70.0, grown.min_y).meters_per_degree();
        assert_relative_eq!((bbox.min_x - grown.min_x) * m_lon_edge, 50_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_of_polygon() {
        let p = polygon![(x: 1.0, y: 2.0), (x: 3.0, y: 2.0), (x: 2.0, y: 5.0)];
        let bbox = BoundingBox::of_polygon(&p).unwrap();
        assert_eq!(bbox, BoundingBox::new(1.0, 2.0, 3.0, 5.0));
    }
}
