//! Metric measurements of WGS84 geometries in a local projection

use geo::{Area, Centroid, Distance, Euclidean, InteriorPoint, Intersects, Point, Polygon};
use glofscan_core::LocalProjection;

/// Planar area in hectares
pub fn area_ha(polygon: &Polygon<f64>, proj: &LocalProjection) -> f64 {
    proj.project_polygon(polygon).unsigned_area() / 10_000.0
}

/// Minimum boundary-to-boundary distance in metres; 0 when the polygons
/// intersect.
pub fn distance_m(a: &Polygon<f64>, b: &Polygon<f64>, proj: &LocalProjection) -> f64 {
    if a.intersects(b) {
        return 0.0;
    }
    Euclidean.distance(&proj.project_polygon(a), &proj.project_polygon(b))
}

/// Distance in metres from a point to a polygon; 0 when the point is inside.
pub fn point_distance_m(point: Point<f64>, polygon: &Polygon<f64>, proj: &LocalProjection) -> f64 {
    if polygon.intersects(&point) {
        return 0.0;
    }
    let p = Point::from(proj.project(point.0));
    Euclidean.distance(&p, &proj.project_polygon(polygon))
}

/// Area-weighted centroid, `None` for a degenerate polygon
pub fn centroid(polygon: &Polygon<f64>) -> Option<Point<f64>> {
    polygon.centroid()
}

/// A point guaranteed to lie inside the polygon
pub fn interior_point(polygon: &Polygon<f64>) -> Option<Point<f64>> {
    polygon.interior_point()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::polygon;

    fn square_m(proj: &LocalProjection, x0: f64, y0: f64, size: f64) -> Polygon<f64> {
        let c = |x: f64, y: f64| proj.unproject(geo::Coord { x, y });
        let (a, b, d, e) = (c(x0, y0), c(x0 + size, y0), c(x0 + size, y0 + size), c(x0, y0 + size));
        polygon![a, b, d, e]
    }

    #[test]
    fn test_area_ha() {
        let proj = LocalProjection::new(86.9, 28.5);
        let sq = square_m(&proj, 0.0, 0.0, 100.0);
        assert_relative_eq!(area_ha(&sq, &proj), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_distance() {
        let proj = LocalProjection::new(86.9, 28.5);
        let a = square_m(&proj, 0.0, 0.0, 100.0);
        let b = square_m(&proj, 400.0, 0.0, 100.0);
        let c = square_m(&proj, 50.0, 50.0, 100.0);

        assert_relative_eq!(distance_m(&a, &b, &proj), 300.0, epsilon = 1e-6);
        assert_eq!(distance_m(&a, &c, &proj), 0.0);
    }

    #[test]
    fn test_point_distance() {
        let proj = LocalProjection::new(86.9, 28.5);
        let sq = square_m(&proj, 0.0, 0.0, 100.0);
        let inside = Point::from(proj.unproject(geo::Coord { x: 50.0, y: 50.0 }));
        let outside = Point::from(proj.unproject(geo::Coord { x: 50.0, y: 250.0 }));

        assert_eq!(point_distance_m(inside, &sq, &proj), 0.0);
        assert_relative_eq!(point_distance_m(outside, &sq, &proj), 150.0, epsilon = 1e-6);
    }

    #[test]
    fn test_degenerate_centroid() {
        let empty: Polygon<f64> = Polygon::new(geo::LineString::new(vec![]), vec![]);
        assert!(centroid(&empty).is_none());
        assert!(interior_point(&empty).is_none());
    }
}
