use geo::MapCoords;
use geo_types::{Coord, Polygon};

/// Equirectangular tangent plane centred on a point.
///
/// Maps WGS84 degrees to metres east/north of the origin using the
/// ellipsoidal lengths of one degree at the origin latitude. Accurate to well
/// under a percent within the few tens of kilometres glofscan measures over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalProjection {
    origin: Coord<f64>,
    m_per_deg_lon: f64,
    m_per_deg_lat: f64,
}

impl LocalProjection {
    pub fn new(lon: f64, lat: f64) -> Self {
        let phi = lat.to_radians();
        let m_per_deg_lat = 111_132.954 - 559.822 * (2.0 * phi).cos() + 1.175 * (4.0 * phi).cos();
        let m_per_deg_lon =
            111_412.84 * phi.cos() - 93.5 * (3.0 * phi).cos() + 0.118 * (5.0 * phi).cos();
        Self {
            origin: Coord { x: lon, y: lat },
            m_per_deg_lon,
            m_per_deg_lat,
        }
    }

    pub fn origin(&self) -> Coord<f64> {
        self.origin
    }

    /// Metres per degree as `(longitude, latitude)`
    pub fn meters_per_degree(&self) -> (f64, f64) {
        (self.m_per_deg_lon, self.m_per_deg_lat)
    }

    pub fn project(&self, c: Coord<f64>) -> Coord<f64> {
        Coord {
            x: (c.x - self.origin.x) * self.m_per_deg_lon,
            y: (c.y - self.origin.y) * self.m_per_deg_lat,
        }
    }

    pub fn unproject(&self, c: Coord<f64>) -> Coord<f64> {
        Coord {
            x: self.origin.x + c.x / self.m_per_deg_lon,
            y: self.origin.y + c.y / self.m_per_deg_lat,
        }
    }

    pub fn project_polygon(&self, polygon: &Polygon<f64>) -> Polygon<f64> {
        polygon.map_coords(|c| self.project(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_degree_lengths() {
        let equator = LocalProjection::new(0.0, 0.0);
        let (lon, lat) = equator.meters_per_degree();
        assert_relative_eq!(lon, 111_319.5, epsilon = 1.0);
        assert_relative_eq!(lat, 110_574.3, epsilon = 1.0);

        let himalaya = LocalProjection::new(86.9, 28.5);
        let (lon, lat) = himalaya.meters_per_degree();
        assert!(lon < 100_000.0 && lon > 95_000.0);
        assert!(lat > 110_700.0 && lat < 110_900.0);
    }

    #[test]
    fn test_roundtrip() {
        let proj = LocalProjection::new(86.9, 28.5);
        let c = Coord { x: 86.93, y: 28.48 };
        let back = proj.unproject(proj.project(c));
        assert_relative_eq!(back.x, c.x, epsilon = 1e-12);
        assert_relative_eq!(back.y, c.y, epsilon = 1e-12);
        assert_eq!(proj.project(proj.origin()), Coord { x: 0.0, y: 0.0 });
    }
}
