//! WGS84 to UTM forward projection (Snyder 1987, USGS Prof. Paper 1395).

use serde::{Deserialize, Serialize};

const A: f64 = 6_378_137.0;
const F: f64 = 1.0 / 298.257_223_563;
const E2: f64 = 2.0 * F - F * F;
const E_PRIME2: f64 = E2 / (1.0 - E2);
const K0: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// A WGS84 / UTM zone (EPSG 326xx north, 327xx south).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtmZone {
    pub zone: u32,
    pub north: bool,
}

impl UtmZone {
    /// Parse an EPSG code; `None` for anything that is not a UTM zone.
    pub fn from_epsg(epsg: u32) -> Option<Self> {
        if (32601..=32660).contains(&epsg) {
            Some(Self { zone: epsg - 32600, north: true })
        } else if (32701..=32760).contains(&epsg) {
            Some(Self { zone: epsg - 32700, north: false })
        } else {
            None
        }
    }

    /// Standard zone for a WGS84 coordinate
    pub fn for_point(lon: f64, lat: f64) -> Self {
        let zone = (((lon + 180.0) / 6.0).floor() as i64).clamp(0, 59) as u32 + 1;
        Self { zone, north: lat >= 0.0 }
    }

    pub fn epsg(&self) -> u32 {
        if self.north {
            32600 + self.zone
        } else {
            32700 + self.zone
        }
    }

    fn central_meridian(&self) -> f64 {
        ((self.zone as f64 - 1.0) * 6.0 - 180.0 + 3.0).to_radians()
    }

    /// Project WGS84 `(lon, lat)` degrees to `(easting, northing)` metres.
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        let lat = lat_deg.to_radians();
        let lon = lon_deg.to_radians();

        let sin_lat = lat.sin();
        let cos_lat = lat.cos();
        let tan_lat = lat.tan();

        let n = A / (1.0 - E2 * sin_lat * sin_lat).sqrt();
        let t = tan_lat * tan_lat;
        let c = E_PRIME2 * cos_lat * cos_lat;
        let a = cos_lat * (lon - self.central_meridian());

        let m = meridional_arc(lat);

        let a2 = a * a;
        let a4 = a2 * a2;
        let a6 = a4 * a2;

        // Snyder eq. 8-9
        let easting = K0
            * n
            * (a + (1.0 - t + c) * a2 * a / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * E_PRIME2) * a4 * a / 120.0)
            + FALSE_EASTING;

        // Snyder eq. 8-10
        let northing = K0
            * (m + n
                * tan_lat
                * (a2 / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * E_PRIME2) * a6 / 720.0));

        if self.north {
            (easting, northing)
        } else {
            (easting, northing + FALSE_NORTHING_SOUTH)
        }
    }
}

/// Meridional arc from the equator to `lat` radians (Snyder eq. 3-21).
fn meridional_arc(lat: f64) -> f64 {
    let e4 = E2 * E2;
    let e6 = e4 * E2;

    A * ((1.0 - E2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
        - (3.0 * E2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
        + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
        - (35.0 * e6 / 3072.0) * (6.0 * lat).sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_epsg() {
        assert_eq!(UtmZone::from_epsg(32645), Some(UtmZone { zone: 45, north: true }));
        assert_eq!(UtmZone::from_epsg(32760), Some(UtmZone { zone: 60, north: false }));
        assert_eq!(UtmZone::from_epsg(32600), None);
        assert_eq!(UtmZone::from_epsg(32661), None);
        assert_eq!(UtmZone::from_epsg(4326), None);
    }

    #[test]
    fn test_zone_for_point() {
        assert_eq!(UtmZone::for_point(86.9, 28.5).epsg(), 32645);
        assert_eq!(UtmZone::for_point(-70.0, -45.0).epsg(), 32719);
        assert_eq!(UtmZone::for_point(180.0, 10.0).zone, 60);
    }

    #[test]
    fn test_equator_central_meridian() {
        let zone = UtmZone { zone: 30, north: true };
        let (e, n) = zone.forward(-3.0, 0.0);
        assert_relative_eq!(e, 500_000.0, epsilon = 0.01);
        assert_relative_eq!(n, 0.0, epsilon = 0.01);
    }

    // pyproj: Transformer.from_crs(4326, 32630, always_xy=True).transform(-3.7037, 40.4168)
    #[test]
    fn test_reference_point() {
        let zone = UtmZone { zone: 30, north: true };
        let (e, n) = zone.forward(-3.7037, 40.4168);
        assert_relative_eq!(e, 440_298.94, epsilon = 1.0);
        assert_relative_eq!(n, 4_474_257.31, epsilon = 1.0);
    }

    #[test]
    fn test_symmetric_about_central_meridian() {
        let zone = UtmZone::for_point(86.9, 28.5);
        let (west, n_west) = zone.forward(86.5, 28.5);
        let (east, n_east) = zone.forward(87.5, 28.5);
        assert_relative_eq!(west + east, 2.0 * FALSE_EASTING, epsilon = 1e-6);
        assert_relative_eq!(n_west, n_east, epsilon = 1e-6);
    }
}
