//! Coordinate reference systems used by glofscan.
//!
//! Geometries and target grids live in WGS84 longitude/latitude. Scene rasters
//! arrive in UTM. Areas and distances are measured in a [`LocalProjection`]
//! centred on the lake being analysed.

mod local;
mod utm;

pub use local::LocalProjection;
pub use utm::UtmZone;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// EPSG code of WGS84 geographic coordinates
pub const WGS84_EPSG: u32 = 4326;

/// Coordinate reference system of a raster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Crs {
    /// WGS84 longitude/latitude in degrees
    #[default]
    Wgs84,
    /// WGS84 / UTM in metres
    Utm(UtmZone),
}

impl Crs {
    /// Resolve an EPSG code (4326, 326xx or 327xx).
    pub fn from_epsg(epsg: u32) -> Result<Self> {
        if epsg == WGS84_EPSG {
            return Ok(Crs::Wgs84);
        }
        UtmZone::from_epsg(epsg).map(Crs::Utm).ok_or_else(|| {
            Error::invalid_parameter("epsg", epsg, "only EPSG:4326 and WGS84 / UTM are supported")
        })
    }

    /// EPSG code of this CRS
    pub fn epsg(&self) -> u32 {
        match self {
            Crs::Wgs84 => WGS84_EPSG,
            Crs::Utm(zone) => zone.epsg(),
        }
    }

    /// Project WGS84 `(lon, lat)` into this CRS.
    pub fn from_wgs84(&self, lon: f64, lat: f64) -> (f64, f64) {
        match self {
            Crs::Wgs84 => (lon, lat),
            Crs::Utm(zone) => zone.forward(lon, lat),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_epsg() {
        assert_eq!(Crs::from_epsg(4326).unwrap(), Crs::Wgs84);
        assert_eq!(Crs::from_epsg(32645).unwrap().epsg(), 32645);
        assert_eq!(Crs::from_epsg(32721).unwrap().epsg(), 32721);
        assert!(Crs::from_epsg(3857).is_err());
    }

    #[test]
    fn test_wgs84_identity() {
        assert_eq!(Crs::Wgs84.from_wgs84(86.9, 28.5), (86.9, 28.5));
    }
}
