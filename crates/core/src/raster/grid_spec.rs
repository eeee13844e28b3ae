//! Target grids built around a lake point

use geo_types::Coord;
use serde::{Deserialize, Serialize};

use crate::crs::LocalProjection;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};
use crate::vector::BoundingBox;

/// A north-up WGS84 grid covering a circular buffer around a point.
///
/// Cells are square in the local metric frame of the centre: every cell is
/// `resolution_m` metres on a side, so a cell covers `resolution_m²` square
/// metres. Only cells whose centre lies within `radius_m` of the point belong
/// to the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub transform: GeoTransform,
    pub rows: usize,
    pub cols: usize,
    pub center: (f64, f64),
    pub radius_m: f64,
    pub resolution_m: f64,
}

impl GridSpec {
    /// Build the grid around `(lon, lat)`.
    pub fn around(lon: f64, lat: f64, radius_m: f64, resolution_m: f64) -> Result<Self> {
        if !(radius_m.is_finite() && radius_m > 0.0) {
            return Err(Error::invalid_parameter("radius_m", radius_m, "must be positive"));
        }
        if !(resolution_m.is_finite() && resolution_m > 0.0) {
            return Err(Error::invalid_parameter("resolution_m", resolution_m, "must be positive"));
        }
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(Error::invalid_parameter("point", format!("({lon}, {lat})"), "not a WGS84 coordinate"));
        }

        let n = ((2.0 * radius_m) / resolution_m).ceil().max(1.0) as usize;
        let proj = LocalProjection::new(lon, lat);
        let (m_lon, m_lat) = proj.meters_per_degree();
        let half = n as f64 * resolution_m / 2.0;

        let transform = GeoTransform::new(
            lon - half / m_lon,
            lat + half / m_lat,
            resolution_m / m_lon,
            -resolution_m / m_lat,
        );

        Ok(Self {
            transform,
            rows: n,
            cols: n,
            center: (lon, lat),
            radius_m,
            resolution_m,
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Local metric frame centred on the grid's point
    pub fn projection(&self) -> LocalProjection {
        LocalProjection::new(self.center.0, self.center.1)
    }

    /// Area of one cell in square metres
    pub fn cell_area_m2(&self) -> f64 {
        self.resolution_m * self.resolution_m
    }

    pub fn bbox(&self) -> BoundingBox {
        let (min_x, min_y, max_x, max_y) = self.transform.bounds(self.cols, self.rows);
        BoundingBox::new(min_x, min_y, max_x, max_y)
    }

    /// WGS84 coordinate of a cell centre
    pub fn cell_center(&self, row: usize, col: usize) -> Coord<f64> {
        let (x, y) = self.transform.pixel_to_geo(col, row);
        Coord { x, y }
    }

    /// Whether the cell centre lies inside the circular buffer
    pub fn in_buffer(&self, row: usize, col: usize) -> bool {
        let p = self.projection().project(self.cell_center(row, col));
        p.x.hypot(p.y) <= self.radius_m
    }

    /// Buffer mask: 1 inside the circle, 0 outside
    pub fn buffer_mask(&self) -> Raster<u8> {
        let mut mask = self.raster_filled(0u8);
        for ((row, col), cell) in mask.data_mut().indexed_iter_mut() {
            *cell = u8::from(self.in_buffer(row, col));
        }
        mask
    }

    /// A raster of this grid's shape and transform filled with `value`
    pub fn raster_filled<T: RasterElement>(&self, value: T) -> Raster<T> {
        let mut raster = Raster::filled(self.rows, self.cols, value);
        raster.set_transform(self.transform);
        raster
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_grid_dimensions() {
        let grid = GridSpec::around(86.9, 28.5, 3000.0, 30.0).unwrap();
        assert_eq!(grid.shape(), (200, 200));
        assert_relative_eq!(grid.cell_area_m2(), 900.0);

        let (m_lon, m_lat) = grid.projection().meters_per_degree();
        assert_relative_eq!(grid.transform.pixel_width * m_lon, 30.0, epsilon = 1e-9);
        assert_relative_eq!(-grid.transform.pixel_height * m_lat, 30.0, epsilon = 1e-9);
    }

    #[test]
    fn test_grid_centered() {
        let grid = GridSpec::around(86.9, 28.5, 300.0, 30.0).unwrap();
        let bbox = grid.bbox();
        let (cx, cy) = bbox.center();
        assert_relative_eq!(cx, 86.9, epsilon = 1e-12);
        assert_relative_eq!(cy, 28.5, epsilon = 1e-12);
    }

    #[test]
    fn test_buffer_mask_is_a_disc() {
        let grid = GridSpec::around(86.9, 28.5, 300.0, 30.0).unwrap();
        let mask = grid.buffer_mask();
        assert_eq!(mask.get(0, 0).unwrap(), 0);
        assert_eq!(mask.get(10, 10).unwrap(), 1);
        let inside = mask.count_where(|v| v == 1) as f64;
        let disc = std::f64::consts::PI * 10.0 * 10.0;
        assert!((inside - disc).abs() / disc < 0.05);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(GridSpec::around(86.9, 28.5, 0.0, 30.0).is_err());
        assert!(GridSpec::around(86.9, 28.5, 3000.0, -1.0).is_err());
        assert!(GridSpec::around(200.0, 28.5, 3000.0, 30.0).is_err());
    }
}
