//! Nearest-neighbour resampling onto a [`GridSpec`]

use crate::crs::Crs;
use crate::raster::{GridSpec, Raster, RasterElement};

/// Resample `src` (in `src_crs`) onto `grid` by nearest neighbour.
///
/// Each target cell takes the source cell containing its centre. Target cells
/// that fall outside the source raster get `fill`.
pub fn resample_to_grid<T: RasterElement>(
    src: &Raster<T>,
    src_crs: Crs,
    grid: &GridSpec,
    fill: T,
) -> Raster<T> {
    let mut out = grid.raster_filled(fill);
    out.set_nodata(src.nodata());

    let (rows, cols) = src.shape();
    for ((row, col), cell) in out.data_mut().indexed_iter_mut() {
        let c = grid.cell_center(row, col);
        let (x, y) = src_crs.from_wgs84(c.x, c.y);
        if let Some((r, k)) = src.transform().geo_to_index(x, y, rows, cols) {
            *cell = src.data()[(r, k)];
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::UtmZone;
    use crate::raster::GeoTransform;

    #[test]
    fn test_identity_on_same_grid() {
        let grid = GridSpec::around(86.9, 28.5, 90.0, 30.0).unwrap();
        let mut src: Raster<u16> = grid.raster_filled(0);
        for ((r, c), v) in src.data_mut().indexed_iter_mut() {
            *v = (r * 10 + c) as u16;
        }

        let out = resample_to_grid(&src, Crs::Wgs84, &grid, 0);
        assert_eq!(out.data(), src.data());
    }

    #[test]
    fn test_from_utm() {
        let grid = GridSpec::around(86.9, 28.5, 300.0, 30.0).unwrap();
        let zone = UtmZone::for_point(86.9, 28.5);
        let (e, n) = zone.forward(86.9, 28.5);

        // 30 m UTM raster covering the grid with margin, constant 7
        let mut src: Raster<u16> = Raster::filled(40, 40, 7);
        src.set_transform(GeoTransform::new(e - 600.0, n + 600.0, 30.0, -30.0));

        let out = resample_to_grid(&src, Crs::Utm(zone), &grid, 0);
        assert_eq!(out.shape(), grid.shape());
        assert_eq!(out.count_where(|v| v == 7), out.len());
    }

    #[test]
    fn test_outside_source_gets_fill() {
        let grid = GridSpec::around(86.9, 28.5, 300.0, 30.0).unwrap();
        let mut src: Raster<f64> = Raster::filled(5, 5, 1.0);
        src.set_transform(GeoTransform::new(10.0, 10.0, 0.001, -0.001));

        let out = resample_to_grid(&src, Crs::Wgs84, &grid, f64::NAN);
        assert_eq!(out.count_where(|v| v.is_nan()), out.len());
    }
}
