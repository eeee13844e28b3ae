//! Water classification by thresholding a water index

use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use glofscan_core::raster::Raster;
use glofscan_core::source::Band;
use glofscan_core::{Error, Result};

use super::composite::Composite;
use super::indices::{mndwi, ndwi, WaterIndex};

/// Binary water raster aligned to a composite: 1 = water, 0 = not water
pub type WaterMask = Raster<u8>;

/// Parameters for water classification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterParams {
    /// Pixels with an index at or above this value are water
    pub threshold: f64,
    pub index: WaterIndex,
}

impl Default for WaterParams {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            index: WaterIndex::Ndwi,
        }
    }
}

/// Compute the configured water index from a composite.
pub fn water_index(composite: &Composite, index: WaterIndex) -> Result<Raster<f64>> {
    let (pos, neg) = index.bands();
    let band = |b: Band| {
        composite
            .band(b)
            .ok_or_else(|| Error::Other(format!("composite has no {b} band")))
    };
    match index {
        WaterIndex::Ndwi => ndwi(band(pos)?, band(neg)?),
        WaterIndex::Mndwi => mndwi(band(pos)?, band(neg)?),
    }
}

/// Binarize an index raster: `index >= threshold` is water, NaN is not.
pub fn threshold_index(index: &Raster<f64>, threshold: f64) -> Result<WaterMask> {
    if !threshold.is_finite() {
        return Err(Error::invalid_parameter("threshold", threshold, "must be finite"));
    }

    let (rows, cols) = index.shape();
    let values = index.data();

    let data: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            (0..cols)
                .map(|col| u8::from(values[(row, col)] >= threshold))
                .collect::<Vec<u8>>()
        })
        .collect();

    let mut mask = index.with_same_meta::<u8>();
    *mask.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(mask)
}

/// Classify a composite into a water mask.
pub fn classify_water(composite: &Composite, params: &WaterParams) -> Result<WaterMask> {
    let index = water_index(composite, params.index)?;
    let mask = threshold_index(&index, params.threshold)?;
    debug!(
        "{:?} >= {}: {} water pixels",
        params.index,
        params.threshold,
        mask.count_where(|v| v == 1)
    );
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glofscan_core::GeoTransform;

    fn make_gradient(rows: usize, cols: usize, start: f64, step: f64) -> Raster<f64> {
        let mut r = Raster::new(rows, cols);
        r.set_transform(GeoTransform::new(0.0, rows as f64, 1.0, -1.0));
        for row in 0..rows {
            for col in 0..cols {
                r.set(row, col, start + (row * cols + col) as f64 * step)
                    .unwrap();
            }
        }
        r
    }

    #[test]
    fn test_threshold_inclusive() {
        let index = Raster::from_vec(vec![0.29, 0.3, 0.31, f64::NAN], 2, 2).unwrap();
        let mask = threshold_index(&index, 0.3).unwrap();
        assert_eq!(mask.data().as_slice().unwrap(), &[0, 1, 1, 0]);
    }

    #[test]
    fn test_raising_threshold_never_adds_water() {
        let index = make_gradient(20, 20, -1.0, 0.005);
        let mut previous = usize::MAX;
        for step in 0..=20 {
            let threshold = -1.0 + step as f64 * 0.1;
            let water = threshold_index(&index, threshold)
                .unwrap()
                .count_where(|v| v == 1);
            assert!(water <= previous, "threshold {threshold} grew water to {water}");
            previous = water;
        }
    }

    #[test]
    fn test_rejects_nan_threshold() {
        let index = make_gradient(2, 2, 0.0, 0.1);
        assert!(threshold_index(&index, f64::NAN).is_err());
    }
}
