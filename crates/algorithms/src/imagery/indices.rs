//! Normalized-difference water indices
//!
//! Indices operate on single-band reflectance rasters (one band per raster)
//! and produce NaN wherever an input is missing.

use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use glofscan_core::raster::Raster;
use glofscan_core::source::Band;
use glofscan_core::{Error, Result};

/// Spectral index used to separate water from land
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaterIndex {
    /// Normalized Difference Water Index (McFeeters)
    #[default]
    Ndwi,
    /// Modified NDWI (Xu, uses SWIR)
    Mndwi,
}

impl WaterIndex {
    /// Bands as (positive, negative) numerator terms
    pub fn bands(&self) -> (Band, Band) {
        match self {
            WaterIndex::Ndwi => (Band::Green, Band::Nir),
            WaterIndex::Mndwi => (Band::Green, Band::Swir1),
        }
    }
}

/// Compute the normalized difference between two bands:
///
/// `(band_a - band_b) / (band_a + band_b)`
///
/// Result is in the range [-1, 1] for non-negative inputs. Pixels where the
/// sum is zero or either band is nodata are set to NaN.
pub fn normalized_difference(band_a: &Raster<f64>, band_b: &Raster<f64>) -> Result<Raster<f64>> {
    check_dimensions(band_a, band_b)?;

    let (rows, cols) = band_a.shape();
    let a = band_a.data();
    let b = band_b.data();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let va = a[(row, col)];
                let vb = b[(row, col)];

                if band_a.is_nodata(va) || band_b.is_nodata(vb) {
                    continue;
                }

                let sum = va + vb;
                if sum.abs() < 1e-10 {
                    continue; // Avoid division by zero
                }

                *out = (va - vb) / sum;
            }
            row_data
        })
        .collect();

    build_output(band_a, rows, cols, data)
}

/// Normalized Difference Water Index (McFeeters, 1996)
///
/// `NDWI = (Green - NIR) / (Green + NIR)`
pub fn ndwi(green: &Raster<f64>, nir: &Raster<f64>) -> Result<Raster<f64>> {
    normalized_difference(green, nir)
}

/// Modified Normalized Difference Water Index (Xu, 2006)
///
/// `MNDWI = (Green - SWIR1) / (Green + SWIR1)`
///
/// Suppresses shadowed terrain and built-up surfaces better than NDWI.
pub fn mndwi(green: &Raster<f64>, swir: &Raster<f64>) -> Result<Raster<f64>> {
    normalized_difference(green, swir)
}

fn check_dimensions(a: &Raster<f64>, b: &Raster<f64>) -> Result<()> {
    if a.shape() != b.shape() {
        return Err(Error::SizeMismatch {
            er: a.rows(),
            ec: a.cols(),
            ar: b.rows(),
            ac: b.cols(),
        });
    }
    Ok(())
}

fn build_output(
    template: &Raster<f64>,
    rows: usize,
    cols: usize,
    data: Vec<f64>,
) -> Result<Raster<f64>> {
    let mut output = template.with_same_meta::<f64>();
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}
