//! Raster data structures and operations

mod element;
mod geotransform;
mod grid;
mod grid_spec;
mod resample;

pub use element::RasterElement;
pub use geotransform::GeoTransform;
pub use grid::Raster;
pub use grid_spec::GridSpec;
pub use resample::resample_to_grid;
