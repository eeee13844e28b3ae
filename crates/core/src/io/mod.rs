//! File I/O: GeoTIFF rasters, GeoJSON glacier inventories and local scene
//! manifests

mod geotiff;
mod glaciers;
mod manifest;

pub use geotiff::{read_geotiff, read_geotiff_from_buffer, write_geotiff, GeoTiff};
pub use glaciers::{parse_glacier_inventory, read_glacier_inventory};
pub use manifest::{LocalSceneCatalog, ManifestScene, SceneManifest};
