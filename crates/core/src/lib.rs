//! # glofscan core
//!
//! Core types, traits and I/O for glacial lake feature extraction.
//!
//! This crate provides:
//! - `Raster<T>`: Generic raster grid type and `GridSpec` target grids
//! - `GeoTransform`: Affine transformation for georeferencing
//! - `Crs` / `LocalProjection`: WGS84, UTM and local metric frames
//! - The lake/glacier/feature domain model
//! - Data-source traits with retry, plus local implementations
//! - I/O for GeoTIFF rasters, GeoJSON glacier inventories and scene manifests

pub mod crs;
pub mod error;
pub mod io;
pub mod model;
pub mod raster;
pub mod source;
pub mod vector;

pub use crs::{Crs, LocalProjection};
pub use error::{Error, Result};
pub use raster::{GeoTransform, GridSpec, Raster, RasterElement};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::{Crs, LocalProjection};
    pub use crate::error::{Error, Result};
    pub use crate::model::{
        Detection, ExpansionRecord, FeatureRecord, GlacierMetrics, GlacierPolygon, LakePoint,
        LakePolygon, LakeSnapshot, NotFoundReason, SnapshotMode,
    };
    pub use crate::raster::{GeoTransform, GridSpec, Raster, RasterElement};
    pub use crate::source::{
        Band, DataSources, ElevationModel, GlacierInventory, RetryPolicy, Scene, SceneCatalog,
        SceneQuery, Sensor, SourceError, SourceResult,
    };
    pub use crate::vector::BoundingBox;
}
