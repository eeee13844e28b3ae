//! Data-source abstraction.
//!
//! The engine never talks to a remote service directly. Imagery, elevation
//! and the glacier inventory are reached through the traits below; a
//! [`DataSources`] bundle shares them across worker threads and retries
//! transient failures.

mod error;
mod memory;
mod retry;
mod scene;

pub use error::{SourceError, SourceResult};
pub use memory::{MemoryCatalog, RasterElevation};
pub(crate) use memory::footprint_overlaps;
pub use retry::RetryPolicy;
pub use scene::{
    reflectance, Band, QaMask, Scene, SceneQuery, Sensor, REFLECTANCE_OFFSET, REFLECTANCE_SCALE,
};

use std::sync::Arc;

use geo_types::Coord;

use crate::model::GlacierPolygon;
use crate::vector::BoundingBox;

/// Searchable archive of surface-reflectance scenes.
pub trait SceneCatalog: Send + Sync {
    /// Scenes acquired within the query's date range that cover its grid,
    /// with every raster resampled onto that grid.
    fn query_scenes(&self, query: &SceneQuery) -> SourceResult<Vec<Scene>>;
}

/// Digital elevation model.
pub trait ElevationModel: Send + Sync {
    /// Elevation in metres at each WGS84 coordinate, `None` where the model
    /// has no value.
    fn query_elevation(&self, points: &[Coord<f64>]) -> SourceResult<Vec<Option<f64>>>;
}

/// Glacier outline inventory.
pub trait GlacierInventory: Send + Sync {
    /// Glaciers whose envelope intersects `bbox` (WGS84).
    fn query_glaciers(&self, bbox: &BoundingBox) -> SourceResult<Vec<GlacierPolygon>>;
}

/// The three data sources of a pipeline plus the retry policy applied to them.
#[derive(Clone)]
pub struct DataSources {
    scenes: Arc<dyn SceneCatalog>,
    elevation: Arc<dyn ElevationModel>,
    glaciers: Arc<dyn GlacierInventory>,
    retry: RetryPolicy,
}

impl DataSources {
    pub fn new(
        scenes: Arc<dyn SceneCatalog>,
        elevation: Arc<dyn ElevationModel>,
        glaciers: Arc<dyn GlacierInventory>,
    ) -> Self {
        Self {
            scenes,
            elevation,
            glaciers,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn query_scenes(&self, query: &SceneQuery) -> SourceResult<Vec<Scene>> {
        self.retry
            .run("scene catalog", || self.scenes.query_scenes(query))
    }

    pub fn query_elevation(&self, points: &[Coord<f64>]) -> SourceResult<Vec<Option<f64>>> {
        let values = self
            .retry
            .run("elevation model", || self.elevation.query_elevation(points))?;
        if values.len() != points.len() {
            return Err(SourceError::Failed(format!(
                "elevation model returned {} values for {} points",
                values.len(),
                points.len()
            )));
        }
        Ok(values)
    }

    pub fn query_glaciers(&self, bbox: &BoundingBox) -> SourceResult<Vec<GlacierPolygon>> {
        self.retry
            .run("glacier inventory", || self.glaciers.query_glaciers(bbox))
    }
}

impl std::fmt::Debug for DataSources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSources")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
