//! In-memory data sources

use geo_types::Coord;
use tracing::debug;

use super::{ElevationModel, QaMask, Scene, SceneCatalog, SceneQuery, SourceResult};
use crate::crs::Crs;
use crate::raster::{resample_to_grid, Raster};
use crate::vector::BoundingBox;

#[derive(Debug, Clone)]
struct StoredScene {
    scene: Scene,
    crs: Crs,
}

/// Scene catalog over scenes held in memory.
///
/// Scenes keep their native grid and CRS; queries resample them onto the
/// requested grid. Pixels outside a scene get the QA fill bit.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    scenes: Vec<StoredScene>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, scene: Scene, crs: Crs) {
        self.scenes.push(StoredScene { scene, crs });
    }

    pub fn with_scene(mut self, scene: Scene, crs: Crs) -> Self {
        self.push(scene, crs);
        self
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}

/// Whether a raster in `crs` overlaps the WGS84 `bbox`
pub(crate) fn footprint_overlaps<T: crate::RasterElement>(
    raster: &Raster<T>,
    crs: Crs,
    bbox: &BoundingBox,
) -> bool {
    let corners = bbox.corners().map(|(x, y)| crs.from_wgs84(x, y));
    let projected = corners.iter().fold(
        BoundingBox::new(f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        |b, &(x, y)| BoundingBox::new(b.min_x.min(x), b.min_y.min(y), b.max_x.max(x), b.max_y.max(y)),
    );
    let (min_x, min_y, max_x, max_y) = raster.bounds();
    projected.intersects(&BoundingBox::new(min_x, min_y, max_x, max_y))
}

/// Resample every raster of `scene` from `crs` onto the query grid.
pub(crate) fn resample_scene(scene: &Scene, crs: Crs, query: &SceneQuery) -> Scene {
    let grid = &query.grid;
    Scene {
        id: scene.id.clone(),
        acquired: scene.acquired,
        sensor: scene.sensor,
        cloud_cover: scene.cloud_cover,
        bands: scene
            .bands
            .iter()
            .map(|(key, band)| (key.clone(), resample_to_grid(band, crs, grid, 0)))
            .collect(),
        qa: resample_to_grid(&scene.qa, crs, grid, QaMask::FILL),
    }
}

impl SceneCatalog for MemoryCatalog {
    fn query_scenes(&self, query: &SceneQuery) -> SourceResult<Vec<Scene>> {
        let bbox = query.grid.bbox();
        let scenes: Vec<Scene> = self
            .scenes
            .iter()
            .filter(|s| query.contains_date(s.scene.acquired))
            .filter(|s| footprint_overlaps(&s.scene.qa, s.crs, &bbox))
            .map(|s| resample_scene(&s.scene, s.crs, query))
            .collect();

        debug!(
            "memory catalog: {} of {} scenes match {}..={}",
            scenes.len(),
            self.scenes.len(),
            query.start,
            query.end
        );
        Ok(scenes)
    }
}

/// Elevation model backed by a single DEM raster.
#[derive(Debug, Clone)]
pub struct RasterElevation {
    dem: Raster<f64>,
    crs: Crs,
}

impl RasterElevation {
    pub fn new(dem: Raster<f64>, crs: Crs) -> Self {
        Self { dem, crs }
    }

    pub fn sample(&self, c: Coord<f64>) -> Option<f64> {
        let (x, y) = self.crs.from_wgs84(c.x, c.y);
        self.dem.sample(x, y).filter(|v| v.is_finite())
    }
}

impl ElevationModel for RasterElevation {
    fn query_elevation(&self, points: &[Coord<f64>]) -> SourceResult<Vec<Option<f64>>> {
        Ok(points.iter().map(|&c| self.sample(c)).collect())
    }
}
