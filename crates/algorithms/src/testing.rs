//! Synthetic fixtures shared by unit tests

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use geo::{Coord, LineString, Polygon};

use glofscan_core::model::{GlacierPolygon, LakePoint};
use glofscan_core::source::{
    DataSources, ElevationModel, RetryPolicy, Scene, SceneCatalog, SceneQuery, Sensor,
    SourceError, SourceResult,
};
use glofscan_core::vector::GlacierIndex;
use glofscan_core::{GridSpec, LocalProjection};

use crate::imagery::CompositeParams;
use crate::lake::SnapshotParams;

pub const POINT: LakePoint = LakePoint { lon: 86.9, lat: 28.5 };

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn dn(reflectance: f64) -> u16 {
    ((reflectance + 0.2) / 0.0000275).round() as u16
}

/// Snapshot parameters on a 20 x 20 grid
pub fn small_params() -> SnapshotParams {
    SnapshotParams {
        composite: CompositeParams {
            radius_m: 300.0,
            ..CompositeParams::default()
        },
        ..SnapshotParams::default()
    }
}

pub fn grid(params: &SnapshotParams) -> GridSpec {
    GridSpec::around(
        POINT.lon,
        POINT.lat,
        params.composite.radius_m,
        params.composite.resolution_m,
    )
    .unwrap()
}

/// Water on rows and columns `from..to`
pub fn square_lake(from: usize, to: usize) -> impl Fn(usize, usize) -> bool {
    move |r, c| (from..to).contains(&r) && (from..to).contains(&c)
}

/// Landsat 8 scene: water reads NDWI ~0.71, land ~-0.58
pub fn lake_scene(
    grid: &GridSpec,
    id: &str,
    acquired: NaiveDate,
    water: impl Fn(usize, usize) -> bool,
    qa: u16,
) -> Scene {
    let mut green = grid.raster_filled(dn(0.08));
    let mut nir = grid.raster_filled(dn(0.30));
    let mut swir = grid.raster_filled(dn(0.25));
    for r in 0..grid.rows {
        for c in 0..grid.cols {
            if water(r, c) {
                green.set(r, c, dn(0.30)).unwrap();
                nir.set(r, c, dn(0.05)).unwrap();
                swir.set(r, c, dn(0.02)).unwrap();
            }
        }
    }

    let sensor = Sensor::Landsat8;
    let mut bands = BTreeMap::new();
    bands.insert("SR_B3".to_string(), green);
    bands.insert("SR_B5".to_string(), nir);
    bands.insert("SR_B6".to_string(), swir);
    Scene {
        id: id.to_string(),
        acquired,
        sensor,
        cloud_cover: Some(5.0),
        bands,
        qa: grid.raster_filled(qa),
    }
}

/// Catalog returning its scenes that fall in the query's dates
#[derive(Debug, Default)]
pub struct StaticCatalog {
    pub scenes: Vec<Scene>,
}

impl SceneCatalog for StaticCatalog {
    fn query_scenes(&self, query: &SceneQuery) -> SourceResult<Vec<Scene>> {
        Ok(self
            .scenes
            .iter()
            .filter(|s| query.contains_date(s.acquired))
            .cloned()
            .collect())
    }
}

pub struct UnavailableCatalog;

impl SceneCatalog for UnavailableCatalog {
    fn query_scenes(&self, _: &SceneQuery) -> SourceResult<Vec<Scene>> {
        Err(SourceError::Unavailable("no collection for this area".into()))
    }
}

pub struct FailingCatalog;

impl SceneCatalog for FailingCatalog {
    fn query_scenes(&self, _: &SceneQuery) -> SourceResult<Vec<Scene>> {
        Err(SourceError::Failed("HTTP 403".into()))
    }
}

pub struct FnElevation<F>(pub F);

impl<F> ElevationModel for FnElevation<F>
where
    F: Fn(Coord<f64>) -> Option<f64> + Send + Sync,
{
    fn query_elevation(&self, points: &[Coord<f64>]) -> SourceResult<Vec<Option<f64>>> {
        Ok(points.iter().map(|&c| (self.0)(c)).collect())
    }
}

pub fn flat_elevation(value: f64) -> Arc<dyn ElevationModel> {
    Arc::new(FnElevation(move |_| Some(value)))
}

pub fn sources_with_elevation(
    catalog: Arc<dyn SceneCatalog>,
    glaciers: Vec<GlacierPolygon>,
    elevation: Arc<dyn ElevationModel>,
) -> DataSources {
    DataSources::new(catalog, elevation, Arc::new(GlacierIndex::new(glaciers)))
        .with_retry(RetryPolicy::none())
}

/// Sources over a flat 4000 m DEM
pub fn sources_from(catalog: Arc<dyn SceneCatalog>, glaciers: Vec<GlacierPolygon>) -> DataSources {
    sources_with_elevation(catalog, glaciers, flat_elevation(4000.0))
}

pub fn sources_with(scenes: Vec<Scene>) -> DataSources {
    sources_from(Arc::new(StaticCatalog { scenes }), Vec::new())
}

/// Square of half-width `half_m` centred `east_m` east of `center`
pub fn square_around(center: Coord<f64>, east_m: f64, half_m: f64) -> Polygon<f64> {
    let proj = LocalProjection::new(center.x, center.y);
    let ring: LineString<f64> = [
        (east_m - half_m, -half_m),
        (east_m + half_m, -half_m),
        (east_m + half_m, half_m),
        (east_m - half_m, half_m),
    ]
    .into_iter()
    .map(|(x, y)| proj.unproject(Coord { x, y }))
    .collect();
    Polygon::new(ring, vec![])
}
