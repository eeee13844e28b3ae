//! Scene catalog over GeoTIFF band files listed in a JSON manifest.
//!
//! ```json
//! {
//!   "scenes": [{
//!     "id": "LC08_L2SP_140041_20151012",
//!     "acquired": "2015-10-12",
//!     "sensor": "landsat-8",
//!     "cloud_cover": 12.4,
//!     "bands": {"SR_B3": "LC08_..._SR_B3.TIF", "SR_B5": "LC08_..._SR_B5.TIF"},
//!     "qa": "LC08_..._QA_PIXEL.TIF"
//!   }]
//! }
//! ```
//!
//! Relative paths resolve against the manifest's directory. The CRS of each
//! file comes from its GeoKeys.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::geotiff::read_geotiff;
use crate::error::Result;
use crate::raster::resample_to_grid;
use crate::source::{
    footprint_overlaps, QaMask, Scene, SceneCatalog, SceneQuery, Sensor, SourceError,
    SourceResult,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneManifest {
    pub scenes: Vec<ManifestScene>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestScene {
    pub id: String,
    pub acquired: NaiveDate,
    pub sensor: Sensor,
    #[serde(default)]
    pub cloud_cover: Option<f64>,
    pub bands: BTreeMap<String, PathBuf>,
    pub qa: PathBuf,
}

/// Scene catalog reading local GeoTIFFs on demand.
#[derive(Debug, Clone)]
pub struct LocalSceneCatalog {
    root: PathBuf,
    manifest: SceneManifest,
}

impl LocalSceneCatalog {
    pub fn new(root: impl Into<PathBuf>, manifest: SceneManifest) -> Self {
        Self {
            root: root.into(),
            manifest,
        }
    }

    /// Open a manifest file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let manifest: SceneManifest = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        debug!("scene manifest {} lists {} scenes", path.display(), manifest.scenes.len());
        Ok(Self::new(root, manifest))
    }

    pub fn len(&self) -> usize {
        self.manifest.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifest.scenes.is_empty()
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn load(&self, entry: &ManifestScene, query: &SceneQuery) -> Result<Option<Scene>> {
        let qa = read_geotiff::<u16, _>(self.resolve(&entry.qa))?;
        let crs = qa.crs()?;
        if !footprint_overlaps(&qa.raster, crs, &query.grid.bbox()) {
            return Ok(None);
        }

        let mut bands = BTreeMap::new();
        for (key, path) in &entry.bands {
            let tif = read_geotiff::<u16, _>(self.resolve(path))?;
            let band_crs = tif.crs()?;
            bands.insert(key.clone(), resample_to_grid(&tif.raster, band_crs, &query.grid, 0));
        }

        Ok(Some(Scene {
            id: entry.id.clone(),
            acquired: entry.acquired,
            sensor: entry.sensor,
            cloud_cover: entry.cloud_cover,
            bands,
            qa: resample_to_grid(&qa.raster, crs, &query.grid, QaMask::FILL),
        }))
    }
}

impl SceneCatalog for LocalSceneCatalog {
    fn query_scenes(&self, query: &SceneQuery) -> SourceResult<Vec<Scene>> {
        let mut scenes = Vec::new();
        for entry in &self.manifest.scenes {
            if !query.contains_date(entry.acquired) {
                continue;
            }
            if let (Some(max), Some(cc)) = (query.max_cloud_cover, entry.cloud_cover) {
                if cc > max {
                    continue;
                }
            }
            match self.load(entry, query) {
                Ok(Some(scene)) => scenes.push(scene),
                Ok(None) => {}
                Err(e) => {
                    warn!("scene {} unreadable: {}", entry.id, e);
                    return Err(SourceError::Failed(format!("scene {}: {e}", entry.id)));
                }
            }
        }
        Ok(scenes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::UtmZone;
    use crate::io::write_geotiff;
    use crate::raster::{GeoTransform, GridSpec, Raster};

    #[test]
    fn test_manifest_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let zone = UtmZone::for_point(86.9, 28.5);
        let (e, n) = zone.forward(86.9, 28.5);
        let transform = GeoTransform::new(e - 600.0, n + 600.0, 30.0, -30.0);

        let mut green: Raster<u16> = Raster::filled(40, 40, 15_000);
        green.set_transform(transform);
        let mut qa: Raster<u16> = Raster::filled(40, 40, 21_824);
        qa.set_transform(transform);
        write_geotiff(&green, zone.epsg(), dir.path().join("b3.tif")).unwrap();
        write_geotiff(&qa, zone.epsg(), dir.path().join("qa.tif")).unwrap();

        let manifest = r#"{"scenes": [
            {"id": "in", "acquired": "2015-10-12", "sensor": "landsat-8", "cloud_cover": 5.0,
             "bands": {"SR_B3": "b3.tif"}, "qa": "qa.tif"},
            {"id": "cloudy", "acquired": "2015-10-28", "sensor": "landsat-8", "cloud_cover": 95.0,
             "bands": {"SR_B3": "b3.tif"}, "qa": "qa.tif"},
            {"id": "old", "acquired": "2001-10-12", "sensor": "landsat-7",
             "bands": {"SR_B2": "b3.tif"}, "qa": "qa.tif"}
        ]}"#;
        let path = dir.path().join("scenes.json");
        std::fs::write(&path, manifest).unwrap();

        let catalog = LocalSceneCatalog::open(&path).unwrap();
        assert_eq!(catalog.len(), 3);

        let grid = GridSpec::around(86.9, 28.5, 300.0, 30.0).unwrap();
        let query = SceneQuery {
            grid,
            start: NaiveDate::from_ymd_opt(2014, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2016, 12, 31).unwrap(),
            max_cloud_cover: Some(80.0),
        };
        let scenes = catalog.query_scenes(&query).unwrap();
        assert_eq!(scenes.len(), 1);
        assert_eq!(scenes[0].id, "in");
        let green = scenes[0].band(crate::source::Band::Green).unwrap();
        assert_eq!(green.shape(), grid.shape());
        assert_eq!(green.count_where(|v| v == 15_000), green.len());
    }

    #[test]
    fn test_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = SceneManifest {
            scenes: vec![ManifestScene {
                id: "ghost".into(),
                acquired: NaiveDate::from_ymd_opt(2015, 10, 1).unwrap(),
                sensor: Sensor::Landsat8,
                cloud_cover: None,
                bands: BTreeMap::new(),
                qa: "missing.tif".into(),
            }],
        };
        let catalog = LocalSceneCatalog::new(dir.path(), manifest);
        let query = SceneQuery {
            grid: GridSpec::around(86.9, 28.5, 300.0, 30.0).unwrap(),
            start: NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2015, 12, 31).unwrap(),
            max_cloud_cover: None,
        };
        assert!(matches!(
            catalog.query_scenes(&query),
            Err(SourceError::Failed(_))
        ));
    }
}
