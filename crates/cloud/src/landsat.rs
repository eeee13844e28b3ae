//! Landsat Collection 2 Level-2 scenes from a STAC API.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use glofscan_core::io::read_geotiff_from_buffer;
use glofscan_core::raster::{resample_to_grid, GridSpec, Raster};
use glofscan_core::source::{
    Band, QaMask, Scene, SceneCatalog, SceneQuery, Sensor, SourceError, SourceResult,
};
use glofscan_core::Crs;

use crate::error::{CloudError, Result};
use crate::stac_client::{StacCatalog, StacClient, StacClientOptions};
use crate::stac_models::{StacItem, StacSearchParams};

/// Landsat Collection 2 Level-2 collection id on Planetary Computer and Earth Search
pub const LANDSAT_COLLECTION: &str = "landsat-c2-l2";

const QA_ASSET: &str = "qa_pixel";

/// STAC asset key of a surface-reflectance band
pub fn asset_key(band: Band) -> &'static str {
    match band {
        Band::Blue => "blue",
        Band::Green => "green",
        Band::Red => "red",
        Band::Nir => "nir08",
        Band::Swir1 => "swir16",
    }
}

/// Scene catalog backed by STAC search and asset download.
///
/// Each returned scene carries the configured bands and the QA band,
/// resampled onto the query grid.
pub struct StacSceneCatalog {
    runtime: tokio::runtime::Runtime,
    client: StacClient,
    collection: String,
    bands: Vec<Band>,
}

impl StacSceneCatalog {
    /// Catalog downloading the green and NIR bands.
    pub fn new(catalog: StacCatalog, options: StacClientOptions) -> Result<Self> {
        Ok(Self {
            runtime: crate::build_runtime()?,
            client: StacClient::new(catalog, options)?,
            collection: LANDSAT_COLLECTION.to_string(),
            bands: vec![Band::Green, Band::Nir],
        })
    }

    pub fn with_bands(mut self, bands: &[Band]) -> Self {
        self.bands = bands.to_vec();
        self
    }

    pub fn with_collection(mut self, collection: &str) -> Self {
        self.collection = collection.to_string();
        self
    }

    async fn fetch_scenes(&self, query: &SceneQuery) -> Result<Vec<Scene>> {
        let bbox = query.grid.bbox();
        let mut params = StacSearchParams::new()
            .bbox(bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y)
            .dates(query.start, query.end)
            .collections(&[self.collection.as_str()]);
        if let Some(max) = query.max_cloud_cover {
            params = params.max_cloud_cover(max);
        }

        let items = self.client.search_all(&params).await?;
        debug!(
            "{} items for {} .. {}",
            items.len(),
            query.start,
            query.end
        );

        let mut scenes = Vec::with_capacity(items.len());
        for item in &items {
            match self.fetch_scene(item, &query.grid).await {
                Ok(Some(scene)) => scenes.push(scene),
                Ok(None) => {}
                Err(e) if e.is_transient() => return Err(e),
                Err(e) => warn!("skipping item {}: {}", item.id, e),
            }
        }
        Ok(scenes)
    }

    async fn fetch_scene(&self, item: &StacItem, grid: &GridSpec) -> Result<Option<Scene>> {
        let sensor = item
            .properties
            .platform
            .as_deref()
            .and_then(Sensor::from_platform);
        let (Some(sensor), Some(acquired)) = (sensor, item.acquired()) else {
            debug!("item {} has no usable platform or date", item.id);
            return Ok(None);
        };

        let qa = self.fetch_band(item, QA_ASSET, grid, QaMask::FILL).await?;
        let mut bands = BTreeMap::new();
        for &band in &self.bands {
            let raster = self.fetch_band(item, asset_key(band), grid, 0).await?;
            bands.insert(sensor.band_key(band).to_string(), raster);
        }

        Ok(Some(Scene {
            id: item.id.clone(),
            acquired,
            sensor,
            cloud_cover: item.properties.eo_cloud_cover,
            bands,
            qa,
        }))
    }

    async fn fetch_band(
        &self,
        item: &StacItem,
        key: &str,
        grid: &GridSpec,
        fill: u16,
    ) -> Result<Raster<u16>> {
        let asset = item.asset(key).ok_or_else(|| CloudError::MissingAsset {
            item: item.id.clone(),
            asset: key.to_string(),
        })?;
        let bytes = self.client.download(&asset.href).await?;
        let tiff = read_geotiff_from_buffer::<u16>(&bytes)?;
        let crs = match tiff.epsg.or_else(|| item.epsg()) {
            Some(code) => Crs::from_epsg(code)?,
            None => Crs::Wgs84,
        };
        Ok(resample_to_grid(&tiff.raster, crs, grid, fill))
    }
}

impl SceneCatalog for StacSceneCatalog {
    fn query_scenes(&self, query: &SceneQuery) -> SourceResult<Vec<Scene>> {
        self.runtime
            .block_on(self.fetch_scenes(query))
            .map_err(SourceError::from)
    }
}
