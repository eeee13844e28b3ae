//! Copernicus DEM elevation from a STAC API.
//!
//! Tiles are found per point with a point search, downloaded whole and kept
//! in an LRU cache shared by all threads.

use std::sync::Arc;

use geo::Coord;
use tracing::debug;

use glofscan_core::io::read_geotiff_from_buffer;
use glofscan_core::source::{ElevationModel, RasterElevation, SourceError, SourceResult};

use crate::cache::AssetCache;
use crate::error::{CloudError, Result};
use crate::stac_client::{StacCatalog, StacClient, StacClientOptions};
use crate::stac_models::StacSearchParams;

/// Copernicus GLO-30 collection id on Planetary Computer
pub const COPERNICUS_DEM_COLLECTION: &str = "cop-dem-glo-30";

const DEM_ASSET: &str = "data";

/// Half-size of the search box around a point (degrees)
const POINT_SEARCH_EPS: f64 = 1e-6;

/// Elevation model over DEM tiles found through STAC.
pub struct StacElevation {
    runtime: tokio::runtime::Runtime,
    client: StacClient,
    collection: String,
    tiles: AssetCache<RasterElevation>,
}

impl StacElevation {
    /// Elevation source caching up to `cache_tiles` tiles.
    pub fn new(catalog: StacCatalog, options: StacClientOptions, cache_tiles: usize) -> Result<Self> {
        Ok(Self {
            runtime: crate::build_runtime()?,
            client: StacClient::new(catalog, options)?,
            collection: COPERNICUS_DEM_COLLECTION.to_string(),
            tiles: AssetCache::new(cache_tiles),
        })
    }

    pub fn with_collection(mut self, collection: &str) -> Self {
        self.collection = collection.to_string();
        self
    }

    async fn elevation_at(&self, c: Coord<f64>) -> Result<Option<f64>> {
        let params = StacSearchParams::new()
            .bbox(
                c.x - POINT_SEARCH_EPS,
                c.y - POINT_SEARCH_EPS,
                c.x + POINT_SEARCH_EPS,
                c.y + POINT_SEARCH_EPS,
            )
            .collections(&[self.collection.as_str()])
            .limit(4);
        let page = self.client.search(&params).await?;

        for item in &page.features {
            let Some(asset) = item.asset(DEM_ASSET) else {
                continue;
            };
            let tile = self.tile(&asset.href).await?;
            if let Some(value) = tile.sample(c) {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    async fn tile(&self, href: &str) -> Result<Arc<RasterElevation>> {
        if let Some(tile) = self.tiles.get(href) {
            return Ok(tile);
        }
        let bytes = self.client.download(href).await?;
        let tiff = read_geotiff_from_buffer::<f64>(&bytes)?;
        let crs = tiff.crs()?;
        let tile = Arc::new(RasterElevation::new(tiff.raster, crs));
        self.tiles.insert(href.to_string(), tile.clone());
        debug!("cached DEM tile {} ({} cached)", href, self.tiles.len());
        Ok(tile)
    }
}

impl ElevationModel for StacElevation {
    fn query_elevation(&self, points: &[Coord<f64>]) -> SourceResult<Vec<Option<f64>>> {
        self.runtime
            .block_on(async {
                let mut values = Vec::with_capacity(points.len());
                for &c in points {
                    values.push(self.elevation_at(c).await?);
                }
                Ok::<_, CloudError>(values)
            })
            .map_err(SourceError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // requires network
    fn everest_region_elevation() {
        let dem = StacElevation::new(
            StacCatalog::PlanetaryComputer,
            StacClientOptions::default(),
            4,
        )
        .unwrap();
        let values = dem
            .query_elevation(&[Coord { x: 86.925, y: 27.988 }])
            .unwrap();
        let elev = values[0].unwrap();
        assert!(elev > 8000.0 && elev < 8900.0, "elevation {}", elev);
    }
}
