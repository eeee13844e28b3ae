//! Data-source selection from command-line flags

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};

use glofscan_algorithms::pipeline::PipelineConfig;
use glofscan_core::io::{read_geotiff, read_glacier_inventory, LocalSceneCatalog};
use glofscan_core::source::{
    DataSources, ElevationModel, GlacierInventory, RasterElevation, SceneCatalog,
};
use glofscan_core::vector::GlacierIndex;
use glofscan_cloud::{StacCatalog, StacClientOptions, StacElevation, StacSceneCatalog};

#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// STAC catalog for imagery and DEM tiles: pc, es, or an API URL
    #[arg(long, default_value = "pc")]
    pub catalog: String,
    /// Local scene manifest (JSON) used instead of the STAC catalog
    #[arg(long)]
    pub scenes: Option<PathBuf>,
    /// Local DEM GeoTIFF used instead of STAC DEM tiles
    #[arg(long)]
    pub dem: Option<PathBuf>,
    /// Glacier inventory (GeoJSON)
    #[arg(long)]
    pub glaciers: Option<PathBuf>,
    /// HTTP request timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,
    /// DEM tiles kept in memory
    #[arg(long, default_value = "16")]
    pub dem_cache: usize,
}

impl SourceArgs {
    fn stac_options(&self) -> StacClientOptions {
        StacClientOptions {
            request_timeout: Duration::from_secs(self.timeout),
            ..StacClientOptions::default()
        }
    }
}

/// Open every data source named on the command line.
pub fn build_sources(args: &SourceArgs, config: &PipelineConfig) -> Result<DataSources> {
    let catalog = StacCatalog::from_str_or_url(&args.catalog);

    let scenes: Arc<dyn SceneCatalog> = match &args.scenes {
        Some(path) => {
            let local = LocalSceneCatalog::open(path)
                .with_context(|| format!("Failed to open scene manifest {}", path.display()))?;
            info!("Using {} scenes from {}", local.len(), path.display());
            Arc::new(local)
        }
        None => {
            let (a, b) = config.snapshot.water.index.bands();
            let stac = StacSceneCatalog::new(catalog.clone(), args.stac_options())
                .context("Failed to create STAC scene catalog")?
                .with_bands(&[a, b]);
            info!("Searching scenes on {}", catalog.search_url());
            Arc::new(stac)
        }
    };

    let elevation: Arc<dyn ElevationModel> = match &args.dem {
        Some(path) => {
            let tif = read_geotiff::<f64, _>(path)
                .with_context(|| format!("Failed to read DEM {}", path.display()))?;
            let crs = tif.crs()?;
            Arc::new(RasterElevation::new(tif.raster, crs))
        }
        None => Arc::new(
            StacElevation::new(catalog, args.stac_options(), args.dem_cache)
                .context("Failed to create STAC elevation source")?,
        ),
    };

    let glaciers: Arc<dyn GlacierInventory> = match &args.glaciers {
        Some(path) => {
            let inventory = read_glacier_inventory(path)
                .with_context(|| format!("Failed to read glacier inventory {}", path.display()))?;
            info!("Loaded {} glaciers", inventory.len());
            Arc::new(GlacierIndex::new(inventory))
        }
        None => {
            warn!("No glacier inventory given; glacier metrics will be empty");
            Arc::new(GlacierIndex::new(Vec::new()))
        }
    };

    Ok(DataSources::new(scenes, elevation, glaciers))
}
