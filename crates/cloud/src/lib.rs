//! # glofscan cloud
//!
//! STAC-backed data sources for glofscan.
//!
//! - [`StacSceneCatalog`]: Landsat Collection 2 Level-2 scenes, signed on
//!   Planetary Computer and resampled onto each query grid
//! - [`StacElevation`]: Copernicus DEM tiles with an LRU tile cache
//!
//! Both expose blocking trait implementations over an internal Tokio
//! runtime; HTTP failures are classified into transient and permanent
//! [`SourceError`](glofscan_core::source::SourceError)s for the retry layer.

pub mod cache;
pub mod elevation;
pub mod error;
pub mod landsat;
pub mod stac_client;
pub mod stac_models;

pub use elevation::StacElevation;
pub use error::{CloudError, Result};
pub use landsat::StacSceneCatalog;
pub use stac_client::{StacCatalog, StacClient, StacClientOptions};
pub use stac_models::{StacItem, StacItemCollection, StacSearchParams};

/// Multi-threaded runtime so several pipeline threads can block on it at once.
pub(crate) fn build_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .map_err(|e| CloudError::Network(format!("failed to start runtime: {e}")))
}
