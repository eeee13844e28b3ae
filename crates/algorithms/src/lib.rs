//! # glofscan algorithms
//!
//! Feature extraction for glacial lakes.
//!
//! ## Stages
//!
//! - **imagery**: median compositing, water indices, water classification
//! - **vector**: mask vectorization, metric measurements
//! - **lake**: single-year snapshots and expansion rates
//! - **glacier**: contact, distance and slope to nearby glaciers
//! - **features**: merging per-lake results into one record
//! - **pipeline**: per-lake orchestration and parallel batch runs

pub mod features;
pub mod glacier;
pub mod imagery;
pub mod lake;
pub mod pipeline;
pub mod vector;

#[cfg(test)]
pub(crate) mod testing;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::features::aggregate;
    pub use crate::glacier::{glacier_proximity, ProximityParams};
    pub use crate::imagery::{
        classify_water, composite, ndwi, mndwi, scene_query, Composite, CompositeOutcome,
        CompositeParams, Season, TemporalWindow, WaterIndex, WaterMask, WaterParams,
    };
    pub use crate::lake::{expansion_rate, snapshot, SnapshotParams};
    pub use crate::pipeline::{BatchReport, LakeFailure, LakePipeline, LakeRequest, PipelineConfig};
    pub use crate::vector::{vectorize, Selection, VectorizeParams, WaterBody};
    pub use glofscan_core::prelude::*;
}
