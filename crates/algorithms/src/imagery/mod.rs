//! Imagery analysis algorithms
//!
//! - Compositing: per-pixel median of cloud-masked scenes
//! - Water indices: NDWI, MNDWI, generic normalized difference
//! - Water classification: index thresholding into a binary mask

mod composite;
mod indices;
mod water;

pub use composite::{
    composite, scene_query, Composite, CompositeOutcome, CompositeParams, Season, TemporalWindow,
};
pub use indices::{mndwi, ndwi, normalized_difference, WaterIndex};
pub use water::{classify_water, threshold_index, water_index, WaterMask, WaterParams};
