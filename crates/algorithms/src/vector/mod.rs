//! Vector operations on lake and glacier outlines
//!
//! - Vectorize: water mask to WGS84 polygons
//! - Measurements: area, distance and centroid in a local metric plane

mod measurements;
mod vectorize;

pub use measurements::{area_ha, centroid, distance_m, interior_point, point_distance_m};
pub use vectorize::{polygonize, vectorize, Selection, VectorizeParams, WaterBody};
