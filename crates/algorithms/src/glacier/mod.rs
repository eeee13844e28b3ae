//! Glacier proximity analysis

mod proximity;

pub use proximity::{glacier_proximity, ProximityParams};
