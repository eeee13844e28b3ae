//! Domain model: lake points and snapshots, glaciers, and the per-lake
//! feature record handed to the risk classifier.
//!
//! Every derived numeric field is an `Option`; a value that could not be
//! derived is `None`, never zero.

mod feature;
mod glacier;
mod lake;

pub use feature::FeatureRecord;
pub use glacier::{GlacierMetrics, GlacierPolygon};
pub use lake::{
    Detection, ExpansionRecord, LakePoint, LakePolygon, LakeSnapshot, NotFoundReason,
    SnapshotMode,
};
