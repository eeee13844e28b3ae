//! Lake delineation and area change
//!
//! - Snapshot: composite, classify and vectorize one lake for one year
//! - Expansion: area change rate between two snapshots

mod expansion;
mod snapshot;

pub use expansion::expansion_rate;
pub use snapshot::{snapshot, SnapshotParams};
