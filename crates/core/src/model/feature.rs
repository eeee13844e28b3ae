use serde::{Deserialize, Serialize};

use super::{ExpansionRecord, GlacierMetrics, LakePoint, LakeSnapshot};

/// The feature vector of one lake for one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub snapshot: LakeSnapshot,
    pub expansion_5y: Option<ExpansionRecord>,
    pub expansion_10y: Option<ExpansionRecord>,
    /// Absent when no lake outline was found
    pub glacier: Option<GlacierMetrics>,
}

impl FeatureRecord {
    pub fn point(&self) -> LakePoint {
        self.snapshot.point
    }

    pub fn year(&self) -> i32 {
        self.snapshot.year
    }

    /// Names of the features that could not be derived.
    ///
    /// Slope is expected to be absent for a lake in contact with a glacier and
    /// is not reported then.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.snapshot.area_ha().is_none() {
            missing.push("lake_area");
        }
        let rate = |e: &Option<ExpansionRecord>| e.as_ref().and_then(|e| e.rate_ha_per_year);
        if rate(&self.expansion_5y).is_none() {
            missing.push("expansion_5y");
        }
        if rate(&self.expansion_10y).is_none() {
            missing.push("expansion_10y");
        }
        match &self.glacier {
            None => missing.push("glacier"),
            Some(g) => {
                if g.nearest_distance_m.is_none() {
                    missing.push("nearest_glacier_distance");
                }
                if g.lake_elev_m.is_none() {
                    missing.push("lake_elevation");
                }
                if g.glacier_elev_m.is_none() {
                    missing.push("glacier_elevation");
                }
                if g.slope.is_none() && !g.contact {
                    missing.push("slope");
                }
            }
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}
