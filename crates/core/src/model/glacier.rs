use geo_types::Polygon;
use serde::{Deserialize, Serialize};

use super::LakePoint;

/// One outline from the glacier inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlacierPolygon {
    pub id: String,
    /// Outline in WGS84 degrees
    pub geometry: Polygon<f64>,
    pub area_km2: f64,
    pub mean_elevation_m: Option<f64>,
}

impl GlacierPolygon {
    pub fn area_ha(&self) -> f64 {
        self.area_km2 * 100.0
    }
}

/// Contact, distance and topographic metrics between a lake and nearby glaciers.
///
/// `touching_glacier_count` is the number of glaciers intersecting the lake.
/// With contact, the area and ids cover every touching glacier; without it
/// they describe only the nearest one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlacierMetrics {
    pub point: LakePoint,
    pub contact: bool,
    pub nearest_distance_m: Option<f64>,
    pub lake_elev_m: Option<f64>,
    pub glacier_elev_m: Option<f64>,
    /// Rise from lake to glacier per metre of horizontal distance
    pub slope: Option<f64>,
    pub touching_glacier_count: usize,
    pub touching_glacier_area_ha: Option<f64>,
    pub candidate_glacier_ids: Vec<String>,
    pub nearest_glacier_id: Option<String>,
}

impl GlacierMetrics {
    /// Metrics for a lake with no glacier inside the search buffer
    pub fn no_candidates(point: LakePoint) -> Self {
        Self {
            point,
            contact: false,
            nearest_distance_m: None,
            lake_elev_m: None,
            glacier_elev_m: None,
            slope: None,
            touching_glacier_count: 0,
            touching_glacier_area_ha: None,
            candidate_glacier_ids: Vec::new(),
            nearest_glacier_id: None,
        }
    }
}
