//! Lake-to-glacier contact, distance and slope
//!
//! Candidates come from an envelope query on the inventory and are then
//! filtered by exact boundary distance. Every glacier touching the lake is
//! reported; without contact only the nearest glacier is.

use geo::{Coord, Intersects};
use serde::{Deserialize, Serialize};
use tracing::debug;

use glofscan_core::model::{GlacierMetrics, GlacierPolygon, LakePoint, LakePolygon};
use glofscan_core::source::{DataSources, SourceError};
use glofscan_core::vector::BoundingBox;
use glofscan_core::{Error, LocalProjection, Result};

use crate::vector::{centroid, distance_m, interior_point};

/// Parameters for the glacier search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProximityParams {
    /// Search radius around the lake outline (metres)
    pub buffer_m: f64,
}

impl Default for ProximityParams {
    fn default() -> Self {
        Self { buffer_m: 50_000.0 }
    }
}

struct Candidate<'a> {
    glacier: &'a GlacierPolygon,
    distance_m: f64,
    touching: bool,
}

/// Contact and distance metrics between `lake` and the inventory glaciers
/// within `params.buffer_m` of it.
pub fn glacier_proximity(
    sources: &DataSources,
    point: LakePoint,
    lake: &LakePolygon,
    params: &ProximityParams,
) -> Result<GlacierMetrics> {
    if !params.buffer_m.is_finite() || params.buffer_m < 0.0 {
        return Err(Error::invalid_parameter(
            "buffer_m",
            params.buffer_m,
            "must be a finite non-negative distance",
        ));
    }

    let Some(envelope) = BoundingBox::of_polygon(&lake.geometry) else {
        debug!("{}: empty lake outline", point);
        return Ok(GlacierMetrics::no_candidates(point));
    };
    let search = envelope.expand_meters(params.buffer_m);

    let glaciers = match sources.query_glaciers(&search) {
        Ok(glaciers) => glaciers,
        Err(SourceError::Unavailable(msg)) => {
            debug!("{}: glacier inventory unavailable: {}", point, msg);
            return Ok(GlacierMetrics::no_candidates(point));
        }
        Err(e) => return Err(e.into()),
    };

    let (cx, cy) = envelope.center();
    let proj = LocalProjection::new(cx, cy);

    let candidates: Vec<Candidate> = glaciers
        .iter()
        .filter_map(|glacier| {
            let touching = lake.geometry.intersects(&glacier.geometry);
            let distance_m = if touching {
                0.0
            } else {
                distance_m(&lake.geometry, &glacier.geometry, &proj)
            };
            (distance_m <= params.buffer_m).then_some(Candidate {
                glacier,
                distance_m,
                touching,
            })
        })
        .collect();

    debug!(
        "{}: {} of {} glaciers within {} m",
        point,
        candidates.len(),
        glaciers.len(),
        params.buffer_m
    );

    let touching: Vec<&Candidate> = candidates.iter().filter(|c| c.touching).collect();

    let mut metrics = GlacierMetrics::no_candidates(point);
    let matched = if !touching.is_empty() {
        metrics.contact = true;
        metrics.nearest_distance_m = Some(0.0);
        metrics.touching_glacier_area_ha =
            Some(touching.iter().map(|c| c.glacier.area_ha()).sum());
        for c in &touching {
            if !metrics.candidate_glacier_ids.contains(&c.glacier.id) {
                metrics.candidate_glacier_ids.push(c.glacier.id.clone());
            }
        }
        metrics.touching_glacier_count = metrics.candidate_glacier_ids.len();
        touching
            .iter()
            .max_by(|a, b| a.glacier.area_km2.total_cmp(&b.glacier.area_km2))
            .map(|c| c.glacier)
    } else {
        let nearest = candidates
            .iter()
            .min_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
        if let Some(c) = nearest {
            metrics.nearest_distance_m = Some(c.distance_m);
            metrics.touching_glacier_area_ha = Some(c.glacier.area_ha());
            metrics.candidate_glacier_ids = vec![c.glacier.id.clone()];
        }
        nearest.map(|c| c.glacier)
    };

    let Some(glacier) = matched else {
        return Ok(metrics);
    };
    metrics.nearest_glacier_id = Some(glacier.id.clone());

    let (lake_elev_m, glacier_elev_m) = sample_elevations(sources, lake, glacier)?;
    metrics.lake_elev_m = lake_elev_m;
    metrics.glacier_elev_m = glacier_elev_m.or(glacier.mean_elevation_m);

    metrics.slope = match (metrics.lake_elev_m, metrics.glacier_elev_m, metrics.nearest_distance_m) {
        (Some(lake), Some(glacier), Some(d)) if d > 0.0 => Some((glacier - lake) / d),
        _ => None,
    };

    Ok(metrics)
}

/// DEM values at the lake centroid and at a point inside the glacier
fn sample_elevations(
    sources: &DataSources,
    lake: &LakePolygon,
    glacier: &GlacierPolygon,
) -> Result<(Option<f64>, Option<f64>)> {
    let lake_at = centroid(&lake.geometry).map(|p| p.0);
    let glacier_at = interior_point(&glacier.geometry).map(|p| p.0);

    let points: Vec<Coord<f64>> = [lake_at, glacier_at].into_iter().flatten().collect();
    if points.is_empty() {
        return Ok((None, None));
    }

    let values = match sources.query_elevation(&points) {
        Ok(values) => values,
        Err(SourceError::Unavailable(msg)) => {
            debug!("elevation unavailable: {}", msg);
            return Ok((None, None));
        }
        Err(e) => return Err(e.into()),
    };

    let mut values = values.into_iter();
    let lake_elev = lake_at.and_then(|_| values.next().flatten());
    let glacier_elev = glacier_at.and_then(|_| values.next().flatten());
    Ok((lake_elev, glacier_elev))
}
