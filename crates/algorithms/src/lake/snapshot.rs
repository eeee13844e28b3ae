//! Single-year lake delineation
//!
//! Composite → water index → threshold → vectorize. Running out of imagery
//! or water is a result, not an error.

use serde::{Deserialize, Serialize};
use tracing::debug;

use glofscan_core::model::{
    Detection, LakePoint, LakePolygon, LakeSnapshot, NotFoundReason, SnapshotMode,
};
use glofscan_core::source::{DataSources, SourceError};
use glofscan_core::Result;

use crate::imagery::{
    classify_water, composite, scene_query, CompositeOutcome, CompositeParams, TemporalWindow,
    WaterParams,
};
use crate::vector::{vectorize, VectorizeParams};

/// Parameters for delineating a lake
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotParams {
    pub composite: CompositeParams,
    pub water: WaterParams,
    pub vectorize: VectorizeParams,
}

/// Delineate the lake at `point` from the imagery window of `year` and `mode`.
///
/// A catalog with nothing for the area, a window without usable pixels and a
/// composite without water all yield [`Detection::NotFound`]. Only source
/// failures that outlast the retry policy and invalid parameters are errors.
pub fn snapshot(
    sources: &DataSources,
    point: LakePoint,
    year: i32,
    mode: SnapshotMode,
    params: &SnapshotParams,
) -> Result<LakeSnapshot> {
    let not_found = |reason| LakeSnapshot {
        point,
        year,
        mode,
        detection: Detection::NotFound(reason),
    };

    let window = TemporalWindow::for_mode(mode);
    let query = scene_query(point, year, window, &params.composite)?;

    let scenes = match sources.query_scenes(&query) {
        Ok(scenes) => scenes,
        Err(SourceError::Unavailable(msg)) => {
            debug!("{} {}: no imagery: {}", point, year, msg);
            return Ok(not_found(NotFoundReason::NoUsableImagery));
        }
        Err(e) => return Err(e.into()),
    };
    debug!("{} {} {}: {} candidate scenes", point, year, mode, scenes.len());

    let (a, b) = params.water.index.bands();
    let composite = match composite(&query, &scenes, &[a, b], &params.composite) {
        CompositeOutcome::Composite(c) => c,
        CompositeOutcome::NoUsableImagery => {
            debug!("{} {}: no usable imagery", point, year);
            return Ok(not_found(NotFoundReason::NoUsableImagery));
        }
    };

    let mask = classify_water(&composite, &params.water)?;
    let proj = composite.grid.projection();

    let Some(body) = vectorize(&mask, &proj, point, &params.vectorize) else {
        debug!("{} {}: no water body above the noise floor", point, year);
        return Ok(not_found(NotFoundReason::NoWater));
    };

    debug!("{} {}: lake of {:.2} ha", point, year, body.area_ha);
    Ok(LakeSnapshot {
        point,
        year,
        mode,
        detection: Detection::Found(LakePolygon {
            geometry: body.geometry,
            area_ha: body.area_ha,
            date_range: composite.date_range,
        }),
    })
}
