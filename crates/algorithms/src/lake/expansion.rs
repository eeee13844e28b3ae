use glofscan_core::model::{ExpansionRecord, LakeSnapshot};
use glofscan_core::{Error, Result};

/// Area change per year from `earlier` to `later`.
///
/// The record is keyed by the later snapshot's year and the span is the
/// absolute year difference, so swapping the arguments negates the rate.
/// The rate is `None` when either snapshot found no lake.
pub fn expansion_rate(later: &LakeSnapshot, earlier: &LakeSnapshot) -> Result<ExpansionRecord> {
    if later.point != earlier.point {
        return Err(Error::KeyMismatch {
            expected: later.point.to_string(),
            found: earlier.point.to_string(),
        });
    }
    if later.year == earlier.year {
        return Err(Error::invalid_parameter(
            "year",
            earlier.year,
            "snapshots must come from different years",
        ));
    }

    let span = (later.year - earlier.year).abs();
    let area_t1 = earlier.area_ha();
    let area_t2 = later.area_ha();
    let rate_ha_per_year = match (area_t1, area_t2) {
        (Some(a1), Some(a2)) => Some((a2 - a1) / span as f64),
        _ => None,
    };

    Ok(ExpansionRecord {
        point: later.point,
        year: later.year,
        years_span: span,
        area_t1,
        area_t2,
        rate_ha_per_year,
    })
}
