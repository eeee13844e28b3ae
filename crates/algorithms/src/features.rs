//! Merge per-lake results into one feature record

use glofscan_core::model::{ExpansionRecord, FeatureRecord, GlacierMetrics, LakeSnapshot};
use glofscan_core::{Error, Result};

/// Expansion spans a feature record has a slot for
pub const EXPANSION_SPANS: [i32; 2] = [5, 10];

/// Combine a snapshot with its expansion records and glacier metrics.
///
/// Every input must describe the snapshot's point, and expansion records its
/// year. Each record goes to the slot of its span; a span without a slot or
/// given twice is rejected.
pub fn aggregate(
    snapshot: LakeSnapshot,
    expansions: Vec<ExpansionRecord>,
    glacier: Option<GlacierMetrics>,
) -> Result<FeatureRecord> {
    let key = format!("{} {}", snapshot.point, snapshot.year);

    let mut expansion_5y = None;
    let mut expansion_10y = None;
    for record in expansions {
        if record.point != snapshot.point || record.year != snapshot.year {
            return Err(Error::KeyMismatch {
                expected: key,
                found: format!("{} {}", record.point, record.year),
            });
        }
        let slot = match record.years_span {
            5 => &mut expansion_5y,
            10 => &mut expansion_10y,
            span => {
                return Err(Error::invalid_parameter(
                    "years_span",
                    span,
                    "expected a 5 or 10 year span",
                ))
            }
        };
        if slot.is_some() {
            return Err(Error::invalid_parameter(
                "years_span",
                record.years_span,
                "span given more than once",
            ));
        }
        *slot = Some(record);
    }

    if let Some(metrics) = &glacier {
        if metrics.point != snapshot.point {
            return Err(Error::KeyMismatch {
                expected: snapshot.point.to_string(),
                found: metrics.point.to_string(),
            });
        }
    }

    Ok(FeatureRecord {
        snapshot,
        expansion_5y,
        expansion_10y,
        glacier,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use geo::polygon;
    use glofscan_core::model::{Detection, LakePoint, LakePolygon, SnapshotMode};

    const POINT: LakePoint = LakePoint { lon: 86.9, lat: 28.5 };

    fn make_snapshot() -> LakeSnapshot {
        let day = NaiveDate::from_ymd_opt(2015, 10, 1).unwrap();
        LakeSnapshot {
            point: POINT,
            year: 2015,
            mode: SnapshotMode::Baseline,
            detection: Detection::Found(LakePolygon {
                geometry: polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)],
                area_ha: 12.5,
                date_range: (day, day),
            }),
        }
    }

    fn make_expansion(point: LakePoint, span: i32, rate: f64) -> ExpansionRecord {
        ExpansionRecord {
            point,
            year: 2015,
            years_span: span,
            area_t1: Some(12.5 - rate * span as f64),
            area_t2: Some(12.5),
            rate_ha_per_year: Some(rate),
        }
    }

    fn make_contact(point: LakePoint) -> GlacierMetrics {
        GlacierMetrics {
            contact: true,
            nearest_distance_m: Some(0.0),
            touching_glacier_count: 1,
            ..GlacierMetrics::no_candidates(point)
        }
    }

    #[test]
    fn test_values_pass_through() {
        let record = aggregate(
            make_snapshot(),
            vec![make_expansion(POINT, 5, 1.1)],
            Some(make_contact(POINT)),
        )
        .unwrap();

        assert_relative_eq!(record.snapshot.area_ha().unwrap(), 12.5);
        assert_relative_eq!(record.expansion_5y.as_ref().unwrap().rate_ha_per_year.unwrap(), 1.1);
        assert!(record.expansion_10y.is_none());
        let glacier = record.glacier.as_ref().unwrap();
        assert!(glacier.contact);
        assert_eq!(glacier.nearest_distance_m, Some(0.0));
        assert_eq!(record.missing_fields(), vec!["expansion_10y", "lake_elevation", "glacier_elevation"]);
    }

    #[test]
    fn test_routes_by_span() {
        let record = aggregate(
            make_snapshot(),
            vec![make_expansion(POINT, 10, 0.2), make_expansion(POINT, 5, 0.4)],
            None,
        )
        .unwrap();
        assert_eq!(record.expansion_5y.unwrap().years_span, 5);
        assert_eq!(record.expansion_10y.unwrap().years_span, 10);
    }

    #[test]
    fn test_key_mismatch() {
        let other = LakePoint::new(90.0, 30.0);
        assert!(matches!(
            aggregate(make_snapshot(), vec![make_expansion(other, 5, 1.0)], None),
            Err(Error::KeyMismatch { .. })
        ));
        assert!(matches!(
            aggregate(make_snapshot(), Vec::new(), Some(make_contact(other))),
            Err(Error::KeyMismatch { .. })
        ));
    }

    #[test]
    fn test_bad_spans() {
        assert!(matches!(
            aggregate(make_snapshot(), vec![make_expansion(POINT, 3, 1.0)], None),
            Err(Error::InvalidParameter { .. })
        ));
        assert!(matches!(
            aggregate(
                make_snapshot(),
                vec![make_expansion(POINT, 5, 1.0), make_expansion(POINT, 5, 2.0)],
                None
            ),
            Err(Error::InvalidParameter { .. })
        ));
    }
}
