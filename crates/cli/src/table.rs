//! Lake list input and feature table output (CSV)

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use glofscan_algorithms::pipeline::{LakeFailure, LakeRequest};
use glofscan_core::model::{FeatureRecord, SnapshotMode};

#[derive(Debug, Deserialize)]
struct LakeRow {
    #[serde(alias = "Longitude", alias = "lon")]
    longitude: f64,
    #[serde(alias = "Latitude", alias = "lat")]
    latitude: f64,
    #[serde(alias = "Year")]
    year: i32,
    #[serde(default)]
    mode: Option<String>,
}

/// Read lakes from a CSV with `longitude, latitude, year` and an optional `mode`.
pub fn read_lakes(path: &Path) -> Result<Vec<LakeRequest>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut lakes = Vec::new();
    for (i, row) in reader.deserialize::<LakeRow>().enumerate() {
        let row = row.with_context(|| format!("Invalid lake on line {}", i + 2))?;
        let mode: SnapshotMode = row
            .mode
            .as_deref()
            .unwrap_or_default()
            .parse()
            .with_context(|| format!("Invalid mode on line {}", i + 2))?;
        lakes.push(LakeRequest::new(row.longitude, row.latitude, row.year).with_mode(mode));
    }
    Ok(lakes)
}

/// One row of the feature table; empty cells are missing values.
#[derive(Debug, Serialize)]
struct FeatureRow {
    #[serde(rename = "Longitude")]
    longitude: f64,
    #[serde(rename = "Latitude")]
    latitude: f64,
    year: i32,
    mode: String,
    detection: String,
    #[serde(rename = "Lake_area_calculated_ha")]
    lake_area_ha: Option<f64>,
    image_start: Option<String>,
    image_end: Option<String>,
    #[serde(rename = "5y_area_t1_ha")]
    area_t1_5y: Option<f64>,
    #[serde(rename = "5y_expansion_rate")]
    rate_5y: Option<f64>,
    #[serde(rename = "10y_area_t1_ha")]
    area_t1_10y: Option<f64>,
    #[serde(rename = "10y_expansion_rate")]
    rate_10y: Option<f64>,
    glacier_contact: Option<bool>,
    nearest_glacier_dist_m: Option<f64>,
    #[serde(rename = "Elevation_m")]
    elevation_m: Option<f64>,
    glacier_elev_m: Option<f64>,
    slope: Option<f64>,
    touching_glacier_count: Option<usize>,
    glacier_area_ha: Option<f64>,
    candidate_glacier_ids: String,
    nearest_glacier_id: Option<String>,
}

impl From<&FeatureRecord> for FeatureRow {
    fn from(r: &FeatureRecord) -> Self {
        let s = &r.snapshot;
        let range = s.polygon().map(|p| p.date_range);
        let g = r.glacier.as_ref();
        Self {
            longitude: s.point.lon,
            latitude: s.point.lat,
            year: s.year,
            mode: s.mode.to_string(),
            detection: s.detection.to_string(),
            lake_area_ha: s.area_ha(),
            image_start: range.map(|(start, _)| start.to_string()),
            image_end: range.map(|(_, end)| end.to_string()),
            area_t1_5y: r.expansion_5y.as_ref().and_then(|e| e.area_t1),
            rate_5y: r.expansion_5y.as_ref().and_then(|e| e.rate_ha_per_year),
            area_t1_10y: r.expansion_10y.as_ref().and_then(|e| e.area_t1),
            rate_10y: r.expansion_10y.as_ref().and_then(|e| e.rate_ha_per_year),
            glacier_contact: g.map(|g| g.contact),
            nearest_glacier_dist_m: g.and_then(|g| g.nearest_distance_m),
            elevation_m: g.and_then(|g| g.lake_elev_m),
            glacier_elev_m: g.and_then(|g| g.glacier_elev_m),
            slope: g.and_then(|g| g.slope),
            touching_glacier_count: g.map(|g| g.touching_glacier_count),
            glacier_area_ha: g.and_then(|g| g.touching_glacier_area_ha),
            candidate_glacier_ids: g.map(|g| g.candidate_glacier_ids.join(";")).unwrap_or_default(),
            nearest_glacier_id: g.and_then(|g| g.nearest_glacier_id.clone()),
        }
    }
}

/// Write one CSV row per record.
pub fn write_features(path: &Path, records: &[FeatureRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for record in records {
        writer.serialize(FeatureRow::from(record))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the lakes that failed, with their error messages.
pub fn write_failures(path: &Path, failures: &[LakeFailure]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(["longitude", "latitude", "year", "mode", "error"])?;
    for f in failures {
        let r = &f.request;
        writer.write_record([
            r.point.lon.to_string(),
            r.point.lat.to_string(),
            r.year.to_string(),
            r.mode.to_string(),
            f.error.clone(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glofscan_core::model::{
        Detection, GlacierMetrics, LakePoint, LakeSnapshot, NotFoundReason,
    };
    use std::io::Write;

    #[test]
    fn test_read_lakes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "longitude,latitude,year,mode").unwrap();
        writeln!(file, "86.9, 28.5, 2015,").unwrap();
        writeln!(file, "90.1,27.9,2010,pre-event").unwrap();

        let lakes = read_lakes(file.path()).unwrap();
        assert_eq!(lakes.len(), 2);
        assert_eq!(lakes[0].mode, SnapshotMode::Baseline);
        assert_eq!(lakes[1].mode, SnapshotMode::PreEvent);
        assert_eq!(lakes[1].year, 2010);
    }

    #[test]
    fn test_read_lakes_without_mode_column() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Longitude,Latitude,Year").unwrap();
        writeln!(file, "86.9,28.5,2015").unwrap();

        let lakes = read_lakes(file.path()).unwrap();
        assert_eq!(lakes[0].point, LakePoint::new(86.9, 28.5));
    }

    #[test]
    fn test_bad_mode_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "longitude,latitude,year,mode").unwrap();
        writeln!(file, "86.9,28.5,2015,monsoon").unwrap();
        assert!(read_lakes(file.path()).is_err());
    }

    #[test]
    fn test_failures_keep_request() {
        let failure = LakeFailure {
            request: LakeRequest::new(200.0, 28.5, 2015),
            error: "invalid longitude".to_string(),
        };
        let file = tempfile::NamedTempFile::new().unwrap();
        write_failures(file.path(), &[failure]).unwrap();

        let text = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(text.lines().nth(1), Some("200,28.5,2015,baseline,invalid longitude"));
    }

    #[test]
    fn test_missing_values_are_empty_cells() {
        let point = LakePoint::new(86.9, 28.5);
        let record = FeatureRecord {
            snapshot: LakeSnapshot {
                point,
                year: 2015,
                mode: SnapshotMode::Baseline,
                detection: Detection::NotFound(NotFoundReason::NoUsableImagery),
            },
            expansion_5y: None,
            expansion_10y: None,
            glacier: None,
        };
        let with_glacier = FeatureRecord {
            glacier: Some(GlacierMetrics::no_candidates(point)),
            ..record.clone()
        };

        let file = tempfile::NamedTempFile::new().unwrap();
        write_features(file.path(), &[record, with_glacier]).unwrap();
        let text = std::fs::read_to_string(file.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].starts_with("Longitude,Latitude,year,mode,detection,Lake_area_calculated_ha"));
        assert_eq!(lines[1], "86.9,28.5,2015,baseline,no_usable_imagery,,,,,,,,,,,,,,,,");
        assert_eq!(lines[2], "86.9,28.5,2015,baseline,no_usable_imagery,,,,,,,,false,,,,,0,,,");
    }
}
