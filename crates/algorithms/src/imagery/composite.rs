//! Multi-scene median compositing
//!
//! Scenes returned for a lake are filtered by date window, season and cloud
//! cover, masked per pixel (buffer, QA bits, fill), rescaled to surface
//! reflectance and merged into one per-band median image.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use glofscan_core::model::{LakePoint, SnapshotMode};
use glofscan_core::raster::{GridSpec, Raster};
use glofscan_core::source::{reflectance, Band, QaMask, Scene, SceneQuery};
use glofscan_core::{Error, Result};

/// Years of imagery around the target year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TemporalWindow {
    /// `year - years ..= year + years`
    Symmetric { years: i32 },
    /// `year - from ..= year - to`
    Retrospective { from: i32, to: i32 },
}

impl TemporalWindow {
    pub fn for_mode(mode: SnapshotMode) -> Self {
        match mode {
            SnapshotMode::Baseline => TemporalWindow::Symmetric { years: 1 },
            SnapshotMode::PreEvent => TemporalWindow::Retrospective { from: 3, to: 1 },
        }
    }

    /// First and last calendar year covered for `year`
    pub fn year_range(&self, year: i32) -> (i32, i32) {
        match *self {
            TemporalWindow::Symmetric { years } => (year - years.abs(), year + years.abs()),
            TemporalWindow::Retrospective { from, to } => {
                let (a, b) = (year - from, year - to);
                (a.min(b), a.max(b))
            }
        }
    }
}

/// Months of the year whose scenes are used, inclusive. A start month after
/// the end month wraps over the new year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    pub start_month: u32,
    pub end_month: u32,
}

impl Season {
    pub fn contains(&self, month: u32) -> bool {
        if self.start_month <= self.end_month {
            (self.start_month..=self.end_month).contains(&month)
        } else {
            month >= self.start_month || month <= self.end_month
        }
    }
}

impl Default for Season {
    /// September to November
    fn default() -> Self {
        Self {
            start_month: 9,
            end_month: 11,
        }
    }
}

/// Parameters for building a composite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeParams {
    /// Radius of the circular analysis buffer around the lake point
    pub radius_m: f64,
    pub resolution_m: f64,
    pub season: Season,
    /// Scenes above this cloud cover (percent) are skipped; `None` keeps all
    pub max_cloud_cover: Option<f64>,
    pub qa_mask: QaMask,
}

impl Default for CompositeParams {
    fn default() -> Self {
        Self {
            radius_m: 3000.0,
            resolution_m: 30.0,
            season: Season::default(),
            max_cloud_cover: Some(80.0),
            qa_mask: QaMask::default(),
        }
    }
}

/// Per-band median surface reflectance on a lake's grid.
#[derive(Debug, Clone)]
pub struct Composite {
    pub grid: GridSpec,
    pub bands: BTreeMap<Band, Raster<f64>>,
    /// Valid observations merged into each pixel
    pub observations: Raster<u16>,
    /// Scenes that contributed at least one pixel
    pub scene_ids: Vec<String>,
    /// First and last acquisition among contributing scenes
    pub date_range: (NaiveDate, NaiveDate),
}

impl Composite {
    pub fn band(&self, band: Band) -> Option<&Raster<f64>> {
        self.bands.get(&band)
    }
}

#[derive(Debug, Clone)]
pub enum CompositeOutcome {
    Composite(Composite),
    NoUsableImagery,
}

/// Build the catalog query for a lake, year and window.
pub fn scene_query(
    point: LakePoint,
    year: i32,
    window: TemporalWindow,
    params: &CompositeParams,
) -> Result<SceneQuery> {
    let grid = GridSpec::around(point.lon, point.lat, params.radius_m, params.resolution_m)?;
    let (first, last) = window.year_range(year);
    let start = NaiveDate::from_ymd_opt(first, 1, 1)
        .ok_or_else(|| Error::invalid_parameter("year", year, "outside the calendar range"))?;
    let end = NaiveDate::from_ymd_opt(last, 12, 31)
        .ok_or_else(|| Error::invalid_parameter("year", year, "outside the calendar range"))?;

    Ok(SceneQuery {
        grid,
        start,
        end,
        max_cloud_cover: params.max_cloud_cover,
    })
}

/// Merge `scenes` into a per-band median composite on the query grid.
///
/// A scene contributes only if it lies in the window and season, passes the
/// cloud-cover limit, carries every band in `bands` on the query grid, and
/// has at least one valid pixel. With no contributing scene the outcome is
/// [`CompositeOutcome::NoUsableImagery`].
pub fn composite(
    query: &SceneQuery,
    scenes: &[Scene],
    bands: &[Band],
    params: &CompositeParams,
) -> CompositeOutcome {
    let grid = &query.grid;
    let npix = grid.rows * grid.cols;
    let buffer = grid.buffer_mask();

    let mut stacks: Vec<Vec<Vec<f64>>> = vec![vec![Vec::new(); npix]; bands.len()];
    let mut used: Vec<&Scene> = Vec::new();

    for scene in scenes {
        let in_window = query.contains_date(scene.acquired);
        if !in_window || !params.season.contains(scene.acquired.month()) {
            continue;
        }
        if let (Some(max), Some(cc)) = (params.max_cloud_cover, scene.cloud_cover) {
            if cc > max {
                debug!("scene {} skipped: cloud cover {:.1}% > {:.1}%", scene.id, cc, max);
                continue;
            }
        }

        let Some(rasters) = scene_bands(scene, bands, grid) else {
            continue;
        };

        let mut valid = 0usize;
        for (idx, ((row, col), &qa)) in scene.qa.data().indexed_iter().enumerate() {
            if buffer.data()[(row, col)] == 0 || params.qa_mask.rejects(qa) {
                continue;
            }
            let values: Option<Vec<f64>> = rasters
                .iter()
                .map(|r| reflectance(r.data()[(row, col)]).filter(|v| v.is_finite()))
                .collect();
            if let Some(values) = values {
                for (stack, value) in stacks.iter_mut().zip(values) {
                    stack[idx].push(value);
                }
                valid += 1;
            }
        }

        if valid == 0 {
            debug!("scene {} has no clear pixel in the buffer", scene.id);
            continue;
        }
        debug!("scene {} contributes {} pixels", scene.id, valid);
        used.push(scene);
    }

    let (Some(first), Some(last)) = (
        used.iter().map(|s| s.acquired).min(),
        used.iter().map(|s| s.acquired).max(),
    ) else {
        debug!("no usable imagery for {}..={}", query.start, query.end);
        return CompositeOutcome::NoUsableImagery;
    };

    let mut observations = grid.raster_filled(0u16);
    if let Some(stack) = stacks.first() {
        for (cell, obs) in observations.data_mut().iter_mut().zip(stack) {
            *cell = u16::try_from(obs.len()).unwrap_or(u16::MAX);
        }
    }

    let merged = bands
        .iter()
        .zip(stacks)
        .map(|(&band, mut stack)| {
            let data: Vec<f64> = stack.par_iter_mut().map(|obs| median(obs)).collect();
            let mut raster = grid.raster_filled(f64::NAN);
            raster.set_nodata(Some(f64::NAN));
            for (cell, value) in raster.data_mut().iter_mut().zip(data) {
                *cell = value;
            }
            (band, raster)
        })
        .collect();

    CompositeOutcome::Composite(Composite {
        grid: *grid,
        bands: merged,
        observations,
        scene_ids: used.iter().map(|s| s.id.clone()).collect(),
        date_range: (first, last),
    })
}

/// The scene's rasters for `bands`, if all are present on the grid.
fn scene_bands<'a>(
    scene: &'a Scene,
    bands: &[Band],
    grid: &GridSpec,
) -> Option<Vec<&'a Raster<u16>>> {
    if scene.qa.shape() != grid.shape() {
        warn!(
            "scene {} skipped: QA grid {:?} != {:?}",
            scene.id,
            scene.qa.shape(),
            grid.shape()
        );
        return None;
    }
    let mut rasters = Vec::with_capacity(bands.len());
    for &band in bands {
        match scene.band(band) {
            Some(r) if r.shape() == grid.shape() => rasters.push(r),
            Some(r) => {
                warn!(
                    "scene {} skipped: {} grid {:?} != {:?}",
                    scene.id,
                    band,
                    r.shape(),
                    grid.shape()
                );
                return None;
            }
            None => {
                debug!(
                    "scene {} skipped: no {} band ({})",
                    scene.id,
                    band,
                    scene.sensor.band_key(band)
                );
                return None;
            }
        }
    }
    Some(rasters)
}

/// Median of the observations, NaN when there are none
fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_unstable_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glofscan_core::source::Sensor;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dn(reflectance: f64) -> u16 {
        ((reflectance + 0.2) / 0.0000275).round() as u16
    }

    fn make_scene(grid: &GridSpec, id: &str, acquired: NaiveDate, green: f64, qa: u16) -> Scene {
        let mut bands = BTreeMap::new();
        bands.insert("SR_B3".to_string(), grid.raster_filled(dn(green)));
        bands.insert("SR_B5".to_string(), grid.raster_filled(dn(0.05)));
        Scene {
            id: id.to_string(),
            acquired,
            sensor: Sensor::Landsat8,
            cloud_cover: Some(10.0),
            bands,
            qa: grid.raster_filled(qa),
        }
    }

    fn query(grid: GridSpec) -> SceneQuery {
        SceneQuery {
            grid,
            start: date(2014, 1, 1),
            end: date(2016, 12, 31),
            max_cloud_cover: Some(80.0),
        }
    }

    const BANDS: [Band; 2] = [Band::Green, Band::Nir];

    #[test]
    fn test_windows() {
        let baseline = TemporalWindow::for_mode(SnapshotMode::Baseline);
        let pre_event = TemporalWindow::for_mode(SnapshotMode::PreEvent);
        assert_eq!(baseline.year_range(2015), (2014, 2016));
        assert_eq!(pre_event.year_range(2015), (2012, 2014));
    }

    #[test]
    fn test_season_wraps() {
        assert!(Season::default().contains(10));
        assert!(!Season::default().contains(12));
        let winter = Season { start_month: 11, end_month: 2 };
        assert!(winter.contains(1) && winter.contains(12));
        assert!(!winter.contains(6));
    }

    #[test]
    fn test_scene_query() {
        let params = CompositeParams::default();
        let window = TemporalWindow::Symmetric { years: 1 };
        let q = scene_query(LakePoint::new(86.9, 28.5), 2015, window, &params).unwrap();
        assert_eq!(q.start, date(2014, 1, 1));
        assert_eq!(q.end, date(2016, 12, 31));
        assert_eq!(q.grid.shape(), (200, 200));
    }

    #[test]
    fn test_median_of_scenes() {
        let grid = GridSpec::around(86.9, 28.5, 150.0, 30.0).unwrap();
        let scenes = vec![
            make_scene(&grid, "a", date(2015, 9, 10), 0.10, 0),
            make_scene(&grid, "b", date(2015, 10, 10), 0.30, 0),
            make_scene(&grid, "c", date(2014, 11, 1), 0.20, 0),
            // Outside the season
            make_scene(&grid, "d", date(2015, 6, 1), 0.90, 0),
        ];

        let outcome = composite(&query(grid), &scenes, &BANDS, &CompositeParams::default());
        let CompositeOutcome::Composite(c) = outcome else {
            panic!("expected a composite");
        };
        assert_eq!(c.scene_ids, vec!["a", "b", "c"]);
        assert_eq!(c.date_range, (date(2014, 11, 1), date(2015, 10, 10)));

        let center = grid.rows / 2;
        let green = c.band(Band::Green).unwrap();
        assert_relative_eq!(green.get(center, center).unwrap(), 0.20, epsilon = 1e-4);
        assert_eq!(c.observations.get(center, center).unwrap(), 3);
        // Corner cells lie outside the circular buffer
        assert!(green.get(0, 0).unwrap().is_nan());
        assert_eq!(c.observations.get(0, 0).unwrap(), 0);
    }

    #[test]
    fn test_clouded_scenes_yield_no_imagery() {
        let grid = GridSpec::around(86.9, 28.5, 150.0, 30.0).unwrap();
        let scenes = vec![
            make_scene(&grid, "a", date(2015, 9, 10), 0.10, QaMask::CLOUD),
            make_scene(&grid, "b", date(2015, 10, 10), 0.10, QaMask::SNOW | QaMask::DILATED_CLOUD),
        ];
        assert!(matches!(
            composite(&query(grid), &scenes, &BANDS, &CompositeParams::default()),
            CompositeOutcome::NoUsableImagery
        ));
    }

    #[test]
    fn test_cloud_cover_and_missing_band() {
        let grid = GridSpec::around(86.9, 28.5, 150.0, 30.0).unwrap();
        let mut cloudy = make_scene(&grid, "cloudy", date(2015, 9, 10), 0.10, 0);
        cloudy.cloud_cover = Some(95.0);
        let mut no_nir = make_scene(&grid, "no-nir", date(2015, 9, 12), 0.10, 0);
        no_nir.bands.remove("SR_B5");

        let scenes = vec![cloudy, no_nir];
        assert!(matches!(
            composite(&query(grid), &scenes, &BANDS, &CompositeParams::default()),
            CompositeOutcome::NoUsableImagery
        ));

        let params = CompositeParams {
            max_cloud_cover: None,
            ..CompositeParams::default()
        };
        assert!(matches!(
            composite(&query(grid), &scenes, &BANDS, &params),
            CompositeOutcome::Composite(_)
        ));
    }

    #[test]
    fn test_band_keys_follow_sensor() {
        let grid = GridSpec::around(86.9, 28.5, 90.0, 30.0).unwrap();
        let mut bands = BTreeMap::new();
        bands.insert("SR_B2".to_string(), grid.raster_filled(dn(0.25)));
        bands.insert("SR_B4".to_string(), grid.raster_filled(dn(0.05)));
        let tm = Scene {
            id: "LT05".into(),
            acquired: date(2015, 10, 1),
            sensor: Sensor::Landsat5,
            cloud_cover: None,
            bands,
            qa: grid.raster_filled(0),
        };

        let outcome = composite(&query(grid), &[tm], &BANDS, &CompositeParams::default());
        let CompositeOutcome::Composite(c) = outcome else {
            panic!("expected a composite");
        };
        let green = c.band(Band::Green).unwrap();
        assert_relative_eq!(green.get(3, 3).unwrap(), 0.25, epsilon = 1e-4);
    }

    #[test]
    fn test_median() {
        assert!(median(&mut []).is_nan());
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&mut [4.0, 1.0, 2.0, 3.0]), 2.5);
    }
}
