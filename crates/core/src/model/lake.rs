use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use geo_types::{Coord, Polygon};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Location of a lake in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LakePoint {
    pub lon: f64,
    pub lat: f64,
}

impl LakePoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn coord(&self) -> Coord<f64> {
        Coord { x: self.lon, y: self.lat }
    }
}

impl fmt::Display for LakePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lon, self.lat)
    }
}

/// Temporal window a snapshot draws its imagery from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SnapshotMode {
    /// Imagery from the year before to the year after the target year
    #[default]
    Baseline,
    /// Imagery from three years to one year before the target year
    PreEvent,
}

impl fmt::Display for SnapshotMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SnapshotMode::Baseline => "baseline",
            SnapshotMode::PreEvent => "pre-event",
        })
    }
}

impl FromStr for SnapshotMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "baseline" => Ok(SnapshotMode::Baseline),
            "pre-event" | "pre_event" | "preevent" => Ok(SnapshotMode::PreEvent),
            other => Err(Error::invalid_parameter(
                "mode",
                other,
                "expected 'baseline' or 'pre-event'",
            )),
        }
    }
}

/// A delineated lake outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LakePolygon {
    /// Outline in WGS84 degrees; exterior counter-clockwise, holes clockwise
    pub geometry: Polygon<f64>,
    /// Planar area in hectares, measured in the lake's local metric frame
    pub area_ha: f64,
    /// First and last day of the imagery window the outline came from
    pub date_range: (NaiveDate, NaiveDate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotFoundReason {
    /// No scene contributed a usable pixel
    NoUsableImagery,
    /// Imagery was usable but no water body passed the noise floor
    NoWater,
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NotFoundReason::NoUsableImagery => "no_usable_imagery",
            NotFoundReason::NoWater => "no_water",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Detection {
    Found(LakePolygon),
    NotFound(NotFoundReason),
}

impl Detection {
    pub fn polygon(&self) -> Option<&LakePolygon> {
        match self {
            Detection::Found(polygon) => Some(polygon),
            Detection::NotFound(_) => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Detection::Found(_))
    }
}

impl fmt::Display for Detection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Detection::Found(_) => f.write_str("found"),
            Detection::NotFound(reason) => reason.fmt(f),
        }
    }
}

/// Result of delineating one lake for one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LakeSnapshot {
    pub point: LakePoint,
    pub year: i32,
    pub mode: SnapshotMode,
    pub detection: Detection,
}

impl LakeSnapshot {
    pub fn area_ha(&self) -> Option<f64> {
        self.detection.polygon().map(|p| p.area_ha)
    }

    pub fn polygon(&self) -> Option<&LakePolygon> {
        self.detection.polygon()
    }
}

/// Area change of a lake between two snapshots.
///
/// `area_t1` belongs to the earlier snapshot (`year - years_span`) and
/// `area_t2` to the later one (`year`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpansionRecord {
    pub point: LakePoint,
    pub year: i32,
    pub years_span: i32,
    pub area_t1: Option<f64>,
    pub area_t2: Option<f64>,
    pub rate_ha_per_year: Option<f64>,
}
