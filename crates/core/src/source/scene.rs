use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::raster::{GridSpec, Raster};

/// Collection 2 Level-2 surface reflectance scale factor
pub const REFLECTANCE_SCALE: f64 = 0.0000275;
/// Collection 2 Level-2 surface reflectance offset
pub const REFLECTANCE_OFFSET: f64 = -0.2;

/// Spectral band, independent of sensor numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Blue,
    Green,
    Red,
    Nir,
    Swir1,
}

impl Band {
    pub const ALL: [Band; 5] = [Band::Blue, Band::Green, Band::Red, Band::Nir, Band::Swir1];
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Band::Blue => "blue",
            Band::Green => "green",
            Band::Red => "red",
            Band::Nir => "nir",
            Band::Swir1 => "swir1",
        })
    }
}

/// Landsat sensor that acquired a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sensor {
    /// Landsat 5 TM
    #[serde(rename = "landsat-5")]
    Landsat5,
    /// Landsat 7 ETM+
    #[serde(rename = "landsat-7")]
    Landsat7,
    /// Landsat 8 OLI
    #[serde(rename = "landsat-8")]
    Landsat8,
    /// Landsat 9 OLI-2
    #[serde(rename = "landsat-9")]
    Landsat9,
}

impl Sensor {
    pub const ALL: [Sensor; 4] = [
        Sensor::Landsat5,
        Sensor::Landsat7,
        Sensor::Landsat8,
        Sensor::Landsat9,
    ];

    /// Collection 2 Level-2 band name of `band` on this sensor
    pub fn band_key(&self, band: Band) -> &'static str {
        match self {
            Sensor::Landsat5 | Sensor::Landsat7 => match band {
                Band::Blue => "SR_B1",
                Band::Green => "SR_B2",
                Band::Red => "SR_B3",
                Band::Nir => "SR_B4",
                Band::Swir1 => "SR_B5",
            },
            Sensor::Landsat8 | Sensor::Landsat9 => match band {
                Band::Blue => "SR_B2",
                Band::Green => "SR_B3",
                Band::Red => "SR_B4",
                Band::Nir => "SR_B5",
                Band::Swir1 => "SR_B6",
            },
        }
    }

    /// STAC `platform` value
    pub fn platform(&self) -> &'static str {
        match self {
            Sensor::Landsat5 => "landsat-5",
            Sensor::Landsat7 => "landsat-7",
            Sensor::Landsat8 => "landsat-8",
            Sensor::Landsat9 => "landsat-9",
        }
    }

    /// Parse `landsat-8`, `LANDSAT_8`, `L8` and similar spellings.
    pub fn from_platform(platform: &str) -> Option<Self> {
        let digits: String = platform.chars().filter(|c| c.is_ascii_digit()).collect();
        match digits.as_str() {
            "5" => Some(Sensor::Landsat5),
            "7" => Some(Sensor::Landsat7),
            "8" => Some(Sensor::Landsat8),
            "9" => Some(Sensor::Landsat9),
            _ => None,
        }
    }
}

/// QA_PIXEL bits that make a pixel unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QaMask(pub u16);

impl QaMask {
    pub const FILL: u16 = 1 << 0;
    pub const DILATED_CLOUD: u16 = 1 << 1;
    pub const CLOUD: u16 = 1 << 3;
    pub const CLOUD_SHADOW: u16 = 1 << 4;
    pub const SNOW: u16 = 1 << 5;

    /// Whether a pixel with this QA value must be discarded
    pub fn rejects(&self, qa: u16) -> bool {
        qa & self.0 != 0
    }
}

impl Default for QaMask {
    fn default() -> Self {
        QaMask(Self::FILL | Self::DILATED_CLOUD | Self::CLOUD | Self::CLOUD_SHADOW | Self::SNOW)
    }
}

/// Rescale a Level-2 digital number to surface reflectance; DN 0 is fill.
pub fn reflectance(dn: u16) -> Option<f64> {
    (dn != 0).then(|| dn as f64 * REFLECTANCE_SCALE + REFLECTANCE_OFFSET)
}

/// One acquisition, resampled onto the grid of the query that returned it.
#[derive(Debug, Clone)]
pub struct Scene {
    pub id: String,
    pub acquired: NaiveDate,
    pub sensor: Sensor,
    /// Scene-level cloud cover in percent
    pub cloud_cover: Option<f64>,
    /// Digital numbers keyed by sensor band name (`SR_B3`, ...)
    pub bands: BTreeMap<String, Raster<u16>>,
    pub qa: Raster<u16>,
}

impl Scene {
    pub fn band(&self, band: Band) -> Option<&Raster<u16>> {
        self.bands.get(self.sensor.band_key(band))
    }
}

/// Request for the scenes covering a grid within a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneQuery {
    pub grid: GridSpec,
    pub start: NaiveDate,
    /// Inclusive
    pub end: NaiveDate,
    /// Catalogs may use this to prefilter; the compositor applies it again
    pub max_cloud_cover: Option<f64>,
}

impl SceneQuery {
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}
