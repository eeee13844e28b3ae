//! Glacier inventory loading from GeoJSON (RGI / GLIMS style exports)

use std::path::Path;

use geo::Area;
use geo_types::{Coord, LineString, Polygon};
use geojson::{Feature, GeoJson, Geometry, Value};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::crs::LocalProjection;
use crate::error::{Error, Result};
use crate::model::GlacierPolygon;

const ID_KEYS: [&str; 4] = ["glac_id", "rgi_id", "RGIId", "id"];
const AREA_KEYS: [&str; 3] = ["area_km2", "Area", "db_area"];
const ELEVATION_KEYS: [&str; 3] = ["zmed_m", "Zmed", "mean_elev"];

/// Load a glacier inventory from a GeoJSON FeatureCollection file.
pub fn read_glacier_inventory<P: AsRef<Path>>(path: P) -> Result<Vec<GlacierPolygon>> {
    let text = std::fs::read_to_string(path.as_ref())?;
    let glaciers = parse_glacier_inventory(&text)?;
    debug!(
        "loaded {} glacier outlines from {}",
        glaciers.len(),
        path.as_ref().display()
    );
    Ok(glaciers)
}

/// Parse a GeoJSON FeatureCollection of glacier outlines.
///
/// Polygon and MultiPolygon features are accepted; each part of a
/// MultiPolygon becomes its own outline sharing the feature id. Features
/// without an area property get their planar area computed.
pub fn parse_glacier_inventory(text: &str) -> Result<Vec<GlacierPolygon>> {
    let geojson: GeoJson = text
        .parse()
        .map_err(|e| Error::Other(format!("invalid GeoJSON: {e}")))?;

    let GeoJson::FeatureCollection(fc) = geojson else {
        return Err(Error::Other("glacier inventory must be a FeatureCollection".into()));
    };

    let mut glaciers = Vec::with_capacity(fc.features.len());
    for (n, feature) in fc.features.iter().enumerate() {
        let id = feature_id(feature).unwrap_or_else(|| format!("glacier-{n}"));
        let parts = match &feature.geometry {
            Some(Geometry { value: Value::Polygon(rings), .. }) => vec![to_polygon(rings)],
            Some(Geometry { value: Value::MultiPolygon(polys), .. }) => {
                polys.iter().map(|rings| to_polygon(rings)).collect()
            }
            _ => {
                warn!("skipping glacier {id}: geometry is not a polygon");
                continue;
            }
        };

        let single = parts.len() == 1;
        let declared_area = number(feature, &AREA_KEYS);
        let mean_elevation_m = number(feature, &ELEVATION_KEYS);

        for geometry in parts.into_iter().flatten() {
            let area_km2 = match declared_area {
                Some(area) if single => area,
                _ => planar_area_km2(&geometry),
            };
            glaciers.push(GlacierPolygon {
                id: id.clone(),
                geometry,
                area_km2,
                mean_elevation_m,
            });
        }
    }

    Ok(glaciers)
}

fn feature_id(feature: &Feature) -> Option<String> {
    ID_KEYS
        .iter()
        .find_map(|key| match feature.property(key)? {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .or_else(|| {
            feature.id.as_ref().map(|id| match id {
                geojson::feature::Id::String(s) => s.clone(),
                geojson::feature::Id::Number(n) => n.to_string(),
            })
        })
}

fn number(feature: &Feature, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .find_map(|key| feature.property(key)?.as_f64())
        .filter(|v| v.is_finite())
}

fn to_ring(positions: &[Vec<f64>]) -> Option<LineString<f64>> {
    let coords: Vec<Coord<f64>> = positions
        .iter()
        .filter(|p| p.len() >= 2)
        .map(|p| Coord { x: p[0], y: p[1] })
        .collect();
    (coords.len() >= 4).then(|| LineString::from(coords))
}

fn to_polygon(rings: &[Vec<Vec<f64>>]) -> Option<Polygon<f64>> {
    let mut rings = rings.iter();
    let exterior = to_ring(rings.next()?)?;
    let interiors = rings.filter_map(|r| to_ring(r)).collect();
    Some(Polygon::new(exterior, interiors))
}

fn planar_area_km2(polygon: &Polygon<f64>) -> f64 {
    let Some(start) = polygon.exterior().0.first() else {
        return 0.0;
    };
    let projection = LocalProjection::new(start.x, start.y);
    projection.project_polygon(polygon).unsigned_area() / 1.0e6
}
