//! Water mask to polygon conversion
//!
//! Water pixels are grouped into 4-connected regions. Each region's pixel
//! edges are traced into closed rings on the pixel-corner lattice, oriented
//! with the water on the left: counter-clockwise rings are exteriors,
//! clockwise rings are holes. Pixels touching only at a corner belong to
//! different regions and never share a ring.

use std::collections::HashMap;

use geo::{Contains, Coord, LineString, Point, Polygon};
use serde::{Deserialize, Serialize};
use tracing::debug;

use glofscan_core::model::LakePoint;
use glofscan_core::{LocalProjection, Raster};

use super::measurements::{area_ha, point_distance_m};

/// Lattice vertex `(col, row)`: the top-left corner of pixel `(col, row)`
type Vertex = (usize, usize);
type Edge = (Vertex, Vertex);

/// Which polygon represents the lake
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// The largest polygon in the buffer
    #[default]
    Largest,
    /// The polygon closest to the lake point; ties go to the larger one
    NearestToPoint,
}

/// Parameters for vectorization
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizeParams {
    /// Polygons smaller than this (hectares) are noise
    pub min_area_ha: f64,
    pub selection: Selection,
}

impl Default for VectorizeParams {
    fn default() -> Self {
        Self {
            min_area_ha: 0.5,
            selection: Selection::Largest,
        }
    }
}

/// A polygonized water region.
#[derive(Debug, Clone, PartialEq)]
pub struct WaterBody {
    /// WGS84 outline
    pub geometry: Polygon<f64>,
    pub area_ha: f64,
}

/// Convert every water region of `mask` into polygons.
///
/// A region yields one polygon per exterior ring; holes are attached to the
/// exterior that encloses them. No area filter is applied.
pub fn polygonize(mask: &Raster<u8>, proj: &LocalProjection) -> Vec<WaterBody> {
    let (labels, count) = label_regions(mask);
    let (rows, cols) = mask.shape();

    let mut bodies = Vec::new();
    for label in 1..=count {
        let rings = trace_rings(&labels, rows, cols, label);

        let (exteriors, holes): (Vec<_>, Vec<_>) =
            rings.into_iter().partition(|ring| signed_area(ring) > 0.0);

        let mut polygons: Vec<(LineString<f64>, Vec<LineString<f64>>)> = exteriors
            .iter()
            .map(|ring| (lattice_ring(ring), Vec::new()))
            .collect();

        for hole in &holes {
            let probe = edge_midpoint(hole);
            let owner = polygons
                .iter()
                .enumerate()
                .filter(|(_, (ext, _))| Polygon::new(ext.clone(), vec![]).contains(&probe))
                .min_by(|(_, (a, _)), (_, (b, _))| ring_area(a).total_cmp(&ring_area(b)))
                .map(|(i, _)| i);
            if let Some(i) = owner {
                polygons[i].1.push(lattice_ring(hole));
            }
        }

        let transform = mask.transform();
        let to_geo = |ls: &LineString<f64>| -> LineString<f64> {
            ls.coords()
                .map(|c| {
                    let (x, y) = transform.pixel_to_geo_corner(c.x as usize, (-c.y) as usize);
                    Coord { x, y }
                })
                .collect()
        };

        for (exterior, interiors) in polygons {
            let geometry = Polygon::new(to_geo(&exterior), interiors.iter().map(to_geo).collect());
            let area = area_ha(&geometry, proj);
            bodies.push(WaterBody {
                geometry,
                area_ha: area,
            });
        }
    }

    bodies
}

/// Polygonize `mask`, drop polygons below the noise floor and pick the lake.
///
/// `None` when no polygon qualifies.
pub fn vectorize(
    mask: &Raster<u8>,
    proj: &LocalProjection,
    point: LakePoint,
    params: &VectorizeParams,
) -> Option<WaterBody> {
    let bodies: Vec<WaterBody> = polygonize(mask, proj)
        .into_iter()
        .filter(|b| b.area_ha >= params.min_area_ha)
        .collect();
    debug!(
        "{} water polygons at or above {} ha",
        bodies.len(),
        params.min_area_ha
    );

    match params.selection {
        Selection::Largest => bodies
            .into_iter()
            .max_by(|a, b| a.area_ha.total_cmp(&b.area_ha)),
        Selection::NearestToPoint => {
            let p = Point::from(point.coord());
            bodies
                .into_iter()
                .map(|b| (point_distance_m(p, &b.geometry, proj), b))
                .min_by(|(da, a), (db, b)| {
                    da.total_cmp(db).then(b.area_ha.total_cmp(&a.area_ha))
                })
                .map(|(_, b)| b)
        }
    }
}

/// Label 4-connected water regions. Returns per-pixel labels (0 = land) and
/// the number of regions.
fn label_regions(mask: &Raster<u8>) -> (Vec<u32>, u32) {
    let (rows, cols) = mask.shape();
    let data = mask.data();
    let mut labels = vec![0u32; rows * cols];
    let mut count = 0;

    for r in 0..rows {
        for c in 0..cols {
            if data[(r, c)] == 1 && labels[r * cols + c] == 0 {
                count += 1;
                flood_fill(mask, &mut labels, r, c, count);
            }
        }
    }

    (labels, count)
}

fn flood_fill(mask: &Raster<u8>, labels: &mut [u32], r: usize, c: usize, label: u32) {
    let (rows, cols) = mask.shape();
    let data = mask.data();
    let mut stack = vec![(r, c)];

    while let Some((cr, cc)) = stack.pop() {
        let idx = cr * cols + cc;
        if labels[idx] != 0 || data[(cr, cc)] != 1 {
            continue;
        }

        labels[idx] = label;

        // 4-connected neighbors
        if cr > 0 { stack.push((cr - 1, cc)); }
        if cr + 1 < rows { stack.push((cr + 1, cc)); }
        if cc > 0 { stack.push((cr, cc - 1)); }
        if cc + 1 < cols { stack.push((cr, cc + 1)); }
    }
}

/// Directed boundary edges of one region, water on the left (y up).
fn boundary_edges(labels: &[u32], rows: usize, cols: usize, label: u32) -> Vec<Edge> {
    let inside = |r: isize, c: isize| {
        r >= 0
            && c >= 0
            && (r as usize) < rows
            && (c as usize) < cols
            && labels[r as usize * cols + c as usize] == label
    };

    let mut edges = Vec::new();
    for r in 0..rows {
        for c in 0..cols {
            if labels[r * cols + c] != label {
                continue;
            }
            let (ri, ci) = (r as isize, c as isize);
            if !inside(ri + 1, ci) {
                edges.push(((c, r + 1), (c + 1, r + 1)));
            }
            if !inside(ri, ci + 1) {
                edges.push(((c + 1, r + 1), (c + 1, r)));
            }
            if !inside(ri - 1, ci) {
                edges.push(((c + 1, r), (c, r)));
            }
            if !inside(ri, ci - 1) {
                edges.push(((c, r), (c, r + 1)));
            }
        }
    }
    edges
}

/// Direction of an edge as a y-up vector
fn direction((from, to): Edge) -> (isize, isize) {
    (
        to.0 as isize - from.0 as isize,
        -(to.1 as isize - from.1 as isize),
    )
}

/// Trace the boundary edges of one region into closed vertex rings.
///
/// At a vertex with two outgoing edges the leftmost turn wins, which keeps
/// diagonal neighbours apart. Rings that pass a vertex twice are split there,
/// so a hole touching the outside at one corner stays a hole.
fn trace_rings(labels: &[u32], rows: usize, cols: usize, label: u32) -> Vec<Vec<Vertex>> {
    let edges = boundary_edges(labels, rows, cols, label);
    let mut outgoing: HashMap<Vertex, Vec<Vertex>> = HashMap::new();
    for &(from, to) in &edges {
        outgoing.entry(from).or_default().push(to);
    }

    let next_edge = |edge: Edge| -> Option<Edge> {
        let (ix, iy) = direction(edge);
        outgoing
            .get(&edge.1)?
            .iter()
            .map(|&to| (edge.1, to))
            .max_by_key(|&out| {
                let (ox, oy) = direction(out);
                ix * oy - iy * ox
            })
    };

    let mut used: HashMap<Edge, bool> = edges.iter().map(|&e| (e, false)).collect();
    let mut rings = Vec::new();

    for &start in &edges {
        if used.get(&start).copied().unwrap_or(true) {
            continue;
        }
        let mut ring = Vec::new();
        let mut edge = start;
        loop {
            used.insert(edge, true);
            ring.push(edge.0);
            match next_edge(edge) {
                Some(next) if next != start => edge = next,
                _ => break,
            }
        }
        rings.extend(split_at_pinches(ring).into_iter().map(simplify_collinear));
    }

    rings
}

/// Split a closed vertex sequence into loops that visit each vertex once.
fn split_at_pinches(ring: Vec<Vertex>) -> Vec<Vec<Vertex>> {
    let mut loops = Vec::new();
    let mut path: Vec<Vertex> = Vec::with_capacity(ring.len());
    let mut seen: HashMap<Vertex, usize> = HashMap::new();

    for v in ring {
        match seen.get(&v) {
            Some(&i) => {
                let mut closed = vec![v];
                closed.extend(path.drain(i + 1..));
                for u in &closed[1..] {
                    seen.remove(u);
                }
                loops.push(closed);
            }
            None => {
                seen.insert(v, path.len());
                path.push(v);
            }
        }
    }

    loops.push(path);
    loops
}

/// Drop vertices where the boundary runs straight through.
fn simplify_collinear(ring: Vec<Vertex>) -> Vec<Vertex> {
    let n = ring.len();
    if n < 4 {
        return ring;
    }
    (0..n)
        .filter(|&i| {
            let prev = ring[(i + n - 1) % n];
            let next = ring[(i + 1) % n];
            direction((prev, ring[i])) != direction((ring[i], next))
        })
        .map(|i| ring[i])
        .collect()
}

/// Shoelace area in y-up lattice units; positive for counter-clockwise rings
fn signed_area(ring: &[Vertex]) -> f64 {
    let n = ring.len();
    let twice: isize = (0..n)
        .map(|i| {
            let (x0, y0) = (ring[i].0 as isize, -(ring[i].1 as isize));
            let (x1, y1) = (ring[(i + 1) % n].0 as isize, -(ring[(i + 1) % n].1 as isize));
            x0 * y1 - x1 * y0
        })
        .sum();
    twice as f64 / 2.0
}

/// Ring in y-up lattice coordinates (`y = -row`)
fn lattice_ring(ring: &[Vertex]) -> LineString<f64> {
    ring.iter()
        .map(|&(c, r)| Coord {
            x: c as f64,
            y: -(r as f64),
        })
        .collect()
}

fn ring_area(ring: &LineString<f64>) -> f64 {
    use geo::Area;
    Polygon::new(ring.clone(), vec![]).unsigned_area()
}

/// Midpoint of a ring's first edge, never on another ring of the region
fn edge_midpoint(ring: &[Vertex]) -> Point<f64> {
    let a = ring[0];
    let b = ring[1 % ring.len()];
    Point::new(
        (a.0 + b.0) as f64 / 2.0,
        -((a.1 + b.1) as f64 / 2.0),
    )
}
