use rstar::{RTree, RTreeObject, AABB};

use crate::model::GlacierPolygon;
use crate::source::{GlacierInventory, SourceResult};
use crate::vector::BoundingBox;

#[derive(Debug, Clone)]
struct GlacierEntry {
    idx: usize,
    env: AABB<[f64; 2]>,
}

impl RTreeObject for GlacierEntry {
    type Envelope = AABB<[f64; 2]>;

    #[inline]
    fn envelope(&self) -> Self::Envelope {
        self.env
    }
}

/// In-memory glacier inventory indexed by envelope.
#[derive(Debug, Clone)]
pub struct GlacierIndex {
    glaciers: Vec<GlacierPolygon>,
    tree: RTree<GlacierEntry>,
}

impl GlacierIndex {
    pub fn new(glaciers: Vec<GlacierPolygon>) -> Self {
        let entries = glaciers
            .iter()
            .enumerate()
            .filter_map(|(idx, g)| {
                let bbox = BoundingBox::of_polygon(&g.geometry)?;
                Some(GlacierEntry {
                    idx,
                    env: AABB::from_corners([bbox.min_x, bbox.min_y], [bbox.max_x, bbox.max_y]),
                })
            })
            .collect();

        Self {
            glaciers,
            tree: RTree::bulk_load(entries),
        }
    }

    pub fn len(&self) -> usize {
        self.glaciers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glaciers.is_empty()
    }

    /// Glaciers whose envelope intersects `bbox`, in inventory order
    pub fn intersecting(&self, bbox: &BoundingBox) -> Vec<&GlacierPolygon> {
        let query = AABB::from_corners([bbox.min_x, bbox.min_y], [bbox.max_x, bbox.max_y]);
        let mut hits: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&query)
            .map(|e| e.idx)
            .collect();
        hits.sort_unstable();
        hits.into_iter().map(|i| &self.glaciers[i]).collect()
    }
}

impl GlacierInventory for GlacierIndex {
    fn query_glaciers(&self, bbox: &BoundingBox) -> SourceResult<Vec<GlacierPolygon>> {
        Ok(self.intersecting(bbox).into_iter().cloned().collect())
    }
}
