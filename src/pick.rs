use crate::types::Record;
use crate::viewport::Viewport;
use rstar::{RTree, RTreeObject, AABB};

// Wrapper for RTree indexing
pub struct IndexedRecord {
    index: usize,
    position: [f64; 2],
}

impl RTreeObject for IndexedRecord {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

/// Spatial index over record positions, used to resolve screen clicks in points mode.
pub struct PointIndex {
    tree: RTree<IndexedRecord>,
}

impl PointIndex {
    pub fn build(records: &[Record]) -> Self {
        let items: Vec<IndexedRecord> = records
            .iter()
            .enumerate()
            .map(|(index, record)| IndexedRecord {
                index,
                position: record.position(),
            })
            .collect();

        Self {
            tree: RTree::bulk_load(items),
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Index of the record drawn under `(screen_x, screen_y)`, if any.
    ///
    /// A record is hit when its projected centre lies within `radius` pixels of the
    /// click. Among several hits the closest wins; on a tie the later-drawn record does.
    pub fn pick(
        &self,
        viewport: &Viewport,
        screen_x: f64,
        screen_y: f64,
        radius: f64,
    ) -> Option<usize> {
        if !(screen_x.is_finite() && screen_y.is_finite() && radius.is_finite()) {
            return None;
        }

        // Search envelope: the lon/lat box covering the click's pixel neighbourhood
        let corners = [
            viewport.unproject(screen_x - radius, screen_y - radius),
            viewport.unproject(screen_x + radius, screen_y - radius),
            viewport.unproject(screen_x - radius, screen_y + radius),
            viewport.unproject(screen_x + radius, screen_y + radius),
        ];
        let (mut min, mut max) = ([f64::INFINITY; 2], [f64::NEG_INFINITY; 2]);
        for (lon, lat) in corners {
            min = [min[0].min(lon), min[1].min(lat)];
            max = [max[0].max(lon), max[1].max(lat)];
        }
        let envelope = AABB::from_corners(min, max);

        let mut best: Option<(usize, f64)> = None;
        for candidate in self.tree.locate_in_envelope_intersecting(&envelope) {
            let (x, y) = viewport.project(candidate.position[0], candidate.position[1]);
            let distance = (x - screen_x).hypot(y - screen_y);
            if !(distance <= radius) {
                continue;
            }
            best = match best {
                Some((index, d))
                    if d < distance || (d == distance && index > candidate.index) =>
                {
                    Some((index, d))
                }
                _ => Some((candidate.index, distance)),
            };
        }

        best.map(|(index, _)| index)
    }
}
