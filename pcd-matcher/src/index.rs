//! Spatial index over the survey points.
//!
//! Survey points are bulk loaded into an R-tree once. Nothing is mutated
//! after `build`, so the index can be shared by reference across worker
//! threads.

use std::fmt;

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use pcd_core::error::{EmptyDataset, Result};
use pcd_core::survey::{SurveyId, SurveyPoint};

/// Relative slack on the tree query so that rounding in the squared distance
/// never drops a point the exact distance test keeps.
const QUERY_SLACK: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
struct SurveyEntry {
    xy: [f64; 2],
    id: SurveyId,
}

impl RTreeObject for SurveyEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.xy)
    }
}

impl PointDistance for SurveyEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.xy[0] - point[0];
        let dy = self.xy[1] - point[1];
        dx * dx + dy * dy
    }
}

pub struct QueryIndex {
    tree: RTree<SurveyEntry>,
}

impl fmt::Debug for QueryIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryIndex")
            .field("len", &self.tree.size())
            .finish()
    }
}

#[inline]
fn planar_distance(a: &[f64; 2], b: &[f64; 2]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    (dx * dx + dy * dy).sqrt()
}

impl QueryIndex {
    pub fn build(points: &[SurveyPoint]) -> Result<Self> {
        if points.is_empty() {
            return Err(EmptyDataset::NoSurveyPoints.into());
        }

        let start = std::time::Instant::now();
        let entries: Vec<SurveyEntry> = points
            .iter()
            .map(|p| SurveyEntry {
                xy: [p.x, p.y],
                id: p.id,
            })
            .collect();
        let tree = RTree::bulk_load(entries);
        log::debug!(
            "built query index over {} survey points in {:?}",
            tree.size(),
            start.elapsed()
        );

        Ok(Self { tree })
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Calls `f(id, distance)` for every survey point whose planar distance to
    /// `(x, y)` is at most `radius`. Visiting order is unspecified.
    pub fn for_each_within<F>(&self, x: f64, y: f64, radius: f64, mut f: F)
    where
        F: FnMut(SurveyId, f64),
    {
        let query = [x, y];
        let reach = radius * (1.0 + QUERY_SLACK);

        for entry in self.tree.locate_within_distance(query, reach * reach) {
            let distance = planar_distance(&query, &entry.xy);
            if distance <= radius {
                f(entry.id, distance);
            }
        }
    }

    /// Ids of survey points within `radius` of `(x, y)`, ascending.
    pub fn within_radius(&self, x: f64, y: f64, radius: f64) -> Vec<SurveyId> {
        let mut ids = Vec::new();
        self.for_each_within(x, y, radius, |id, _| ids.push(id));
        ids.sort_unstable();
        ids
    }
}
