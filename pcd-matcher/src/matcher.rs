use pcd_core::matching::{MatchCandidate, MatchedPoint};
use pcd_core::pointcloud::point::CloudPoint;

use crate::index::QueryIndex;

/// Emits every (survey point, cloud point) pair within the radius.
///
/// Keeping the best pair is left to [`crate::merger::ResultMerger`], so a
/// matcher holds no state between chunks.
#[derive(Debug, Clone, Copy)]
pub struct NearestNeighborMatcher<'a> {
    index: &'a QueryIndex,
    radius: f64,
}

impl<'a> NearestNeighborMatcher<'a> {
    pub fn new(index: &'a QueryIndex, radius: f64) -> Self {
        Self { index, radius }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn match_point(&self, point: &CloudPoint, out: &mut Vec<MatchCandidate>) {
        let cloud = MatchedPoint::from(point);
        self.index
            .for_each_within(point.x, point.y, self.radius, |survey_id, distance| {
                out.push(MatchCandidate {
                    survey_id,
                    distance,
                    cloud,
                })
            });
    }

    pub fn match_points(&self, points: &[CloudPoint]) -> Vec<MatchCandidate> {
        let mut candidates = Vec::new();
        for point in points {
            self.match_point(point, &mut candidates);
        }
        candidates
    }
}
