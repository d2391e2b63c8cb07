use serde::Serialize;

use crate::pointcloud::point::CloudPoint;
use crate::survey::SurveyId;

/// A cloud point that fell within the search radius of a survey point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchCandidate {
    pub survey_id: SurveyId,
    pub distance: f64,
    pub cloud: MatchedPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchedPoint {
    pub index: u64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<&CloudPoint> for MatchedPoint {
    fn from(p: &CloudPoint) -> Self {
        Self {
            index: p.index,
            x: p.x,
            y: p.y,
            z: p.z,
        }
    }
}

/// Best match seen so far for one survey point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchResult {
    pub best_distance: f64,
    pub best: Option<MatchedPoint>,
}

impl Default for MatchResult {
    fn default() -> Self {
        Self {
            best_distance: f64::INFINITY,
            best: None,
        }
    }
}

impl MatchResult {
    pub fn best_cloud_z(&self) -> Option<f64> {
        self.best.map(|p| p.z)
    }

    pub fn is_found(&self) -> bool {
        self.best.is_some()
    }

    /// Whether `candidate` should replace the current best.
    ///
    /// Exact ties go to the cloud point that comes first in the file, which is
    /// the first one seen when chunks are processed in order.
    pub fn is_improved_by(&self, candidate: &MatchCandidate) -> bool {
        if candidate.distance < self.best_distance {
            return true;
        }
        match self.best {
            Some(best) => {
                candidate.distance == self.best_distance && candidate.cloud.index < best.index
            }
            None => false,
        }
    }
}

/// Counters collected while the chunks of one run are processed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStats {
    pub chunks: usize,
    pub points: u64,
    pub ground_points: u64,
    pub candidates: u64,
}
