use serde::Serialize;

/// Dense identifier assigned in ingestion order, `0..n`.
pub type SurveyId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SurveyPoint {
    pub id: SurveyId,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}
