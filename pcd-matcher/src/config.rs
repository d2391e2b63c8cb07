use pcd_core::error::{Error, Result};
use pcd_core::pointcloud::point::GROUND_CLASSIFICATION;

pub const DEFAULT_RADIUS: f64 = 0.2;
pub const DEFAULT_MAX_CHUNK_POINTS: u32 = 200_000;

#[derive(Debug, Clone, PartialEq)]
pub struct MatchConfig {
    /// Search radius in the point cloud's real-world units.
    pub radius: f64,
    pub max_chunk_points: u32,
    /// Fixed for the whole run.
    pub workers: usize,
    pub ground_class: u8,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            max_chunk_points: DEFAULT_MAX_CHUNK_POINTS,
            workers: num_cpus::get(),
            ground_class: GROUND_CLASSIFICATION,
        }
    }
}

impl MatchConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "radius must be a positive number, got {}",
                self.radius
            )));
        }
        if self.max_chunk_points == 0 {
            return Err(Error::InvalidConfig(
                "maximum chunk point count must be positive".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(Error::InvalidConfig(
                "worker count must be positive".to_string(),
            ));
        }
        if self.ground_class > 31 {
            return Err(Error::InvalidConfig(format!(
                "classification {} does not fit the 5-bit class field",
                self.ground_class
            )));
        }
        Ok(())
    }
}
