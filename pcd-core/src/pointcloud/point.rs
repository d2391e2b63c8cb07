use serde::Serialize;

/// Classification code of terrain surface returns.
pub const GROUND_CLASSIFICATION: u8 = 2;

// LAS data coordinates are expressed as i32 values
// The actual coordinates are calculated based on a combination of scale and offset, as follows
// x = (x * scale[0]) + offset[0]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CloudPoint {
    /// Position of the record within the point data block.
    pub index: u64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub classification: u8,
}

impl CloudPoint {
    pub fn is_class(&self, class: u8) -> bool {
        self.classification == class
    }
}

// This represents the maximum and minimum values of the original coordinate values obtained by combining the scale and offset.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoundingVolume {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl BoundingVolume {
    pub fn empty() -> Self {
        Self {
            min: [f64::MAX, f64::MAX, f64::MAX],
            max: [f64::MIN, f64::MIN, f64::MIN],
        }
    }

    pub fn extend(&mut self, x: f64, y: f64, z: f64) {
        self.max[0] = self.max[0].max(x);
        self.max[1] = self.max[1].max(y);
        self.max[2] = self.max[2].max(z);
        self.min[0] = self.min[0].min(x);
        self.min[1] = self.min[1].min(y);
        self.min[2] = self.min[2].min(z);
    }

    pub fn is_empty(&self) -> bool {
        self.min[0] > self.max[0]
    }
}
