use serde::Serialize;

use crate::error::FormatError;
use crate::pointcloud::point::BoundingVolume;

/// Point data record formats whose first 20 bytes share the legacy layout
/// (X, Y, Z, intensity, flags, classification, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PointRecordFormat {
    Format0,
    Format1,
    Format2,
    Format3,
}

impl PointRecordFormat {
    pub fn code(&self) -> u8 {
        match self {
            Self::Format0 => 0,
            Self::Format1 => 1,
            Self::Format2 => 2,
            Self::Format3 => 3,
        }
    }

    /// Smallest record length the format can be stored in.
    pub fn min_record_length(&self) -> u16 {
        match self {
            Self::Format0 => 20,
            // + gps time
            Self::Format1 => 28,
            // + rgb
            Self::Format2 => 26,
            // + gps time + rgb
            Self::Format3 => 34,
        }
    }
}

impl TryFrom<u8> for PointRecordFormat {
    type Error = FormatError;

    fn try_from(format: u8) -> Result<Self, Self::Error> {
        match format {
            0 => Ok(Self::Format0),
            1 => Ok(Self::Format1),
            2 => Ok(Self::Format2),
            3 => Ok(Self::Format3),
            _ => Err(FormatError::UnsupportedRecordFormat { format }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointCloudHeader {
    pub version: (u8, u8),
    pub header_size: u16,
    pub point_count: u32,
    pub point_data_offset: u32,
    pub record_format: PointRecordFormat,
    pub record_length: u16,
    pub scale: [f64; 3],
    pub offset: [f64; 3],
    /// Extent as declared by the header, not recomputed from the records.
    pub bounds: BoundingVolume,
}

impl PointCloudHeader {
    pub fn point_data_length(&self) -> u64 {
        self.point_count as u64 * self.record_length as u64
    }

    pub fn point_data_end(&self) -> u64 {
        self.point_data_offset as u64 + self.point_data_length()
    }
}
