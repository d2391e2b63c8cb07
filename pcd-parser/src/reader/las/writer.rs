//! Minimal LAS 1.2 writer for synthetic files.
//!
//! Coordinates go through the inverse of the scale/offset transform,
//! `stored = round((real - offset) / scale)`, so a file built from values
//! that sit on the scale grid decodes back to the same values.

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt as _};

use pcd_core::error::{FormatError, Result};
use pcd_core::pointcloud::header::PointRecordFormat;
use pcd_core::pointcloud::point::{BoundingVolume, CloudPoint};

use super::decoder::CLASSIFICATION_OFFSET;
use super::header::{LEGACY_HEADER_SIZE, SIGNATURE};

const GENERATING_SOFTWARE: &str = "pcd-parser";

#[derive(Debug, Clone)]
pub struct LasBuilder {
    pub scale: [f64; 3],
    pub offset: [f64; 3],
    pub record_format: PointRecordFormat,
    pub record_length: u16,
}

impl LasBuilder {
    pub fn new(scale: [f64; 3], offset: [f64; 3]) -> Self {
        Self {
            scale,
            offset,
            record_format: PointRecordFormat::Format0,
            record_length: PointRecordFormat::Format0.min_record_length(),
        }
    }

    pub fn record_format(mut self, record_format: PointRecordFormat) -> Self {
        self.record_format = record_format;
        self.record_length = record_format.min_record_length();
        self
    }

    /// Pads every record to `record_length` bytes, e.g. to emulate extra bytes.
    pub fn record_length(mut self, record_length: u16) -> Self {
        self.record_length = record_length;
        self
    }

    fn encode_axis(&self, axis: usize, value: f64) -> Result<i32> {
        let stored = ((value - self.offset[axis]) / self.scale[axis]).round();
        if !stored.is_finite() || stored < i32::MIN as f64 || stored > i32::MAX as f64 {
            return Err(FormatError::CoordinateOutOfRange {
                axis: ['x', 'y', 'z'][axis],
                value,
                scale: self.scale[axis],
                offset: self.offset[axis],
            }
            .into());
        }
        Ok(stored as i32)
    }

    fn write_header<W: Write>(&self, w: &mut W, points: &[CloudPoint]) -> Result<()> {
        let mut bounds = BoundingVolume::empty();
        for p in points {
            bounds.extend(p.x, p.y, p.z);
        }
        if bounds.is_empty() {
            bounds = BoundingVolume::default();
        }
        let point_count = u32::try_from(points.len()).map_err(|_| {
            pcd_core::error::Error::InvalidConfig(format!(
                "{} points do not fit a legacy point count",
                points.len()
            ))
        })?;

        w.write_all(SIGNATURE)?;
        // file source id, global encoding
        w.write_u16::<LittleEndian>(0)?;
        w.write_u16::<LittleEndian>(0)?;
        // project id (guid)
        w.write_all(&[0u8; 16])?;
        // version 1.2
        w.write_u8(1)?;
        w.write_u8(2)?;
        // system identifier
        w.write_all(&[0u8; 32])?;
        let mut software = [0u8; 32];
        software[..GENERATING_SOFTWARE.len()].copy_from_slice(GENERATING_SOFTWARE.as_bytes());
        w.write_all(&software)?;
        // creation day of year, year
        w.write_u16::<LittleEndian>(1)?;
        w.write_u16::<LittleEndian>(2025)?;
        w.write_u16::<LittleEndian>(LEGACY_HEADER_SIZE as u16)?;
        w.write_u32::<LittleEndian>(LEGACY_HEADER_SIZE as u32)?;
        // no variable length records
        w.write_u32::<LittleEndian>(0)?;
        w.write_u8(self.record_format.code())?;
        w.write_u16::<LittleEndian>(self.record_length)?;
        w.write_u32::<LittleEndian>(point_count)?;
        // points by return, everything is a first return
        w.write_u32::<LittleEndian>(point_count)?;
        for _ in 0..4 {
            w.write_u32::<LittleEndian>(0)?;
        }
        for v in self.scale.iter().chain(self.offset.iter()) {
            w.write_f64::<LittleEndian>(*v)?;
        }
        for axis in 0..3 {
            w.write_f64::<LittleEndian>(bounds.max[axis])?;
            w.write_f64::<LittleEndian>(bounds.min[axis])?;
        }
        Ok(())
    }

    fn write_record<W: Write>(&self, w: &mut W, point: &CloudPoint) -> Result<()> {
        w.write_i32::<LittleEndian>(self.encode_axis(0, point.x)?)?;
        w.write_i32::<LittleEndian>(self.encode_axis(1, point.y)?)?;
        w.write_i32::<LittleEndian>(self.encode_axis(2, point.z)?)?;
        // intensity
        w.write_u16::<LittleEndian>(0)?;
        // return 1 of 1
        w.write_u8(0b0000_1001)?;
        w.write_u8(point.classification)?;
        // scan angle rank, user data, point source id
        w.write_i8(0)?;
        w.write_u8(0)?;
        w.write_u16::<LittleEndian>(0)?;

        let padding = self.record_length as usize - (CLASSIFICATION_OFFSET + 5);
        w.write_all(&vec![0u8; padding])?;
        Ok(())
    }

    /// Writes a complete file: header followed by one record per point.
    pub fn write<W: Write>(&self, w: &mut W, points: &[CloudPoint]) -> Result<()> {
        if self.record_length < self.record_format.min_record_length() {
            return Err(FormatError::RecordLengthTooShort {
                format: self.record_format.code(),
                length: self.record_length,
                minimum: self.record_format.min_record_length(),
            }
            .into());
        }
        self.write_header(w, points)?;
        for point in points {
            self.write_record(w, point)?;
        }
        Ok(())
    }

    pub fn build(&self, points: &[CloudPoint]) -> Result<Vec<u8>> {
        let mut bytes =
            Vec::with_capacity(LEGACY_HEADER_SIZE + points.len() * self.record_length as usize);
        self.write(&mut bytes, points)?;
        Ok(bytes)
    }
}
