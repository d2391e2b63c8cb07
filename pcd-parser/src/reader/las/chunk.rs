use std::io::{Read, Seek, SeekFrom};

use pcd_core::error::{Error, Result};
use pcd_core::pointcloud::chunk::ChunkDescriptor;
use pcd_core::pointcloud::header::PointCloudHeader;

use crate::reader::ChunkReader;

/// Splits the point data block into contiguous chunks of at most
/// `max_chunk_points` records, in file order.
#[derive(Debug, Clone)]
pub struct ChunkPlanner {
    point_data_offset: u64,
    record_length: u64,
    point_count: u64,
    max_chunk_points: u32,
    next_point: u64,
    next_index: usize,
}

impl ChunkPlanner {
    pub fn new(header: &PointCloudHeader, max_chunk_points: u32) -> Result<Self> {
        if max_chunk_points == 0 {
            return Err(Error::InvalidConfig(
                "maximum chunk point count must be positive".to_string(),
            ));
        }
        Ok(Self {
            point_data_offset: header.point_data_offset as u64,
            record_length: header.record_length as u64,
            point_count: header.point_count as u64,
            max_chunk_points,
            next_point: 0,
            next_index: 0,
        })
    }

    pub fn chunk_count(&self) -> usize {
        self.point_count.div_ceil(self.max_chunk_points as u64) as usize
    }
}

impl Iterator for ChunkPlanner {
    type Item = ChunkDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_point >= self.point_count {
            return None;
        }

        let point_count = (self.point_count - self.next_point).min(self.max_chunk_points as u64);
        let chunk = ChunkDescriptor {
            index: self.next_index,
            first_point: self.next_point,
            byte_start: self.point_data_offset + self.next_point * self.record_length,
            byte_length: point_count * self.record_length,
            point_count: point_count as u32,
        };

        self.next_point += point_count;
        self.next_index += 1;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.chunk_count() - self.next_index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ChunkPlanner {}

pub fn plan_chunks(header: &PointCloudHeader, max_chunk_points: u32) -> Result<Vec<ChunkDescriptor>> {
    Ok(ChunkPlanner::new(header, max_chunk_points)?.collect())
}

/// Reads chunk byte ranges from a seekable source, such as an open LAS file.
pub struct LasChunkReader<R> {
    inner: R,
}

impl<R: Read + Seek> LasChunkReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Seek> ChunkReader for LasChunkReader<R> {
    fn read_chunk(&mut self, chunk: &ChunkDescriptor) -> Result<Vec<u8>> {
        self.inner.seek(SeekFrom::Start(chunk.byte_start))?;

        // A short read is left for the decoder to report against the chunk.
        let mut buffer = Vec::with_capacity(chunk.byte_length as usize);
        self.inner
            .by_ref()
            .take(chunk.byte_length)
            .read_to_end(&mut buffer)?;
        Ok(buffer)
    }
}
