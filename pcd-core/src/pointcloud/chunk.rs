use serde::Serialize;

/// One contiguous run of point records, processed as a single unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChunkDescriptor {
    /// Position of the chunk in the plan.
    pub index: usize,
    /// Index of the first point record in the chunk.
    pub first_point: u64,
    pub byte_start: u64,
    pub byte_length: u64,
    pub point_count: u32,
}

impl ChunkDescriptor {
    pub fn byte_end(&self) -> u64 {
        self.byte_start + self.byte_length
    }

    pub fn point_range(&self) -> std::ops::Range<u64> {
        self.first_point..self.first_point + self.point_count as u64
    }
}
