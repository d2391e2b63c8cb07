pub mod las;

use pcd_core::error::Result;
use pcd_core::pointcloud::chunk::ChunkDescriptor;

pub trait ChunkReader {
    /// Returns the bytes of `chunk`. A source that ends early yields fewer bytes.
    fn read_chunk(&mut self, chunk: &ChunkDescriptor) -> Result<Vec<u8>>;
}
