pub mod chunk;
pub mod decoder;
pub mod header;
pub mod writer;

pub use chunk::{plan_chunks, ChunkPlanner, LasChunkReader};
pub use decoder::{ChunkDecoder, RecordLayout};
pub use header::{parse_header, read_header};
pub use writer::LasBuilder;
