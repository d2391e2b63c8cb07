use std::fs::File;
use std::io::BufReader;

use pcd_parser::reader::{
    las::{plan_chunks, read_header, ChunkDecoder, LasChunkReader, RecordLayout},
    ChunkReader as _,
};

fn main() {
    let path = std::env::args()
        .nth(1)
        .expect("usage: read_header <file.las>");
    let mut file = BufReader::new(File::open(&path).unwrap());
    let header = read_header(&mut file).unwrap();

    println!("LAS {}.{}", header.version.0, header.version.1);
    println!("Number of points: {}", header.point_count);
    println!(
        "Record format: {:?} ({} bytes)",
        header.record_format, header.record_length
    );
    println!("Bounds: {:?}", header.bounds);

    let chunks = plan_chunks(&header, 100_000).unwrap();
    let Some(first) = chunks.first() else {
        return;
    };
    let mut reader = LasChunkReader::new(file);
    let bytes = reader.read_chunk(first).unwrap();
    let decoder = ChunkDecoder::new(RecordLayout::from(&header), None);
    let points = decoder.decode(&bytes, first).unwrap();

    println!("Chunks: {}", chunks.len());
    println!("First point: {:?}", points[0]);
}
