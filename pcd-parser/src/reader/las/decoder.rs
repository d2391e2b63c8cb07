use byteorder::{ByteOrder as _, LittleEndian};

use pcd_core::error::DecodeError;
use pcd_core::pointcloud::chunk::ChunkDescriptor;
use pcd_core::pointcloud::header::PointCloudHeader;
use pcd_core::pointcloud::point::CloudPoint;

/// Offset of the classification byte inside a format 0-3 record.
pub const CLASSIFICATION_OFFSET: usize = 15;

/// The low five bits hold the class, the rest are synthetic/key-point/withheld flags.
pub const CLASSIFICATION_MASK: u8 = 0b0001_1111;

/// Header constants needed to turn record bytes into coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordLayout {
    pub record_length: u16,
    pub scale: [f64; 3],
    pub offset: [f64; 3],
}

impl From<&PointCloudHeader> for RecordLayout {
    fn from(header: &PointCloudHeader) -> Self {
        Self {
            record_length: header.record_length,
            scale: header.scale,
            offset: header.offset,
        }
    }
}

impl RecordLayout {
    fn decode_record(&self, index: u64, record: &[u8]) -> CloudPoint {
        let xi = LittleEndian::read_i32(&record[0..4]);
        let yi = LittleEndian::read_i32(&record[4..8]);
        let zi = LittleEndian::read_i32(&record[8..12]);

        CloudPoint {
            index,
            x: xi as f64 * self.scale[0] + self.offset[0],
            y: yi as f64 * self.scale[1] + self.offset[1],
            z: zi as f64 * self.scale[2] + self.offset[2],
            classification: record[CLASSIFICATION_OFFSET] & CLASSIFICATION_MASK,
        }
    }
}

/// Decodes the records of one chunk, optionally keeping a single class.
#[derive(Debug, Clone, Copy)]
pub struct ChunkDecoder {
    pub layout: RecordLayout,
    pub class: Option<u8>,
}

impl ChunkDecoder {
    pub fn new(layout: RecordLayout, class: Option<u8>) -> Self {
        Self { layout, class }
    }

    pub fn decode(
        &self,
        bytes: &[u8],
        chunk: &ChunkDescriptor,
    ) -> Result<Vec<CloudPoint>, DecodeError> {
        let record_length = self.layout.record_length as usize;
        let expected = chunk.point_count as u64 * record_length as u64;
        if bytes.len() as u64 != expected || chunk.byte_length != expected {
            return Err(DecodeError {
                chunk: chunk.index,
                byte_start: chunk.byte_start,
                expected,
                actual: bytes.len() as u64,
            });
        }

        let points = bytes
            .chunks_exact(record_length)
            .zip(chunk.point_range())
            .map(|(record, index)| self.layout.decode_record(index, record))
            .filter(|p| self.class.map_or(true, |class| p.is_class(class)))
            .collect();

        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use byteorder::ByteOrder;
    use pcd_core::pointcloud::header::PointRecordFormat;

    use super::*;
    use crate::reader::las::header::{parse_header, LEGACY_HEADER_SIZE};
    use crate::reader::las::writer::LasBuilder;

    fn point(index: u64, x: f64, y: f64, z: f64, classification: u8) -> CloudPoint {
        CloudPoint {
            index,
            x,
            y,
            z,
            classification,
        }
    }

    fn whole_file_chunk(header: &PointCloudHeader) -> ChunkDescriptor {
        ChunkDescriptor {
            index: 0,
            first_point: 0,
            byte_start: header.point_data_offset as u64,
            byte_length: header.point_data_length(),
            point_count: header.point_count,
        }
    }

    #[test]
    fn decodes_scaled_ground_point() {
        let bytes = LasBuilder::new([0.01, 0.01, 0.01], [0.0, 0.0, 0.0])
            .build(&[point(0, 10.0, 20.0, 5.0, 2)])
            .unwrap();
        // stored integers are (1000, 2000, 500)
        let record = &bytes[LEGACY_HEADER_SIZE..];
        assert_eq!(LittleEndian::read_i32(&record[0..4]), 1000);
        assert_eq!(LittleEndian::read_i32(&record[4..8]), 2000);
        assert_eq!(LittleEndian::read_i32(&record[8..12]), 500);

        let header = parse_header(&bytes, bytes.len() as u64).unwrap();
        let decoder = ChunkDecoder::new(RecordLayout::from(&header), Some(2));
        let points = decoder.decode(record, &whole_file_chunk(&header)).unwrap();

        assert_eq!(points, vec![point(0, 10.0, 20.0, 5.0, 2)]);
    }

    #[test]
    fn round_trips_through_scale_and_offset() {
        let scale = [0.001, 0.001, 0.01];
        let offset = [500_000.0, 300_000.0, -10.0];
        // values built from stored integers, so the inverse transform is exact
        let expected: Vec<CloudPoint> = (0..50)
            .map(|i| {
                let (xi, yi, zi) = (i * 37 - 900, i * 11 + 4, i * 3 - 70);
                point(
                    i as u64,
                    xi as f64 * scale[0] + offset[0],
                    yi as f64 * scale[1] + offset[1],
                    zi as f64 * scale[2] + offset[2],
                    (i % 3) as u8 + 1,
                )
            })
            .collect();

        for format in [
            PointRecordFormat::Format0,
            PointRecordFormat::Format1,
            PointRecordFormat::Format2,
            PointRecordFormat::Format3,
        ] {
            let bytes = LasBuilder::new(scale, offset)
                .record_format(format)
                .build(&expected)
                .unwrap();
            let header = parse_header(&bytes, bytes.len() as u64).unwrap();
            let decoder = ChunkDecoder::new(RecordLayout::from(&header), None);
            let decoded = decoder
                .decode(
                    &bytes[header.point_data_offset as usize..],
                    &whole_file_chunk(&header),
                )
                .unwrap();
            assert_eq!(decoded, expected, "format {:?}", format);
        }
    }

    #[test]
    fn keeps_only_requested_class() {
        let points = vec![
            point(0, 1.0, 1.0, 1.0, 1),
            point(1, 2.0, 2.0, 2.0, 2),
            point(2, 3.0, 3.0, 3.0, 6),
            point(3, 4.0, 4.0, 4.0, 2),
        ];
        let bytes = LasBuilder::new([0.01; 3], [0.0; 3])
            .build(&points)
            .unwrap();
        let header = parse_header(&bytes, bytes.len() as u64).unwrap();
        let decoder = ChunkDecoder::new(RecordLayout::from(&header), Some(2));
        let ground = decoder
            .decode(&bytes[LEGACY_HEADER_SIZE..], &whole_file_chunk(&header))
            .unwrap();

        assert_eq!(ground.len(), 2);
        assert_eq!(ground[0].index, 1);
        assert_eq!(ground[1].index, 3);
    }

    #[test]
    fn ignores_classification_flag_bits() {
        // synthetic + withheld flags on top of class 2
        let points = vec![point(0, 1.0, 1.0, 1.0, 0b1010_0010)];
        let bytes = LasBuilder::new([0.01; 3], [0.0; 3])
            .build(&points)
            .unwrap();
        let header = parse_header(&bytes, bytes.len() as u64).unwrap();
        let decoder = ChunkDecoder::new(RecordLayout::from(&header), Some(2));
        let ground = decoder
            .decode(&bytes[LEGACY_HEADER_SIZE..], &whole_file_chunk(&header))
            .unwrap();

        assert_eq!(ground.len(), 1);
        assert_eq!(ground[0].classification, 2);
    }

    #[test]
    fn honours_padded_record_length() {
        let points = vec![point(0, 1.0, 2.0, 3.0, 2), point(1, 4.0, 5.0, 6.0, 2)];
        let bytes = LasBuilder::new([0.5; 3], [0.0; 3])
            .record_length(32)
            .build(&points)
            .unwrap();
        let header = parse_header(&bytes, bytes.len() as u64).unwrap();
        assert_eq!(header.record_length, 32);

        let decoder = ChunkDecoder::new(RecordLayout::from(&header), None);
        let decoded = decoder
            .decode(&bytes[LEGACY_HEADER_SIZE..], &whole_file_chunk(&header))
            .unwrap();
        assert_eq!(decoded, points);
    }

    #[test]
    fn rejects_length_mismatch() {
        let layout = RecordLayout {
            record_length: 20,
            scale: [1.0; 3],
            offset: [0.0; 3],
        };
        let chunk = ChunkDescriptor {
            index: 4,
            first_point: 10,
            byte_start: 427,
            byte_length: 60,
            point_count: 3,
        };
        let err = ChunkDecoder::new(layout, Some(2))
            .decode(&[0u8; 59], &chunk)
            .unwrap_err();

        assert_eq!(
            err,
            DecodeError {
                chunk: 4,
                byte_start: 427,
                expected: 60,
                actual: 59,
            }
        );
    }
}
