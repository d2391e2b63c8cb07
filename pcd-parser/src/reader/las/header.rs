use std::io::{Read, Seek, SeekFrom};

use byteorder::{ByteOrder as _, LittleEndian};

use pcd_core::error::{FormatError, Result};
use pcd_core::pointcloud::header::{PointCloudHeader, PointRecordFormat};
use pcd_core::pointcloud::point::BoundingVolume;

pub const SIGNATURE: &[u8; 4] = b"LASF";

/// Size of the LAS 1.0 - 1.3 public header block.
pub const LEGACY_HEADER_SIZE: usize = 227;

/// Bytes read from the start of the file, enough for a LAS 1.4 header.
pub const HEADER_WINDOW: usize = 375;

/// Byte offsets of the public header block fields.
pub mod offsets {
    pub const SIGNATURE: usize = 0;
    pub const VERSION_MAJOR: usize = 24;
    pub const VERSION_MINOR: usize = 25;
    pub const HEADER_SIZE: usize = 94;
    pub const POINT_DATA_OFFSET: usize = 96;
    pub const RECORD_FORMAT: usize = 104;
    pub const RECORD_LENGTH: usize = 105;
    pub const POINT_COUNT: usize = 107;
    pub const SCALE: usize = 131;
    pub const OFFSET: usize = 155;
    pub const MAX_X: usize = 179;
    pub const MIN_X: usize = 187;
    pub const MAX_Y: usize = 195;
    pub const MIN_Y: usize = 203;
    pub const MAX_Z: usize = 211;
    pub const MIN_Z: usize = 219;
}

fn read_f64_triple(bytes: &[u8], start: usize) -> [f64; 3] {
    [
        LittleEndian::read_f64(&bytes[start..start + 8]),
        LittleEndian::read_f64(&bytes[start + 8..start + 16]),
        LittleEndian::read_f64(&bytes[start + 16..start + 24]),
    ]
}

/// Parses the header from the first bytes of a point cloud file.
///
/// `file_size` is the size of the whole file; the declared point data block
/// must fit inside it.
pub fn parse_header(bytes: &[u8], file_size: u64) -> Result<PointCloudHeader> {
    if bytes.len() < LEGACY_HEADER_SIZE {
        return Err(FormatError::HeaderTooShort {
            required: LEGACY_HEADER_SIZE,
            actual: bytes.len(),
        }
        .into());
    }

    let mut signature = [0u8; 4];
    signature.copy_from_slice(&bytes[offsets::SIGNATURE..offsets::SIGNATURE + 4]);
    if &signature != SIGNATURE {
        return Err(FormatError::InvalidSignature { found: signature }.into());
    }

    let format_code = bytes[offsets::RECORD_FORMAT];
    let record_format = PointRecordFormat::try_from(format_code)?;

    let record_length =
        LittleEndian::read_u16(&bytes[offsets::RECORD_LENGTH..offsets::RECORD_LENGTH + 2]);
    if record_length < record_format.min_record_length() {
        return Err(FormatError::RecordLengthTooShort {
            format: format_code,
            length: record_length,
            minimum: record_format.min_record_length(),
        }
        .into());
    }

    let header_size =
        LittleEndian::read_u16(&bytes[offsets::HEADER_SIZE..offsets::HEADER_SIZE + 2]);
    if (header_size as usize) < LEGACY_HEADER_SIZE {
        return Err(FormatError::HeaderSizeTooSmall {
            header_size,
            minimum: LEGACY_HEADER_SIZE,
        }
        .into());
    }
    let point_data_offset =
        LittleEndian::read_u32(&bytes[offsets::POINT_DATA_OFFSET..offsets::POINT_DATA_OFFSET + 4]);
    if point_data_offset < header_size as u32 {
        return Err(FormatError::PointDataBeforeHeader {
            offset: point_data_offset,
            header_size,
        }
        .into());
    }

    let point_count =
        LittleEndian::read_u32(&bytes[offsets::POINT_COUNT..offsets::POINT_COUNT + 4]);

    let bounds = BoundingVolume {
        min: [
            LittleEndian::read_f64(&bytes[offsets::MIN_X..offsets::MIN_X + 8]),
            LittleEndian::read_f64(&bytes[offsets::MIN_Y..offsets::MIN_Y + 8]),
            LittleEndian::read_f64(&bytes[offsets::MIN_Z..offsets::MIN_Z + 8]),
        ],
        max: [
            LittleEndian::read_f64(&bytes[offsets::MAX_X..offsets::MAX_X + 8]),
            LittleEndian::read_f64(&bytes[offsets::MAX_Y..offsets::MAX_Y + 8]),
            LittleEndian::read_f64(&bytes[offsets::MAX_Z..offsets::MAX_Z + 8]),
        ],
    };

    let header = PointCloudHeader {
        version: (bytes[offsets::VERSION_MAJOR], bytes[offsets::VERSION_MINOR]),
        header_size,
        point_count,
        point_data_offset,
        record_format,
        record_length,
        scale: read_f64_triple(bytes, offsets::SCALE),
        offset: read_f64_triple(bytes, offsets::OFFSET),
        bounds,
    };

    if header.point_data_end() > file_size {
        return Err(FormatError::TruncatedPointData {
            point_count,
            record_length,
            offset: point_data_offset,
            expected_end: header.point_data_end(),
            file_size,
        }
        .into());
    }

    Ok(header)
}

/// Reads and validates the header of a seekable source, leaving the cursor
/// at an unspecified position.
pub fn read_header<R: Read + Seek>(reader: &mut R) -> Result<PointCloudHeader> {
    let file_size = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(0))?;

    let window = (HEADER_WINDOW as u64).min(file_size) as usize;
    let mut bytes = vec![0u8; window];
    reader.read_exact(&mut bytes)?;

    parse_header(&bytes, file_size)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use byteorder::ByteOrder;
    use pcd_core::error::Error;
    use pcd_core::pointcloud::point::CloudPoint;

    use super::*;
    use crate::reader::las::writer::LasBuilder;

    fn sample_file(points: usize) -> Vec<u8> {
        let points: Vec<CloudPoint> = (0..points)
            .map(|i| CloudPoint {
                index: i as u64,
                x: 10.0 + i as f64,
                y: 20.0,
                z: 5.0,
                classification: 2,
            })
            .collect();
        LasBuilder::new([0.01, 0.01, 0.01], [0.0, 0.0, 0.0])
            .build(&points)
            .unwrap()
    }

    fn format_error(result: Result<PointCloudHeader>) -> FormatError {
        match result {
            Err(Error::Format(e)) => e,
            other => panic!("expected format error, got {:?}", other),
        }
    }

    #[test]
    fn reads_header_fields() {
        let bytes = sample_file(3);
        let header = read_header(&mut Cursor::new(&bytes)).unwrap();

        assert_eq!(header.version, (1, 2));
        assert_eq!(header.header_size, LEGACY_HEADER_SIZE as u16);
        assert_eq!(header.point_count, 3);
        assert_eq!(header.point_data_offset, LEGACY_HEADER_SIZE as u32);
        assert_eq!(header.record_format, PointRecordFormat::Format0);
        assert_eq!(header.record_length, 20);
        assert_eq!(header.scale, [0.01, 0.01, 0.01]);
        assert_eq!(header.offset, [0.0, 0.0, 0.0]);
        assert_eq!(header.bounds.min, [10.0, 20.0, 5.0]);
        assert_eq!(header.bounds.max, [12.0, 20.0, 5.0]);
        assert_eq!(header.point_data_end(), bytes.len() as u64);
    }

    #[test]
    fn rejects_bad_signature() {
        let mut bytes = sample_file(1);
        bytes[0..4].copy_from_slice(b"LASX");
        let err = format_error(parse_header(&bytes, bytes.len() as u64));
        assert_eq!(
            err,
            FormatError::InvalidSignature {
                found: *b"LASX"
            }
        );
    }

    #[test]
    fn rejects_unsupported_record_format() {
        let mut bytes = sample_file(1);
        bytes[offsets::RECORD_FORMAT] = 6;
        let err = format_error(parse_header(&bytes, bytes.len() as u64));
        assert_eq!(err, FormatError::UnsupportedRecordFormat { format: 6 });
    }

    #[test]
    fn rejects_compressed_record_format() {
        // LAZ files set the high bit of the format byte
        let mut bytes = sample_file(1);
        bytes[offsets::RECORD_FORMAT] = 0x80 | 1;
        let err = format_error(parse_header(&bytes, bytes.len() as u64));
        assert_eq!(err, FormatError::UnsupportedRecordFormat { format: 0x81 });
    }

    #[test]
    fn rejects_short_record_length() {
        let mut bytes = sample_file(1);
        bytes[offsets::RECORD_FORMAT] = 3;
        let err = format_error(parse_header(&bytes, bytes.len() as u64));
        assert_eq!(
            err,
            FormatError::RecordLengthTooShort {
                format: 3,
                length: 20,
                minimum: 34,
            }
        );
    }

    #[test]
    fn rejects_truncated_point_data() {
        let bytes = sample_file(4);
        let truncated = &bytes[..bytes.len() - 1];
        let err = format_error(read_header(&mut Cursor::new(truncated)));
        assert_eq!(
            err,
            FormatError::TruncatedPointData {
                point_count: 4,
                record_length: 20,
                offset: LEGACY_HEADER_SIZE as u32,
                expected_end: bytes.len() as u64,
                file_size: bytes.len() as u64 - 1,
            }
        );
    }

    #[test]
    fn rejects_short_file() {
        let bytes = b"LASF".to_vec();
        let err = format_error(read_header(&mut Cursor::new(bytes)));
        assert_eq!(
            err,
            FormatError::HeaderTooShort {
                required: LEGACY_HEADER_SIZE,
                actual: 4,
            }
        );
    }

    #[test]
    fn rejects_header_size_below_legacy_header() {
        // a zero header size must not let the points start inside the real header
        let mut bytes = sample_file(1);
        LittleEndian::write_u16(&mut bytes[offsets::HEADER_SIZE..], 0);
        LittleEndian::write_u32(&mut bytes[offsets::POINT_DATA_OFFSET..], 100);
        let err = format_error(parse_header(&bytes, bytes.len() as u64));
        assert_eq!(
            err,
            FormatError::HeaderSizeTooSmall {
                header_size: 0,
                minimum: LEGACY_HEADER_SIZE,
            }
        );

        LittleEndian::write_u16(&mut bytes[offsets::HEADER_SIZE..], 226);
        LittleEndian::write_u32(
            &mut bytes[offsets::POINT_DATA_OFFSET..],
            LEGACY_HEADER_SIZE as u32,
        );
        let err = format_error(parse_header(&bytes, bytes.len() as u64));
        assert_eq!(
            err,
            FormatError::HeaderSizeTooSmall {
                header_size: 226,
                minimum: LEGACY_HEADER_SIZE,
            }
        );
    }

    #[test]
    fn rejects_point_data_inside_header() {
        let mut bytes = sample_file(1);
        LittleEndian::write_u32(&mut bytes[offsets::POINT_DATA_OFFSET..], 100);
        let err = format_error(parse_header(&bytes, bytes.len() as u64));
        assert_eq!(
            err,
            FormatError::PointDataBeforeHeader {
                offset: 100,
                header_size: LEGACY_HEADER_SIZE as u16,
            }
        );
    }
}
