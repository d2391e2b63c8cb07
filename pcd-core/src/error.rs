use std::io;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("empty dataset: {0}")]
    EmptyDataset(#[from] EmptyDataset),

    #[error("survey table is missing required column '{column}'")]
    MissingColumn { column: &'static str },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("worker thread panicked: {0}")]
    WorkerPanicked(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Problems with the point cloud header. Always fatal, raised before any chunk is read.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FormatError {
    #[error("header needs at least {required} bytes but only {actual} are available")]
    HeaderTooShort { required: usize, actual: usize },

    #[error("expected signature \"LASF\" at byte 0, found {found:?}")]
    InvalidSignature { found: [u8; 4] },

    #[error("point record format {format} (byte 104) is not supported, expected 0..=3")]
    UnsupportedRecordFormat { format: u8 },

    #[error("point record length {length} (byte 105) is shorter than the {minimum} bytes format {format} requires")]
    RecordLengthTooShort {
        format: u8,
        length: u16,
        minimum: u16,
    },

    #[error("header size {header_size} (byte 94) is smaller than the {minimum} byte legacy header")]
    HeaderSizeTooSmall { header_size: u16, minimum: usize },

    #[error("point data offset {offset} (byte 96) lies inside the {header_size} byte header")]
    PointDataBeforeHeader { offset: u32, header_size: u16 },

    #[error("header declares {point_count} points of {record_length} bytes from offset {offset}, ending at byte {expected_end}, but the file has {file_size} bytes")]
    TruncatedPointData {
        point_count: u32,
        record_length: u16,
        offset: u32,
        expected_end: u64,
        file_size: u64,
    },

    #[error("{axis} coordinate {value} cannot be stored as i32 with scale {scale} and offset {offset}")]
    CoordinateOutOfRange {
        axis: char,
        value: f64,
        scale: f64,
        offset: f64,
    },
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("chunk {chunk} at byte {byte_start}: expected {expected} bytes, got {actual}")]
pub struct DecodeError {
    pub chunk: usize,
    pub byte_start: u64,
    pub expected: u64,
    pub actual: u64,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EmptyDataset {
    #[error("the survey table has no usable rows")]
    NoSurveyPoints,

    #[error("the point cloud header declares zero points")]
    NoCloudPoints,

    #[error("the point cloud has no points with classification {class}")]
    NoGroundPoints { class: u8 },
}
