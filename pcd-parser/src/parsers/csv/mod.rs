use std::{fs::File, io::Read, path::PathBuf};

use csv::{ByteRecord, ReaderBuilder};

use pcd_core::error::{Error, Result};
use pcd_core::survey::SurveyPoint;

use super::{Parser, ParserProvider};

const REQUIRED_COLUMNS: [&str; 3] = ["x", "y", "z"];

/// Number of dropped line numbers kept for the warning message.
const DROPPED_LINES_REPORTED: usize = 10;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurveyTable {
    pub points: Vec<SurveyPoint>,
    /// Rows that did not yield three finite numbers.
    pub dropped_rows: usize,
}

pub struct CsvParserProvider {
    pub filename: PathBuf,
}

impl ParserProvider for CsvParserProvider {
    fn get_parser(&self) -> Box<dyn Parser> {
        Box::new(CsvParser {
            filename: self.filename.clone(),
        })
    }
}

pub struct CsvParser {
    pub filename: PathBuf,
}

impl Parser for CsvParser {
    fn parse(&self) -> Result<SurveyTable> {
        let start = std::time::Instant::now();
        let file = File::open(&self.filename)?;
        let table = parse_survey(file)?;
        log::info!(
            "read {} survey points from {:?} in {:?}",
            table.points.len(),
            self.filename,
            start.elapsed()
        );
        Ok(table)
    }
}

/// Column positions of x, y and z, matched case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq)]
struct FieldMapping {
    x: usize,
    y: usize,
    z: usize,
}

fn create_field_mapping(headers: &ByteRecord) -> Result<FieldMapping> {
    let mut found = [None; 3];

    for (index, header) in headers.iter().enumerate() {
        let normalized_header = String::from_utf8_lossy(header).trim().to_lowercase();
        for (slot, column) in found.iter_mut().zip(REQUIRED_COLUMNS) {
            if slot.is_none() && normalized_header == column {
                *slot = Some(index);
            }
        }
    }

    let mut resolved = [0; 3];
    for ((slot, column), out) in found.iter().zip(REQUIRED_COLUMNS).zip(resolved.iter_mut()) {
        *out = slot.ok_or(Error::MissingColumn { column })?;
    }

    Ok(FieldMapping {
        x: resolved[0],
        y: resolved[1],
        z: resolved[2],
    })
}

fn parse_field(record: &ByteRecord, index: usize) -> Option<f64> {
    let value = std::str::from_utf8(record.get(index)?).ok()?;
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_point(record: &ByteRecord, mapping: &FieldMapping, id: usize) -> Option<SurveyPoint> {
    Some(SurveyPoint {
        id,
        x: parse_field(record, mapping.x)?,
        y: parse_field(record, mapping.y)?,
        z: parse_field(record, mapping.z)?,
    })
}

/// Reads a delimited survey table with a header row.
///
/// Fails with [`Error::MissingColumn`] when x, y or z is absent. Rows whose
/// three values do not parse as finite numbers are dropped. Surviving rows get
/// consecutive ids starting at 0.
pub fn parse_survey<R: Read>(reader: R) -> Result<SurveyTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.byte_headers()?.clone();
    let mapping = create_field_mapping(&headers)?;

    let mut table = SurveyTable::default();
    let mut dropped_lines = Vec::new();
    let mut record = ByteRecord::new();

    while reader.read_byte_record(&mut record)? {
        match parse_point(&record, &mapping, table.points.len()) {
            Some(point) => table.points.push(point),
            None => {
                table.dropped_rows += 1;
                if dropped_lines.len() < DROPPED_LINES_REPORTED {
                    if let Some(position) = record.position() {
                        dropped_lines.push(position.line());
                    }
                }
            }
        }
    }

    if table.dropped_rows > 0 {
        log::warn!(
            "dropped {} survey rows without numeric x/y/z (first lines: {:?})",
            table.dropped_rows,
            dropped_lines
        );
    }

    Ok(table)
}
