use std::io::Write;

use rayon::iter::{IndexedParallelIterator as _, IntoParallelRefIterator as _, ParallelIterator as _};
use serde::Serialize;

use pcd_core::matching::{MatchResult, MatchedPoint};
use pcd_core::survey::SurveyPoint;

use crate::classify::DiffClass;
use crate::error::ExportError;

pub const DEFAULT_PRECISION: usize = 3;

/// One survey point with its matched cloud point, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub survey: SurveyPoint,
    pub matched: Option<MatchedPoint>,
    pub distance: Option<f64>,
    /// survey z - matched cloud z
    pub dz: Option<f64>,
    pub class: DiffClass,
}

impl ReportRow {
    pub fn new(survey: &SurveyPoint, result: &MatchResult) -> Self {
        let dz = result.best.map(|m| survey.z - m.z);
        Self {
            survey: *survey,
            matched: result.best,
            distance: result.best.map(|_| result.best_distance),
            dz,
            class: DiffClass::from_dz(dz),
        }
    }
}

pub fn build_rows(
    survey: &[SurveyPoint],
    results: &[MatchResult],
) -> Result<Vec<ReportRow>, ExportError> {
    if survey.len() != results.len() {
        return Err(ExportError::LengthMismatch {
            survey: survey.len(),
            results: results.len(),
        });
    }

    Ok(survey
        .par_iter()
        .zip(results.par_iter())
        .map(|(point, result)| ReportRow::new(point, result))
        .collect())
}

#[derive(Serialize)]
struct CsvRecord<'a> {
    #[serde(rename = "CSV_X")]
    survey_x: String,
    #[serde(rename = "CSV_Y")]
    survey_y: String,
    #[serde(rename = "CSV_Z")]
    survey_z: String,
    #[serde(rename = "LAS_X")]
    cloud_x: Option<String>,
    #[serde(rename = "LAS_Y")]
    cloud_y: Option<String>,
    #[serde(rename = "LAS_Z")]
    cloud_z: Option<String>,
    #[serde(rename = "Dist")]
    distance: Option<String>,
    #[serde(rename = "Z_diff")]
    dz: Option<String>,
    #[serde(rename = "Class")]
    class: &'a str,
}

fn fixed(value: f64, precision: usize) -> String {
    format!("{:.*}", precision, value)
}

/// Writes the rows as a comma separated table. Unmatched points have empty
/// cloud, distance and difference cells.
pub fn write_csv<W: Write>(
    writer: W,
    rows: &[ReportRow],
    precision: usize,
) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(writer);

    for row in rows {
        writer.serialize(CsvRecord {
            survey_x: fixed(row.survey.x, precision),
            survey_y: fixed(row.survey.y, precision),
            survey_z: fixed(row.survey.z, precision),
            cloud_x: row.matched.map(|m| fixed(m.x, precision)),
            cloud_y: row.matched.map(|m| fixed(m.y, precision)),
            cloud_z: row.matched.map(|m| fixed(m.z, precision)),
            distance: row.distance.map(|d| fixed(d, precision)),
            dz: row.dz.map(|d| fixed(d, precision)),
            class: row.class.as_str(),
        })?;
    }

    writer.flush()?;
    Ok(())
}
