use std::io::Write;

use serde::Serialize;

use pcd_core::matching::RunStats;

use crate::classify::DiffClass;
use crate::error::ExportError;
use crate::report::ReportRow;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassCount {
    pub class: DiffClass,
    pub interval: &'static str,
    pub count: usize,
}

/// Statistics over the elevation differences of matched survey points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub survey_points: usize,
    pub matched: usize,
    pub not_found: usize,
    pub dropped_rows: usize,
    pub min_dz: Option<f64>,
    pub max_dz: Option<f64>,
    pub mean_dz: Option<f64>,
    pub rmse: Option<f64>,
    pub classes: Vec<ClassCount>,
    pub run: RunStats,
}

impl Summary {
    pub fn from_rows(rows: &[ReportRow], dropped_rows: usize, run: RunStats) -> Self {
        let dzs: Vec<f64> = rows.iter().filter_map(|r| r.dz).collect();
        let matched = dzs.len();

        let (min_dz, max_dz, mean_dz, rmse) = if dzs.is_empty() {
            (None, None, None, None)
        } else {
            let n = matched as f64;
            let min = dzs.iter().copied().fold(f64::INFINITY, f64::min);
            let max = dzs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let mean = dzs.iter().sum::<f64>() / n;
            let rmse = (dzs.iter().map(|d| d * d).sum::<f64>() / n).sqrt();
            (Some(min), Some(max), Some(mean), Some(rmse))
        };

        let classes = DiffClass::ALL
            .iter()
            .map(|class| ClassCount {
                class: *class,
                interval: class.interval(),
                count: rows.iter().filter(|r| r.class == *class).count(),
            })
            .collect();

        Self {
            survey_points: rows.len(),
            matched,
            not_found: rows.len() - matched,
            dropped_rows,
            min_dz,
            max_dz,
            mean_dz,
            rmse,
            classes,
            run,
        }
    }

    pub fn log(&self) {
        log::info!(
            "compared {} survey points: {} matched, {} not found, {} rows dropped",
            self.survey_points,
            self.matched,
            self.not_found,
            self.dropped_rows
        );
        if let (Some(min), Some(max), Some(mean), Some(rmse)) =
            (self.min_dz, self.max_dz, self.mean_dz, self.rmse)
        {
            log::info!(
                "dz min {:.3}, max {:.3}, mean {:.3}, rmse {:.3}",
                min,
                max,
                mean,
                rmse
            );
        }
        for c in &self.classes {
            log::info!("  {:<10} {:>10}: {}", c.class.as_str(), c.interval, c.count);
        }
    }
}

pub fn write_summary<W: Write>(writer: W, summary: &Summary) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(writer, summary)?;
    Ok(())
}
