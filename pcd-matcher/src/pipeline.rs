use std::fs::File;
use std::path::Path;

use pcd_core::error::{EmptyDataset, Result};
use pcd_core::matching::{MatchResult, RunStats};
use pcd_core::pointcloud::header::PointCloudHeader;
use pcd_core::survey::SurveyPoint;
use pcd_parser::parsers::csv::CsvParserProvider;
use pcd_parser::parsers::ParserProvider as _;
use pcd_parser::reader::las::{plan_chunks, read_header, ChunkDecoder, LasChunkReader, RecordLayout};
use pcd_parser::reader::ChunkReader;

use crate::config::MatchConfig;
use crate::index::QueryIndex;
use crate::matcher::NearestNeighborMatcher;
use crate::merger::ResultMerger;
use crate::scheduler::{ChunkProcessor, Scheduler};

/// Outcome of one run: the survey points and their best matches, index-aligned.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub header: PointCloudHeader,
    pub survey: Vec<SurveyPoint>,
    pub results: Vec<MatchResult>,
    pub stats: RunStats,
    pub dropped_rows: usize,
}

impl Comparison {
    pub fn found_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_found()).count()
    }

    pub fn rows(&self) -> impl Iterator<Item = (&SurveyPoint, &MatchResult)> {
        self.survey.iter().zip(self.results.iter())
    }
}

/// Matches the survey table at `survey_path` against the LAS file at `cloud_path`.
///
/// The survey table is loaded first so that a missing column is reported
/// before the point cloud is opened.
pub fn compare_files(survey_path: &Path, cloud_path: &Path, config: &MatchConfig) -> Result<Comparison> {
    config.validate()?;

    let provider = CsvParserProvider {
        filename: survey_path.to_path_buf(),
    };
    let table = provider.get_parser().parse()?;

    let mut file = File::open(cloud_path)?;
    let header = read_header(&mut file)?;
    log::info!(
        "point cloud {:?}: LAS {}.{}, format {}, {} points of {} bytes, scale {:?}, offset {:?}",
        cloud_path,
        header.version.0,
        header.version.1,
        header.record_format.code(),
        header.point_count,
        header.record_length,
        header.scale,
        header.offset
    );

    let mut comparison = compare(table.points, header, LasChunkReader::new(file), config)?;
    comparison.dropped_rows = table.dropped_rows;
    Ok(comparison)
}

/// Runs the chunked join of `survey` against the points described by `header`.
pub fn compare<R: ChunkReader>(
    survey: Vec<SurveyPoint>,
    header: PointCloudHeader,
    reader: R,
    config: &MatchConfig,
) -> Result<Comparison> {
    config.validate()?;

    let index = QueryIndex::build(&survey)?;
    if header.point_count == 0 {
        return Err(EmptyDataset::NoCloudPoints.into());
    }

    let chunks = plan_chunks(&header, config.max_chunk_points)?;
    log::info!(
        "matching {} survey points against {} cloud points in {} chunks on {} workers (radius {})",
        survey.len(),
        header.point_count,
        chunks.len(),
        config.workers,
        config.radius
    );

    let start = std::time::Instant::now();
    let decoder = ChunkDecoder::new(RecordLayout::from(&header), Some(config.ground_class));
    let matcher = NearestNeighborMatcher::new(&index, config.radius);
    let processor = ChunkProcessor::new(decoder, matcher);
    let scheduler = Scheduler::new(chunks, config.workers, reader, ResultMerger::new(survey.len()));
    let (merger, stats) = scheduler.run(&processor)?;

    if stats.ground_points == 0 {
        return Err(EmptyDataset::NoGroundPoints {
            class: config.ground_class,
        }
        .into());
    }

    let results = merger.into_results();
    let comparison = Comparison {
        header,
        survey,
        results,
        stats,
        dropped_rows: 0,
    };
    log::info!(
        "matched {}/{} survey points ({} ground points, {} candidates) in {:?}",
        comparison.found_count(),
        comparison.survey.len(),
        comparison.stats.ground_points,
        comparison.stats.candidates,
        start.elapsed()
    );

    Ok(comparison)
}
