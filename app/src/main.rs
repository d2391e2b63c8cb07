use std::error::Error;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;

use pcd_core::pointcloud::point::GROUND_CLASSIFICATION;
use pcd_exporter::{
    geojson::write_geojson,
    report::{build_rows, write_csv, DEFAULT_PRECISION},
    summary::{write_summary, Summary},
};
use pcd_matcher::{
    compare_files,
    config::{DEFAULT_MAX_CHUNK_POINTS, DEFAULT_RADIUS},
    MatchConfig,
};
use pcd_parser::parsers::{get_extension, Extension};

#[derive(Parser, Debug)]
#[command(
    name = "pcdiff",
    about = "Compares survey points against the ground points of a LAS point cloud",
    author = "MIERUNE Inc.",
    version = "0.0.1"
)]
struct Cli {
    /// LAS file (point formats 0-3)
    #[arg(short, long, required = true, value_name = "FILE")]
    cloud: PathBuf,

    /// Survey table with x, y and z columns
    #[arg(short, long, required = true, value_name = "FILE")]
    survey: PathBuf,

    #[arg(short, long, required = true, value_name = "DIR")]
    output: PathBuf,

    /// Search radius in point cloud units
    #[arg(short, long, default_value_t = DEFAULT_RADIUS)]
    radius: f64,

    #[arg(long, default_value_t = DEFAULT_MAX_CHUNK_POINTS)]
    chunk_points: u32,

    #[arg(short, long, default_value_t = num_cpus::get())]
    workers: usize,

    #[arg(long, default_value_t = GROUND_CLASSIFICATION)]
    ground_class: u8,

    /// Decimals written to the result table
    #[arg(long, default_value_t = DEFAULT_PRECISION)]
    precision: usize,

    /// Also write a colored point layer
    #[arg(long)]
    geojson: bool,
}

fn check_extension(path: &Path, expected: &[Extension]) -> Result<Extension, String> {
    let extension = path
        .extension()
        .and_then(OsStr::to_str)
        .ok_or_else(|| format!("File extension is not found: {:?}", path))?;
    let extension = get_extension(extension).map_err(|e| format!("{:?}: {}", path, e))?;
    if !expected.contains(&extension) {
        return Err(format!("{:?} is not one of {:?}", path, expected));
    }
    Ok(extension)
}

fn create_writer(path: &Path) -> std::io::Result<BufWriter<File>> {
    log::info!("write {:?}", path);
    Ok(BufWriter::new(File::create(path)?))
}

fn run(args: Cli) -> Result<(), Box<dyn Error>> {
    check_extension(&args.cloud, &[Extension::Las])?;
    check_extension(&args.survey, &[Extension::Csv, Extension::Txt])?;

    let config = MatchConfig {
        radius: args.radius,
        max_chunk_points: args.chunk_points,
        workers: args.workers,
        ground_class: args.ground_class,
    };
    config.validate()?;
    fs::create_dir_all(&args.output)?;

    log::info!("start matching...");
    let start_local = std::time::Instant::now();
    let comparison = compare_files(&args.survey, &args.cloud, &config)?;
    log::info!("Finish matching in {:?}", start_local.elapsed());

    log::info!("start exporting...");
    let start_local = std::time::Instant::now();
    let rows = build_rows(&comparison.survey, &comparison.results)?;

    let mut writer = create_writer(&args.output.join("results.csv"))?;
    write_csv(&mut writer, &rows, args.precision)?;
    writer.flush()?;

    let summary = Summary::from_rows(&rows, comparison.dropped_rows, comparison.stats.clone());
    summary.log();
    let mut writer = create_writer(&args.output.join("summary.json"))?;
    write_summary(&mut writer, &summary)?;
    writer.flush()?;

    if args.geojson {
        let mut writer = create_writer(&args.output.join("results.geojson"))?;
        write_geojson(&mut writer, &rows, args.precision as i32)?;
        writer.flush()?;
    }
    log::info!("Finish exporting in {:?}", start_local.elapsed());

    Ok(())
}

fn main() -> ExitCode {
    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Cli::parse();

    log::info!("point cloud: {:?}", args.cloud);
    log::info!("survey table: {:?}", args.survey);
    log::info!("output folder: {:?}", args.output);
    log::info!("radius: {}", args.radius);
    log::info!("chunk points: {}", args.chunk_points);
    log::info!("workers: {}", args.workers);

    let start = std::time::Instant::now();
    match run(args) {
        Ok(()) => {
            log::info!("Elapsed: {:?}", start.elapsed());
            log::info!("Finish processing");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
