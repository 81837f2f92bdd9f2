//! CLI entry point of the GTFS to transit schedule converter.
//!
//! Takes 4 to 6 positional parameters:
//! `feedFolder sampleDay outputCrs scheduleFile [vehicleFile [shapeRefFile]]`.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use gtfs2schedule::pipeline::{self, ConversionRequest, RunOptions, ShapeReferenceOutcome};
use gtfs2schedule::schedule::VehicleTypeConfig;
use tracing::{debug, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "gtfs2schedule")]
#[command(about = "Converts a GTFS feed into an unmapped MATSim transit schedule", long_about = None)]
struct Cli {
    /// feedFolder sampleDay outputCrs scheduleFile [vehicleFile [shapeRefFile]]
    #[arg(value_name = "ARGS")]
    args: Vec<String>,

    /// JSON file overriding the default vehicle type of each transport mode
    #[arg(long, value_name = "FILE")]
    vehicle_types: Option<PathBuf>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/gtfs2schedule.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("gtfs2schedule.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| EnvFilter::new("info")));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(
            EnvFilter::try_from_env("RUST_LOG_JSON").unwrap_or_else(|_| EnvFilter::new("debug")),
        );

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let request = ConversionRequest::from_args(&cli.args)?;
    debug!(?request, "Conversion request");

    let mut options = RunOptions::default();
    if let Some(path) = &cli.vehicle_types {
        options.vehicle_types = VehicleTypeConfig::load(path)?;
        info!(path = %path.display(), "Vehicle types loaded");
    }

    let report = pipeline::execute(&request, &options)?;
    info!(schedule = %report.schedule.display(), "Schedule written");
    if let Some(vehicles) = &report.vehicles {
        info!(vehicles = %vehicles.display(), "Vehicles written");
    }
    if let ShapeReferenceOutcome::Written(path) = &report.shape_references {
        info!(shape_references = %path.display(), "Shape references written");
    }

    Ok(())
}
