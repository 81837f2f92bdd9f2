//! Conversion orchestration: request construction, sequencing of the
//! conversion and output steps, and degradation of the shape reference output.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};

use crate::converter::{Conversion, GtfsConverter};
use crate::crs::{Crs, CrsError, CrsRegistry};
use crate::error::ConvertError;
use crate::output;
use crate::sample_day::SampleDay;
use crate::schedule::{ShapeReference, TransitSchedule, VehicleTypeConfig, Vehicles};

/// Produces the converted schedule for a sample day.
#[cfg_attr(test, mockall::automock)]
pub trait FeedSource {
    fn convert(&self, sample_day: &SampleDay) -> Result<Conversion>;
}

/// Decides whether an output coordinate system is known.
#[cfg_attr(test, mockall::automock)]
pub trait CrsLookup {
    fn lookup(&self, id: &str) -> Result<Crs, CrsError>;
}

/// Persists conversion results.
#[cfg_attr(test, mockall::automock)]
pub trait ArtifactWriter {
    fn write_schedule(&self, schedule: &TransitSchedule, path: &Path) -> Result<()>;
    fn write_vehicles(&self, vehicles: &Vehicles, path: &Path) -> Result<()>;
    fn write_shape_references(&self, references: &[ShapeReference], path: &Path) -> Result<()>;
}

impl FeedSource for GtfsConverter {
    fn convert(&self, sample_day: &SampleDay) -> Result<Conversion> {
        GtfsConverter::convert(self, sample_day)
    }
}

impl CrsLookup for CrsRegistry {
    fn lookup(&self, id: &str) -> Result<Crs, CrsError> {
        self.resolve(id)
    }
}

/// Writes artifacts to the file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileWriter;

impl ArtifactWriter for FileWriter {
    fn write_schedule(&self, schedule: &TransitSchedule, path: &Path) -> Result<()> {
        output::write_schedule(schedule, path)
    }

    fn write_vehicles(&self, vehicles: &Vehicles, path: &Path) -> Result<()> {
        output::write_vehicles(vehicles, path)
    }

    fn write_shape_references(&self, references: &[ShapeReference], path: &Path) -> Result<()> {
        output::write_shape_references(references, path)
    }
}

/// Everything one conversion run needs, validated up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub feed_folder: PathBuf,
    pub sample_day: SampleDay,
    pub output_crs: String,
    pub schedule_file: PathBuf,
    pub vehicle_file: Option<PathBuf>,
    pub shape_reference_file: Option<PathBuf>,
}

impl ConversionRequest {
    /// Builds a request, resolving the sample day token.
    pub fn new(
        feed_folder: impl Into<PathBuf>,
        sample_day: Option<&str>,
        output_crs: impl Into<String>,
        schedule_file: impl Into<PathBuf>,
        vehicle_file: Option<PathBuf>,
        shape_reference_file: Option<PathBuf>,
    ) -> Result<Self, ConvertError> {
        Ok(Self {
            feed_folder: feed_folder.into(),
            sample_day: SampleDay::resolve(sample_day)?,
            output_crs: output_crs.into(),
            schedule_file: schedule_file.into(),
            vehicle_file,
            shape_reference_file,
        })
    }

    /// Builds a request from 4, 5 or 6 positional parameters:
    /// `feedFolder sampleDay outputCrs scheduleFile [vehicleFile [shapeRefFile]]`.
    pub fn from_args(args: &[String]) -> Result<Self, ConvertError> {
        match args {
            [feed, day, crs, schedule, rest @ ..] if rest.len() <= 2 => Self::new(
                feed,
                Some(day.as_str()),
                crs.as_str(),
                schedule,
                rest.first().map(PathBuf::from),
                rest.get(1).map(PathBuf::from),
            ),
            _ => Err(ConvertError::ArgumentCount(args.len())),
        }
    }
}

/// Per-run settings that are not part of the request itself.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Most verbose level the coordinate system lookups may log at
    pub crs_log_level: LevelFilter,
    pub vehicle_types: VehicleTypeConfig,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            crs_log_level: LevelFilter::WARN,
            vehicle_types: VehicleTypeConfig::default(),
        }
    }
}

/// What happened to the shape reference output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeReferenceOutcome {
    NotRequested,
    Written(PathBuf),
    /// The output coordinate system was not recognized
    Skipped { crs: String },
}

/// Files written by a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub schedule: PathBuf,
    pub vehicles: Option<PathBuf>,
    pub shape_references: ShapeReferenceOutcome,
}

/// Converts a feed folder into a schedule file and, when requested, a vehicle
/// file and a shape reference file.
pub fn run(
    feed_folder: impl Into<PathBuf>,
    sample_day: Option<&str>,
    output_crs: &str,
    schedule_file: impl Into<PathBuf>,
    vehicle_file: Option<PathBuf>,
    shape_reference_file: Option<PathBuf>,
) -> Result<RunReport> {
    let request = ConversionRequest::new(
        feed_folder,
        sample_day,
        output_crs,
        schedule_file,
        vehicle_file,
        shape_reference_file,
    )?;
    execute(&request, &RunOptions::default())
}

/// Runs `request` against the file system.
pub fn execute(request: &ConversionRequest, options: &RunOptions) -> Result<RunReport> {
    let registry = CrsRegistry::new(options.crs_log_level);
    let converter = GtfsConverter::new(&request.feed_folder, &request.output_crs, registry)
        .with_vehicle_types(options.vehicle_types.clone());
    run_with(request, &converter, &registry, &FileWriter)
}

/// Runs `request` with the given collaborators.
///
/// The schedule is always written. Vehicles and shape references are written
/// only when a destination was requested, and shape references additionally
/// only when the output coordinate system is known. An unknown system is not
/// an error: the run succeeds and keeps the files already written.
#[tracing::instrument(skip_all, fields(
    feed = %request.feed_folder.display(),
    sample_day = %request.sample_day,
    crs = %request.output_crs,
))]
pub fn run_with(
    request: &ConversionRequest,
    source: &impl FeedSource,
    crs: &impl CrsLookup,
    writer: &impl ArtifactWriter,
) -> Result<RunReport> {
    let conversion = source.convert(&request.sample_day).context("converting GTFS feed")?;

    writer
        .write_schedule(&conversion.schedule, &request.schedule_file)
        .with_context(|| format!("writing schedule to {}", request.schedule_file.display()))?;

    if let Some(path) = &request.vehicle_file {
        writer
            .write_vehicles(&conversion.vehicles, path)
            .with_context(|| format!("writing vehicles to {}", path.display()))?;
    }

    let shape_references = match &request.shape_reference_file {
        None => ShapeReferenceOutcome::NotRequested,
        Some(path) => match crs.lookup(&request.output_crs) {
            Ok(_) => {
                writer
                    .write_shape_references(&conversion.shape_references, path)
                    .with_context(|| format!("writing shape references to {}", path.display()))?;
                ShapeReferenceOutcome::Written(path.clone())
            }
            Err(e) => {
                warn!(error = %e, "Code {} not recognized. Shape reference file not written.", request.output_crs);
                ShapeReferenceOutcome::Skipped {
                    crs: request.output_crs.clone(),
                }
            }
        },
    };

    info!("Conversion finished");
    Ok(RunReport {
        schedule: request.schedule_file.clone(),
        vehicles: request.vehicle_file.clone(),
        shape_references,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use chrono::NaiveDate;
    use mockall::predicate::eq;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn request(vehicles: bool, shapes: bool) -> ConversionRequest {
        ConversionRequest {
            feed_folder: PathBuf::from("gtfs"),
            sample_day: SampleDay::DayWithMostTrips,
            output_crs: "EPSG:2056".to_string(),
            schedule_file: PathBuf::from("schedule.xml"),
            vehicle_file: vehicles.then(|| PathBuf::from("vehicles.xml")),
            shape_reference_file: shapes.then(|| PathBuf::from("shapes.csv")),
        }
    }

    fn source() -> MockFeedSource {
        let mut source = MockFeedSource::new();
        source
            .expect_convert()
            .times(1)
            .returning(|_| Ok(Conversion::default()));
        source
    }

    fn known_crs() -> MockCrsLookup {
        let mut crs = MockCrsLookup::new();
        crs.expect_lookup().returning(|_| Ok(Crs::wgs84()));
        crs
    }

    fn unknown_crs() -> MockCrsLookup {
        let mut crs = MockCrsLookup::new();
        crs.expect_lookup()
            .returning(|id| Err(CrsError::Unrecognized {
                id: id.to_string(),
                source: None,
            }));
        crs
    }

    #[test]
    fn test_from_args_four_five_six() {
        let four = ConversionRequest::from_args(&args(&["gtfs", "all", "WGS84", "s.xml"])).unwrap();
        assert_eq!(four.sample_day, SampleDay::AllServices);
        assert_eq!(four.vehicle_file, None);
        assert_eq!(four.shape_reference_file, None);

        let five =
            ConversionRequest::from_args(&args(&["gtfs", "all", "WGS84", "s.xml", "v.xml"])).unwrap();
        assert_eq!(five.vehicle_file, Some(PathBuf::from("v.xml")));
        assert_eq!(five.shape_reference_file, None);

        let six = ConversionRequest::from_args(&args(&[
            "gtfs", "20230612", "EPSG:2056", "s.xml", "v.xml", "r.csv",
        ]))
        .unwrap();
        assert_eq!(
            six.sample_day,
            SampleDay::Date(NaiveDate::from_ymd_opt(2023, 6, 12).unwrap())
        );
        assert_eq!(six.output_crs, "EPSG:2056");
        assert_eq!(six.shape_reference_file, Some(PathBuf::from("r.csv")));
    }

    #[test]
    fn test_from_args_wrong_count() {
        for n in [0, 1, 3, 7, 8] {
            let values: Vec<String> = (0..n).map(|i| format!("a{i}")).collect();
            assert_eq!(
                ConversionRequest::from_args(&values),
                Err(ConvertError::ArgumentCount(n))
            );
        }
    }

    #[test]
    fn test_from_args_invalid_selector() {
        assert_eq!(
            ConversionRequest::from_args(&args(&["gtfs", "2023-06-12", "WGS84", "s.xml"])),
            Err(ConvertError::InvalidSelector("2023-06-12".to_string()))
        );
    }

    #[test]
    fn test_new_without_token_defaults_to_most_trips() {
        let request = ConversionRequest::new("gtfs", None, "WGS84", "s.xml", None, None).unwrap();
        assert_eq!(request.sample_day, SampleDay::DayWithMostTrips);
    }

    #[test]
    fn test_schedule_only() {
        let mut writer = MockArtifactWriter::new();
        writer
            .expect_write_schedule()
            .withf(|_, path| path == Path::new("schedule.xml"))
            .times(1)
            .returning(|_, _| Ok(()));
        writer.expect_write_vehicles().never();
        writer.expect_write_shape_references().never();

        let report = run_with(&request(false, false), &source(), &known_crs(), &writer).unwrap();
        assert_eq!(report.vehicles, None);
        assert_eq!(report.shape_references, ShapeReferenceOutcome::NotRequested);
    }

    #[test]
    fn test_sample_day_is_passed_to_source() {
        let mut request = request(false, false);
        request.sample_day = SampleDay::DayWithMostServices;
        let mut source = MockFeedSource::new();
        source
            .expect_convert()
            .with(eq(SampleDay::DayWithMostServices))
            .times(1)
            .returning(|_| Ok(Conversion::default()));
        let mut writer = MockArtifactWriter::new();
        writer.expect_write_schedule().returning(|_, _| Ok(()));

        run_with(&request, &source, &known_crs(), &writer).unwrap();
    }

    #[test]
    fn test_all_outputs_written() {
        let mut writer = MockArtifactWriter::new();
        writer.expect_write_schedule().times(1).returning(|_, _| Ok(()));
        writer
            .expect_write_vehicles()
            .withf(|_, path| path == Path::new("vehicles.xml"))
            .times(1)
            .returning(|_, _| Ok(()));
        writer
            .expect_write_shape_references()
            .withf(|_, path| path == Path::new("shapes.csv"))
            .times(1)
            .returning(|_, _| Ok(()));

        let report = run_with(&request(true, true), &source(), &known_crs(), &writer).unwrap();
        assert_eq!(report.vehicles, Some(PathBuf::from("vehicles.xml")));
        assert_eq!(
            report.shape_references,
            ShapeReferenceOutcome::Written(PathBuf::from("shapes.csv"))
        );
    }

    #[test]
    fn test_unknown_crs_skips_shape_references_only() {
        let mut writer = MockArtifactWriter::new();
        writer.expect_write_schedule().times(1).returning(|_, _| Ok(()));
        writer.expect_write_vehicles().times(1).returning(|_, _| Ok(()));
        writer.expect_write_shape_references().never();

        let report = run_with(&request(true, true), &source(), &unknown_crs(), &writer).unwrap();
        assert_eq!(
            report.shape_references,
            ShapeReferenceOutcome::Skipped {
                crs: "EPSG:2056".to_string()
            }
        );
    }

    #[test]
    fn test_crs_checked_only_when_shape_references_requested() {
        let mut crs = MockCrsLookup::new();
        crs.expect_lookup().never();
        let mut writer = MockArtifactWriter::new();
        writer.expect_write_schedule().returning(|_, _| Ok(()));
        writer.expect_write_vehicles().returning(|_, _| Ok(()));

        run_with(&request(true, false), &source(), &crs, &writer).unwrap();
    }

    #[test]
    fn test_conversion_failure_writes_nothing() {
        let mut source = MockFeedSource::new();
        source
            .expect_convert()
            .returning(|_| Err(anyhow!("feed folder missing")));
        let mut writer = MockArtifactWriter::new();
        writer.expect_write_schedule().never();
        writer.expect_write_vehicles().never();
        writer.expect_write_shape_references().never();

        assert!(run_with(&request(true, true), &source, &known_crs(), &writer).is_err());
    }

    #[test]
    fn test_schedule_failure_stops_the_run() {
        let mut writer = MockArtifactWriter::new();
        writer
            .expect_write_schedule()
            .returning(|_, _| Err(anyhow!("disk full")));
        writer.expect_write_vehicles().never();
        writer.expect_write_shape_references().never();

        let err = run_with(&request(true, true), &source(), &known_crs(), &writer).unwrap_err();
        assert!(err.to_string().contains("schedule.xml"));
    }

    #[test]
    fn test_run_rejects_invalid_selector_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let schedule = dir.path().join("schedule.xml");
        let err = run(dir.path().join("missing"), Some("tomorrow"), "WGS84", &schedule, None, None)
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConvertError>(),
            Some(&ConvertError::InvalidSelector("tomorrow".to_string()))
        );
        assert!(!schedule.exists());
    }
}
