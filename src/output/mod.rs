//! Persistence of conversion results.
//!
//! The schedule and vehicles are written as MATSim XML, shape references as
//! CSV. A destination whose name ends in `.gz` is gzip-compressed.

mod xml;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;
use tracing::info;

use crate::schedule::{ShapeReference, TransitSchedule, Vehicles};

pub use xml::{write_schedule_xml, write_vehicles_xml};

/// A buffered output file, compressed when its name ends in `.gz`
pub enum Sink {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl Sink {
    /// Creates `path`. Missing parent directories are an error.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        let buffered = BufWriter::new(file);
        if path.extension().is_some_and(|ext| ext == "gz") {
            Ok(Sink::Gzip(GzEncoder::new(buffered, Compression::default())))
        } else {
            Ok(Sink::Plain(buffered))
        }
    }

    /// Flushes all buffers and writes the gzip trailer.
    pub fn finish(self) -> io::Result<()> {
        let mut inner = match self {
            Sink::Plain(w) => w,
            Sink::Gzip(encoder) => encoder.finish()?,
        };
        inner.flush()
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Plain(w) => w.write(buf),
            Sink::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Plain(w) => w.flush(),
            Sink::Gzip(w) => w.flush(),
        }
    }
}

#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn write_schedule(schedule: &TransitSchedule, path: &Path) -> Result<()> {
    let mut sink = Sink::create(path)?;
    write_schedule_xml(schedule, &mut sink)?;
    sink.finish()?;
    info!(
        transit_lines = schedule.lines.len(),
        stop_facilities = schedule.stop_facilities.len(),
        "Transit schedule written"
    );
    Ok(())
}

#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn write_vehicles(vehicles: &Vehicles, path: &Path) -> Result<()> {
    let mut sink = Sink::create(path)?;
    write_vehicles_xml(vehicles, &mut sink)?;
    sink.finish()?;
    info!(
        vehicle_types = vehicles.types.len(),
        vehicles = vehicles.vehicles.len(),
        "Vehicles written"
    );
    Ok(())
}

/// Writes one CSV row per shape reference, header included even when empty.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn write_shape_references(references: &[ShapeReference], path: &Path) -> Result<()> {
    let sink = Sink::create(path)?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(sink);
    writer.write_record(["transitLineId", "transitRouteId", "shapeId"])?;
    for reference in references {
        writer.serialize(reference)?;
    }
    writer.flush()?;
    let sink = writer.into_inner().map_err(|e| e.into_error())?;
    sink.finish()?;
    info!(rows = references.len(), "Shape references written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;
    use tempfile::tempdir;

    fn reference(line: &str, route: &str, shape: &str) -> ShapeReference {
        ShapeReference {
            transit_line_id: line.to_string(),
            transit_route_id: route.to_string(),
            shape_id: shape.to_string(),
        }
    }

    #[test]
    fn test_shape_references_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shapes.csv");
        write_shape_references(&[reference("L1", "r1", "s1"), reference("L1", "r2", "s2")], &path)
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "transitLineId,transitRouteId,shapeId\nL1,r1,s1\nL1,r2,s2\n"
        );
    }

    #[test]
    fn test_empty_shape_references_still_have_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shapes.csv");
        write_shape_references(&[], &path).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "transitLineId,transitRouteId,shapeId\n"
        );
    }

    #[test]
    fn test_gz_destination_is_compressed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shapes.csv.gz");
        write_shape_references(&[reference("L1", "r1", "s1")], &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
        let mut content = String::new();
        GzDecoder::new(&bytes[..]).read_to_string(&mut content).unwrap();
        assert!(content.ends_with("L1,r1,s1\n"));
    }

    #[test]
    fn test_missing_parent_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("schedule.xml");
        assert!(write_schedule(&TransitSchedule::default(), &path).is_err());
        assert!(!dir.path().join("missing").exists());
    }

    #[test]
    fn test_write_vehicles_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vehicles.xml");
        write_vehicles(&Vehicles::default(), &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<vehicleDefinitions"));
    }
}
