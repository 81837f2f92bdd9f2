//! Loading of a GTFS directory into a [`GtfsFeed`].
//!
//! Every table is read as trimmed, flexible CSV with an optional UTF-8 BOM.
//! Missing mandatory files and dangling references are errors; stop times and
//! frequencies end up attached to their trips.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::debug;

use super::objects::*;
use super::{FeedError, GtfsFeed};

impl GtfsFeed {
    /// Reads a GTFS feed from a local directory.
    ///
    /// `stops.txt`, `routes.txt`, `trips.txt` and `stop_times.txt` are
    /// mandatory, as is at least one of `calendar.txt` and
    /// `calendar_dates.txt`. `frequencies.txt` is optional.
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_dir(path: impl AsRef<Path>) -> Result<Self, FeedError> {
        let p = path.as_ref();
        if !p.is_dir() {
            return Err(FeedError::NotADirectory(p.display().to_string()));
        }

        let stops: Vec<Stop> = read_objs_from_path(p, "stops.txt")?;
        let routes: Vec<Route> = read_objs_from_path(p, "routes.txt")?;
        let raw_trips: Vec<RawTrip> = read_objs_from_path(p, "trips.txt")?;
        let raw_stop_times: Vec<RawStopTime> = read_objs_from_path(p, "stop_times.txt")?;
        let calendar: Option<Vec<Calendar>> = read_objs_from_optional_path(p, "calendar.txt")?;
        let calendar_dates: Option<Vec<CalendarDate>> =
            read_objs_from_optional_path(p, "calendar_dates.txt")?;
        let frequencies: Vec<Frequency> =
            read_objs_from_optional_path(p, "frequencies.txt")?.unwrap_or_default();

        if calendar.is_none() && calendar_dates.is_none() {
            return Err(FeedError::NoCalendar);
        }

        let stops: HashMap<String, Stop> =
            stops.into_iter().map(|s| (s.id.clone(), s)).collect();
        let routes: HashMap<String, Route> =
            routes.into_iter().map(|r| (r.id.clone(), r)).collect();
        let trips = create_trips(raw_trips, raw_stop_times, frequencies, &stops, &routes)?;

        let mut dates: HashMap<String, Vec<CalendarDate>> = HashMap::new();
        for cd in calendar_dates.unwrap_or_default() {
            dates.entry(cd.service_id.clone()).or_default().push(cd);
        }

        let feed = GtfsFeed {
            stops,
            routes,
            trips,
            calendar: calendar
                .unwrap_or_default()
                .into_iter()
                .map(|c| (c.id.clone(), c))
                .collect(),
            calendar_dates: dates,
        };
        debug!(
            stops = feed.stops.len(),
            routes = feed.routes.len(),
            trips = feed.trips.len(),
            services = feed.calendar.len(),
            "GTFS feed read"
        );
        Ok(feed)
    }
}

fn create_trips(
    raw_trips: Vec<RawTrip>,
    raw_stop_times: Vec<RawStopTime>,
    raw_frequencies: Vec<Frequency>,
    stops: &HashMap<String, Stop>,
    routes: &HashMap<String, Route>,
) -> Result<HashMap<String, Trip>, FeedError> {
    let mut trips = HashMap::with_capacity(raw_trips.len());
    for rt in raw_trips {
        if !routes.contains_key(&rt.route_id) {
            return Err(FeedError::ReferenceError {
                kind: "route",
                id: rt.route_id,
            });
        }
        trips.insert(
            rt.id.clone(),
            Trip {
                id: rt.id,
                service_id: rt.service_id,
                route_id: rt.route_id,
                shape_id: rt.shape_id.filter(|s| !s.is_empty()),
                stop_times: vec![],
                frequencies: vec![],
            },
        );
    }

    for s in raw_stop_times {
        if !stops.contains_key(&s.stop_id) {
            return Err(FeedError::ReferenceError {
                kind: "stop",
                id: s.stop_id,
            });
        }
        let trip = trips
            .get_mut(&s.trip_id)
            .ok_or_else(|| FeedError::ReferenceError {
                kind: "trip",
                id: s.trip_id.clone(),
            })?;
        trip.stop_times.push(StopTime::from(s));
    }

    for trip in trips.values_mut() {
        trip.stop_times.sort_by_key(|st| st.stop_sequence);
    }

    for f in raw_frequencies {
        let trip = trips
            .get_mut(&f.trip_id)
            .ok_or_else(|| FeedError::ReferenceError {
                kind: "trip",
                id: f.trip_id.clone(),
            })?;
        trip.frequencies.push(f);
    }

    Ok(trips)
}

fn read_objs<T, O>(mut reader: T, file_name: &str) -> Result<Vec<O>, FeedError>
where
    O: DeserializeOwned,
    T: Read,
{
    let mut bom = [0; 3];
    let n = reader
        .read(&mut bom)
        .map_err(|e| FeedError::NamedFileIO {
            file_name: file_name.to_owned(),
            source: e,
        })?;

    // Skip a leading UTF-8 byte order mark
    let head: &[u8] = if bom[..n] == [0xef, 0xbb, 0xbf] {
        &[]
    } else {
        &bom[..n]
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(head.chain(reader));

    let csv_error = |e| FeedError::Csv {
        file_name: file_name.to_owned(),
        source: e,
    };
    let headers = reader.headers().map_err(csv_error)?.clone();

    let mut rec = csv::StringRecord::new();
    let mut objs = Vec::new();
    while reader.read_record(&mut rec).map_err(csv_error)? {
        objs.push(rec.deserialize(Some(&headers)).map_err(csv_error)?);
    }
    Ok(objs)
}

fn read_objs_from_path<O>(dir: &Path, file_name: &str) -> Result<Vec<O>, FeedError>
where
    O: DeserializeOwned,
{
    read_objs_from_optional_path(dir, file_name)?
        .ok_or_else(|| FeedError::MissingFile(file_name.to_owned()))
}

fn read_objs_from_optional_path<O>(dir: &Path, file_name: &str) -> Result<Option<Vec<O>>, FeedError>
where
    O: DeserializeOwned,
{
    let path = dir.join(file_name);
    if !path.exists() {
        return Ok(None);
    }
    let file = File::open(&path).map_err(|e| FeedError::NamedFileIO {
        file_name: file_name.to_owned(),
        source: e,
    })?;
    read_objs(file, file_name).map(Some)
}
