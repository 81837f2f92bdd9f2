//! Conversion of a GTFS feed into an unmapped transit schedule.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::crs::{Crs, CrsRegistry};
use crate::gtfs::{GtfsFeed, ServiceCalendar, ServiceSelection, StopTime, Trip};
use crate::sample_day::SampleDay;
use crate::schedule::{
    Departure, RouteStop, ShapeReference, StopFacility, TransitLine, TransitRoute,
    TransitSchedule, TransportMode, VehicleTypeConfig, Vehicles,
};

/// Everything produced from one feed
#[derive(Debug, Clone, Default)]
pub struct Conversion {
    pub schedule: TransitSchedule,
    pub vehicles: Vehicles,
    pub shape_references: Vec<ShapeReference>,
    pub selection: ServiceSelection,
}

/// Reads a GTFS directory and converts the services of a sample day.
pub struct GtfsConverter {
    feed_folder: PathBuf,
    output_crs: String,
    registry: CrsRegistry,
    vehicle_types: VehicleTypeConfig,
}

impl GtfsConverter {
    pub fn new(feed_folder: impl Into<PathBuf>, output_crs: impl Into<String>, registry: CrsRegistry) -> Self {
        Self {
            feed_folder: feed_folder.into(),
            output_crs: output_crs.into(),
            registry,
            vehicle_types: VehicleTypeConfig::default(),
        }
    }

    pub fn with_vehicle_types(mut self, vehicle_types: VehicleTypeConfig) -> Self {
        self.vehicle_types = vehicle_types;
        self
    }

    pub fn feed_folder(&self) -> &Path {
        &self.feed_folder
    }

    /// Reads the feed and converts it.
    #[tracing::instrument(skip(self), fields(feed = %self.feed_folder.display(), crs = %self.output_crs))]
    pub fn convert(&self, sample_day: &SampleDay) -> Result<Conversion> {
        info!("Reading GTFS feed");
        let feed = GtfsFeed::from_dir(&self.feed_folder)
            .with_context(|| format!("reading GTFS feed in {}", self.feed_folder.display()))?;
        Ok(self.convert_feed(&feed, sample_day))
    }

    /// Converts an already loaded feed.
    pub fn convert_feed(&self, feed: &GtfsFeed, sample_day: &SampleDay) -> Conversion {
        let selection = ServiceCalendar::new(feed).select(sample_day);

        let crs = self.registry.resolve(&self.output_crs).unwrap_or_else(|e| {
            warn!(error = %e, "Stop coordinates are left in WGS84");
            Crs::wgs84()
        });

        let mut schedule = TransitSchedule {
            stop_facilities: stop_facilities(feed, &crs),
            lines: BTreeMap::new(),
        };

        let mut trips: Vec<&Trip> = feed
            .trips
            .values()
            .filter(|t| selection.contains(&t.service_id))
            .collect();
        trips.sort_by(|a, b| a.id.cmp(&b.id));

        let mut groups: Vec<RouteGroup> = Vec::new();
        let mut group_index: HashMap<(&str, Vec<RouteStop>), usize> = HashMap::new();
        let mut skipped = 0;

        for trip in trips {
            let Some((base, stops)) = route_profile(trip, &schedule.stop_facilities) else {
                skipped += 1;
                continue;
            };
            let departures = departures(trip, base);
            let idx = *group_index
                .entry((trip.route_id.as_str(), stops.clone()))
                .or_insert_with(|| {
                    groups.push(RouteGroup {
                        line_id: trip.route_id.clone(),
                        route_id: trip.id.clone(),
                        stops,
                        departures: Vec::new(),
                        shape_id: None,
                    });
                    groups.len() - 1
                });
            let group = &mut groups[idx];
            group.departures.extend(departures);
            if group.shape_id.is_none() {
                group.shape_id = trip.shape_id.clone();
            }
        }
        if skipped > 0 {
            warn!(skipped, "Trips without a usable stop profile were skipped");
        }

        let mut vehicles = Vehicles::default();
        let mut shape_references = Vec::new();
        for group in groups {
            // trips are only read when their route exists
            let Some(route) = feed.routes.get(&group.line_id) else {
                continue;
            };
            let mode = TransportMode::from_route_type(route.route_type);
            if let Some(shape_id) = &group.shape_id {
                shape_references.push(ShapeReference {
                    transit_line_id: group.line_id.clone(),
                    transit_route_id: group.route_id.clone(),
                    shape_id: shape_id.clone(),
                });
            }
            let line = schedule
                .lines
                .entry(group.line_id.clone())
                .or_insert_with(|| TransitLine {
                    id: group.line_id.clone(),
                    name: route.display_name().map(String::from),
                    routes: BTreeMap::new(),
                });
            line.routes.insert(
                group.route_id.clone(),
                TransitRoute {
                    id: group.route_id,
                    mode,
                    stops: group.stops,
                    departures: group.departures,
                },
            );
        }

        for line in schedule.lines.values_mut() {
            for route in line.routes.values_mut() {
                route
                    .departures
                    .sort_by(|a, b| a.time.cmp(&b.time).then_with(|| a.id.cmp(&b.id)));
                for departure in &mut route.departures {
                    departure.vehicle_id = Some(vehicles.add_vehicle(route.mode, &self.vehicle_types));
                }
            }
        }
        shape_references.sort();

        info!(
            stop_facilities = schedule.stop_facilities.len(),
            transit_lines = schedule.lines.len(),
            transit_routes = schedule.routes().count(),
            departures = schedule.departure_count(),
            "Schedule created"
        );

        Conversion {
            schedule,
            vehicles,
            shape_references,
            selection,
        }
    }
}

struct RouteGroup {
    line_id: String,
    route_id: String,
    stops: Vec<RouteStop>,
    departures: Vec<Departure>,
    shape_id: Option<String>,
}

fn stop_facilities(feed: &GtfsFeed, crs: &Crs) -> BTreeMap<String, StopFacility> {
    let mut facilities = BTreeMap::new();
    for stop in feed.stops.values().filter(|s| s.is_stop_point()) {
        let (Some(lon), Some(lat)) = (stop.longitude, stop.latitude) else {
            warn!(stop_id = %stop.id, "Stop has no coordinates, no stop facility created");
            continue;
        };
        let coord = match crs.transform(lon, lat) {
            Ok(coord) => coord,
            Err(e) => {
                warn!(stop_id = %stop.id, error = %e, "Stop not projectable, no stop facility created");
                continue;
            }
        };
        facilities.insert(
            stop.id.clone(),
            StopFacility {
                id: stop.id.clone(),
                name: stop.name.clone(),
                coord,
            },
        );
    }
    facilities
}

/// Returns the first departure time and the stop profile with offsets
/// relative to it, or `None` if the trip cannot become a transit route.
fn route_profile(
    trip: &Trip,
    facilities: &BTreeMap<String, StopFacility>,
) -> Option<(u32, Vec<RouteStop>)> {
    if trip.stop_times.len() < 2 {
        debug!(trip_id = %trip.id, "Trip has fewer than two stop times");
        return None;
    }
    if let Some(st) = trip.stop_times.iter().find(|st| !facilities.contains_key(&st.stop_id)) {
        debug!(trip_id = %trip.id, stop_id = %st.stop_id, "Trip serves a stop without stop facility");
        return None;
    }
    let Some(times) = interpolate_times(&trip.stop_times) else {
        debug!(trip_id = %trip.id, "Trip has no times at its first or last stop");
        return None;
    };

    let base = times[0].1;
    let last = times.len() - 1;
    let stops = trip
        .stop_times
        .iter()
        .zip(&times)
        .enumerate()
        .map(|(i, (st, (arrival, departure)))| RouteStop {
            stop_facility_id: st.stop_id.clone(),
            arrival_offset: (i > 0).then(|| arrival.saturating_sub(base)),
            departure_offset: (i < last).then(|| departure.saturating_sub(base)),
            await_departure: true,
        })
        .collect();
    Some((base, stops))
}

/// Arrival and departure of every stop time. Untimed intermediate stops are
/// interpolated linearly between their timed neighbours.
fn interpolate_times(stop_times: &[StopTime]) -> Option<Vec<(u32, u32)>> {
    let known: Vec<Option<(u32, u32)>> = stop_times
        .iter()
        .map(|st| match (st.arrival_time, st.departure_time) {
            (Some(a), Some(d)) => Some((a, d)),
            (Some(t), None) | (None, Some(t)) => Some((t, t)),
            (None, None) => None,
        })
        .collect();
    if known.first()?.is_none() || known.last()?.is_none() {
        return None;
    }

    let mut times = Vec::with_capacity(known.len());
    let mut prev = 0;
    for (i, k) in known.iter().enumerate() {
        match k {
            Some(t) => {
                times.push(*t);
                prev = i;
            }
            None => {
                let next = (i + 1..known.len()).find(|j| known[*j].is_some())?;
                let start = times[prev].1;
                let end = known[next]?.0;
                let span = end.saturating_sub(start) as u64;
                let t = start + (span * (i - prev) as u64 / (next - prev) as u64) as u32;
                times.push((t, t));
            }
        }
    }
    Some(times)
}

fn departures(trip: &Trip, base: u32) -> Vec<Departure> {
    if trip.frequencies.is_empty() {
        return vec![Departure {
            id: trip.id.clone(),
            time: base,
            vehicle_id: None,
        }];
    }
    let mut result = Vec::new();
    for frequency in &trip.frequencies {
        if frequency.headway_secs == 0 {
            warn!(trip_id = %trip.id, "Frequency with a headway of 0 seconds ignored");
            continue;
        }
        let mut time = frequency.start_time;
        while time < frequency.end_time {
            result.push(Departure {
                id: format!("{}_{}", trip.id, result.len() + 1),
                time,
                vehicle_id: None,
            });
            match time.checked_add(frequency.headway_secs) {
                Some(next) => time = next,
                None => break,
            }
        }
    }
    result
}
