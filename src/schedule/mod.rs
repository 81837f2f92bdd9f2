//! In-memory unmapped transit schedule.
//!
//! Stop facilities carry coordinates but no link, transit routes carry an
//! ordered stop profile but no network route.

mod mode;
pub mod vehicles;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::crs::Coord;

pub use mode::TransportMode;
pub use vehicles::{Vehicle, VehicleType, VehicleTypeConfig, VehicleTypeSpec, Vehicles};

#[derive(Debug, Clone, PartialEq)]
pub struct StopFacility {
    pub id: String,
    pub name: Option<String>,
    pub coord: Coord,
}

/// A stop of a [`TransitRoute`] with offsets relative to the route's departure
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteStop {
    pub stop_facility_id: String,
    pub arrival_offset: Option<u32>,
    pub departure_offset: Option<u32>,
    pub await_departure: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub id: String,
    /// Seconds after midnight of the service day, may exceed 24h
    pub time: u32,
    pub vehicle_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransitRoute {
    pub id: String,
    pub mode: TransportMode,
    pub stops: Vec<RouteStop>,
    pub departures: Vec<Departure>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransitLine {
    pub id: String,
    pub name: Option<String>,
    pub routes: BTreeMap<String, TransitRoute>,
}

/// Stop facilities and transit lines, both sorted by id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitSchedule {
    pub stop_facilities: BTreeMap<String, StopFacility>,
    pub lines: BTreeMap<String, TransitLine>,
}

impl TransitSchedule {
    pub fn routes(&self) -> impl Iterator<Item = (&TransitLine, &TransitRoute)> {
        self.lines
            .values()
            .flat_map(|line| line.routes.values().map(move |route| (line, route)))
    }

    pub fn departure_count(&self) -> usize {
        self.routes().map(|(_, route)| route.departures.len()).sum()
    }
}

/// One row of the transit route to GTFS shape association
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeReference {
    pub transit_line_id: String,
    pub transit_route_id: String,
    pub shape_id: String,
}

/// Formats seconds after midnight as `HH:MM:SS`, hours are not wrapped.
pub fn format_time(seconds: u32) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        seconds % 3600 / 60,
        seconds % 60
    )
}
