//! Rows of the GTFS tables used by the converter.
//!
//! Only the columns needed to build an unmapped schedule are kept. Unknown
//! columns are ignored by the reader.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Deserialize;

use super::serde_helpers::{
    deserialize_bool, deserialize_date, deserialize_optional_time, deserialize_time,
};

/// A physical stop, station or area. See <https://gtfs.org/reference/static/#stopstxt>
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Stop {
    /// Unique technical identifier of the stop
    #[serde(rename = "stop_id")]
    pub id: String,
    /// Name of the location
    #[serde(rename = "stop_name", default)]
    pub name: Option<String>,
    /// Latitude of the stop
    #[serde(rename = "stop_lat", default)]
    pub latitude: Option<f64>,
    /// Longitude of the stop
    #[serde(rename = "stop_lon", default)]
    pub longitude: Option<f64>,
    /// 0 or empty for a stop or platform, other values for stations, entrances...
    #[serde(default)]
    pub location_type: Option<u8>,
}

impl Stop {
    /// Whether passengers board or alight at this location.
    pub fn is_stop_point(&self) -> bool {
        matches!(self.location_type, None | Some(0))
    }
}

/// A commercial line. See <https://gtfs.org/reference/static/#routestxt>
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Route {
    /// Unique technical identifier for the route
    #[serde(rename = "route_id")]
    pub id: String,
    /// Short name of a route, like "32" or "Green"
    #[serde(rename = "route_short_name", default)]
    pub short_name: Option<String>,
    /// Full name of a route
    #[serde(rename = "route_long_name", default)]
    pub long_name: Option<String>,
    /// Basic or extended GTFS route type
    pub route_type: u16,
}

impl Route {
    /// Name shown for the transit line: the short name, else the long name.
    pub fn display_name(&self) -> Option<&str> {
        self.short_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.long_name.as_deref().filter(|s| !s.is_empty()))
    }
}

/// A trip as written in trips.txt, before stop times are attached
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RawTrip {
    /// Unique technical identifier for the trip
    #[serde(rename = "trip_id")]
    pub id: String,
    /// References the service on which this trip runs
    pub service_id: String,
    /// References along which route this trip runs
    pub route_id: String,
    /// Shape of the trip
    #[serde(default)]
    pub shape_id: Option<String>,
}

/// A stop time as written in stop_times.txt
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RawStopTime {
    /// Trip to which this stop time belongs
    pub trip_id: String,
    /// Arrival in seconds after midnight of the service day
    #[serde(deserialize_with = "deserialize_optional_time", default)]
    pub arrival_time: Option<u32>,
    /// Departure in seconds after midnight of the service day
    #[serde(deserialize_with = "deserialize_optional_time", default)]
    pub departure_time: Option<u32>,
    /// Stop where the vehicle stops
    pub stop_id: String,
    /// Order of stops for a particular trip
    pub stop_sequence: u32,
}

/// A stop time attached to its [Trip]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopTime {
    /// Stop where the vehicle stops
    pub stop_id: String,
    /// Arrival in seconds after midnight
    pub arrival_time: Option<u32>,
    /// Departure in seconds after midnight
    pub departure_time: Option<u32>,
    /// Order of the stop within the trip
    pub stop_sequence: u32,
}

impl From<RawStopTime> for StopTime {
    fn from(raw: RawStopTime) -> Self {
        Self {
            stop_id: raw.stop_id,
            arrival_time: raw.arrival_time,
            departure_time: raw.departure_time,
            stop_sequence: raw.stop_sequence,
        }
    }
}

/// A headway based block of departures. See <https://gtfs.org/reference/static/#frequenciestxt>
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Frequency {
    /// Trip whose timing is repeated
    pub trip_id: String,
    /// First departure of the block
    #[serde(deserialize_with = "deserialize_time")]
    pub start_time: u32,
    /// End of the block, exclusive
    #[serde(deserialize_with = "deserialize_time")]
    pub end_time: u32,
    /// Seconds between two departures
    pub headway_secs: u32,
}

/// A trip with its ordered stop times and frequencies
#[derive(Debug, Clone, Default)]
pub struct Trip {
    /// Unique technical identifier for the trip
    pub id: String,
    /// References the service on which this trip runs
    pub service_id: String,
    /// References along which route this trip runs
    pub route_id: String,
    /// Shape of the trip
    pub shape_id: Option<String>,
    /// Stop times sorted by `stop_sequence`
    pub stop_times: Vec<StopTime>,
    /// Headway blocks; empty for a trip that runs exactly once
    pub frequencies: Vec<Frequency>,
}

/// Regular weekly service pattern. See <https://gtfs.org/reference/static/#calendartxt>
#[derive(Debug, Deserialize, Clone)]
pub struct Calendar {
    /// Service identifier
    #[serde(rename = "service_id")]
    pub id: String,
    #[serde(deserialize_with = "deserialize_bool")]
    pub monday: bool,
    #[serde(deserialize_with = "deserialize_bool")]
    pub tuesday: bool,
    #[serde(deserialize_with = "deserialize_bool")]
    pub wednesday: bool,
    #[serde(deserialize_with = "deserialize_bool")]
    pub thursday: bool,
    #[serde(deserialize_with = "deserialize_bool")]
    pub friday: bool,
    #[serde(deserialize_with = "deserialize_bool")]
    pub saturday: bool,
    #[serde(deserialize_with = "deserialize_bool")]
    pub sunday: bool,
    /// First day of the service interval
    #[serde(deserialize_with = "deserialize_date")]
    pub start_date: NaiveDate,
    /// Last day of the service interval, included
    #[serde(deserialize_with = "deserialize_date")]
    pub end_date: NaiveDate,
}

impl Calendar {
    /// Returns true if the service runs on that weekday
    pub fn valid_weekday(&self, date: NaiveDate) -> bool {
        match date.weekday() {
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
            Weekday::Sun => self.sunday,
        }
    }

    /// Returns true if `date` is inside the interval and on a valid weekday
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date && self.valid_weekday(date)
    }
}

/// Whether a [CalendarDate] adds or removes a service
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Exception {
    #[serde(rename = "1")]
    Added,
    #[serde(rename = "2")]
    Deleted,
}

/// A date added to or removed from a service. See <https://gtfs.org/reference/static/#calendar_datestxt>
#[derive(Debug, Deserialize, Clone)]
pub struct CalendarDate {
    /// Service modified on this date
    pub service_id: String,
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    pub exception_type: Exception,
}
