//! Reading of GTFS feeds stored as a directory of CSV files.
//!
//! [`GtfsFeed`] holds the tables needed for an unmapped schedule, with stop
//! times already attached to their trips. [`ServiceCalendar`] answers which
//! services run on which dates.

pub mod calendar;
mod error;
mod objects;
mod reader;
mod serde_helpers;

use std::collections::HashMap;

pub use calendar::{ServiceCalendar, ServiceSelection};
pub use error::FeedError;
pub use objects::*;
pub use serde_helpers::parse_time;

/// All GTFS objects used by the converter, indexed by id
#[derive(Debug, Default)]
pub struct GtfsFeed {
    /// All stops by `stop_id`
    pub stops: HashMap<String, Stop>,
    /// All routes by `route_id`
    pub routes: HashMap<String, Route>,
    /// All trips by `trip_id`, with their stop times and frequencies
    pub trips: HashMap<String, Trip>,
    /// All calendars by `service_id`
    pub calendar: HashMap<String, Calendar>,
    /// All calendar dates grouped by `service_id`
    pub calendar_dates: HashMap<String, Vec<CalendarDate>>,
}
