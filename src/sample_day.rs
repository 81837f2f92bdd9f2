//! Selection of the service-calendar subset that is turned into a schedule.

use std::fmt;

use chrono::NaiveDate;

use crate::error::ConvertError;

/// Token selecting the date on which the most trips run.
pub const DAY_WITH_MOST_TRIPS: &str = "dayWithMostTrips";
/// Token selecting the date on which the most distinct services run.
pub const DAY_WITH_MOST_SERVICES: &str = "dayWithMostServices";
/// Token selecting every service of the feed, regardless of dates.
pub const ALL_SERVICE_IDS: &str = "all";

/// Which services of a feed end up in the schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SampleDay {
    /// Services running on this calendar date
    Date(NaiveDate),
    /// Services of the date with the highest number of trips
    #[default]
    DayWithMostTrips,
    /// Services of the date with the highest number of active services
    DayWithMostServices,
    /// All services, no calendar filtering
    AllServices,
}

impl SampleDay {
    /// Validates a caller supplied token.
    ///
    /// An absent token means [`SampleDay::DayWithMostTrips`]. A present token
    /// must match a sentinel exactly or be an 8 digit `yyyymmdd` calendar
    /// date; anything else is rejected. Note the asymmetry: `None` is never
    /// an error, while an empty string is.
    pub fn resolve(token: Option<&str>) -> Result<Self, ConvertError> {
        match token {
            None => Ok(SampleDay::default()),
            Some(DAY_WITH_MOST_TRIPS) => Ok(SampleDay::DayWithMostTrips),
            Some(DAY_WITH_MOST_SERVICES) => Ok(SampleDay::DayWithMostServices),
            Some(ALL_SERVICE_IDS) => Ok(SampleDay::AllServices),
            Some(other) => parse_compact_date(other)
                .map(SampleDay::Date)
                .ok_or_else(|| ConvertError::InvalidSelector(other.to_string())),
        }
    }
}

impl fmt::Display for SampleDay {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SampleDay::Date(date) => write!(f, "{}", date.format("%Y%m%d")),
            SampleDay::DayWithMostTrips => f.write_str(DAY_WITH_MOST_TRIPS),
            SampleDay::DayWithMostServices => f.write_str(DAY_WITH_MOST_SERVICES),
            SampleDay::AllServices => f.write_str(ALL_SERVICE_IDS),
        }
    }
}

fn parse_compact_date(s: &str) -> Option<NaiveDate> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = s[0..4].parse().ok()?;
    let month: u32 = s[4..6].parse().ok()?;
    let day: u32 = s[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
