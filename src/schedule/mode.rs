use std::fmt;

use serde::{Deserialize, Serialize};

/// Transport mode of a transit route, derived from the GTFS `route_type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    Tram,
    Subway,
    Rail,
    Bus,
    Ferry,
    CableCar,
    Gondola,
    Funicular,
    Trolleybus,
    Monorail,
    Other,
}

impl TransportMode {
    pub const ALL: [TransportMode; 11] = [
        TransportMode::Tram,
        TransportMode::Subway,
        TransportMode::Rail,
        TransportMode::Bus,
        TransportMode::Ferry,
        TransportMode::CableCar,
        TransportMode::Gondola,
        TransportMode::Funicular,
        TransportMode::Trolleybus,
        TransportMode::Monorail,
        TransportMode::Other,
    ];

    /// Maps basic (0-12) and extended (100-1799) route types.
    pub fn from_route_type(route_type: u16) -> Self {
        match route_type {
            0 => TransportMode::Tram,
            1 => TransportMode::Subway,
            2 => TransportMode::Rail,
            3 => TransportMode::Bus,
            4 => TransportMode::Ferry,
            5 => TransportMode::CableCar,
            6 => TransportMode::Gondola,
            7 => TransportMode::Funicular,
            11 => TransportMode::Trolleybus,
            12 => TransportMode::Monorail,
            100..=199 => TransportMode::Rail,
            200..=299 => TransportMode::Bus,
            405 => TransportMode::Monorail,
            400..=499 => TransportMode::Subway,
            700..=799 => TransportMode::Bus,
            800..=899 => TransportMode::Trolleybus,
            900..=999 => TransportMode::Tram,
            1000..=1099 | 1200..=1299 => TransportMode::Ferry,
            1300..=1399 => TransportMode::Gondola,
            1400..=1499 => TransportMode::Funicular,
            _ => TransportMode::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Tram => "tram",
            TransportMode::Subway => "subway",
            TransportMode::Rail => "rail",
            TransportMode::Bus => "bus",
            TransportMode::Ferry => "ferry",
            TransportMode::CableCar => "cable_car",
            TransportMode::Gondola => "gondola",
            TransportMode::Funicular => "funicular",
            TransportMode::Trolleybus => "trolleybus",
            TransportMode::Monorail => "monorail",
            TransportMode::Other => "other",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
