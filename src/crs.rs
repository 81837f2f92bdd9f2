//! Coordinate reference systems known to the converter.
//!
//! GTFS coordinates are WGS84 longitude/latitude. [`CrsRegistry::resolve`]
//! maps an identifier (an authority code such as `EPSG:2056`, a PROJ
//! definition, or one of the MATSim names) to a [`Crs`] that projects those
//! coordinates through PROJ.

use std::fmt;

use proj::{Proj, ProjCreateError, ProjError};
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing::{Level, debug, info};

/// Identifier meaning "keep WGS84 longitude/latitude".
pub const WGS84: &str = "WGS84";

const SOURCE_CRS: &str = "EPSG:4326";

#[derive(Error, Debug)]
pub enum CrsError {
    #[error("Code {id} not recognized")]
    Unrecognized {
        id: String,
        #[source]
        source: Option<ProjCreateError>,
    },
    #[error("could not project ({lon}, {lat}) into {id}")]
    Transform {
        id: String,
        lon: f64,
        lat: f64,
        #[source]
        source: ProjError,
    },
}

impl CrsError {
    fn unrecognized(id: &str, source: Option<ProjCreateError>) -> Self {
        CrsError::Unrecognized {
            id: id.to_string(),
            source,
        }
    }
}

/// A planar or geographic coordinate in some [`Crs`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

/// A resolved output coordinate system
pub struct Crs {
    code: String,
    /// `None` when the output stays WGS84
    proj: Option<Proj>,
}

impl Crs {
    /// WGS84 longitude/latitude, no transformation
    pub fn wgs84() -> Self {
        Self {
            code: SOURCE_CRS.to_string(),
            proj: None,
        }
    }

    /// The definition handed to PROJ, e.g. `EPSG:2056`
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn is_wgs84(&self) -> bool {
        self.proj.is_none()
    }

    /// Projects a WGS84 longitude/latitude (degrees) into this system.
    pub fn transform(&self, lon: f64, lat: f64) -> Result<Coord, CrsError> {
        let Some(proj) = &self.proj else {
            return Ok(Coord { x: lon, y: lat });
        };
        let (x, y) = proj.convert((lon, lat)).map_err(|source| CrsError::Transform {
            id: self.code.clone(),
            lon,
            lat,
            source,
        })?;
        Ok(Coord { x, y })
    }
}

impl fmt::Debug for Crs {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Crs").field("code", &self.code).finish()
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.code)
    }
}

/// Maps the MATSim names to authority codes, normalizes the `EPSG:` prefix
/// and passes anything else through unchanged.
fn definition(id: &str) -> String {
    match id {
        WGS84 => return SOURCE_CRS.to_string(),
        "WGS84_Pseudo_Mercator" => return "EPSG:3857".to_string(),
        "CH1903_LV03_Plus" | "CH1903_LV95" => return "EPSG:2056".to_string(),
        "CH1903_LV03" => return "EPSG:21781".to_string(),
        "DHDN_GK4" => return "EPSG:31468".to_string(),
        "WGS84_SA_Albers" => return "ESRI:102033".to_string(),
        _ => {}
    }
    if let Some(rest) = id.strip_prefix("WGS84_UTM") {
        let utm = |zone: &str, base: u32| {
            zone.parse::<u32>()
                .ok()
                .filter(|z| (1..=60).contains(z))
                .map(|z| format!("EPSG:{}", base + z))
        };
        let code = match rest.strip_suffix('N') {
            Some(zone) => utm(zone, 32600),
            None => rest.strip_suffix('S').and_then(|zone| utm(zone, 32700)),
        };
        if let Some(code) = code {
            return code;
        }
    }
    match id.get(..5) {
        Some(prefix) if prefix.eq_ignore_ascii_case("EPSG:") => format!("EPSG:{}", &id[5..]),
        _ => id.to_string(),
    }
}

/// Looks up coordinate systems by identifier.
///
/// Lookups are logged at debug/info level, but only up to `verbosity`, so a
/// run can silence this module without touching the global subscriber.
#[derive(Debug, Clone, Copy)]
pub struct CrsRegistry {
    verbosity: LevelFilter,
}

impl Default for CrsRegistry {
    fn default() -> Self {
        Self::new(LevelFilter::WARN)
    }
}

impl CrsRegistry {
    pub fn new(verbosity: LevelFilter) -> Self {
        Self { verbosity }
    }

    fn enabled(&self, level: Level) -> bool {
        level <= self.verbosity
    }

    /// Resolves `id` to a coordinate system known to PROJ.
    pub fn resolve(&self, id: &str) -> Result<Crs, CrsError> {
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(CrsError::unrecognized(id, None));
        }
        let code = definition(trimmed);
        if code == SOURCE_CRS {
            if self.enabled(Level::INFO) {
                info!(id, "No coordinate transformation applied");
            }
            return Ok(Crs::wgs84());
        }

        let proj = Proj::new_known_crs(SOURCE_CRS, &code, None)
            .map_err(|e| CrsError::unrecognized(id, Some(e)))?;
        if self.enabled(Level::DEBUG) {
            debug!(id, code = %code, "Coordinate system resolved");
        }
        Ok(Crs {
            code,
            proj: Some(proj),
        })
    }
}
