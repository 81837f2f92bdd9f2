//! Default vehicle fleet: one vehicle type per transport mode and one vehicle
//! per departure.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use super::TransportMode;

/// Dimensions and capacity of a vehicle type.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VehicleTypeSpec {
    pub seats: u32,
    pub standing_room: u32,
    /// Metres
    pub length: f64,
    /// Metres
    pub width: f64,
    /// Passenger car equivalents
    pub pce: f64,
    /// Network mode used once the schedule is mapped
    pub network_mode: String,
}

impl VehicleTypeSpec {
    fn new(seats: u32, standing_room: u32, length: f64, width: f64, pce: f64, network_mode: &str) -> Self {
        Self {
            seats,
            standing_room,
            length,
            width,
            pce,
            network_mode: network_mode.to_string(),
        }
    }

    /// Built-in defaults for a transport mode
    pub fn default_for(mode: TransportMode) -> Self {
        match mode {
            TransportMode::Bus => Self::new(38, 52, 18.0, 2.5, 2.8, "car"),
            TransportMode::Trolleybus => Self::new(38, 52, 18.0, 2.5, 2.8, "car"),
            TransportMode::Tram => Self::new(80, 100, 36.0, 2.4, 5.2, "tram"),
            TransportMode::Subway => Self::new(200, 600, 120.0, 2.9, 17.0, "subway"),
            TransportMode::Rail => Self::new(400, 0, 200.0, 2.8, 27.1, "rail"),
            TransportMode::Monorail => Self::new(100, 200, 60.0, 2.7, 9.0, "monorail"),
            TransportMode::Ferry => Self::new(250, 0, 50.0, 6.0, 7.1, "ferry"),
            TransportMode::CableCar => Self::new(30, 30, 8.0, 2.4, 1.5, "cable_car"),
            TransportMode::Gondola => Self::new(8, 0, 3.0, 2.0, 0.5, "gondola"),
            TransportMode::Funicular => Self::new(50, 150, 20.0, 2.6, 3.0, "funicular"),
            TransportMode::Other => Self::new(50, 50, 15.0, 2.5, 2.0, "other"),
        }
    }
}

/// Per-mode overrides of the default vehicle types.
///
/// Stored as a JSON object on disk:
/// ```json
/// {
///   "bus": { "seats": 40, "standing_room": 60, "length": 12.0, "width": 2.55, "pce": 2.0, "network_mode": "car" }
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct VehicleTypeConfig {
    entries: HashMap<TransportMode, VehicleTypeSpec>,
}

impl VehicleTypeConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading vehicle types from {}", path.display()))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let entries: HashMap<TransportMode, VehicleTypeSpec> =
            serde_json::from_str(content).context("parsing vehicle types")?;
        Ok(Self { entries })
    }

    /// The configured type for `mode`, falling back to the built-in default
    pub fn spec_for(&self, mode: TransportMode) -> VehicleTypeSpec {
        self.entries
            .get(&mode)
            .cloned()
            .unwrap_or_else(|| VehicleTypeSpec::default_for(mode))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleType {
    pub id: String,
    pub spec: VehicleTypeSpec,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vehicle {
    pub id: String,
    pub type_id: String,
}

/// Vehicle types sorted by id, vehicles in the order they were added
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vehicles {
    pub types: BTreeMap<String, VehicleType>,
    pub vehicles: Vec<Vehicle>,
}

impl Vehicles {
    /// Adds the vehicle type of `mode` if missing and returns its id.
    pub fn ensure_type(&mut self, mode: TransportMode, config: &VehicleTypeConfig) -> String {
        let id = mode.as_str().to_string();
        self.types.entry(id.clone()).or_insert_with(|| VehicleType {
            id: id.clone(),
            spec: config.spec_for(mode),
        });
        id
    }

    /// Creates a new vehicle of `mode`, numbered after the existing vehicles.
    pub fn add_vehicle(&mut self, mode: TransportMode, config: &VehicleTypeConfig) -> String {
        let type_id = self.ensure_type(mode, config);
        let id = format!("veh_{}_{}", self.vehicles.len() + 1, mode);
        self.vehicles.push(Vehicle {
            id: id.clone(),
            type_id,
        });
        id
    }
}
