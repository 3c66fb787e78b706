use std::path::{Path, PathBuf};

use fieldnet_protocol::{ConfigError, ProtocolConfig};
use fieldnet_wire::{Position, Role};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("Failed to read scenario '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid scenario file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid protocol configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Scenario field '{field}' out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("Scenario has no surveyors")]
    NoSurveyors,
}

/// A deployment to simulate: where every node starts and how the world
/// around the protocol behaves.
///
/// Every field has a default, so a scenario file only needs the parts it
/// changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Simulated seconds to run.
    pub duration: f64,
    /// Mobility tick length in simulated seconds.
    pub step: f64,
    /// Surveyor ground speed, units per simulated second.
    pub speed: f64,
    /// Distance at which a surveyor snaps onto its waypoint.
    pub tolerance: f64,
    /// Seed for the random sensor field.
    pub seed: u64,
    /// Sensors at fixed positions.
    pub sensors: Vec<Position>,
    /// Extra sensors scattered uniformly over the field.
    pub random_sensors: usize,
    /// Side length of the square field random sensors are placed in.
    pub field_size: f64,
    pub surveyors: Vec<Position>,
    pub coordinator: Position,
    pub protocol: ProtocolConfig,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            duration: 400.0,
            step: 0.25,
            speed: 10.0,
            tolerance: 0.5,
            seed: 42,
            sensors: vec![Position::new(150.0, 0.0, 0.0)],
            random_sensors: 0,
            field_size: 500.0,
            surveyors: vec![Position::new(0.0, 0.0, 0.0)],
            coordinator: Position::new(15.0, 15.0, 0.0),
            protocol: ProtocolConfig::default(),
        }
    }
}

impl Scenario {
    /// Load a scenario from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, SimulationError> {
        let text = std::fs::read_to_string(path).map_err(|source| SimulationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, SimulationError> {
        let scenario: Scenario = serde_json::from_str(text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        for (field, value) in [
            ("duration", self.duration),
            ("step", self.step),
            ("speed", self.speed),
            ("field_size", self.field_size),
        ] {
            if !(value > 0.0) {
                return Err(SimulationError::OutOfRange { field, value });
            }
        }
        if self.tolerance < 0.0 {
            return Err(SimulationError::OutOfRange {
                field: "tolerance",
                value: self.tolerance,
            });
        }
        if self.surveyors.is_empty() {
            return Err(SimulationError::NoSurveyors);
        }
        self.protocol.validate()?;
        Ok(())
    }

    /// Every node in id order: fixed sensors, random sensors, surveyors,
    /// then the coordinator.
    pub fn placements(&self) -> Vec<(Role, Position)> {
        let mut placements: Vec<(Role, Position)> = self
            .sensors
            .iter()
            .map(|&position| (Role::Sensor, position))
            .collect();
        placements.extend(
            random_field(self.seed, self.random_sensors, self.field_size)
                .into_iter()
                .map(|position| (Role::Sensor, position)),
        );
        placements.extend(self.surveyors.iter().map(|&position| (Role::Surveyor, position)));
        placements.push((Role::Coordinator, self.coordinator));
        placements
    }
}

/// Scatter `count` ground sensors over a `size` x `size` field.
/// Same seed, same field.
pub fn random_field(seed: u64, count: usize, size: f64) -> Vec<Position> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| Position::new(rng.gen_range(0.0..size), rng.gen_range(0.0..size), 0.0))
        .collect()
}
