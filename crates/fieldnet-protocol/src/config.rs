/// Protocol tuning shared by every agent in a deployment.
use fieldnet_wire::Position;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Communication range must be positive, got {0}")]
    Range(f64),

    #[error("Heartbeat interval must be positive, got {0}")]
    Heartbeat(f64),

    #[error("Patrol loop must contain at least one waypoint")]
    EmptyPatrol,
}

/// Configuration for the fieldnet agents.
///
/// The defaults reproduce the reference deployment: a 500 x 500 field with a
/// ground station near the origin and a 50-unit radio range.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Radio range. Also sets the arrival radius at one tenth of it.
    pub range: f64,
    /// Simulated seconds between heartbeats (surveyors), beacons (sensors)
    /// and assignment rounds (coordinator).
    pub heartbeat_interval: f64,
    /// Altitude at which surveyors visit a discovered sensor.
    pub survey_altitude: f64,
    /// Closed patrol polygon handed out by the coordinator. The last point is
    /// the drop-off where surveyors report.
    pub patrol: Vec<Position>,
}

impl ProtocolConfig {
    /// Squared arrival radius, `(range / 10)^2`. Arrival requires a strictly
    /// smaller squared distance.
    pub fn arrival_threshold(&self) -> f64 {
        let radius = self.range / 10.0;
        radius * radius
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.range > 0.0) {
            return Err(ConfigError::Range(self.range));
        }
        if !(self.heartbeat_interval > 0.0) {
            return Err(ConfigError::Heartbeat(self.heartbeat_interval));
        }
        if self.patrol.is_empty() {
            return Err(ConfigError::EmptyPatrol);
        }
        Ok(())
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            range: 50.0,
            heartbeat_interval: 1.0,
            survey_altitude: 20.0,
            patrol: vec![
                Position::new(50.0, 50.0, 20.0),
                Position::new(50.0, 450.0, 20.0),
                Position::new(450.0, 450.0, 20.0),
                Position::new(450.0, 50.0, 20.0),
                Position::new(15.0, 15.0, 0.0),
            ],
        }
    }
}
