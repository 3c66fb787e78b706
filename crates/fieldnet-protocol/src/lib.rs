//! fieldnet protocol: per-role state machines for sensor discovery, data
//! collection and route conflict resolution.
//!
//! Each agent is a reactive actor. It owns its state and changes it only from
//! one of three callbacks (timer, packet, telemetry), talking to the world
//! exclusively through a [`Provider`].

pub mod config;
pub mod conflict;
pub mod coordinator;
pub mod mission;
pub mod provider;
pub mod sensor;
pub mod surveyor;

pub use config::{ConfigError, ProtocolConfig};
pub use conflict::{resolve, Branch, ConflictLabel, Directive, Rank};
pub use coordinator::{Coordinator, CoordinatorLedger, LedgerEntry};
pub use mission::MissionPlan;
pub use provider::{Agent, Provider, Telemetry, TimerHandle, TimerSlot};
pub use sensor::{SensorAgent, SensorOutcome, SensorState};
pub use surveyor::{Surveyor, SurveyorState, SurveyorSummary};
