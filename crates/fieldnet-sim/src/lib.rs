//! Reference runtime for the fieldnet agents.
//!
//! Drives sensors, surveyors and a coordinator through a discrete event
//! simulation: a timer service, a range-gated radio medium and straight-line
//! mobility toward each surveyor's current waypoint. Everything is
//! deterministic for a given scenario and seed.

pub mod medium;
pub mod node;
pub mod queue;
pub mod report;
pub mod scenario;
pub mod simulation;

pub use medium::{fly_towards, Medium, TrafficStats};
pub use node::{Node, NodeSlot};
pub use queue::{Event, EventQueue, TimerService};
pub use report::{sweep, SeedReport, SimulationReport, SweepReport, SweepSummary};
pub use scenario::{random_field, Scenario, SimulationError};
pub use simulation::{run_scenario, Simulation};
