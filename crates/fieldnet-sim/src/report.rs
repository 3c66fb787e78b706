//! End-of-run reporting and multi-seed sweeps.

use fieldnet_protocol::SurveyorSummary;
use rayon::prelude::*;
use serde::Serialize;

use crate::medium::TrafficStats;
use crate::node::{Node, NodeSlot};
use crate::scenario::{Scenario, SimulationError};
use crate::simulation::run_scenario;

/// What one run achieved, gathered from each agent's final state.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub duration: f64,
    pub sensors_delivered: usize,
    pub sensors_pending: usize,
    pub surveyors: Vec<SurveyorSummary>,
    pub coordinator_total: u64,
    pub messages_sent: u64,
    pub messages_delivered: u64,
}

impl SimulationReport {
    pub(crate) fn collect(duration: f64, nodes: &[NodeSlot], traffic: TrafficStats) -> Self {
        let mut report = SimulationReport {
            duration,
            sensors_delivered: 0,
            sensors_pending: 0,
            surveyors: Vec::new(),
            coordinator_total: 0,
            messages_sent: traffic.sent,
            messages_delivered: traffic.delivered,
        };
        for (index, slot) in nodes.iter().enumerate() {
            let id = index as u64;
            match &slot.node {
                Node::Sensor(sensor) => {
                    if sensor.finish(id).delivered {
                        report.sensors_delivered += 1;
                    } else {
                        report.sensors_pending += 1;
                    }
                }
                Node::Surveyor(surveyor) => report.surveyors.push(surveyor.finish(id)),
                Node::Coordinator(coordinator) => report.coordinator_total += coordinator.finish(),
            }
        }
        report
    }

    /// Surveyor summary by node id.
    pub fn surveyor(&self, id: u64) -> Option<&SurveyorSummary> {
        self.surveyors.iter().find(|summary| summary.id == id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SeedReport {
    pub seed: u64,
    pub report: SimulationReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepSummary {
    pub runs: usize,
    pub mean_delivered: f64,
    pub mean_coordinator_total: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub runs: Vec<SeedReport>,
    pub summary: SweepSummary,
}

/// Run `scenario` once per seed on the rayon pool.
///
/// Runs are independent; results come back in seed order.
pub fn sweep(scenario: &Scenario, seeds: &[u64]) -> Result<SweepReport, SimulationError> {
    scenario.validate()?;
    let runs: Vec<SeedReport> = seeds
        .par_iter()
        .map(|&seed| {
            let mut scenario = scenario.clone();
            scenario.seed = seed;
            run_scenario(scenario).map(|report| SeedReport { seed, report })
        })
        .collect::<Result<_, _>>()?;

    let count = runs.len();
    let mean = |value: fn(&SimulationReport) -> f64| {
        if count == 0 {
            0.0
        } else {
            runs.iter().map(|run| value(&run.report)).sum::<f64>() / count as f64
        }
    };
    let summary = SweepSummary {
        runs: count,
        mean_delivered: mean(|r| r.sensors_delivered as f64),
        mean_coordinator_total: mean(|r| r.coordinator_total as f64),
    };
    Ok(SweepReport { runs, summary })
}
