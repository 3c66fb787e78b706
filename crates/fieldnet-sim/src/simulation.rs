//! Single-threaded discrete event simulation of one deployment.

use fieldnet_protocol::{Provider, Telemetry, TimerHandle};
use fieldnet_wire::AgentId;
use tracing::{debug, info, trace};

use crate::medium::{fly_towards, Medium};
use crate::node::{Node, NodeSlot};
use crate::queue::{Event, EventQueue, TimerService};
use crate::report::SimulationReport;
use crate::scenario::{Scenario, SimulationError};

/// A payload an agent handed to the radio during a callback.
struct Outgoing {
    payload: Vec<u8>,
    destination: Option<AgentId>,
}

/// The `Provider` an agent sees while one of its callbacks runs.
///
/// Timers go straight onto the queue. Transmissions are buffered and put on
/// the air once the callback returns, when the sender's position is known.
struct NodeContext<'a> {
    id: AgentId,
    now: f64,
    queue: &'a mut EventQueue,
    timers: &'a mut TimerService,
    outbox: &'a mut Vec<Outgoing>,
}

impl Provider for NodeContext<'_> {
    fn self_id(&self) -> AgentId {
        self.id
    }

    fn schedule_timer(&mut self, after: f64) -> TimerHandle {
        let handle = self.timers.allocate();
        self.queue.push(
            self.now + after,
            Event::Timer {
                node: self.id,
                handle,
            },
        );
        handle
    }

    fn cancel_timer(&mut self, handle: TimerHandle) {
        self.timers.cancel(handle);
    }

    fn send_unicast(&mut self, payload: Vec<u8>, destination: AgentId) {
        self.outbox.push(Outgoing {
            payload,
            destination: Some(destination),
        });
    }

    fn send_broadcast(&mut self, payload: Vec<u8>) {
        self.outbox.push(Outgoing {
            payload,
            destination: None,
        });
    }
}

pub struct Simulation {
    scenario: Scenario,
    nodes: Vec<NodeSlot>,
    queue: EventQueue,
    timers: TimerService,
    medium: Medium,
    now: f64,
}

impl Simulation {
    /// Place every node of `scenario`. Ids follow insertion order from 0.
    pub fn new(scenario: Scenario) -> Result<Self, SimulationError> {
        scenario.validate()?;
        let nodes = scenario
            .placements()
            .into_iter()
            .map(|(role, position)| NodeSlot {
                node: Node::new(role, &scenario.protocol),
                position,
            })
            .collect();
        let medium = Medium::new(scenario.protocol.range);
        Ok(Self {
            scenario,
            nodes,
            queue: EventQueue::new(),
            timers: TimerService::new(),
            medium,
            now: 0.0,
        })
    }

    pub fn nodes(&self) -> &[NodeSlot] {
        &self.nodes
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    /// Run to the scenario's duration and collect the report.
    pub fn run(mut self) -> SimulationReport {
        info!(
            nodes = self.nodes.len(),
            duration = self.scenario.duration,
            seed = self.scenario.seed,
            "simulation started"
        );
        self.start();

        while let Some(time) = self.queue.peek_time() {
            if time > self.scenario.duration {
                break;
            }
            let Some((time, event)) = self.queue.pop() else {
                break;
            };
            self.now = time;
            self.dispatch(event);
        }

        self.now = self.scenario.duration;
        let report = SimulationReport::collect(self.scenario.duration, &self.nodes, self.medium.stats);
        info!(
            delivered = report.sensors_delivered,
            pending = report.sensors_pending,
            coordinator_total = report.coordinator_total,
            "simulation finished"
        );
        report
    }

    fn start(&mut self) {
        for id in 0..self.nodes.len() {
            let position = self.nodes[id].position;
            self.with_node(id, |node, ctx| {
                node.agent_mut().handle_telemetry(Telemetry { position }, ctx);
            });
        }
        for id in 0..self.nodes.len() {
            self.with_node(id, |node, ctx| node.agent_mut().initialize(ctx));
        }
        self.queue.push(self.scenario.step, Event::Mobility);
    }

    fn dispatch(&mut self, event: Event) {
        match event {
            Event::Timer { node, handle } => {
                if self.timers.fire(handle) {
                    self.with_node(node as usize, |node, ctx| {
                        node.agent_mut().handle_timer(handle, ctx);
                    });
                }
            }
            Event::Deliver { to, payload } => {
                self.medium.stats.delivered += 1;
                self.with_node(to as usize, |node, ctx| {
                    node.agent_mut().handle_packet(&payload, ctx);
                });
            }
            Event::Mobility => {
                self.step_mobility();
                self.queue.push(self.now + self.scenario.step, Event::Mobility);
            }
        }
    }

    /// Run one callback on node `index` and put whatever it sent on the air.
    fn with_node<F>(&mut self, index: usize, f: F)
    where
        F: FnOnce(&mut Node, &mut NodeContext<'_>),
    {
        let mut outbox = Vec::new();
        let Some(slot) = self.nodes.get_mut(index) else {
            debug!(node = index, "event for unknown node dropped");
            return;
        };
        let mut ctx = NodeContext {
            id: index as AgentId,
            now: self.now,
            queue: &mut self.queue,
            timers: &mut self.timers,
            outbox: &mut outbox,
        };
        f(&mut slot.node, &mut ctx);
        self.transmit(index, outbox);
    }

    fn transmit(&mut self, sender: usize, outbox: Vec<Outgoing>) {
        let origin = self.nodes[sender].position;
        for outgoing in outbox {
            self.medium.stats.sent += 1;
            let receivers: Vec<usize> = match outgoing.destination {
                Some(destination) => {
                    let index = destination as usize;
                    match self.nodes.get(index) {
                        Some(slot)
                            if index != sender && self.medium.reaches(&origin, &slot.position) =>
                        {
                            vec![index]
                        }
                        _ => Vec::new(),
                    }
                }
                None => self
                    .nodes
                    .iter()
                    .enumerate()
                    .filter(|(index, slot)| {
                        *index != sender && self.medium.reaches(&origin, &slot.position)
                    })
                    .map(|(index, _)| index)
                    .collect(),
            };
            trace!(
                from = sender,
                to = ?outgoing.destination,
                receivers = receivers.len(),
                "transmission"
            );
            for to in receivers {
                self.queue.push(
                    self.now,
                    Event::Deliver {
                        to: to as AgentId,
                        payload: outgoing.payload.clone(),
                    },
                );
            }
        }
    }

    fn step_mobility(&mut self) {
        let distance = self.scenario.speed * self.scenario.step;
        let tolerance = self.scenario.tolerance;
        for index in 0..self.nodes.len() {
            let slot = &mut self.nodes[index];
            let Node::Surveyor(surveyor) = &slot.node else {
                continue;
            };
            let mut snapped = None;
            if let Some(target) = surveyor.mission().current_target() {
                let (next, arrived) = fly_towards(slot.position, target, distance, tolerance);
                slot.position = next;
                if arrived {
                    snapped = Some(target);
                }
            }

            let position = slot.position;
            self.with_node(index, |node, ctx| {
                node.agent_mut().handle_telemetry(Telemetry { position }, ctx);
            });

            // The telemetry may already have moved the plan on; only report
            // arrival at a waypoint that is still current.
            if let Some(target) = snapped {
                if let Node::Surveyor(surveyor) = &mut self.nodes[index].node {
                    if surveyor.mission().current_target() == Some(target) {
                        surveyor.handle_waypoint_reached();
                    }
                }
            }
        }
    }
}

/// Build and run `scenario` in one go.
pub fn run_scenario(scenario: Scenario) -> Result<SimulationReport, SimulationError> {
    Ok(Simulation::new(scenario)?.run())
}
