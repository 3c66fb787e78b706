use std::collections::HashSet;

use fieldnet_wire::{decode, AgentId, Body, Message, Position, Role};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ProtocolConfig;
use crate::conflict::{resolve, ConflictLabel, Directive, Rank};
use crate::mission::MissionPlan;
use crate::provider::{broadcast, unicast, Agent, Provider, Telemetry, TimerHandle, TimerSlot};

/// Coarse surveyor state, derived from its flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurveyorState {
    /// No mission running.
    Idle,
    Patrolling,
    /// At a waypoint, data requested but not yet received.
    AwaitingData,
    /// Stood down by the coordinator; no more heartbeats.
    Retired,
}

/// Final state of a surveyor, collected at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurveyorSummary {
    pub id: AgentId,
    pub sensor_count: u64,
    pub assigned: bool,
    pub retired: bool,
    pub label: Option<ConflictLabel>,
}

/// A mobile agent that patrols its mission, detours to sensors and reports
/// what it collected.
#[derive(Debug, Clone)]
pub struct Surveyor {
    config: ProtocolConfig,
    mission: MissionPlan,
    /// Present from the first adopted assignment on.
    label: Option<ConflictLabel>,
    position: Option<Position>,
    assigned: bool,
    retired: bool,
    got_data: bool,
    awaiting_data: bool,
    away: bool,
    sensor_count: u64,
    heartbeat: TimerSlot,
    /// Sensors already spliced into the mission.
    detours: HashSet<AgentId>,
    /// Peer we offered ourselves to after yielding.
    parlay_with: Option<AgentId>,
}

impl Surveyor {
    pub fn new(config: ProtocolConfig) -> Self {
        Self {
            config,
            mission: MissionPlan::new(),
            label: None,
            position: None,
            assigned: false,
            retired: false,
            got_data: false,
            awaiting_data: false,
            away: false,
            sensor_count: 0,
            heartbeat: TimerSlot::new(),
            detours: HashSet::new(),
            parlay_with: None,
        }
    }

    pub fn mission(&self) -> &MissionPlan {
        &self.mission
    }

    pub fn label(&self) -> Option<&ConflictLabel> {
        self.label.as_ref()
    }

    pub fn label_mut(&mut self) -> Option<&mut ConflictLabel> {
        self.label.as_mut()
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }

    pub fn sensor_count(&self) -> u64 {
        self.sensor_count
    }

    pub fn is_assigned(&self) -> bool {
        self.assigned
    }

    pub fn is_retired(&self) -> bool {
        self.retired
    }

    pub fn got_data(&self) -> bool {
        self.got_data
    }

    pub fn is_away(&self) -> bool {
        self.away
    }

    pub fn heartbeat_armed(&self) -> bool {
        self.heartbeat.is_armed()
    }

    pub fn state(&self) -> SurveyorState {
        if self.retired {
            SurveyorState::Retired
        } else if self.awaiting_data {
            SurveyorState::AwaitingData
        } else if self.assigned && !self.mission.is_idle() {
            SurveyorState::Patrolling
        } else {
            SurveyorState::Idle
        }
    }

    /// Mobility callback: the vehicle physically reached the current waypoint.
    pub fn handle_waypoint_reached(&mut self) {
        self.mission.advance();
    }

    pub fn finish(&self, id: AgentId) -> SurveyorSummary {
        info!(
            surveyor = id,
            sensor_count = self.sensor_count,
            retired = self.retired,
            "surveyor finished"
        );
        SurveyorSummary {
            id,
            sensor_count: self.sensor_count,
            assigned: self.assigned,
            retired: self.retired,
            label: self.label.clone(),
        }
    }

    fn weight(&self) -> u32 {
        self.label.as_ref().map_or(1, |label| label.weight)
    }

    fn send_beacon(&mut self, provider: &mut dyn Provider) {
        debug!(
            surveyor = provider.self_id(),
            position = ?self.position,
            weight = self.weight(),
            away = self.away,
            "heartbeat"
        );
        broadcast(
            provider,
            Role::Surveyor,
            Body::Beacon {
                position: self.position,
                waypoints: Some(self.mission.claim().to_vec()),
                away: Some(self.away),
                weight: Some(self.weight()),
            },
        );
        self.heartbeat.arm(provider, self.config.heartbeat_interval);
    }

    fn start_mission(&mut self, waypoints: Vec<Position>) {
        self.mission.restart(waypoints);
        self.got_data = false;
        self.awaiting_data = false;
        self.away = false;
    }

    /// Head back to the drop-off point so the coordinator can collect.
    fn stand_down(&mut self, provider: &mut dyn Provider) {
        if self.retired {
            return;
        }
        if let Some(drop_off) = self.mission.last() {
            self.mission.restart(vec![drop_off]);
            self.got_data = false;
            self.awaiting_data = false;
        }
        info!(surveyor = provider.self_id(), "standing down");
    }

    fn retire(&mut self, provider: &mut dyn Provider) {
        if self.retired {
            return;
        }
        self.retired = true;
        self.awaiting_data = false;
        self.heartbeat.cancel(provider);
        self.mission.stop();
        info!(surveyor = provider.self_id(), sensor_count = self.sensor_count, "retired");
    }

    fn handle_message(&mut self, message: Message, provider: &mut dyn Provider) {
        let sender = message.sender_id;
        match (message.sender_role, message.body) {
            (Role::Sensor, Body::Beacon { position, .. }) => {
                self.on_sensor_beacon(sender, position, provider);
            }
            (Role::Sensor, Body::DataRequest) => {
                unicast(provider, Role::Surveyor, sender, Body::Data { count: Some(1) });
            }
            (Role::Sensor, Body::Data { .. }) => {
                self.sensor_count += 1;
                self.got_data = true;
                self.awaiting_data = false;
                info!(
                    surveyor = provider.self_id(),
                    sensor = sender,
                    sensor_count = self.sensor_count,
                    "collected sensor data"
                );
            }
            (Role::Coordinator, Body::Assignment { waypoints, .. }) => {
                self.on_coordinator_assignment(waypoints, provider);
            }
            (Role::Coordinator, Body::DataRequest) => {
                if self.mission.is_final_leg() {
                    info!(
                        surveyor = provider.self_id(),
                        sensor_count = self.sensor_count,
                        "reporting to coordinator"
                    );
                    unicast(
                        provider,
                        Role::Surveyor,
                        sender,
                        Body::Data {
                            count: Some(self.sensor_count),
                        },
                    );
                } else {
                    debug!(surveyor = provider.self_id(), "not on final leg, report deferred");
                }
            }
            (Role::Coordinator, Body::Copy) => self.retire(provider),
            (Role::Surveyor, Body::Beacon {
                waypoints, weight, ..
            }) => {
                self.on_peer_beacon(sender, waypoints, weight, provider);
            }
            (Role::Surveyor, Body::Assignment { waypoints, depth }) => {
                self.on_peer_assignment(sender, waypoints, depth, provider);
            }
            (_, Body::Halt) => self.on_halt(sender, provider),
            (Role::Surveyor, Body::Parlay { position }) => {
                self.on_parlay(sender, position, provider);
            }
            (role, body) => {
                debug!(
                    surveyor = provider.self_id(),
                    from = sender,
                    %role,
                    category = ?body.category(),
                    "ignored"
                );
            }
        }
    }

    fn on_sensor_beacon(
        &mut self,
        sensor: AgentId,
        position: Option<Position>,
        provider: &mut dyn Provider,
    ) {
        if self.retired {
            return;
        }
        let Some(position) = position else {
            debug!(surveyor = provider.self_id(), sensor, "sensor beacon without position");
            return;
        };
        if self.detours.insert(sensor) {
            let detour = position.with_altitude(self.config.survey_altitude);
            self.mission.splice_front(detour);
            info!(surveyor = provider.self_id(), sensor, %detour, "detour spliced");
        }
        unicast(provider, Role::Surveyor, sensor, Body::Copy);
    }

    fn on_coordinator_assignment(&mut self, waypoints: Vec<Position>, provider: &mut dyn Provider) {
        if self.assigned {
            debug!(surveyor = provider.self_id(), "already assigned, assignment ignored");
            return;
        }
        info!(
            surveyor = provider.self_id(),
            waypoints = waypoints.len(),
            "mission assigned by coordinator"
        );
        self.start_mission(waypoints);
        self.assigned = true;
        self.label = Some(ConflictLabel::root());
    }

    /// Absorption by a conflict winner or a peer accepting our parlay.
    fn on_peer_assignment(
        &mut self,
        winner: AgentId,
        waypoints: Vec<Position>,
        depth: Option<u32>,
        provider: &mut dyn Provider,
    ) {
        if self.retired {
            return;
        }
        let label = self.label.get_or_insert_with(ConflictLabel::root);
        if label.parent.is_some() || label.is_child(winner) {
            debug!(surveyor = provider.self_id(), peer = winner, "absorption refused");
            return;
        }
        label.attach(winner, depth.unwrap_or(1));
        let depth = label.depth;
        self.parlay_with = None;
        self.assigned = true;
        self.start_mission(waypoints);
        info!(surveyor = provider.self_id(), parent = winner, depth, "absorbed");
    }

    fn on_peer_beacon(
        &mut self,
        peer: AgentId,
        waypoints: Option<Vec<Position>>,
        weight: Option<u32>,
        provider: &mut dyn Provider,
    ) {
        if self.retired || !self.assigned {
            return;
        }
        let Some(waypoints) = waypoints else {
            return;
        };
        let claim = self.mission.claim();
        if claim.is_empty() || claim != waypoints.as_slice() {
            return;
        }
        let own_id = provider.self_id();
        let Some(label) = self.label.as_mut() else {
            return;
        };
        if label.is_child(peer) {
            // A child still flying our route may have lost its Assignment.
            debug!(surveyor = own_id, peer, "re-sending assignment to child");
            self.send_absorption(peer, provider);
            return;
        }
        let directives = resolve(label, own_id, Rank::new(weight.unwrap_or(1), peer));
        for directive in directives {
            self.apply(directive, provider);
        }
    }

    fn apply(&mut self, directive: Directive, provider: &mut dyn Provider) {
        let own_id = provider.self_id();
        match directive {
            Directive::Halt { to } => {
                info!(surveyor = own_id, peer = to, "halting relation");
                unicast(provider, Role::Surveyor, to, Body::Halt);
            }
            Directive::Parlay { to } => {
                info!(surveyor = own_id, peer = to, "yielding, parlay offered");
                self.parlay_with = Some(to);
                unicast(
                    provider,
                    Role::Surveyor,
                    to,
                    Body::Parlay {
                        position: self.position,
                    },
                );
            }
            Directive::StopMission => self.mission.stop(),
            Directive::Absorb { loser } => self.send_absorption(loser, provider),
            Directive::Yield { winner } => {
                debug!(surveyor = own_id, peer = winner, "outranked, awaiting assignment");
            }
        }
    }

    fn send_absorption(&mut self, loser: AgentId, provider: &mut dyn Provider) {
        let depth = self.label.as_ref().map_or(0, |label| label.depth) + 1;
        info!(surveyor = provider.self_id(), peer = loser, depth, "absorbing peer");
        unicast(
            provider,
            Role::Surveyor,
            loser,
            Body::Assignment {
                waypoints: self.mission.waypoints().to_vec(),
                depth: Some(depth),
            },
        );
    }

    fn on_halt(&mut self, sender: AgentId, provider: &mut dyn Provider) {
        let Some(label) = self.label.as_mut() else {
            debug!(surveyor = provider.self_id(), from = sender, "halt before assignment ignored");
            return;
        };
        if label.parent == Some(sender) || self.parlay_with == Some(sender) {
            label.detach();
            self.parlay_with = None;
            self.stand_down(provider);
        } else if let Some(branch) = label.drop_child(sender) {
            info!(
                surveyor = provider.self_id(),
                child = branch.id,
                weight = label.weight,
                "child released"
            );
        } else {
            debug!(surveyor = provider.self_id(), from = sender, "halt from unknown relation ignored");
        }
    }

    fn on_parlay(&mut self, sender: AgentId, position: Option<Position>, provider: &mut dyn Provider) {
        let own_id = provider.self_id();
        let active = self.assigned && !self.retired && !self.mission.claim().is_empty();
        let accepted = match self.label.as_mut() {
            Some(label) if label.is_relation(sender) => {
                debug!(surveyor = own_id, peer = sender, "parlay from relation ignored");
                return;
            }
            Some(label) if active && label.is_root() => label.adopt_child(sender, 1),
            _ => false,
        };
        if accepted {
            info!(surveyor = own_id, peer = sender, at = ?position, "parlay accepted");
            self.send_absorption(sender, provider);
        } else {
            debug!(surveyor = own_id, peer = sender, "parlay declined");
            unicast(provider, Role::Surveyor, sender, Body::Halt);
        }
    }
}

impl Agent for Surveyor {
    fn role(&self) -> Role {
        Role::Surveyor
    }

    fn initialize(&mut self, provider: &mut dyn Provider) {
        self.mission.stop();
        self.assigned = false;
        self.retired = false;
        self.got_data = false;
        self.heartbeat.arm(provider, self.config.heartbeat_interval);
        info!(surveyor = provider.self_id(), "operation started");
    }

    fn handle_timer(&mut self, handle: TimerHandle, provider: &mut dyn Provider) {
        if !self.heartbeat.fire(handle) || self.retired {
            return;
        }
        self.send_beacon(provider);
    }

    fn handle_packet(&mut self, payload: &[u8], provider: &mut dyn Provider) {
        match decode(payload) {
            Ok(message) => self.handle_message(message, provider),
            Err(err) => warn!(surveyor = provider.self_id(), %err, "malformed packet"),
        }
    }

    fn handle_telemetry(&mut self, telemetry: Telemetry, provider: &mut dyn Provider) {
        self.position = Some(telemetry.position);
        if self.retired {
            return;
        }
        let Some(target) = self.mission.current_target() else {
            return;
        };
        if telemetry.position.squared_distance(&target) >= self.config.arrival_threshold() {
            return;
        }

        self.heartbeat.cancel(provider);
        self.away = true;
        if !self.got_data {
            debug!(surveyor = provider.self_id(), %target, "arrived, requesting data");
            broadcast(provider, Role::Surveyor, Body::DataRequest);
            self.awaiting_data = true;
            self.heartbeat.arm(provider, self.config.heartbeat_interval);
        } else {
            self.mission.complete_current();
            self.got_data = false;
            self.awaiting_data = false;
            debug!(
                surveyor = provider.self_id(),
                remaining = self.mission.waypoints().len(),
                "leg complete"
            );
            self.send_beacon(provider);
        }
    }
}
