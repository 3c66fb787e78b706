use fieldnet_wire::{decode, AgentId, Body, Message, Position, Role};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ProtocolConfig;
use crate::provider::{broadcast, unicast, Agent, Provider, Telemetry, TimerHandle, TimerSlot};

/// Lifecycle of a sensor's single data packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorState {
    /// Beaconing, waiting for a surveyor.
    Undiscovered,
    /// Claimed by exactly one surveyor, waiting for its data request.
    Discovered { claimer: AgentId },
    /// Data handed off to the claimer.
    Delivered { claimer: AgentId },
}

/// Final state of a sensor, collected at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SensorOutcome {
    pub id: AgentId,
    pub delivered: bool,
}

/// A stationary sensor holding one packet of data.
#[derive(Debug, Clone)]
pub struct SensorAgent {
    config: ProtocolConfig,
    state: SensorState,
    position: Option<Position>,
    timer: TimerSlot,
}

impl SensorAgent {
    pub fn new(config: ProtocolConfig) -> Self {
        Self {
            config,
            state: SensorState::Undiscovered,
            position: None,
            timer: TimerSlot::new(),
        }
    }

    pub fn state(&self) -> SensorState {
        self.state
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }

    pub fn finish(&self, id: AgentId) -> SensorOutcome {
        let delivered = matches!(self.state, SensorState::Delivered { .. });
        info!(sensor = id, delivered, "sensor finished");
        SensorOutcome { id, delivered }
    }

    fn send_beacon(&mut self, provider: &mut dyn Provider) {
        debug!(sensor = provider.self_id(), position = ?self.position, "beacon");
        broadcast(
            provider,
            Role::Sensor,
            Body::Beacon {
                position: self.position,
                waypoints: None,
                away: None,
                weight: None,
            },
        );
        self.timer.arm(provider, self.config.heartbeat_interval);
    }

    fn claim(&mut self, claimer: AgentId, provider: &mut dyn Provider) {
        self.state = SensorState::Discovered { claimer };
        self.timer.cancel(provider);
        info!(sensor = provider.self_id(), surveyor = claimer, "claimed");
    }

    fn handle_message(&mut self, message: Message, provider: &mut dyn Provider) {
        let sender = message.sender_id;
        match (message.sender_role, message.body, self.state) {
            (Role::Surveyor, Body::Beacon { .. }, SensorState::Undiscovered) => {
                unicast(
                    provider,
                    Role::Sensor,
                    sender,
                    Body::Beacon {
                        position: self.position,
                        waypoints: None,
                        away: None,
                        weight: None,
                    },
                );
                self.claim(sender, provider);
            }
            (Role::Surveyor, Body::Copy, SensorState::Undiscovered) => {
                self.claim(sender, provider);
            }
            (Role::Surveyor, Body::DataRequest, SensorState::Discovered { claimer })
                if claimer == sender =>
            {
                unicast(provider, Role::Sensor, sender, Body::Data { count: None });
                self.state = SensorState::Delivered { claimer };
                info!(sensor = provider.self_id(), surveyor = sender, "data delivered");
            }
            (role, body, state) => {
                debug!(
                    sensor = provider.self_id(),
                    from = sender,
                    %role,
                    category = ?body.category(),
                    ?state,
                    "ignored"
                );
            }
        }
    }
}

impl Agent for SensorAgent {
    fn role(&self) -> Role {
        Role::Sensor
    }

    fn initialize(&mut self, provider: &mut dyn Provider) {
        info!(sensor = provider.self_id(), "packet ready");
        self.timer.arm(provider, self.config.heartbeat_interval);
    }

    fn handle_timer(&mut self, handle: TimerHandle, provider: &mut dyn Provider) {
        if !self.timer.fire(handle) {
            return;
        }
        if self.state == SensorState::Undiscovered {
            self.send_beacon(provider);
        }
    }

    fn handle_packet(&mut self, payload: &[u8], provider: &mut dyn Provider) {
        match decode(payload) {
            Ok(message) => self.handle_message(message, provider),
            Err(err) => warn!(sensor = provider.self_id(), %err, "malformed packet"),
        }
    }

    fn handle_telemetry(&mut self, telemetry: Telemetry, _provider: &mut dyn Provider) {
        self.position = Some(telemetry.position);
    }
}
