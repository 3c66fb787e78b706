#![allow(dead_code)]

use std::collections::BTreeSet;

use fieldnet_protocol::{Agent, Provider, Telemetry, TimerHandle};
use fieldnet_wire::{decode, encode, AgentId, Body, Message, Position, Role};

/// Where a recorded payload was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Unicast(AgentId),
    Broadcast,
}

/// Provider double that records every command instead of executing it.
pub struct RecordingProvider {
    pub id: AgentId,
    pub sent: Vec<(Destination, Message)>,
    pub armed: BTreeSet<TimerHandle>,
    pub cancelled: Vec<TimerHandle>,
    next_timer: u64,
}

impl RecordingProvider {
    pub fn new(id: AgentId) -> Self {
        Self {
            id,
            sent: Vec::new(),
            armed: BTreeSet::new(),
            cancelled: Vec::new(),
            next_timer: 0,
        }
    }

    /// Drain what was sent since the last call.
    pub fn take_sent(&mut self) -> Vec<(Destination, Message)> {
        std::mem::take(&mut self.sent)
    }

    /// The single outstanding timer, if exactly one is armed.
    pub fn only_timer(&self) -> Option<TimerHandle> {
        if self.armed.len() == 1 {
            self.armed.iter().next().copied()
        } else {
            None
        }
    }

    /// Mark the outstanding timer as fired and hand it to the agent.
    pub fn fire(&mut self, agent: &mut dyn Agent) {
        let handle = self.only_timer().expect("exactly one armed timer");
        self.armed.remove(&handle);
        agent.handle_timer(handle, self);
    }
}

impl Provider for RecordingProvider {
    fn self_id(&self) -> AgentId {
        self.id
    }

    fn schedule_timer(&mut self, _after: f64) -> TimerHandle {
        let handle = TimerHandle(self.next_timer);
        self.next_timer += 1;
        self.armed.insert(handle);
        handle
    }

    fn cancel_timer(&mut self, handle: TimerHandle) {
        self.armed.remove(&handle);
        self.cancelled.push(handle);
    }

    fn send_unicast(&mut self, payload: Vec<u8>, destination: AgentId) {
        let message = decode(&payload).expect("agents only send valid payloads");
        self.sent.push((Destination::Unicast(destination), message));
    }

    fn send_broadcast(&mut self, payload: Vec<u8>) {
        let message = decode(&payload).expect("agents only send valid payloads");
        self.sent.push((Destination::Broadcast, message));
    }
}

pub fn deliver(agent: &mut dyn Agent, provider: &mut RecordingProvider, message: Message) {
    let payload = encode(&message).unwrap();
    agent.handle_packet(&payload, provider);
}

pub fn telemetry(agent: &mut dyn Agent, provider: &mut RecordingProvider, position: Position) {
    agent.handle_telemetry(Telemetry { position }, provider);
}

pub fn patrol() -> Vec<Position> {
    vec![
        Position::new(50.0, 50.0, 20.0),
        Position::new(50.0, 450.0, 20.0),
        Position::new(450.0, 450.0, 20.0),
        Position::new(450.0, 50.0, 20.0),
        Position::new(15.0, 15.0, 0.0),
    ]
}

pub fn assignment_from_coordinator(waypoints: Vec<Position>) -> Message {
    Message::new(
        Role::Coordinator,
        0,
        Body::Assignment {
            waypoints,
            depth: None,
        },
    )
}

pub fn surveyor_beacon(id: AgentId, waypoints: Vec<Position>, weight: u32) -> Message {
    Message::new(
        Role::Surveyor,
        id,
        Body::Beacon {
            position: Some(Position::new(50.0, 50.0, 20.0)),
            waypoints: Some(waypoints),
            away: Some(false),
            weight: Some(weight),
        },
    )
}

pub fn sensor_beacon(id: AgentId, position: Position) -> Message {
    Message::new(
        Role::Sensor,
        id,
        Body::Beacon {
            position: Some(position),
            waypoints: None,
            away: None,
            weight: None,
        },
    )
}

pub fn from(role: Role, id: AgentId, body: Body) -> Message {
    Message::new(role, id, body)
}
