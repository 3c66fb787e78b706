//! The seam between protocol logic and the runtime substrate.
//!
//! Agents never move, keep time or touch the radio themselves. Every callback
//! receives a `Provider` through which it schedules timers and emits payloads;
//! the substrate decides when timers fire and which receivers are in range.

use fieldnet_wire::{encode, AgentId, Body, Message, Position, Role};
use tracing::warn;

/// Opaque handle for a scheduled one-shot timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub u64);

/// Position refresh pushed by the mobility substrate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Telemetry {
    pub position: Position,
}

/// Capabilities the runtime offers to an agent while it handles an event.
pub trait Provider {
    fn self_id(&self) -> AgentId;

    /// Schedule a one-shot callback `after` simulated seconds from now.
    fn schedule_timer(&mut self, after: f64) -> TimerHandle;

    /// Cancel a pending timer. Cancelling an already fired handle is a no-op.
    fn cancel_timer(&mut self, handle: TimerHandle);

    /// Best-effort unicast; delivery is range-gated by the medium.
    fn send_unicast(&mut self, payload: Vec<u8>, destination: AgentId);

    /// Best-effort broadcast to every receiver in range.
    fn send_broadcast(&mut self, payload: Vec<u8>);
}

/// Callbacks every agent role implements.
pub trait Agent {
    fn role(&self) -> Role;

    fn initialize(&mut self, provider: &mut dyn Provider);

    fn handle_timer(&mut self, handle: TimerHandle, provider: &mut dyn Provider);

    fn handle_packet(&mut self, payload: &[u8], provider: &mut dyn Provider);

    fn handle_telemetry(&mut self, telemetry: Telemetry, provider: &mut dyn Provider);
}

/// The single timer an agent may hold at any time.
///
/// Arming always cancels the outstanding handle first, so two competing
/// heartbeats can never be pending together.
#[derive(Debug, Clone, Default)]
pub struct TimerSlot {
    pending: Option<TimerHandle>,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self { pending: None }
    }

    pub fn arm(&mut self, provider: &mut dyn Provider, after: f64) {
        self.cancel(provider);
        self.pending = Some(provider.schedule_timer(after));
    }

    pub fn cancel(&mut self, provider: &mut dyn Provider) {
        if let Some(handle) = self.pending.take() {
            provider.cancel_timer(handle);
        }
    }

    /// Consume a fired handle. Returns false for a stale handle that is not
    /// the one currently armed.
    pub fn fire(&mut self, handle: TimerHandle) -> bool {
        if self.pending == Some(handle) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }
}

pub(crate) fn unicast(provider: &mut dyn Provider, role: Role, destination: AgentId, body: Body) {
    let message = Message::new(role, provider.self_id(), body);
    match encode(&message) {
        Ok(payload) => provider.send_unicast(payload, destination),
        Err(err) => warn!(agent = provider.self_id(), %err, "dropping unencodable unicast"),
    }
}

pub(crate) fn broadcast(provider: &mut dyn Provider, role: Role, body: Body) {
    let message = Message::new(role, provider.self_id(), body);
    match encode(&message) {
        Ok(payload) => provider.send_broadcast(payload),
        Err(err) => warn!(agent = provider.self_id(), %err, "dropping unencodable broadcast"),
    }
}
