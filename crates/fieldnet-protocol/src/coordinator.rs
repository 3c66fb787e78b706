//! Ground-station role: hands out the patrol loop and tallies reports.

use std::collections::BTreeMap;

use fieldnet_wire::{decode, AgentId, Body, Message, Position, Role};
use tracing::{debug, info, warn};

use crate::config::ProtocolConfig;
use crate::provider::{broadcast, unicast, Agent, Provider, Telemetry, TimerHandle, TimerSlot};

/// What the coordinator knows about one surveyor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Last reported sensor count; zero until the surveyor reports.
    pub count: u64,
    /// Set once the surveyor has reported and been told to stand down.
    pub claimed: bool,
    /// Whether the last beacon advertised a running mission.
    pub assigned: bool,
}

/// Per-surveyor records. Entries are added on first sighting and never
/// removed during a run.
#[derive(Debug, Clone, Default)]
pub struct CoordinatorLedger {
    entries: BTreeMap<AgentId, LedgerEntry>,
}

impl CoordinatorLedger {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn get(&self, id: AgentId) -> Option<&LedgerEntry> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Entry for `id`, created unclaimed if this is the first sighting.
    pub fn entry(&mut self, id: AgentId) -> &mut LedgerEntry {
        self.entries.entry(id).or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AgentId, &LedgerEntry)> {
        self.entries.iter()
    }

    /// Sum of the last reported counts. Silent surveyors contribute zero.
    pub fn total(&self) -> u64 {
        self.entries.values().map(|entry| entry.count).sum()
    }
}

/// The fixed ground station.
#[derive(Debug, Clone)]
pub struct Coordinator {
    config: ProtocolConfig,
    ledger: CoordinatorLedger,
    position: Option<Position>,
    timer: TimerSlot,
}

impl Coordinator {
    pub fn new(config: ProtocolConfig) -> Self {
        Self {
            config,
            ledger: CoordinatorLedger::new(),
            position: None,
            timer: TimerSlot::new(),
        }
    }

    pub fn ledger(&self) -> &CoordinatorLedger {
        &self.ledger
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }

    pub fn total(&self) -> u64 {
        self.ledger.total()
    }

    pub fn finish(&self) -> u64 {
        let total = self.ledger.total();
        info!(surveyors = self.ledger.len(), total, "coordinator finished");
        total
    }

    fn assignment(&self) -> Body {
        Body::Assignment {
            waypoints: self.config.patrol.clone(),
            depth: None,
        }
    }

    /// Broadcast while nobody is known, then unicast to known surveyors that
    /// have not been seen advertising a mission.
    fn assignment_round(&mut self, provider: &mut dyn Provider) {
        if self.ledger.is_empty() {
            debug!(coordinator = provider.self_id(), "broadcasting assignment");
            broadcast(provider, Role::Coordinator, self.assignment());
        } else {
            let pending: Vec<AgentId> = self
                .ledger
                .iter()
                .filter(|(_, entry)| !entry.assigned && !entry.claimed)
                .map(|(id, _)| *id)
                .collect();
            for id in pending {
                debug!(coordinator = provider.self_id(), surveyor = id, "re-sending assignment");
                unicast(provider, Role::Coordinator, id, self.assignment());
            }
        }
        self.timer.arm(provider, self.config.heartbeat_interval);
    }

    fn handle_message(&mut self, message: Message, provider: &mut dyn Provider) {
        let sender = message.sender_id;
        match (message.sender_role, message.body) {
            (Role::Surveyor, Body::Beacon {
                waypoints, away, ..
            }) => {
                let advertising = waypoints.is_some_and(|w| !w.is_empty());
                self.on_beacon(sender, advertising, away.unwrap_or(false), provider);
            }
            (Role::Surveyor, Body::Data { count: Some(count) }) => {
                let entry = self.ledger.entry(sender);
                entry.count = count;
                entry.claimed = true;
                info!(
                    coordinator = provider.self_id(),
                    surveyor = sender,
                    count,
                    total = self.ledger.total(),
                    "received sensor report"
                );
                unicast(provider, Role::Coordinator, sender, Body::Copy);
            }
            (Role::Surveyor, Body::Data { count: None }) => {
                debug!(coordinator = provider.self_id(), surveyor = sender, "data without count");
            }
            (role, body) => {
                debug!(
                    coordinator = provider.self_id(),
                    from = sender,
                    %role,
                    category = ?body.category(),
                    "ignored"
                );
            }
        }
    }

    fn on_beacon(
        &mut self,
        surveyor: AgentId,
        advertising: bool,
        away: bool,
        provider: &mut dyn Provider,
    ) {
        if !self.ledger.contains(surveyor) {
            self.ledger.entry(surveyor).assigned = advertising;
            info!(coordinator = provider.self_id(), surveyor, "discovered surveyor");
            unicast(provider, Role::Coordinator, surveyor, self.assignment());
            return;
        }

        let entry = self.ledger.entry(surveyor);
        entry.assigned = advertising;
        if !entry.claimed && away {
            debug!(coordinator = provider.self_id(), surveyor, "pulling progress report");
            unicast(provider, Role::Coordinator, surveyor, Body::DataRequest);
        }
    }
}

impl Agent for Coordinator {
    fn role(&self) -> Role {
        Role::Coordinator
    }

    fn initialize(&mut self, provider: &mut dyn Provider) {
        info!(coordinator = provider.self_id(), "operation started");
        self.timer.arm(provider, self.config.heartbeat_interval);
    }

    fn handle_timer(&mut self, handle: TimerHandle, provider: &mut dyn Provider) {
        if self.timer.fire(handle) {
            self.assignment_round(provider);
        }
    }

    fn handle_packet(&mut self, payload: &[u8], provider: &mut dyn Provider) {
        match decode(payload) {
            Ok(message) => self.handle_message(message, provider),
            Err(err) => warn!(coordinator = provider.self_id(), %err, "malformed packet"),
        }
    }

    fn handle_telemetry(&mut self, telemetry: Telemetry, _provider: &mut dyn Provider) {
        self.position = Some(telemetry.position);
    }
}
