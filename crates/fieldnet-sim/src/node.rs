use fieldnet_protocol::{Agent, Coordinator, ProtocolConfig, SensorAgent, Surveyor};
use fieldnet_wire::{Position, Role};

/// One agent of any role.
#[derive(Debug, Clone)]
pub enum Node {
    Sensor(SensorAgent),
    Surveyor(Surveyor),
    Coordinator(Coordinator),
}

impl Node {
    pub fn new(role: Role, config: &ProtocolConfig) -> Self {
        match role {
            Role::Sensor => Node::Sensor(SensorAgent::new(config.clone())),
            Role::Surveyor => Node::Surveyor(Surveyor::new(config.clone())),
            Role::Coordinator => Node::Coordinator(Coordinator::new(config.clone())),
        }
    }

    pub fn agent_mut(&mut self) -> &mut dyn Agent {
        match self {
            Node::Sensor(agent) => agent,
            Node::Surveyor(agent) => agent,
            Node::Coordinator(agent) => agent,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Node::Sensor(_) => Role::Sensor,
            Node::Surveyor(_) => Role::Surveyor,
            Node::Coordinator(_) => Role::Coordinator,
        }
    }
}

/// A node and where it physically is.
#[derive(Debug, Clone)]
pub struct NodeSlot {
    pub node: Node,
    pub position: Position,
}
