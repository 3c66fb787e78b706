use std::fmt;

use serde::{Deserialize, Serialize};

/// Process-unique agent identity, assigned by the runtime at creation.
pub type AgentId = u64;

/// The three agent classes taking part in the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Sensor,
    Surveyor,
    Coordinator,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Sensor => write!(f, "sensor"),
            Role::Surveyor => write!(f, "surveyor"),
            Role::Coordinator => write!(f, "coordinator"),
        }
    }
}

/// A point in the deployment volume. Encoded on the wire as `[x, y, z]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn squared_distance(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    pub fn distance(&self, other: &Position) -> f64 {
        self.squared_distance(other).sqrt()
    }

    /// Same ground coordinates, different altitude.
    pub fn with_altitude(self, z: f64) -> Self {
        Self { z, ..self }
    }
}

impl From<[f64; 3]> for Position {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<Position> for [f64; 3] {
    fn from(p: Position) -> Self {
        [p.x, p.y, p.z]
    }
}

impl From<(f64, f64, f64)> for Position {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Message category tag, as written in the `category` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Beacon,
    DataRequest,
    Data,
    Assignment,
    Copy,
    Halt,
    Parlay,
}

/// Category-specific message contents.
///
/// Each variant carries only the fields meaningful for its category. Optional
/// fields are omitted when encoding and decode to `None` when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum Body {
    /// Liveness/position advertisement. Surveyors also publish their current
    /// territorial claim (`waypoints`), the `away` flag and their `weight`.
    Beacon {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<Position>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        waypoints: Option<Vec<Position>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        away: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        weight: Option<u32>,
    },
    DataRequest,
    /// Data hand-off. Sensors leave `count` out: their contribution is one unit.
    Data {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        count: Option<u64>,
    },
    /// Mission hand-out. `depth` is only set by a surveyor absorbing a peer.
    Assignment {
        waypoints: Vec<Position>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        depth: Option<u32>,
    },
    Copy,
    Halt,
    Parlay {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<Position>,
    },
}

impl Body {
    pub fn category(&self) -> Category {
        match self {
            Body::Beacon { .. } => Category::Beacon,
            Body::DataRequest => Category::DataRequest,
            Body::Data { .. } => Category::Data,
            Body::Assignment { .. } => Category::Assignment,
            Body::Copy => Category::Copy,
            Body::Halt => Category::Halt,
            Body::Parlay { .. } => Category::Parlay,
        }
    }
}

/// One protocol message: sender header plus category body, encoded flat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub sender_role: Role,
    pub sender_id: AgentId,
    #[serde(flatten)]
    pub body: Body,
}

impl Message {
    pub fn new(sender_role: Role, sender_id: AgentId, body: Body) -> Self {
        Self {
            sender_role,
            sender_id,
            body,
        }
    }

    pub fn category(&self) -> Category {
        self.body.category()
    }
}
