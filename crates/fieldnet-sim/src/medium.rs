//! Range-gated radio and straight-line mobility.

use fieldnet_wire::Position;
use serde::Serialize;

/// Traffic counters of the shared medium.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrafficStats {
    /// Send commands issued by agents.
    pub sent: u64,
    /// Individual receptions, one per receiver in range.
    pub delivered: u64,
}

/// Omnidirectional radio with a hard range cutoff.
#[derive(Debug, Clone)]
pub struct Medium {
    range_squared: f64,
    pub stats: TrafficStats,
}

impl Medium {
    pub fn new(range: f64) -> Self {
        Self {
            range_squared: range * range,
            stats: TrafficStats::default(),
        }
    }

    /// Whether a transmission from `a` reaches `b`. Inclusive at the edge.
    pub fn reaches(&self, a: &Position, b: &Position) -> bool {
        a.squared_distance(b) <= self.range_squared
    }
}

/// Move `from` toward `to` by at most `distance`.
///
/// Returns the new position and whether the mover ended within `tolerance`
/// of the target, in which case it is snapped exactly onto it.
pub fn fly_towards(from: Position, to: Position, distance: f64, tolerance: f64) -> (Position, bool) {
    let gap = from.distance(&to);
    if gap <= distance + tolerance {
        return (to, true);
    }
    let t = distance / gap;
    let next = Position::new(
        from.x + (to.x - from.x) * t,
        from.y + (to.y - from.y) * t,
        from.z + (to.z - from.z) * t,
    );
    (next, false)
}
