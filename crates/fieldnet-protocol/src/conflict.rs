//! Route conflict resolution between surveyors.
//!
//! Two surveyors advertising the same waypoint sequence both believe they own
//! that route. Each side runs `resolve` independently on the other's beacon;
//! the `(weight, id)` rank guarantees they reach complementary verdicts without
//! a central arbiter. Resolution only mutates the local label and returns
//! directives; the surveyor carries them out on the radio.

use std::cmp::Ordering;

use fieldnet_wire::AgentId;
use serde::Serialize;

/// Priority of a root surveyor in a conflict.
///
/// Larger weight ranks higher; on equal weight the smaller id ranks higher.
/// Being a lexicographic order over distinct pairs, this is a strict total
/// order: of two distinct ranks exactly one is greater, and it is transitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rank {
    pub weight: u32,
    pub id: AgentId,
}

impl Rank {
    pub fn new(weight: u32, id: AgentId) -> Self {
        Self { weight, id }
    }

    /// Whether `self` wins a conflict against `other`.
    pub fn beats(&self, other: &Rank) -> bool {
        self > other
    }
}

impl Ord for Rank {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight
            .cmp(&other.weight)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for Rank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A subordinate recorded under a root, with the weight it brought along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Branch {
    pub id: AgentId,
    pub weight: u32,
}

/// Position of a surveyor in the implicit coordination tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictLabel {
    /// 0 for an unchallenged root, greater for subordinates.
    pub depth: u32,
    /// Size of the subtree this surveyor represents, itself included.
    pub weight: u32,
    pub parent: Option<AgentId>,
    pub left: Option<Branch>,
    pub right: Option<Branch>,
}

impl ConflictLabel {
    /// Label of a freshly assigned surveyor: a root of weight one.
    pub fn root() -> Self {
        Self {
            depth: 0,
            weight: 1,
            parent: None,
            left: None,
            right: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.depth == 0
    }

    /// Whether `id` is already our parent or one of our children.
    pub fn is_relation(&self, id: AgentId) -> bool {
        self.parent == Some(id) || self.is_child(id)
    }

    pub fn is_child(&self, id: AgentId) -> bool {
        self.children().any(|branch| branch.id == id)
    }

    pub fn children(&self) -> impl Iterator<Item = Branch> {
        self.left.into_iter().chain(self.right)
    }

    pub fn has_free_slot(&self) -> bool {
        self.left.is_none() || self.right.is_none()
    }

    /// Record `id` as a child in the first free slot.
    pub fn adopt_child(&mut self, id: AgentId, weight: u32) -> bool {
        let branch = Some(Branch { id, weight });
        if self.left.is_none() {
            self.left = branch;
        } else if self.right.is_none() {
            self.right = branch;
        } else {
            return false;
        }
        self.weight = self.weight.saturating_add(weight);
        true
    }

    /// Forget child `id`, giving back the weight it contributed.
    pub fn drop_child(&mut self, id: AgentId) -> Option<Branch> {
        let slot = if self.left.map(|b| b.id) == Some(id) {
            &mut self.left
        } else if self.right.map(|b| b.id) == Some(id) {
            &mut self.right
        } else {
            return None;
        };
        let dropped = slot.take()?;
        self.weight = self.weight.saturating_sub(dropped.weight).max(1);
        Some(dropped)
    }

    /// Forget every child, returning them.
    pub fn shed_children(&mut self) -> Vec<Branch> {
        let shed: Vec<Branch> = self.children().collect();
        for branch in &shed {
            self.drop_child(branch.id);
        }
        shed
    }

    pub fn attach(&mut self, parent: AgentId, depth: u32) {
        self.parent = Some(parent);
        self.depth = depth.max(1);
    }

    pub fn detach(&mut self) {
        self.parent = None;
        self.depth = 0;
    }
}

impl Default for ConflictLabel {
    fn default() -> Self {
        Self::root()
    }
}

/// Action the surveyor must carry out after a resolution step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Send Halt to a (former) relation.
    Halt { to: AgentId },
    /// Offer our position to the peer we just met.
    Parlay { to: AgentId },
    /// Stop our own mission.
    StopMission,
    /// Send the loser an Assignment carrying our mission.
    Absorb { loser: AgentId },
    /// We lost; wait for the winner's Assignment.
    Yield { winner: AgentId },
}

/// Decide how to react to a peer advertising the same route.
///
/// `own_id` is this surveyor's id and `peer` the rank carried in the peer's
/// beacon. Beacons from known relations are not re-litigated.
pub fn resolve(label: &mut ConflictLabel, own_id: AgentId, peer: Rank) -> Vec<Directive> {
    let mut directives = Vec::new();
    if peer.id == own_id || label.is_relation(peer.id) {
        return directives;
    }

    // Rank on the weight the peer saw advertised, before any shedding.
    let own = Rank::new(label.weight, own_id);

    // A surveyor sheds its subordinates before taking on another competitor.
    for branch in label.shed_children() {
        directives.push(Directive::Halt { to: branch.id });
    }

    if !label.is_root() {
        if let Some(parent) = label.parent {
            directives.push(Directive::Halt { to: parent });
        }
        directives.push(Directive::Parlay { to: peer.id });
        directives.push(Directive::StopMission);
        label.detach();
        return directives;
    }

    if own.beats(&peer) {
        // Children were shed above, so a slot is always free here.
        label.adopt_child(peer.id, peer.weight);
        directives.push(Directive::Absorb { loser: peer.id });
    } else {
        directives.push(Directive::Yield { winner: peer.id });
    }
    directives
}
