use fieldnet_wire::Position;

/// Ordered, cursor-tracked waypoint sequence owned by one surveyor.
///
/// Invariant: `cursor <= waypoints.len()`. A cursor equal to the length means
/// the plan is exhausted and has no current target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MissionPlan {
    waypoints: Vec<Position>,
    cursor: usize,
    active: bool,
}

impl MissionPlan {
    /// A stopped, empty plan.
    pub fn new() -> Self {
        Self {
            waypoints: Vec::new(),
            cursor: 0,
            active: false,
        }
    }

    /// Replace the whole sequence and rewind to its first waypoint.
    pub fn start(&mut self, waypoints: Vec<Position>) {
        self.waypoints = waypoints;
        self.cursor = 0;
        self.active = true;
    }

    /// Suspend execution. The sequence and cursor are kept.
    pub fn stop(&mut self) {
        self.active = false;
    }

    /// Stop and start again with `waypoints`.
    pub fn restart(&mut self, waypoints: Vec<Position>) {
        self.stop();
        self.start(waypoints);
    }

    /// Step past the current waypoint; saturates once exhausted.
    pub fn advance(&mut self) {
        if self.cursor < self.waypoints.len() {
            self.cursor += 1;
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// True when stopped or exhausted.
    pub fn is_idle(&self) -> bool {
        !self.active || self.is_exhausted()
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.waypoints.len()
    }

    pub fn current_index(&self) -> usize {
        self.cursor
    }

    /// The waypoint to fly to next, if the plan is running and not exhausted.
    pub fn current_target(&self) -> Option<Position> {
        if !self.active {
            return None;
        }
        self.waypoints.get(self.cursor).copied()
    }

    pub fn waypoints(&self) -> &[Position] {
        &self.waypoints
    }

    /// Waypoints from the cursor on.
    pub fn remaining(&self) -> &[Position] {
        &self.waypoints[self.cursor.min(self.waypoints.len())..]
    }

    /// Waypoints after the current one.
    pub fn after_current(&self) -> &[Position] {
        let next = (self.cursor + 1).min(self.waypoints.len());
        &self.waypoints[next..]
    }

    /// The territory this plan claims: the whole sequence while running,
    /// nothing while stopped.
    pub fn claim(&self) -> &[Position] {
        if self.active {
            &self.waypoints
        } else {
            &[]
        }
    }

    /// On the last leg: heading for, or already past, the final waypoint.
    pub fn is_final_leg(&self) -> bool {
        !self.waypoints.is_empty() && self.cursor + 1 >= self.waypoints.len()
    }

    /// The final waypoint (the drop-off), if any.
    pub fn last(&self) -> Option<Position> {
        self.waypoints.last().copied()
    }

    /// Put `position` ahead of the remaining route and restart.
    pub fn splice_front(&mut self, position: Position) {
        let mut spliced = Vec::with_capacity(self.remaining().len() + 1);
        spliced.push(position);
        spliced.extend_from_slice(self.remaining());
        self.restart(spliced);
    }

    /// Drop everything up to and including the current waypoint and restart
    /// with what is left.
    pub fn complete_current(&mut self) {
        let rest = self.after_current().to_vec();
        self.restart(rest);
    }
}
