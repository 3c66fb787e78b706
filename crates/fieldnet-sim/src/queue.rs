//! Discrete event queue and the timer bookkeeping that rides on it.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use fieldnet_protocol::TimerHandle;
use fieldnet_wire::AgentId;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Timer { node: AgentId, handle: TimerHandle },
    Deliver { to: AgentId, payload: Vec<u8> },
    Mobility,
}

#[derive(Debug)]
struct Scheduled {
    time: f64,
    seq: u64,
    event: Event,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scheduled {}

// Reversed so the max-heap pops the earliest (time, seq) first.
impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-heap of events keyed by `(time, insertion sequence)`.
///
/// Events at the same instant come out in the order they were pushed, which
/// keeps deliveries between a pair of nodes FIFO.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Scheduled>,
    next_seq: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, time: f64, event: Event) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Scheduled { time, seq, event });
    }

    pub fn pop(&mut self) -> Option<(f64, Event)> {
        self.heap.pop().map(|s| (s.time, s.event))
    }

    pub fn peek_time(&self) -> Option<f64> {
        self.heap.peek().map(|s| s.time)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

/// Allocates timer handles and tracks which are still live.
#[derive(Debug, Default)]
pub struct TimerService {
    next: u64,
    live: HashSet<TimerHandle>,
}

impl TimerService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> TimerHandle {
        let handle = TimerHandle(self.next);
        self.next += 1;
        self.live.insert(handle);
        handle
    }

    pub fn cancel(&mut self, handle: TimerHandle) {
        self.live.remove(&handle);
    }

    /// Consume a due handle. False if it was cancelled.
    pub fn fire(&mut self, handle: TimerHandle) -> bool {
        self.live.remove(&handle)
    }

    pub fn pending(&self) -> usize {
        self.live.len()
    }
}
