//! `EventQueue`: the activation queue of the yard.
//!
//! Every process (crane, per-crane job scheduler) and every workflow
//! callback is an entry keyed by `(time, priority, seq)`.  `seq` is a
//! monotonic insertion counter, so two activations at the same instant and
//! priority always run in the order they were requested.
//!
//! A process has at most one live activation: re-activating bumps the
//! process generation and older entries are dropped when popped.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use yc_core::{EquipmentId, OperationId, Priority, RequestId, SimTime};
use yc_request::Signal;

/// What happens when an entry comes due.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Event {
    /// Resume a crane process.
    Equipment { id: EquipmentId, generation: u64 },
    /// Run a crane's job scheduler.
    Schedule { id: EquipmentId, generation: u64 },
    /// Fire a lifecycle signal of `request` planned by `op`.
    Signal { request: RequestId, op: OperationId, signal: Signal },
    /// Hand a newly created request to its block's dispatcher.
    Submit(RequestId),
    /// Make a rejected request ready again after a backoff.
    Retry(RequestId),
    /// Report equipment positions to the observer.
    Sample,
}

#[derive(Clone, Debug)]
pub struct Entry {
    pub time:     SimTime,
    pub priority: Priority,
    pub seq:      u64,
    pub event:    Event,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    /// Reversed so that `BinaryHeap` pops the earliest entry.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .cmp(&self.time)
            .then(other.priority.cmp(&self.priority))
            .then(other.seq.cmp(&self.seq))
    }
}

#[derive(Default)]
pub struct EventQueue {
    heap: BinaryHeap<Entry>,
    seq:  u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `event` at `time` with tie-break `priority`.
    pub fn push(&mut self, time: f64, priority: Priority, event: Event) {
        self.seq += 1;
        self.heap.push(Entry { time: SimTime(time), priority, seq: self.seq, event });
    }

    /// Remove and return the earliest entry.
    pub fn pop(&mut self) -> Option<Entry> {
        self.heap.pop()
    }

    /// The earliest entry, if any.
    pub fn peek(&self) -> Option<&Entry> {
        self.heap.peek()
    }

    /// Time of the earliest entry.
    pub fn next_time(&self) -> Option<SimTime> {
        self.heap.peek().map(|e| e.time)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Number of entries other than observer samples.
    pub fn pending_work(&self) -> usize {
        self.heap.iter().filter(|e| e.event != Event::Sample).count()
    }
}
