//! Rail-mounted gantry cranes.

use std::fmt;

use yc_core::{Axis, BlockId, EquipmentId, OperationId, RequestId, V3};
use yc_motion::{MotionSpec, Mover, SpecTable};
use yc_workflow::MoverSet;

use crate::IdleAction;

/// Drive limits and geometry of one crane.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CraneConfig {
    pub gantry:        SpecTable,
    pub trolley:       SpecTable,
    /// Keyed by load: hoisting a box is slower than an empty spreader.
    pub hoist:         SpecTable,
    /// Spreader height for travelling over full stacks with a box.
    pub travel_height: f64,
    /// Bay the crane starts at; `None` places it at the edge of its reach.
    pub initial_bay:   Option<u16>,
}

impl Default for CraneConfig {
    fn default() -> Self {
        Self {
            gantry:        SpecTable::uniform(MotionSpec::symmetric(4.0, 0.4)),
            trolley:       SpecTable::uniform(MotionSpec::symmetric(1.2, 0.4)),
            hoist:         SpecTable::with_loaded(
                MotionSpec::symmetric(1.5, 0.5),
                MotionSpec::symmetric(0.75, 0.3),
            ),
            travel_height: 22.0,
            initial_bay:   None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EquipmentState {
    Idle,
    /// Running an operation.
    Working,
    /// Waiting for a peer to start an ADJUST that clears the way.
    Blocking,
}

impl fmt::Display for EquipmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EquipmentState::Idle => "IDLE",
            EquipmentState::Working => "WORKING",
            EquipmentState::Blocking => "BLOCKING",
        };
        f.write_str(s)
    }
}

/// Work handed to a crane by its scheduler.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Task {
    Request(RequestId),
    Housekeeping(IdleAction),
}

/// The request a crane is currently working through.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct Job {
    pub request:   RequestId,
    /// The request's own operation (as opposed to relocations clearing the
    /// way for it) has been planned.
    pub main_done: bool,
}

pub struct Equipment {
    pub id:     EquipmentId,
    pub block:  BlockId,
    pub config: CraneConfig,
    pub movers: [Mover; 3],
    pub state:  EquipmentState,
    /// Gantry positions this crane may serve.
    pub reach:  (f64, f64),

    pub(crate) next_task:  Option<Task>,
    pub(crate) job:        Option<Job>,
    pub(crate) current_op: Option<OperationId>,
    /// ADJUST request this crane is blocked on.
    pub(crate) blocked_by: Option<RequestId>,
    /// Rejected requests of other cranes waiting for this one to finish its
    /// operation or stop blocking.
    pub(crate) waiters:    Vec<RequestId>,

    pub(crate) generation:       u64,
    pub(crate) sched_generation: u64,
}

impl Equipment {
    pub fn new(id: EquipmentId, block: BlockId, config: CraneConfig, at: V3, reach: (f64, f64)) -> Self {
        let movers = [
            Mover::new(Axis::Gantry, config.gantry, at.x),
            Mover::new(Axis::Trolley, config.trolley, at.y),
            Mover::new(Axis::Hoist, config.hoist, at.z),
        ];
        Self {
            id,
            block,
            config,
            movers,
            state: EquipmentState::Idle,
            reach,
            next_task: None,
            job: None,
            current_op: None,
            blocked_by: None,
            waiters: Vec::new(),
            generation: 0,
            sched_generation: 0,
        }
    }

    #[inline]
    pub fn current_op(&self) -> Option<OperationId> {
        self.current_op
    }

    #[inline]
    pub fn blocked_by(&self) -> Option<RequestId> {
        self.blocked_by
    }

    /// Request in progress, if any.
    pub fn active_request(&self) -> Option<RequestId> {
        self.job.map(|j| j.request)
    }

    /// Authoritative spreader position (as of the last `run_until`).
    pub fn position(&self) -> V3 {
        V3::new(self.movers[0].position(), self.movers[1].position(), self.movers[2].position())
    }

    /// Predicted spreader position at `t`.
    pub fn position_at(&self, t: f64) -> V3 {
        V3::new(
            self.movers[0].position_at(t),
            self.movers[1].position_at(t),
            self.movers[2].position_at(t),
        )
    }

    /// Where the spreader will be once everything queued has run.
    pub fn end_position(&self) -> V3 {
        V3::new(
            self.movers[0].end_position(),
            self.movers[1].end_position(),
            self.movers[2].end_position(),
        )
    }

    pub fn in_reach(&self, x: f64) -> bool {
        x >= self.reach.0 - 1e-6 && x <= self.reach.1 + 1e-6
    }

    /// `true` if every axis may be interrupted right now.
    pub fn allows_interrupt(&self) -> bool {
        self.movers.iter().all(Mover::allows_interrupt)
    }

    /// Can the scheduler hand this crane something new?
    pub fn ready_for_new_task(&self) -> bool {
        if self.next_task.is_some() || self.job.is_some() {
            return false;
        }
        match self.state {
            EquipmentState::Idle => true,
            EquipmentState::Working => self.allows_interrupt(),
            EquipmentState::Blocking => false,
        }
    }
}

impl MoverSet for Equipment {
    #[inline]
    fn mover(&self, axis: Axis) -> &Mover {
        &self.movers[axis.index()]
    }

    #[inline]
    fn mover_mut(&mut self, axis: Axis) -> &mut Mover {
        &mut self.movers[axis.index()]
    }
}

impl fmt::Display for Equipment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] at {}", self.id, self.state, self.position())
    }
}
