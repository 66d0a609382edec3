//! Operations: one planned, committed crane motion sequence.

use std::fmt;

use yc_core::{BoxId, Cell, EquipmentId, LaneId, OperationId, RequestId};
use yc_request::Signal;
use yc_workflow::Workflow;

use crate::{OperationRecord, SignalContext};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OpKind {
    Store,
    Retrieve,
    Relocate,
    Adjust,
    /// Housekeeping move with no request behind it.
    Move,
}

impl OpKind {
    pub fn name(self) -> &'static str {
        match self {
            OpKind::Store => "STORE",
            OpKind::Retrieve => "RETRIEVE",
            OpKind::Relocate => "RELOCATE",
            OpKind::Adjust => "ADJUST",
            OpKind::Move => "MOVE",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OpState {
    /// Planned, not committed (possibly refused).
    Init,
    Running,
    Finished,
    /// Interrupted, or refused at planning.
    Cancelled,
}

impl OpState {
    pub fn name(self) -> &'static str {
        match self {
            OpState::Init => "INIT",
            OpState::Running => "RUNNING",
            OpState::Finished => "FINISHED",
            OpState::Cancelled => "CANCELLED",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Operation {
    pub id:            OperationId,
    pub kind:          OpKind,
    pub equipment:     EquipmentId,
    pub request:       Option<RequestId>,
    pub state:         OpState,
    pub box_id:        Option<BoxId>,
    pub src:           Option<Cell>,
    pub dst:           Option<Cell>,
    pub lane:          Option<LaneId>,
    pub start:         f64,
    pub finish:        f64,
    pub interruptible: bool,
    /// The request's own operation rather than one clearing its way.
    pub main:          bool,
    pub workflow:      Workflow<Signal>,
}

impl Operation {
    pub(crate) fn new(
        id:        OperationId,
        kind:      OpKind,
        equipment: EquipmentId,
        request:   Option<RequestId>,
        workflow:  Workflow<Signal>,
    ) -> Self {
        Self {
            id,
            kind,
            equipment,
            request,
            state: OpState::Init,
            box_id: None,
            src: None,
            dst: None,
            lane: None,
            start: 0.0,
            finish: 0.0,
            interruptible: false,
            main: false,
            workflow,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == OpState::Running
    }

    pub(crate) fn signal_context(&self, request: RequestId) -> SignalContext {
        SignalContext {
            request,
            op: self.id,
            equipment: self.equipment,
            box_id: self.box_id,
            from: self.src,
            to: self.dst,
        }
    }

    /// Summary with motions relative to the operation start.
    pub fn record(&self) -> OperationRecord {
        OperationRecord {
            op:        self.id,
            kind:      self.kind,
            equipment: self.equipment,
            request:   self.request,
            box_id:    self.box_id,
            state:     self.state,
            start:     self.start,
            finish:    self.finish,
            motions:   self.workflow.dump(self.start),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} on {}", self.id, self.kind, self.equipment)
    }
}

/// What a request's unit should do next.
#[derive(Debug)]
pub(crate) enum NextStep {
    Op(Box<Operation>),
    Done,
    Reject(yc_request::Rejection),
}
