use thiserror::Error;
use yc_core::{BlockId, BoxId, Cell, CoreError, EquipmentId, LaneId, OperationId, RequestId};
use yc_motion::MotionError;
use yc_request::RequestError;
use yc_stack::StackError;
use yc_workflow::WorkflowError;

use crate::BoxState;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("yard configuration error: {0}")]
    Config(String),

    #[error("unknown {0}")]
    UnknownBlock(BlockId),

    #[error("unknown {0}")]
    UnknownBox(BoxId),

    #[error("unknown {0}")]
    UnknownRequest(RequestId),

    #[error("unknown {0}")]
    UnknownEquipment(EquipmentId),

    #[error("unknown {0}")]
    UnknownOperation(OperationId),

    #[error("{0} does not move a box")]
    NoBox(OperationId),

    #[error("{block} has no {lane}")]
    UnknownLane { block: BlockId, lane: LaneId },

    #[error("cell {cell} is not usable: {reason}")]
    InvalidCell { cell: Cell, reason: &'static str },

    #[error("cannot {action} {box_id} in state {state:?}")]
    BoxState { box_id: BoxId, state: BoxState, action: &'static str },

    #[error("no free slot for {0}")]
    NoSlot(BoxId),

    #[error("time {requested} lies before the current time {now}")]
    PastTime { now: f64, requested: f64 },

    #[error("run aborted: {request} failed ({reason})")]
    Aborted { request: RequestId, reason: String },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Motion(#[from] MotionError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Stack(#[from] StackError),

    #[error(transparent)]
    Request(#[from] RequestError),
}

pub type SimResult<T> = Result<T, SimError>;
