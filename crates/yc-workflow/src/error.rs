use thiserror::Error;
use yc_motion::MotionError;

use crate::StepId;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{0} is not part of this workflow")]
    UnknownStep(StepId),

    #[error("predecessor cycle through {0}")]
    Cycle(StepId),

    #[error("workflow committed before a dry run")]
    NotPlanned,

    #[error(transparent)]
    Motion(#[from] MotionError),
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
