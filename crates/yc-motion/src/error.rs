use yc_core::Axis;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MotionError {
    #[error("{axis} mover asked to run back to {requested:.3}s but is already at {now:.3}s")]
    TimeReversal { axis: Axis, now: f64, requested: f64 },

    #[error("{axis} motion starting at {start:.3}s overlaps the queue ending at {queue_end:.3}s")]
    Overlap { axis: Axis, start: f64, queue_end: f64 },

    #[error("{axis} mover restored without a matching save")]
    UnbalancedRestore { axis: Axis },

    #[error("invalid motion spec: {0}")]
    InvalidSpec(String),
}

pub type MotionResult<T> = Result<T, MotionError>;
