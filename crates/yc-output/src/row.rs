//! Plain data row types written by output backends.

use yc_core::Axis;
use yc_motion::LoadState;

/// One operation, as reported when it finishes or is interrupted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperationRow {
    pub op:        u32,
    pub kind:      &'static str,
    pub equipment: u32,
    /// `u32::MAX` for housekeeping moves that belong to no request.
    pub request:   u32,
    /// `u32::MAX` if the operation moves no box.
    pub box_id:    u32,
    pub state:     &'static str,
    pub start:     f64,
    pub finish:    f64,
}

/// One axis move of an operation, in absolute simulation time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionRow {
    pub op:        u32,
    pub equipment: u32,
    pub axis:      Axis,
    pub load:      LoadState,
    pub start:     f64,
    pub duration:  f64,
    pub from:      f64,
    pub to:        f64,
}

/// A request at the end of its life.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestRow {
    pub request:      u32,
    pub kind:         &'static str,
    pub box_id:       u32,
    pub equipment:    u32,
    pub state:        &'static str,
    pub arrival:      f64,
    /// `NaN` where the request never got that far.
    pub start:        f64,
    pub finish:       f64,
    pub reject_count: u32,
    /// Last fatal rejection label, empty if none.
    pub failure:      String,
}
