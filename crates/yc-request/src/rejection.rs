//! Why an operation was refused.

use thiserror::Error;
use yc_core::{BoxId, Column, EquipmentId, OperationId};

/// Closed set of reasons an operation of a request can be refused before
/// it moves anything.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Rejection {
    /// The planned path comes too close to `peer`.  `new_pos` is the gantry
    /// position that would clear the way when `peer` is idle.
    #[error("{op} conflicts with {peer}")]
    EquipmentConflict { op: OperationId, peer: EquipmentId, new_pos: Option<f64> },

    /// Some stack columns are locked by other requests.
    #[error("stack lock busy on {} column(s)", .columns.len())]
    AcquireFail { columns: Vec<Column> },

    /// The box is in the middle of another request's transition.
    #[error("{0} is being operated")]
    BoxBeingOperated(BoxId),

    /// A box above the target still has to be relocated by someone else.
    #[error("{0} has an unfinished relocation above it")]
    BoxHasUndoneRelocation(BoxId),

    /// No way to go on (e.g. no slot for a relocation).
    #[error("undefined rejection: {0}")]
    Undefined(String),
}

impl Rejection {
    /// Short label for probes and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Rejection::EquipmentConflict { .. } => "equipment_conflict",
            Rejection::AcquireFail { .. } => "acquire_fail",
            Rejection::BoxBeingOperated(_) => "box_being_operated",
            Rejection::BoxHasUndoneRelocation(_) => "box_has_undone_relocation",
            Rejection::Undefined(_) => "undefined",
        }
    }

    /// `false` only for `Undefined`, which ends the request.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Rejection::Undefined(_))
    }
}
