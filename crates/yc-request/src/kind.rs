//! Request kinds and their kind-specific data.

use std::fmt;

use yc_core::{BoxId, Cell, EquipmentId, LaneId, RequestId};

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RequestKind {
    Store,
    Retrieve,
    Relocate,
    Adjust,
}

impl RequestKind {
    pub fn name(self) -> &'static str {
        match self {
            RequestKind::Store => "STORE",
            RequestKind::Retrieve => "RETRIEVE",
            RequestKind::Relocate => "RELOCATE",
            RequestKind::Adjust => "ADJUST",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a request asks for.
#[derive(Clone, Debug, PartialEq)]
pub enum Intent {
    /// Take `box_id` off a vehicle at `lane` and put it at its allocated cell.
    Store { box_id: BoxId, lane: LaneId },
    /// Take `box_id` out of the block and put it on a vehicle at `lane`.
    Retrieve { box_id: BoxId, lane: LaneId },
    /// Move `box_id` inside the block, to `dest` or wherever the allocator
    /// finds room.
    Relocate { box_id: BoxId, dest: Option<Cell> },
    /// Move the bound unit's gantry to `target` so that `blocked` can pass.
    Adjust {
        target:           f64,
        blocked:          EquipmentId,
        blocking_request: Option<RequestId>,
    },
}

impl Intent {
    pub fn kind(&self) -> RequestKind {
        match self {
            Intent::Store { .. } => RequestKind::Store,
            Intent::Retrieve { .. } => RequestKind::Retrieve,
            Intent::Relocate { .. } => RequestKind::Relocate,
            Intent::Adjust { .. } => RequestKind::Adjust,
        }
    }

    pub fn box_id(&self) -> Option<BoxId> {
        match self {
            Intent::Store { box_id, .. }
            | Intent::Retrieve { box_id, .. }
            | Intent::Relocate { box_id, .. } => Some(*box_id),
            Intent::Adjust { .. } => None,
        }
    }

    /// Access lane served by the request, if any.
    pub fn lane(&self) -> Option<LaneId> {
        match self {
            Intent::Store { lane, .. } | Intent::Retrieve { lane, .. } => Some(*lane),
            _ => None,
        }
    }
}
