//! Checking a planned gantry path against the other cranes on the rail.

use yc_core::{Axis, EquipmentId, OperationId};
use yc_motion::PathTrace;
use yc_request::{Intent, Rejection};

use crate::{EquipmentState, Operation, Yard};

/// Outcome of an interference check.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Interference {
    Clear,
    /// `peer` is idle and in the way; moving it to `target` clears the path.
    Idle { peer: EquipmentId, target: f64 },
    /// `peer` is in the way and cannot be moved right now.
    Busy { peer: EquipmentId },
    /// `peer` cannot get far enough out of the way within its reach.  Waited
    /// out like a busy peer; the layout may change before the next attempt.
    Unresolvable { peer: EquipmentId },
}

impl Interference {
    /// Rejection for operation `op`, or `None` when the path is clear.
    /// Every conflict is recoverable.
    pub fn rejection(self, op: OperationId) -> Option<Rejection> {
        match self {
            Interference::Clear => None,
            Interference::Idle { peer, target } => {
                Some(Rejection::EquipmentConflict { op, peer, new_pos: Some(target) })
            }
            Interference::Busy { peer } | Interference::Unresolvable { peer } => {
                Some(Rejection::EquipmentConflict { op, peer, new_pos: None })
            }
        }
    }
}

impl Yard {
    /// Check the dry-run gantry path of `op` (planned for `eq`) against every
    /// other crane of the same block.
    pub(crate) fn check_interference(&self, eq: EquipmentId, op: &Operation) -> Interference {
        let Some(unit) = self.equipment.get(eq.index()) else { return Interference::Clear };
        let Some(block) = self.blocks.get(unit.block.index()) else { return Interference::Clear };
        let path: &PathTrace = op.workflow.trace(Axis::Gantry);
        if path.is_empty() {
            return Interference::Clear;
        }
        let clearance = self.config.check_clearance();
        let step = clearance + 1.0;
        let own_x = unit.end_position().x;

        // An ADJUST moves away from the crane it unblocks.
        let unblocking = op.request.and_then(|r| match self.requests.get(r.index())?.intent {
            Intent::Adjust { blocked, .. } => Some(blocked),
            _ => None,
        });

        for &peer_id in &block.equipment {
            if peer_id == eq || Some(peer_id) == unblocking {
                continue;
            }
            let Some(peer) = self.equipment.get(peer_id.index()) else { continue };

            if peer.state == EquipmentState::Working {
                let Some(peer_op) = peer.current_op.and_then(|o| self.operations.get(o.index())) else {
                    continue;
                };
                if path.intersects(peer_op.workflow.trace(Axis::Gantry), clearance, 0.0) {
                    return Interference::Busy { peer: peer_id };
                }
                continue;
            }

            let peer_x = peer.end_position().x;
            if path.distance_to(peer_x).is_none_or(|d| d >= clearance) {
                continue;
            }
            if peer.state == EquipmentState::Blocking {
                return Interference::Busy { peer: peer_id };
            }
            let target = if peer_x > own_x { path.max() + step } else { path.min() - step };
            let target = target.clamp(peer.reach.0, peer.reach.1);
            if path.distance_to(target).is_none_or(|d| d < clearance) {
                return Interference::Unresolvable { peer: peer_id };
            }
            return Interference::Idle { peer: peer_id, target };
        }
        Interference::Clear
    }
}
