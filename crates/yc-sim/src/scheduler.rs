//! Per-crane job scheduling.
//!
//! Whenever a crane could take new work, its scheduler looks at the ready
//! candidates of the block dispatcher, drops those the crane cannot reach
//! and hands the best-ranked one to the crane.

use std::cmp::Ordering;

use tracing::debug;
use yc_core::{BlockId, EquipmentId, Priority, RequestId};
use yc_request::{Intent, Request, RequestKind, RequestState, Wake};

use crate::{
    BlockLayout, Equipment, Event, ProbeEvent, SignalHandler, SimError, SimResult, Task, Yard,
};

/// Housekeeping a crane may do when it has nothing to work on.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum IdleAction {
    /// Raise the spreader to `height`.
    Park { height: f64 },
}

/// Ranking and idle behaviour of the cranes.
pub trait JobPolicy {
    /// Sort key of a candidate; lower runs first.  Ties go to the lower
    /// request id.
    fn rank(&self, req: &Request<SignalHandler>) -> (u8, f64);

    /// What an idle crane with an empty pool should do.
    fn on_idle(&self, unit: &Equipment) -> Option<IdleAction>;
}

/// ADJUST first, then resumed requests, then new ones, oldest first in
/// each class.  Idle cranes park at travel height.
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultPolicy;

impl JobPolicy for DefaultPolicy {
    fn rank(&self, req: &Request<SignalHandler>) -> (u8, f64) {
        let class = if matches!(req.intent, Intent::Adjust { .. }) {
            0
        } else if req.state == RequestState::RESUME_READY {
            1
        } else {
            2
        };
        (class, req.ready_since())
    }

    fn on_idle(&self, unit: &Equipment) -> Option<IdleAction> {
        let height = unit.config.travel_height;
        ((unit.end_position().z - height).abs() > 0.1).then_some(IdleAction::Park { height })
    }
}

impl Yard {
    /// Let `eq`'s scheduler run at the current instant.
    pub(crate) fn schedule(&mut self, eq: EquipmentId, time: f64) {
        if let Some(unit) = self.equipment.get_mut(eq.index()) {
            unit.sched_generation += 1;
            let generation = unit.sched_generation;
            self.queue.push(time, Priority::Schedule, Event::Schedule { id: eq, generation });
        }
    }

    pub(crate) fn wake(&mut self, wake: Wake, block: BlockId, time: f64) {
        match wake {
            Wake::Equipment(eq) => self.schedule(eq, time),
            Wake::All => {
                let units = self.blocks.get(block.index()).map(|b| b.equipment.clone()).unwrap_or_default();
                for eq in units {
                    self.schedule(eq, time);
                }
            }
        }
    }

    /// Can `unit` physically serve `req`?
    pub(crate) fn can_serve(&self, unit: &Equipment, req: &Request<SignalHandler>) -> bool {
        let Some(block) = self.blocks.get(req.block.index()) else { return false };
        let bay_ok = |bay: u16| unit.in_reach(block.layout.bay_x(bay));
        match &req.intent {
            Intent::Adjust { .. } => true,
            Intent::Store { box_id, .. } | Intent::Retrieve { box_id, .. } => {
                self.boxes.get(box_id.index()).is_some_and(|b| bay_ok(b.cell.bay))
            }
            Intent::Relocate { box_id, dest } => {
                self.boxes.get(box_id.index()).is_some_and(|b| bay_ok(b.cell.bay))
                    && dest.is_none_or(|d| bay_ok(d.bay))
            }
        }
    }

    pub(crate) fn run_scheduler(&mut self, eq: EquipmentId, time: f64) -> SimResult<()> {
        let unit = self.equipment.get(eq.index()).ok_or(SimError::UnknownEquipment(eq))?;
        if !unit.ready_for_new_task() {
            return Ok(());
        }
        let block_id = unit.block;
        let block = self.blocks.get(block_id.index()).ok_or(SimError::UnknownBlock(block_id))?;
        let requests = &self.requests;
        let candidates = block.dispatcher.candidates(eq, |id| {
            requests.get(id.index()).map(|r| (r.state, r.predecessor))
        });

        let mut best: Option<(RequestId, (u8, f64))> = None;
        let mut stranded = Vec::new();
        for id in candidates {
            let req = self.requests.get(id.index()).ok_or(SimError::UnknownRequest(id))?;
            if !self.can_serve(unit, req) {
                if req.equipment == Some(eq) && req.kind() != RequestKind::Adjust {
                    stranded.push(id);
                }
                continue;
            }
            let rank = self.policy.rank(req);
            let better = best.is_none_or(|(bid, brank)| {
                match rank.0.cmp(&brank.0).then(rank.1.total_cmp(&brank.1)) {
                    Ordering::Less => true,
                    Ordering::Equal => id < bid,
                    Ordering::Greater => false,
                }
            });
            if better {
                best = Some((id, rank));
            }
        }

        for id in stranded {
            self.unbind(id, time)?;
        }

        let Some((id, _)) = best else { return Ok(()) };
        let block = self.blocks.get_mut(block_id.index()).ok_or(SimError::UnknownBlock(block_id))?;
        block.dispatcher.take(id)?;
        self.request_mut(id)?.schedule(eq)?;
        debug!(time, equipment = %eq, request = %id, "scheduled");
        self.probe(time, ProbeEvent::Scheduled { request: id, equipment: eq });
        self.submit_task(eq, time, Task::Request(id))
    }

    /// A request bound to a crane that can no longer reach its box goes
    /// back to the shared queues.
    fn unbind(&mut self, id: RequestId, time: f64) -> SimResult<()> {
        let req = self.requests.get_mut(id.index()).ok_or(SimError::UnknownRequest(id))?;
        let block_id = req.block;
        let block = self.blocks.get_mut(block_id.index()).ok_or(SimError::UnknownBlock(block_id))?;
        block.dispatcher.take(id)?;
        req.equipment = None;
        let wake = block.dispatcher.submit(time, req, false)?;
        debug!(time, request = %id, "request released to shared pool");
        self.wake(wake, block_id, time);
        Ok(())
    }
}
