//! Working through a request: planning its next operation, and what
//! happens when an operation is refused.
//!
//! A RETRIEVE (or RELOCATE) first clears the boxes above its target, one
//! relocation operation per box, topmost first.  Every operation is
//! planned against the live stack and lock state at the moment the crane
//! is ready for it, so nothing is decided ahead of time.

use tracing::{debug, error, info, warn};
use yc_core::{BlockId, BoxId, Cell, Column, EquipmentId, LaneId, Priority, RequestId, V3};
use yc_request::{Dispatcher, Intent, Rejection, Request, RequestKind, RequestState};

use crate::equipment::Job;
use crate::op_builder;
use crate::operation::NextStep;
use crate::{
    BoxState, EquipmentState, Event, OpKind, OpState, ProbeEvent,
    SimError, SimResult, StackView, Yard, link_default_handlers,
};

/// What a RETRIEVE or RELOCATE does once its box is on top.
#[derive(Copy, Clone, Debug)]
enum Take {
    Retrieve(LaneId),
    Relocate(Option<Cell>),
}

impl Yard {
    /// Plan, check and commit the next operation of `job`, or close it.
    pub(crate) fn advance_job(&mut self, eq: EquipmentId, time: f64, job: Job) -> SimResult<()> {
        let mut op = match self.next_op(eq, time, job)? {
            NextStep::Done => return self.end_job(eq, time, job),
            NextStep::Reject(why) => return self.on_reject(eq, time, job, why),
            NextStep::Op(op) => *op,
        };

        op.workflow.dry_run(self.unit_mut(eq)?, time)?;
        if let Some(why) = self.check_interference(eq, &op).rejection(op.id) {
            op.state = OpState::Cancelled;
            self.operations.push(op);
            return self.on_reject(eq, time, job, why);
        }

        if op.main {
            if let Some(j) = self.unit_mut(eq)?.job.as_mut() {
                j.main_done = true;
            }
        }
        self.commit_operation(eq, op, time)
    }

    fn next_op(&mut self, eq: EquipmentId, time: f64, job: Job) -> SimResult<NextStep> {
        if job.main_done {
            return Ok(NextStep::Done);
        }
        let rid = job.request;
        let req = self.requests.get(rid.index()).ok_or(SimError::UnknownRequest(rid))?;
        let from = self.unit(eq)?.end_position();
        match req.intent.clone() {
            Intent::Store { box_id, lane } => self.plan_store(eq, time, rid, box_id, lane, from),
            Intent::Retrieve { box_id, lane } => self.plan_take(eq, time, rid, box_id, Take::Retrieve(lane), from),
            Intent::Relocate { box_id, dest } => self.plan_take(eq, time, rid, box_id, Take::Relocate(dest), from),
            Intent::Adjust { target, blocked, .. } => {
                let blocked_x = self.unit(blocked)?.end_position().x;
                let unit = self.unit(eq)?;
                let workflow = op_builder::adjust(&self.site(unit)?, from, target, blocked_x)?;
                let mut op = self.new_operation(OpKind::Adjust, eq, Some(rid), workflow);
                op.main = true;
                Ok(NextStep::Op(Box::new(op)))
            }
        }
    }

    fn box_state(&self, id: BoxId) -> SimResult<(BoxState, Cell, BlockId)> {
        let b = self.boxes.get(id.index()).ok_or(SimError::UnknownBox(id))?;
        Ok((b.state, b.cell, b.block))
    }

    /// Lock `columns`; on failure the rejection names what is held.
    fn lock_or_reject(
        &mut self,
        time:    f64,
        block:   BlockId,
        rid:     RequestId,
        columns: &[Column],
    ) -> SimResult<Option<Rejection>> {
        if self.acquire_columns(time, block, rid, columns)? {
            return Ok(None);
        }
        let held: Vec<Column> = self.request_mut(rid)?.pending_columns.iter().copied().collect();
        Ok(Some(Rejection::AcquireFail { columns: held }))
    }

    fn plan_store(
        &mut self,
        eq:     EquipmentId,
        time:   f64,
        rid:    RequestId,
        box_id: BoxId,
        lane:   LaneId,
        from:   V3,
    ) -> SimResult<NextStep> {
        let (state, cell, block_id) = self.box_state(box_id)?;
        if state != BoxState::Allocated {
            return Err(SimError::BoxState { box_id, state, action: "store" });
        }
        let block = self.blocks.get(block_id.index()).ok_or(SimError::UnknownBlock(block_id))?;
        let unsettled = block
            .below(cell)
            .iter()
            .copied()
            .find(|id| self.boxes.get(id.index()).is_none_or(|b| b.state != BoxState::Stored));
        if let Some(below) = unsettled {
            return Ok(NextStep::Reject(Rejection::BoxBeingOperated(below)));
        }
        if let Some(why) = self.lock_or_reject(time, block_id, rid, &[cell.column()])? {
            return Ok(NextStep::Reject(why));
        }

        let unit = self.unit(eq)?;
        let workflow = op_builder::store(&self.site(unit)?, from, lane, cell)?;
        let mut op = self.new_operation(OpKind::Store, eq, Some(rid), workflow);
        op.box_id = Some(box_id);
        op.dst = Some(cell);
        op.lane = Some(lane);
        op.main = true;
        Ok(NextStep::Op(Box::new(op)))
    }

    fn plan_take(
        &mut self,
        eq:     EquipmentId,
        time:   f64,
        rid:    RequestId,
        box_id: BoxId,
        take:   Take,
        from:   V3,
    ) -> SimResult<NextStep> {
        let (state, cell, block_id) = self.box_state(box_id)?;
        match state {
            BoxState::Stored => {}
            BoxState::Relocating | BoxState::Allocated | BoxState::Storing => {
                return Ok(NextStep::Reject(Rejection::BoxBeingOperated(box_id)));
            }
            BoxState::Retrieving | BoxState::Retrieved => {
                return Err(SimError::BoxState { box_id, state, action: "retrieve" });
            }
        }

        let unit = self.unit(eq)?;
        let block = self.blocks.get(block_id.index()).ok_or(SimError::UnknownBlock(block_id))?;
        let Some(bays) = block.bays_within(unit.reach.0, unit.reach.1) else {
            return Ok(NextStep::Reject(Rejection::Undefined(format!("no bay within reach of {eq}"))));
        };
        let source = cell.column();

        // Clear the way first.
        if let Some(&top) = block.above(cell).last() {
            let (top_state, top_cell, _) = self.box_state(top)?;
            if top_state == BoxState::Relocating {
                return Ok(NextStep::Reject(Rejection::BoxHasUndoneRelocation(top)));
            }
            if top_state != BoxState::Stored {
                return Ok(NextStep::Reject(Rejection::BoxBeingOperated(top)));
            }
            let view = StackView::new(block, &self.boxes);
            let Some(dst) = self.allocator.slot_for_relocation(view, source, bays) else {
                return Ok(self.allocator_failed(time, rid, top));
            };
            if let Some(why) = self.lock_or_reject(time, block_id, rid, &[source, dst.column()])? {
                return Ok(NextStep::Reject(why));
            }
            return self.relocation_op(eq, rid, top, top_cell, dst, false, from);
        }

        match take {
            Take::Retrieve(lane) => {
                if let Some(why) = self.lock_or_reject(time, block_id, rid, &[source])? {
                    return Ok(NextStep::Reject(why));
                }
                let unit = self.unit(eq)?;
                let workflow = op_builder::retrieve(&self.site(unit)?, from, cell, lane)?;
                let mut op = self.new_operation(OpKind::Retrieve, eq, Some(rid), workflow);
                op.box_id = Some(box_id);
                op.src = Some(cell);
                op.lane = Some(lane);
                op.main = true;
                Ok(NextStep::Op(Box::new(op)))
            }
            Take::Relocate(dest) => {
                let dst = match dest {
                    Some(d) => {
                        let column = d.column();
                        if column == source {
                            return Ok(NextStep::Reject(Rejection::Undefined(
                                "destination is the source column".into(),
                            )));
                        }
                        let view = StackView::new(block, &self.boxes);
                        if !view.is_settled(column) {
                            let top = block.column(column).last().copied().unwrap_or(box_id);
                            return Ok(NextStep::Reject(Rejection::BoxBeingOperated(top)));
                        }
                        match block.top_cell(column) {
                            Some(c) => c,
                            None => {
                                return Ok(NextStep::Reject(Rejection::Undefined(
                                    "destination column is full".into(),
                                )));
                            }
                        }
                    }
                    None => {
                        let view = StackView::new(block, &self.boxes);
                        match self.allocator.slot_for_relocation(view, source, bays) {
                            Some(c) => c,
                            None => return Ok(self.allocator_failed(time, rid, box_id)),
                        }
                    }
                };
                if let Some(why) = self.lock_or_reject(time, block_id, rid, &[source, dst.column()])? {
                    return Ok(NextStep::Reject(why));
                }
                self.relocation_op(eq, rid, box_id, cell, dst, true, from)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn relocation_op(
        &self,
        eq:     EquipmentId,
        rid:    RequestId,
        box_id: BoxId,
        src:    Cell,
        dst:    Cell,
        main:   bool,
        from:   V3,
    ) -> SimResult<NextStep> {
        let unit = self.unit(eq)?;
        let workflow = op_builder::relocate(&self.site(unit)?, from, src, dst, main)?;
        let mut op = self.new_operation(OpKind::Relocate, eq, Some(rid), workflow);
        op.box_id = Some(box_id);
        op.src = Some(src);
        op.dst = Some(dst);
        op.main = main;
        Ok(NextStep::Op(Box::new(op)))
    }

    fn allocator_failed(&mut self, time: f64, rid: RequestId, box_id: BoxId) -> NextStep {
        warn!(time, request = %rid, box_id = %box_id, "no slot for relocation");
        self.probe(time, ProbeEvent::AllocatorFail { request: rid, box_id });
        NextStep::Reject(Rejection::Undefined("no slot for relocation".into()))
    }

    // ── Closing a job ─────────────────────────────────────────────────────

    fn end_job(&mut self, eq: EquipmentId, time: f64, job: Job) -> SimResult<()> {
        let rid = job.request;
        self.finish_request(rid, time)?;
        let req = self.requests.get(rid.index()).ok_or(SimError::UnknownRequest(rid))?;
        let (block, kind) = (req.block, req.kind());
        self.release_all_columns(time, block, rid)?;
        self.blocks.get_mut(block.index()).ok_or(SimError::UnknownBlock(block))?.locks.cancel_wait(rid);
        self.unit_mut(eq)?.job = None;
        if kind == RequestKind::Adjust {
            self.release_blocked(rid, time, true)?;
        }
        self.schedule(eq, time);
        self.activate(eq, time, Priority::Forever)
    }

    /// Single dispatch point for refused operations.
    pub(crate) fn on_reject(&mut self, eq: EquipmentId, time: f64, job: Job, why: Rejection) -> SimResult<()> {
        let rid = job.request;
        let req = self.request_mut(rid)?;
        let resubmit = req.reject(time, why.clone())?;
        let (kind, block, one_time) = (req.kind(), req.block, req.one_time_attempt);
        warn!(time, request = %rid, equipment = %eq, %kind, reason = %why, "request rejected");
        self.probe(time, ProbeEvent::RequestRejected { request: rid, equipment: eq, reason: why.clone() });
        self.release_all_columns(time, block, rid)?;
        self.unit_mut(eq)?.job = None;

        match &why {
            Rejection::EquipmentConflict { peer, new_pos: Some(target), .. } if !one_time => {
                let adjust = self.create_adjust(time, block, *peer, *target, eq, rid)?;
                let unit = self.unit_mut(eq)?;
                unit.state = EquipmentState::Blocking;
                unit.blocked_by = Some(adjust);
                debug!(time, equipment = %eq, peer = %peer, %adjust, target, "blocking on peer");
                self.probe(time, ProbeEvent::EquipmentConflict { equipment: eq, peer: *peer, adjust });
            }
            Rejection::EquipmentConflict { peer, new_pos: None, .. } if resubmit => {
                // An idle peer that could not be moved has no finish to wait for.
                if self.unit(*peer)?.state == EquipmentState::Idle {
                    self.queue.push(time + self.config.retry_backoff, Priority::Request, Event::Retry(rid));
                } else {
                    self.unit_mut(*peer)?.waiters.push(rid);
                }
            }
            Rejection::BoxBeingOperated(_) | Rejection::BoxHasUndoneRelocation(_) if resubmit => {
                self.queue.push(time + self.config.retry_backoff, Priority::Request, Event::Retry(rid));
            }
            Rejection::Undefined(reason) => {
                error!(time, request = %rid, %kind, %reason, "request failed");
                if let Some(record) = self.request_record(rid) {
                    self.probe(time, ProbeEvent::RequestFailed(record));
                }
                if self.config.abort_on_undefined {
                    return Err(SimError::Aborted { request: rid, reason: reason.clone() });
                }
            }
            _ => {}
        }

        if resubmit {
            let req = self.requests.get_mut(rid.index()).ok_or(SimError::UnknownRequest(rid))?;
            let dispatcher = &mut self.blocks.get_mut(block.index()).ok_or(SimError::UnknownBlock(block))?.dispatcher;
            dispatcher.submit(time, req, false)?;
        } else {
            self.blocks.get_mut(block.index()).ok_or(SimError::UnknownBlock(block))?.locks.cancel_wait(rid);
        }

        if kind == RequestKind::Adjust {
            self.release_blocked(rid, time, false)?;
        }
        if self.unit(eq)?.state != EquipmentState::Blocking {
            self.schedule(eq, time);
            self.activate(eq, time, Priority::Forever)?;
        }
        Ok(())
    }

    /// Create the ADJUST that moves idle `peer` to `target` so `blocked`
    /// can carry out `blocking`.
    fn create_adjust(
        &mut self,
        time:     f64,
        block:    BlockId,
        peer:     EquipmentId,
        target:   f64,
        blocked:  EquipmentId,
        blocking: RequestId,
    ) -> SimResult<RequestId> {
        let id = RequestId(self.requests.len() as u32);
        let intent = Intent::Adjust { target, blocked, blocking_request: Some(blocking) };
        let mut req = Request::new(id, intent, block, time);
        req.equipment = Some(peer);
        req.one_time_attempt = true;
        link_default_handlers(&mut req)?;
        self.requests.push(req);

        let req = self.requests.get_mut(id.index()).ok_or(SimError::UnknownRequest(id))?;
        let dispatcher = &mut self.blocks.get_mut(block.index()).ok_or(SimError::UnknownBlock(block))?.dispatcher;
        let wake = dispatcher.submit(time, req, true)?;
        self.wake(wake, block, time);
        Ok(id)
    }

    /// Let the unit blocked on `adjust` go.  Its blocking request resumes
    /// now if the ADJUST got under way, after a backoff otherwise.
    pub(crate) fn release_blocked(&mut self, adjust: RequestId, time: f64, succeeded: bool) -> SimResult<()> {
        let req = self.requests.get(adjust.index()).ok_or(SimError::UnknownRequest(adjust))?;
        let Intent::Adjust { blocked, blocking_request, .. } = req.intent else {
            return Ok(());
        };
        let unit = self.unit_mut(blocked)?;
        if unit.blocked_by != Some(adjust) {
            return Ok(());
        }
        unit.blocked_by = None;
        unit.state = EquipmentState::Idle;
        let waiters = std::mem::take(&mut unit.waiters);
        info!(time, equipment = %blocked, %adjust, succeeded, "unblocked");

        if let Some(b) = blocking_request {
            if succeeded {
                self.make_ready(b, time)?;
            } else {
                self.queue.push(time + self.config.retry_backoff, Priority::Request, Event::Retry(b));
            }
        }
        for w in waiters {
            self.make_ready(w, time)?;
        }
        self.activate(blocked, time, Priority::InterferenceRelease)
    }

    /// REJECTED → RESUME_READY for a queued, recoverable request, waking
    /// whoever may schedule it.
    pub(crate) fn make_ready(&mut self, rid: RequestId, time: f64) -> SimResult<()> {
        let req = self.requests.get_mut(rid.index()).ok_or(SimError::UnknownRequest(rid))?;
        if req.state != RequestState::REJECTED || req.failure.is_some() {
            return Ok(());
        }
        let block = req.block;
        let queued = self
            .blocks
            .get(block.index())
            .is_some_and(|b| b.dispatcher.is_queued(rid));
        if !queued {
            return Ok(());
        }
        req.pending_columns.clear();
        req.ready(time)?;
        let wake = Dispatcher::wake_for(req);
        debug!(time, request = %rid, "request ready again");
        self.wake(wake, block, time);
        Ok(())
    }
}
