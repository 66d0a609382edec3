//! The `Yard` struct, its public request API and the event loop.

use tracing::{debug, info, trace, warn};
use yc_core::{
    BlockId, BoxId, Cell, Column, EquipmentId, LaneId, OperationId, Priority, RequestId, SimClock,
    V3, YardConfig,
};
use yc_motion::LoadState;
use yc_request::{Intent, Request, RequestKind};
use yc_stack::LockEvent;

use crate::op_builder::{self, Site};
use crate::{
    Block, BlockLayout, BoxRecord, BoxState, Equipment, EquipmentState, Event, EventQueue,
    IdleAction, JobPolicy, OpKind, OpState, Operation, ProbeEvent, RequestRecord, SignalHandler,
    SimError, SimResult, SlotAllocator, StackView, Task, YardObserver, link_default_handlers,
};

/// Motion below this is not worth a housekeeping operation.
const PARK_TOLERANCE: f64 = 1e-6;

const TIME_EPS: f64 = 1e-9;

/// The simulated container yard.
///
/// Holds every block with its cranes, the request, operation and box arenas
/// and the event queue that drives them.  Everything happens inside
/// [`run`](Yard::run) / [`run_until`](Yard::run_until); between runs the
/// yard can be inspected and new requests can be submitted for the future.
///
/// Create via [`YardBuilder`][crate::YardBuilder].
pub struct Yard {
    pub(crate) config:     YardConfig,
    pub(crate) clock:      SimClock,
    pub(crate) queue:      EventQueue,
    pub(crate) blocks:     Vec<Block>,
    pub(crate) equipment:  Vec<Equipment>,
    pub(crate) requests:   Vec<Request<SignalHandler>>,
    pub(crate) operations: Vec<Operation>,
    pub(crate) boxes:      Vec<BoxRecord>,
    pub(crate) policy:     Box<dyn JobPolicy>,
    pub(crate) allocator:  Box<dyn SlotAllocator>,

    /// Observer sampling period; `None` disables position samples.
    pub(crate) sample_interval: Option<f64>,
    sampling:                   bool,
    /// Probes raised while handling the current event.
    pub(crate) probes:          Vec<(f64, ProbeEvent)>,
}

impl Yard {
    pub(crate) fn from_parts(
        config:          YardConfig,
        blocks:          Vec<Block>,
        equipment:       Vec<Equipment>,
        policy:          Box<dyn JobPolicy>,
        allocator:       Box<dyn SlotAllocator>,
        sample_interval: Option<f64>,
    ) -> Self {
        Self {
            config,
            clock: SimClock::new(),
            queue: EventQueue::new(),
            blocks,
            equipment,
            requests: Vec::new(),
            operations: Vec::new(),
            boxes: Vec::new(),
            policy,
            allocator,
            sample_interval,
            sampling: false,
            probes: Vec::new(),
        }
    }

    // ── Inspection ────────────────────────────────────────────────────────

    #[inline]
    pub fn config(&self) -> &YardConfig {
        &self.config
    }

    #[inline]
    pub fn now(&self) -> f64 {
        self.clock.now().secs()
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.index())
    }

    pub fn equipment(&self, id: EquipmentId) -> Option<&Equipment> {
        self.equipment.get(id.index())
    }

    pub fn equipment_ids(&self) -> impl Iterator<Item = EquipmentId> + '_ {
        self.equipment.iter().map(|e| e.id)
    }

    pub fn request(&self, id: RequestId) -> Option<&Request<SignalHandler>> {
        self.requests.get(id.index())
    }

    pub fn requests(&self) -> &[Request<SignalHandler>] {
        &self.requests
    }

    pub fn operation(&self, id: OperationId) -> Option<&Operation> {
        self.operations.get(id.index())
    }

    /// Every operation ever planned, refused ones included.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn box_record(&self, id: BoxId) -> Option<&BoxRecord> {
        self.boxes.get(id.index())
    }

    pub fn boxes(&self) -> &[BoxRecord] {
        &self.boxes
    }

    /// Queued events other than observer samples.
    pub fn pending_work(&self) -> usize {
        self.queue.pending_work()
    }

    /// Summary of a request as reported by the `request.*` probes.
    pub fn request_record(&self, id: RequestId) -> Option<RequestRecord> {
        let req = self.requests.get(id.index())?;
        Some(RequestRecord {
            request:      req.id,
            kind:         req.kind(),
            box_id:       req.box_id(),
            equipment:    req.equipment,
            state:        req.state,
            arrival:      req.arrival_time,
            ready:        req.ready_time,
            start:        req.start_time,
            finish:       req.finish_time,
            reject_count: req.reject_count,
            failure:      req.failure.clone(),
        })
    }

    // ── Requests ──────────────────────────────────────────────────────────

    fn check_time(&self, time: f64) -> SimResult<()> {
        let now = self.now();
        if time < now {
            return Err(SimError::PastTime { now, requested: time });
        }
        Ok(())
    }

    /// Bring a new box in at `lane` at `time`.
    ///
    /// The box gets `cell` if given (it must be the next free cell of an
    /// unlocked column), otherwise whatever the allocator picks.  The cell is
    /// reserved immediately.
    pub fn store(
        &mut self,
        time:     f64,
        block_id: BlockId,
        lane:     LaneId,
        cell:     Option<Cell>,
    ) -> SimResult<(BoxId, RequestId)> {
        self.check_time(time)?;
        let block = self.blocks.get(block_id.index()).ok_or(SimError::UnknownBlock(block_id))?;
        if lane.index() >= block.layout.lane_count() {
            return Err(SimError::UnknownLane { block: block_id, lane });
        }
        let box_id = BoxId(self.boxes.len() as u32);
        let target = match cell {
            Some(c) => {
                if !block.layout.contains(c) {
                    return Err(SimError::InvalidCell { cell: c, reason: "outside the block" });
                }
                if c.tier != block.height(c.column()) {
                    return Err(SimError::InvalidCell { cell: c, reason: "not the next free tier" });
                }
                if block.locks().is_locked(c.column()) {
                    return Err(SimError::InvalidCell { cell: c, reason: "column is locked" });
                }
                c
            }
            None => self
                .allocator
                .slot_for_store(StackView::new(block, &self.boxes), lane)
                .ok_or(SimError::NoSlot(box_id))?,
        };
        let cell = self.reserve_in_stack(block_id, target.column(), box_id)?;
        self.boxes.push(BoxRecord::allocated(box_id, block_id, cell, time));
        self.probe(time, ProbeEvent::BoxAlloc { box_id, cell });
        let id = self.create_request(time, block_id, Intent::Store { box_id, lane })?;
        Ok((box_id, id))
    }

    /// Take `box_id` out to `lane` at `time`.
    pub fn retrieve(&mut self, time: f64, box_id: BoxId, lane: LaneId) -> SimResult<RequestId> {
        self.check_time(time)?;
        let block_id = self.live_box(box_id, "retrieve")?;
        let block = self.blocks.get(block_id.index()).ok_or(SimError::UnknownBlock(block_id))?;
        if lane.index() >= block.layout.lane_count() {
            return Err(SimError::UnknownLane { block: block_id, lane });
        }
        self.create_request(time, block_id, Intent::Retrieve { box_id, lane })
    }

    /// Move `box_id` to the top of `dest`'s column, or wherever the allocator
    /// finds room.
    pub fn relocate(&mut self, time: f64, box_id: BoxId, dest: Option<Cell>) -> SimResult<RequestId> {
        self.check_time(time)?;
        let block_id = self.live_box(box_id, "relocate")?;
        if let Some(d) = dest {
            let block = self.blocks.get(block_id.index()).ok_or(SimError::UnknownBlock(block_id))?;
            if !block.layout.contains(d) {
                return Err(SimError::InvalidCell { cell: d, reason: "outside the block" });
            }
        }
        self.create_request(time, block_id, Intent::Relocate { box_id, dest })
    }

    fn live_box(&self, box_id: BoxId, action: &'static str) -> SimResult<BlockId> {
        let b = self.boxes.get(box_id.index()).ok_or(SimError::UnknownBox(box_id))?;
        if matches!(b.state, BoxState::Retrieving | BoxState::Retrieved) {
            return Err(SimError::BoxState { box_id, state: b.state, action });
        }
        Ok(b.block)
    }

    fn create_request(&mut self, time: f64, block: BlockId, intent: Intent) -> SimResult<RequestId> {
        let id = RequestId(self.requests.len() as u32);
        let mut req = Request::new(id, intent, block, time);
        link_default_handlers(&mut req)?;
        debug!(request = %id, kind = %req.kind(), time, "request created");
        self.requests.push(req);
        self.queue.push(time, Priority::Request, Event::Submit(id));
        Ok(id)
    }

    // ── Run loop ──────────────────────────────────────────────────────────

    /// Run until the queue drains or `config.end_time` is reached.
    pub fn run<O: YardObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        self.run_until(self.config.end_time, observer)
    }

    /// Process every event due at or before `end`.
    pub fn run_until<O: YardObserver>(&mut self, end: f64, observer: &mut O) -> SimResult<()> {
        if let Some(dt) = self.sample_interval.filter(|dt| *dt > 0.0) {
            if !self.sampling && self.queue.pending_work() > 0 {
                self.sampling = true;
                self.queue.push(self.now().max(0.0), Priority::Observe, Event::Sample);
                trace!(dt, "sampling started");
            }
        }

        while let Some(time) = self.queue.next_time() {
            if time.secs() > end {
                break;
            }
            let Some(entry) = self.queue.pop() else { break };
            if !self.clock.advance_to(entry.time) {
                return Err(SimError::PastTime { now: self.now(), requested: entry.time.secs() });
            }
            let now = entry.time.secs();
            let result = match entry.event {
                Event::Sample => {
                    self.sample(now, observer);
                    Ok(())
                }
                event => self.dispatch(now, entry.priority, event),
            };
            self.flush_probes(observer);
            result?;
        }
        observer.on_run_end(self.now());
        Ok(())
    }

    fn sample<O: YardObserver>(&mut self, time: f64, observer: &mut O) {
        let positions: Vec<(EquipmentId, V3)> =
            self.equipment.iter().map(|e| (e.id, e.position_at(time))).collect();
        observer.on_sample(time, &positions);
        match self.sample_interval {
            Some(dt) if self.queue.pending_work() > 0 => {
                self.queue.push(time + dt, Priority::Observe, Event::Sample);
            }
            _ => self.sampling = false,
        }
    }

    fn flush_probes<O: YardObserver>(&mut self, observer: &mut O) {
        for (time, event) in self.probes.drain(..) {
            observer.on_probe(time, &event);
        }
    }

    fn dispatch(&mut self, time: f64, priority: Priority, event: Event) -> SimResult<()> {
        match event {
            Event::Equipment { id, generation } => {
                let unit = self.unit(id)?;
                if unit.generation == generation {
                    self.on_equipment(id, time, priority)?;
                }
            }
            Event::Schedule { id, generation } => {
                if self.unit(id)?.sched_generation == generation {
                    self.run_scheduler(id, time)?;
                }
            }
            Event::Signal { request, op, signal } => {
                let operation = self.operations.get(op.index()).ok_or(SimError::UnknownOperation(op))?;
                if operation.state == OpState::Cancelled {
                    trace!(%op, %signal, "signal of cancelled operation dropped");
                    return Ok(());
                }
                let ctx = operation.signal_context(request);
                match self.requests.get(request.index()).and_then(|r| r.signals.get(signal)) {
                    Some(handler) => {
                        trace!(time, %request, %op, %signal, "signal");
                        handler(self, time, &ctx)?;
                    }
                    None => debug!(%request, %signal, "no handler linked"),
                }
            }
            Event::Submit(id) => {
                let req = self.requests.get_mut(id.index()).ok_or(SimError::UnknownRequest(id))?;
                let block_id = req.block;
                let block = self.blocks.get_mut(block_id.index()).ok_or(SimError::UnknownBlock(block_id))?;
                let wake = block.dispatcher.submit(time, req, true)?;
                self.wake(wake, block_id, time);
            }
            Event::Retry(id) => self.make_ready(id, time)?,
            Event::Sample => {}
        }
        Ok(())
    }

    // ── Equipment process ─────────────────────────────────────────────────

    pub(crate) fn unit(&self, id: EquipmentId) -> SimResult<&Equipment> {
        self.equipment.get(id.index()).ok_or(SimError::UnknownEquipment(id))
    }

    pub(crate) fn unit_mut(&mut self, id: EquipmentId) -> SimResult<&mut Equipment> {
        self.equipment.get_mut(id.index()).ok_or(SimError::UnknownEquipment(id))
    }

    /// Resume `eq` at `time`, superseding any earlier pending activation.
    pub(crate) fn activate(&mut self, eq: EquipmentId, time: f64, priority: Priority) -> SimResult<()> {
        let unit = self.unit_mut(eq)?;
        unit.generation += 1;
        let generation = unit.generation;
        self.queue.push(time, priority, Event::Equipment { id: eq, generation });
        Ok(())
    }

    fn on_equipment(&mut self, eq: EquipmentId, time: f64, priority: Priority) -> SimResult<()> {
        for mover in &mut self.unit_mut(eq)?.movers {
            mover.run_until(time)?;
        }

        if let Some(op) = self.unit(eq)?.current_op {
            let finish = self.operations.get(op.index()).ok_or(SimError::UnknownOperation(op))?.finish;
            if time + TIME_EPS < finish {
                return self.activate(eq, finish, Priority::OperationFinish);
            }
            self.finish_operation(eq, op, time)?;
        }

        let unit = self.unit_mut(eq)?;
        if unit.state == EquipmentState::Blocking {
            return Ok(());
        }
        if let Some(job) = unit.job {
            return self.advance_job(eq, time, job);
        }
        if let Some(task) = unit.next_task.take() {
            return self.start_task(eq, time, task);
        }
        if priority == Priority::Forever {
            let action = self.policy.on_idle(self.unit(eq)?);
            if let Some(action) = action {
                return self.start_task(eq, time, Task::Housekeeping(action));
            }
            return Ok(());
        }
        self.schedule(eq, time);
        self.activate(eq, time, Priority::Forever)
    }

    /// Hand `task` to `eq`, interrupting an interruptible operation.
    pub(crate) fn submit_task(&mut self, eq: EquipmentId, time: f64, task: Task) -> SimResult<()> {
        let unit = self.unit_mut(eq)?;
        unit.next_task = Some(task);
        match unit.state {
            EquipmentState::Working if unit.allows_interrupt() => {
                for mover in &mut unit.movers {
                    mover.interrupt(time, LoadState::Empty)?;
                }
                unit.state = EquipmentState::Idle;
                let cancelled = unit.current_op.take();
                let waiters = std::mem::take(&mut unit.waiters);
                if let Some(op) = cancelled {
                    let operation = self.operations.get_mut(op.index()).ok_or(SimError::UnknownOperation(op))?;
                    operation.state = OpState::Cancelled;
                    operation.finish = time;
                    debug!(time, %op, equipment = %eq, "operation interrupted");
                    let record = operation.record();
                    self.probe(time, ProbeEvent::OperationFinish(record));
                }
                for w in waiters {
                    self.make_ready(w, time)?;
                }
                self.activate(eq, time, Priority::Interrupt)
            }
            EquipmentState::Idle => self.activate(eq, time, Priority::TaskArrival),
            _ => Ok(()),
        }
    }

    fn start_task(&mut self, eq: EquipmentId, time: f64, task: Task) -> SimResult<()> {
        match task {
            Task::Request(request) => {
                let unit = self.unit_mut(eq)?;
                let job = crate::equipment::Job { request, main_done: false };
                unit.job = Some(job);
                debug!(time, equipment = %eq, %request, "job started");
                self.advance_job(eq, time, job)
            }
            Task::Housekeeping(IdleAction::Park { height }) => {
                let unit = self.unit(eq)?;
                let from = unit.end_position();
                if (from.z - height).abs() <= PARK_TOLERANCE {
                    return Ok(());
                }
                let workflow = {
                    let site = self.site(unit)?;
                    op_builder::park(&site, from, height)?
                };
                let mut op = self.new_operation(OpKind::Move, eq, None, workflow);
                op.interruptible = true;
                op.workflow.dry_run(self.unit_mut(eq)?, time)?;
                if self.check_interference(eq, &op) != crate::Interference::Clear {
                    warn!(time, equipment = %eq, "park move dropped: crosses another crane");
                    op.state = OpState::Cancelled;
                    self.operations.push(op);
                    return Ok(());
                }
                self.commit_operation(eq, op, time)
            }
        }
    }

    pub(crate) fn site<'a>(&'a self, unit: &'a Equipment) -> SimResult<Site<'a>> {
        let block = self.blocks.get(unit.block.index()).ok_or(SimError::UnknownBlock(unit.block))?;
        Ok(Site { block: unit.block, layout: &block.layout, config: &self.config, crane: &unit.config })
    }

    pub(crate) fn new_operation(
        &self,
        kind:     OpKind,
        eq:       EquipmentId,
        request:  Option<RequestId>,
        workflow: yc_workflow::Workflow<yc_request::Signal>,
    ) -> Operation {
        let id = OperationId(self.operations.len() as u32);
        Operation::new(id, kind, eq, request, workflow)
    }

    /// Queue a planned operation's motions and signals for real.
    pub(crate) fn commit_operation(&mut self, eq: EquipmentId, mut op: Operation, time: f64) -> SimResult<()> {
        let mut signals: Vec<(f64, yc_request::Signal)> = Vec::new();
        let unit = self.equipment.get_mut(eq.index()).ok_or(SimError::UnknownEquipment(eq))?;
        op.workflow.commit(unit, &mut signals)?;
        op.state = OpState::Running;
        op.start = op.workflow.start_time();
        op.finish = op.workflow.finish_time();
        unit.state = EquipmentState::Working;
        unit.current_op = Some(op.id);

        if let Some(rid) = op.request {
            for (t, signal) in signals {
                self.queue.push(t, Priority::Callback, Event::Signal { request: rid, op: op.id, signal });
            }
            let req = self.request_mut(rid)?;
            req.ops.push(op.id);
            if !req.state.is_running() {
                req.start_or_resume(time)?;
            }
        }

        debug!(time, op = %op, start = op.start, finish = op.finish, "operation start");
        self.probe(time, ProbeEvent::OperationStart {
            op:        op.id,
            kind:      op.kind,
            equipment: eq,
            request:   op.request,
        });
        let finish = op.finish;
        self.operations.push(op);
        self.activate(eq, finish, Priority::OperationFinish)
    }

    fn finish_operation(&mut self, eq: EquipmentId, op: OperationId, time: f64) -> SimResult<()> {
        let operation = self.operations.get_mut(op.index()).ok_or(SimError::UnknownOperation(op))?;
        operation.state = OpState::Finished;
        let record = operation.record();
        let unit = self.unit_mut(eq)?;
        unit.current_op = None;
        unit.state = EquipmentState::Idle;
        let waiters = std::mem::take(&mut unit.waiters);
        debug!(time, %op, equipment = %eq, "operation finish");
        self.probe(time, ProbeEvent::OperationFinish(record));
        for w in waiters {
            self.make_ready(w, time)?;
        }
        Ok(())
    }

    // ── Shared helpers (also used by signal handlers) ─────────────────────

    pub(crate) fn probe(&mut self, time: f64, event: ProbeEvent) {
        trace!(time, probe = event.name());
        self.probes.push((time, event));
    }

    pub(crate) fn request_mut(&mut self, id: RequestId) -> SimResult<&mut Request<SignalHandler>> {
        self.requests.get_mut(id.index()).ok_or(SimError::UnknownRequest(id))
    }

    pub(crate) fn box_mut(&mut self, id: BoxId) -> SimResult<&mut BoxRecord> {
        self.boxes.get_mut(id.index()).ok_or(SimError::UnknownBox(id))
    }

    fn block_mut(&mut self, id: BlockId) -> SimResult<&mut Block> {
        self.blocks.get_mut(id.index()).ok_or(SimError::UnknownBlock(id))
    }

    pub(crate) fn reserve_in_stack(&mut self, block: BlockId, column: Column, box_id: BoxId) -> SimResult<Cell> {
        self.block_mut(block)?.reserve(column, box_id).ok_or(SimError::NoSlot(box_id))
    }

    /// Remove a box from its column; boxes that were above it drop a tier.
    pub(crate) fn take_from_stack(&mut self, block: BlockId, column: Column, box_id: BoxId) -> SimResult<()> {
        let shifted = self.block_mut(block)?.remove(column, box_id);
        for id in shifted {
            let b = self.box_mut(id)?;
            b.cell.tier = b.cell.tier.saturating_sub(1);
        }
        Ok(())
    }

    /// Lock `columns` for `who`.  On failure `who` waits on the held ones.
    pub(crate) fn acquire_columns(
        &mut self,
        time:    f64,
        block:   BlockId,
        who:     RequestId,
        columns: &[Column],
    ) -> SimResult<bool> {
        let mut events = Vec::new();
        let granted = self.block_mut(block)?.locks.acquire(time, who, columns, &mut events);
        self.apply_lock_events(events, time)?;
        Ok(granted)
    }

    pub(crate) fn release_columns(
        &mut self,
        time:    f64,
        block:   BlockId,
        who:     RequestId,
        columns: &[Column],
    ) -> SimResult<()> {
        let mut events = Vec::new();
        self.block_mut(block)?.locks.release(time, who, columns, &mut events)?;
        self.apply_lock_events(events, time)
    }

    pub(crate) fn release_all_columns(&mut self, time: f64, block: BlockId, who: RequestId) -> SimResult<()> {
        let mut events = Vec::new();
        self.block_mut(block)?.locks.release_all(time, who, &mut events)?;
        self.apply_lock_events(events, time)
    }

    fn apply_lock_events(&mut self, events: Vec<LockEvent<RequestId>>, time: f64) -> SimResult<()> {
        for event in events {
            match event {
                LockEvent::AcquireFail { who, column, .. } => self.request_mut(who)?.wait_on(column),
                LockEvent::AcquireSuccess { who, column, .. } => trace!(%who, %column, "column locked"),
                LockEvent::Released { who, column, .. } => {
                    if self.request_mut(who)?.on_resource_release(column) {
                        self.make_ready(who, time)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Close `id` as finished, once.
    pub(crate) fn finish_request(&mut self, id: RequestId, time: f64) -> SimResult<()> {
        if self.request_mut(id)?.finish_or_fail(time) {
            let kind = self.request_mut(id)?.kind();
            if kind != RequestKind::Adjust {
                info!(time, request = %id, %kind, "request finished");
            }
            if let Some(record) = self.request_record(id) {
                self.probe(time, ProbeEvent::RequestFinished(record));
            }
        }
        Ok(())
    }
}
