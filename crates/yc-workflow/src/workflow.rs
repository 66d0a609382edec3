//! The step arena and its two-phase (dry run, commit) execution.

use std::collections::BTreeMap;

use tracing::trace;
use yc_core::Axis;
use yc_motion::{LoadState, Motion, Mover, PathTrace};

use crate::{AxisTotal, MotionRecord, StepId, StepKind, StepNode, WorkflowError, WorkflowResult};

/// Access to the movers of one equipment unit, by axis.
pub trait MoverSet {
    fn mover(&self, axis: Axis) -> &Mover;
    fn mover_mut(&mut self, axis: Axis) -> &mut Mover;
}

impl MoverSet for [Mover; 3] {
    #[inline]
    fn mover(&self, axis: Axis) -> &Mover {
        &self[axis.index()]
    }

    #[inline]
    fn mover_mut(&mut self, axis: Axis) -> &mut Mover {
        &mut self[axis.index()]
    }
}

/// Receives callback payloads at commit, with the time they must fire.
pub trait CallbackSink<E> {
    fn schedule(&mut self, time: f64, event: E);
}

impl<E> CallbackSink<E> for Vec<(f64, E)> {
    fn schedule(&mut self, time: f64, event: E) {
        self.push((time, event));
    }
}

/// Timing-relevant copy of a step kind, detached from the arena borrow.
enum Plan {
    Move { axis: Axis, from: f64, to: f64, interruptible: bool, load: LoadState },
    Wait { duration: f64, hold: Option<Axis> },
    Instant,
    Seq(Vec<StepId>),
    All(Vec<StepId>),
    AnyOf(Vec<StepId>),
}

/// The plan of one operation: an arena of steps plus the ordered list of
/// top-level steps.
///
/// Top-level steps run in sequence.  `dry_run` resolves start and finish
/// times of every reachable step against a snapshot of the movers and
/// records the predicted path of each axis; movers are left exactly as they
/// were.  `commit` then queues the planned motions and hands callback
/// payloads to a sink.
#[derive(Clone, Debug)]
pub struct Workflow<E> {
    steps:           Vec<StepNode<E>>,
    top:             Vec<StepId>,
    traces:          [PathTrace; 3],
    sample_interval: f64,
    start:           f64,
    finish:          f64,
    planned:         bool,
    committed:       bool,
}

impl<E> Workflow<E> {
    /// `sample_interval` is the maximum spacing of predicted path samples.
    pub fn new(sample_interval: f64) -> Self {
        Self {
            steps: Vec::new(),
            top: Vec::new(),
            traces: Default::default(),
            sample_interval,
            start: 0.0,
            finish: 0.0,
            planned: false,
            committed: false,
        }
    }

    // ── Building ──────────────────────────────────────────────────────────────

    /// Add a detached step to the arena.
    pub fn push(&mut self, kind: StepKind<E>) -> StepId {
        let id = StepId(self.steps.len() as u32);
        self.steps.push(StepNode::new(kind));
        id
    }

    pub fn move_axis(
        &mut self,
        axis:          Axis,
        from:          f64,
        to:            f64,
        interruptible: bool,
        load:          LoadState,
    ) -> StepId {
        self.push(StepKind::Move { axis, from, to, interruptible, load })
    }

    pub fn wait(&mut self, duration: f64, hold: Option<Axis>) -> StepId {
        self.push(StepKind::Wait { duration, hold })
    }

    pub fn callback(&mut self, event: E) -> StepId {
        self.push(StepKind::Callback(event))
    }

    pub fn seq(&mut self, steps: Vec<StepId>) -> StepId {
        self.push(StepKind::Seq(steps))
    }

    pub fn all(&mut self, steps: Vec<StepId>) -> StepId {
        self.push(StepKind::All(steps))
    }

    pub fn any_of(&mut self, steps: Vec<StepId>) -> StepId {
        self.push(StepKind::AnyOf(steps))
    }

    /// `step` may not start before `pred` is ready.
    pub fn after(&mut self, step: StepId, pred: StepId) -> WorkflowResult<()> {
        if pred.index() >= self.steps.len() {
            return Err(WorkflowError::UnknownStep(pred));
        }
        let node = self.steps.get_mut(step.index()).ok_or(WorkflowError::UnknownStep(step))?;
        if !node.preds.contains(&pred) {
            node.preds.push(pred);
        }
        Ok(())
    }

    /// Append a top-level step.
    pub fn add(&mut self, step: StepId) -> WorkflowResult<()> {
        if step.index() >= self.steps.len() {
            return Err(WorkflowError::UnknownStep(step));
        }
        self.top.push(step);
        Ok(())
    }

    // ── Inspection ────────────────────────────────────────────────────────────

    #[inline] pub fn len(&self) -> usize { self.steps.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.steps.is_empty() }
    #[inline] pub fn start_time(&self) -> f64 { self.start }
    #[inline] pub fn finish_time(&self) -> f64 { self.finish }
    #[inline] pub fn is_planned(&self) -> bool { self.planned }
    #[inline] pub fn is_committed(&self) -> bool { self.committed }

    pub fn step(&self, id: StepId) -> Option<&StepNode<E>> {
        self.steps.get(id.index())
    }

    /// Predicted path of `axis` from the last dry run.
    pub fn trace(&self, axis: Axis) -> &PathTrace {
        &self.traces[axis.index()]
    }

    /// Resolved `(time, payload)` of every planned callback, in time order.
    pub fn callbacks(&self) -> Vec<(f64, &E)> {
        let mut out: Vec<(f64, &E)> = self
            .steps
            .iter()
            .filter(|n| n.executed)
            .filter_map(|n| match &n.kind {
                StepKind::Callback(e) => Some((n.start, e)),
                _ => None,
            })
            .collect();
        out.sort_by(|a, b| a.0.total_cmp(&b.0));
        out
    }

    /// Planned moves with times relative to `origin`, in start order.
    pub fn dump(&self, origin: f64) -> Vec<MotionRecord> {
        let mut out: Vec<MotionRecord> = self
            .steps
            .iter()
            .filter(|n| n.executed)
            .filter_map(|n| match n.kind {
                StepKind::Move { axis, from, to, load, .. } if n.finish > n.start => Some(MotionRecord {
                    axis,
                    load,
                    start: n.start - origin,
                    duration: n.finish - n.start,
                    from,
                    to,
                }),
                _ => None,
            })
            .collect();
        out.sort_by(|a, b| a.start.total_cmp(&b.start));
        out
    }

    /// Distance and moving time per (axis, load).
    pub fn axis_totals(&self) -> Vec<AxisTotal> {
        let mut acc: BTreeMap<(usize, LoadState), AxisTotal> = BTreeMap::new();
        for rec in self.dump(0.0) {
            let entry = acc.entry((rec.axis.index(), rec.load)).or_insert(AxisTotal {
                axis: rec.axis,
                load: rec.load,
                distance: 0.0,
                time: 0.0,
            });
            entry.distance += rec.distance();
            entry.time += rec.duration;
        }
        acc.into_values().collect()
    }

    // ── Execution ─────────────────────────────────────────────────────────────

    /// Forget the previous plan so the workflow can be planned again.
    pub fn reset(&mut self) {
        for node in &mut self.steps {
            node.reset();
        }
        for trace in &mut self.traces {
            *trace = PathTrace::new();
        }
        self.planned = false;
        self.committed = false;
    }

    /// Resolve timing of every top-level step starting at `start` and
    /// return the latest finish.  Mover planning state is restored
    /// afterwards, also on error.
    pub fn dry_run<M: MoverSet>(&mut self, movers: &mut M, start: f64) -> WorkflowResult<f64> {
        self.reset();
        for axis in Axis::ALL {
            let mover = movers.mover_mut(axis);
            mover.save_state();
            let trace = &mut self.traces[axis.index()];
            trace.push(start, mover.position_at(start));
            for m in mover.pending().filter(|m| m.finish() > start) {
                trace.push(m.finish(), mover.position_at(m.finish()));
            }
        }

        let mut visiting = vec![false; self.steps.len()];
        let result = self.resolve_top(movers, start, &mut visiting);

        for axis in Axis::ALL {
            movers.mover_mut(axis).restore_state()?;
        }
        let finish = result?;
        for trace in &mut self.traces {
            trace.extend_to(finish);
        }
        self.start = start;
        self.finish = finish;
        self.planned = true;
        trace!(start, finish, steps = self.steps.len(), "workflow dry run");
        Ok(finish)
    }

    fn resolve_top<M: MoverSet>(
        &mut self,
        movers:   &mut M,
        start:    f64,
        visiting: &mut [bool],
    ) -> WorkflowResult<f64> {
        let mut ready = start;
        let mut finish = start;
        for id in self.top.clone() {
            self.resolve(id, ready, movers, visiting)?;
            let node = &self.steps[id.index()];
            finish = finish.max(node.finish);
            ready = node.next_ready;
        }
        Ok(finish)
    }

    fn resolve<M: MoverSet>(
        &mut self,
        id:       StepId,
        est:      f64,
        movers:   &mut M,
        visiting: &mut [bool],
    ) -> WorkflowResult<()> {
        let idx = id.index();
        let node = self.steps.get(idx).ok_or(WorkflowError::UnknownStep(id))?;
        if node.executed {
            return Ok(());
        }
        if visiting[idx] {
            return Err(WorkflowError::Cycle(id));
        }
        visiting[idx] = true;

        let preds = node.preds.clone();
        let plan = match &node.kind {
            StepKind::Move { axis, from, to, interruptible, load } => Plan::Move {
                axis: *axis,
                from: *from,
                to: *to,
                interruptible: *interruptible,
                load: *load,
            },
            StepKind::Wait { duration, hold } => Plan::Wait { duration: *duration, hold: *hold },
            StepKind::Callback(_) => Plan::Instant,
            StepKind::Seq(c) => Plan::Seq(c.clone()),
            StepKind::All(c) => Plan::All(c.clone()),
            StepKind::AnyOf(c) => Plan::AnyOf(c.clone()),
        };

        let mut start = est;
        for p in preds {
            self.resolve(p, est, movers, visiting)?;
            start = start.max(self.steps[p.index()].next_ready);
        }

        let mut motions = Vec::new();
        let (start, finish, next_ready) = match plan {
            Plan::Move { axis, from, to, interruptible, load } => {
                let mover = movers.mover_mut(axis);
                let start = start.max(mover.queue_end());
                let (duration, ms) = mover.create_motions(start, to - from, interruptible, load);
                self.traces[axis.index()].record_motions(from, &ms, self.sample_interval);
                motions = ms;
                (start, start + duration, start + duration)
            }
            Plan::Wait { duration, hold } => {
                let start = match hold {
                    Some(axis) => start.max(movers.mover(axis).queue_end()),
                    None => start,
                };
                if hold.is_some() && duration > 0.0 {
                    motions.push(Motion::dwell(start, duration, false));
                }
                (start, start + duration, start + duration)
            }
            Plan::Instant => (start, start, start),
            Plan::Seq(children) => {
                let mut ready = start;
                let mut finish = start;
                for c in children {
                    self.resolve(c, ready, movers, visiting)?;
                    let child = &self.steps[c.index()];
                    finish = finish.max(child.finish);
                    ready = child.next_ready;
                }
                (start, finish, ready)
            }
            Plan::All(children) => {
                let mut finish = start;
                let mut ready = start;
                for c in children {
                    self.resolve(c, start, movers, visiting)?;
                    let child = &self.steps[c.index()];
                    finish = finish.max(child.finish);
                    ready = ready.max(child.next_ready);
                }
                (start, finish, ready)
            }
            Plan::AnyOf(children) => {
                let mut finish = start;
                let mut ready = f64::INFINITY;
                for c in children {
                    self.resolve(c, start, movers, visiting)?;
                    let child = &self.steps[c.index()];
                    finish = finish.max(child.finish);
                    ready = ready.min(child.next_ready);
                }
                (start, finish, if ready.is_finite() { ready } else { start })
            }
        };

        let node = &mut self.steps[idx];
        node.start = start;
        node.finish = finish;
        node.next_ready = next_ready;
        node.motions = motions;
        node.executed = true;
        visiting[idx] = false;
        Ok(())
    }
}

impl<E: Clone> Workflow<E> {
    /// Queue every planned motion on its mover and schedule every planned
    /// callback, in start-time order.  Calling it again is a no-op.
    pub fn commit<M, S>(&mut self, movers: &mut M, sink: &mut S) -> WorkflowResult<()>
    where
        M: MoverSet,
        S: CallbackSink<E>,
    {
        if !self.planned {
            return Err(WorkflowError::NotPlanned);
        }
        if self.committed {
            return Ok(());
        }
        let mut order: Vec<usize> = (0..self.steps.len())
            .filter(|&i| self.steps[i].executed && !self.steps[i].committed)
            .collect();
        order.sort_by(|&a, &b| self.steps[a].start.total_cmp(&self.steps[b].start).then(a.cmp(&b)));

        for i in order {
            let node = &mut self.steps[i];
            match &node.kind {
                StepKind::Move { axis, .. } | StepKind::Wait { hold: Some(axis), .. } => {
                    movers.mover_mut(*axis).commit_motions(&node.motions)?;
                }
                StepKind::Callback(event) => sink.schedule(node.start, event.clone()),
                _ => {}
            }
            node.committed = true;
        }
        self.committed = true;
        Ok(())
    }
}
