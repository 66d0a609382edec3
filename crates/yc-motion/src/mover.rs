//! Per-axis kinematic tracker.

use std::collections::VecDeque;

use tracing::debug;
use yc_core::Axis;

use crate::motion::EPS;
use crate::{LoadState, Motion, MotionError, MotionResult, MotionSpec, SpecTable};

/// Minimal-time profile moving by signed `displacement` from velocity `v0`
/// and ending at rest.
///
/// 1. If `v0` points away from the target, or the target is closer than the
///    braking distance, a braking segment to zero comes first and the
///    remaining displacement is adjusted (it may now point backwards).
/// 2. A speed above `v_max` is first reduced to `v_max`.
/// 3. The remaining distance selects a trapezoidal profile (accelerate,
///    cruise, decelerate) when it reaches the `w0` threshold, a triangular
///    one otherwise.
///
/// Segments of zero duration are omitted, so a zero displacement from rest
/// yields no segments.
pub fn profile(
    start:         f64,
    v0:            f64,
    displacement:  f64,
    spec:          &MotionSpec,
    interruptible: bool,
) -> Vec<Motion> {
    let (a, d, vm) = (spec.accel, spec.decel, spec.v_max);
    let mut out = Vec::with_capacity(4);
    let mut st = start;
    let push = |out: &mut Vec<Motion>, st: &mut f64, dur: f64, v: f64, acc: f64| {
        if dur > EPS {
            out.push(Motion::new(*st, dur, v, acc, interruptible));
            *st += dur;
        }
    };

    let mut v0 = v0;
    let mut rest = displacement;
    let stop = spec.braking_distance(v0);
    if (v0 > EPS && rest < stop) || (v0 < -EPS && rest > -stop) {
        let t0 = v0.abs() / d;
        push(&mut out, &mut st, t0, v0, -v0.signum() * d);
        rest -= v0 * t0 / 2.0;
        v0 = 0.0;
    }

    let dir = if rest >= 0.0 { 1.0 } else { -1.0 };
    let mut dist = rest.abs();
    let mut speed = v0.abs();

    if speed > vm + EPS {
        let t = (speed - vm) / d;
        push(&mut out, &mut st, t, dir * speed, -dir * d);
        dist -= (speed * speed - vm * vm) / (2.0 * d);
        speed = vm;
    }

    if dist <= EPS && speed <= EPS {
        return out;
    }

    let w1 = spec.w1();
    if dist >= spec.w0() - speed * speed / (2.0 * a) {
        let t0 = (vm - speed) / a;
        let t1 = dist / vm - vm / w1 + speed * speed / (2.0 * a * vm);
        let t2 = vm / d;
        push(&mut out, &mut st, t0, dir * speed, dir * a);
        push(&mut out, &mut st, t1, dir * vm, 0.0);
        push(&mut out, &mut st, t2, dir * vm, -dir * d);
    } else {
        let vx = (w1 * (dist + speed * speed / (2.0 * a))).sqrt().max(speed);
        let t0 = (vx - speed) / a;
        let t1 = vx / d;
        push(&mut out, &mut st, t0, dir * speed, dir * a);
        push(&mut out, &mut st, t1, dir * vx, -dir * d);
    }
    out
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
struct Kinematic {
    velocity: f64,
    accel:    f64,
}

/// One physical axis: authoritative state plus queued, not yet elapsed
/// motion segments.
///
/// Planning goes through a separate *terminal* cursor, the velocity the axis
/// will have at the end of everything planned so far.  `create_motions`
/// reads and advances it without touching the queue, and `save_state` /
/// `restore_state` snapshot it so that speculative planning (at any nesting
/// depth) leaves no trace.
#[derive(Clone, Debug)]
pub struct Mover {
    axis:     Axis,
    specs:    SpecTable,
    position: f64,
    current:  Kinematic,
    time:     f64,
    pending:  VecDeque<Motion>,
    terminal: Kinematic,
    saved:    Vec<Kinematic>,
}

impl Mover {
    /// An axis at rest at `position`, clock at zero.
    pub fn new(axis: Axis, specs: SpecTable, position: f64) -> Self {
        Self {
            axis,
            specs,
            position,
            current:  Kinematic::default(),
            time:     0.0,
            pending:  VecDeque::new(),
            terminal: Kinematic::default(),
            saved:    Vec::new(),
        }
    }

    #[inline] pub fn axis(&self) -> Axis { self.axis }
    #[inline] pub fn specs(&self) -> &SpecTable { &self.specs }
    #[inline] pub fn position(&self) -> f64 { self.position }
    #[inline] pub fn velocity(&self) -> f64 { self.current.velocity }
    #[inline] pub fn acceleration(&self) -> f64 { self.current.accel }
    #[inline] pub fn time(&self) -> f64 { self.time }
    #[inline] pub fn terminal_velocity(&self) -> f64 { self.terminal.velocity }

    pub fn pending(&self) -> impl Iterator<Item = &Motion> {
        self.pending.iter()
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    /// `true` if idle or the running segment may be interrupted.
    pub fn allows_interrupt(&self) -> bool {
        self.pending.front().is_none_or(|m| m.interruptible)
    }

    /// Time at which everything queued has elapsed.
    pub fn queue_end(&self) -> f64 {
        self.pending.back().map_or(self.time, |m| m.finish().max(self.time))
    }

    /// Position once every queued segment has elapsed.
    pub fn end_position(&self) -> f64 {
        self.position + self.pending.iter().map(Motion::displacement).sum::<f64>()
    }

    /// Predicted position at `t`, including queued segments.  Times before
    /// the authoritative clock return the current position.
    pub fn position_at(&self, t: f64) -> f64 {
        let mut pos = self.position;
        for m in &self.pending {
            if m.start >= t {
                break;
            }
            pos += m.offset_at(t);
        }
        pos
    }

    /// Queued time left, stopping at the first interruptible segment when
    /// `interrupt` is set.
    pub fn available_time(&self, interrupt: bool) -> f64 {
        let mut total = 0.0;
        for m in &self.pending {
            if interrupt && m.interruptible {
                break;
            }
            total += m.duration;
        }
        total
    }

    /// Plan a move by `displacement` starting at `start` from the terminal
    /// velocity.  Returns `(duration, segments)` and advances the terminal
    /// cursor; the queue is untouched.
    pub fn create_motions(
        &mut self,
        start:         f64,
        displacement:  f64,
        interruptible: bool,
        load:          LoadState,
    ) -> (f64, Vec<Motion>) {
        let spec = *self.specs.get(load);
        let motions = profile(start, self.terminal.velocity, displacement, &spec, interruptible);
        if let Some(last) = motions.last() {
            self.terminal = Kinematic { velocity: last.finish_velocity(), accel: last.accel };
        }
        let duration = motions.last().map_or(0.0, |m| m.finish() - start);
        (duration, motions)
    }

    /// Append planned segments to the queue.
    ///
    /// Gaps between queued segments are filled with dwell segments (taking
    /// the interruptibility of the segment that follows) so the queue stays
    /// time-contiguous; a segment starting before the queue end is an error
    /// and leaves the queue unchanged.
    pub fn commit_motions(&mut self, motions: &[Motion]) -> MotionResult<()> {
        let mut end = self.queue_end();
        let mut staged = Vec::with_capacity(motions.len() + 1);
        for m in motions {
            if m.start < end - EPS {
                return Err(MotionError::Overlap { axis: self.axis, start: m.start, queue_end: end });
            }
            let has_queue = !self.pending.is_empty() || !staged.is_empty();
            if has_queue && m.start > end + EPS {
                staged.push(Motion::dwell(end, m.start - end, m.interruptible));
            }
            staged.push(*m);
            end = m.finish();
        }
        if let Some(last) = staged.last() {
            self.terminal = Kinematic { velocity: last.finish_velocity(), accel: last.accel };
        }
        self.pending.extend(staged);
        Ok(())
    }

    /// Retire (and split) queued segments up to `t`.  Repeated calls with
    /// the same `t` are no-ops; going back in time is an error.  Returns the
    /// number of segments still queued.
    pub fn run_until(&mut self, t: f64) -> MotionResult<usize> {
        if t < self.time - EPS {
            return Err(MotionError::TimeReversal { axis: self.axis, now: self.time, requested: t });
        }
        while let Some(head) = self.pending.front_mut() {
            if head.start >= t {
                break;
            }
            let done = if head.finish() <= t {
                self.pending.pop_front()
            } else {
                Some(head.split(t))
            };
            if let Some(m) = done {
                self.position += m.displacement();
                self.current = Kinematic { velocity: m.finish_velocity(), accel: m.accel };
            }
        }
        if self.pending.is_empty() {
            self.current.accel = 0.0;
        }
        self.time = self.time.max(t);
        Ok(self.pending.len())
    }

    /// Drop the queue if its head is interruptible and bring a still moving
    /// axis to rest with one braking segment under `load` limits.
    ///
    /// Returns `false` (nothing changed) when the running segment must not
    /// be interrupted.
    pub fn interrupt(&mut self, now: f64, load: LoadState) -> MotionResult<bool> {
        self.run_until(now)?;
        if !self.allows_interrupt() {
            return Ok(false);
        }
        self.pending.clear();
        let v = self.current.velocity;
        if v.abs() > EPS {
            let d = self.specs.get(load).decel;
            let brake = Motion::new(self.time, v.abs() / d, v, -v.signum() * d, false);
            debug!(axis = %self.axis, v, stop = brake.finish(), "interrupt: braking");
            self.pending.push_back(brake);
        }
        self.terminal = Kinematic::default();
        Ok(true)
    }

    /// Snapshot the planning cursor.  Nests.
    pub fn save_state(&mut self) {
        self.saved.push(self.terminal);
    }

    /// Roll the planning cursor back to the matching `save_state`.
    pub fn restore_state(&mut self) -> MotionResult<()> {
        self.terminal = self.saved.pop().ok_or(MotionError::UnbalancedRestore { axis: self.axis })?;
        Ok(())
    }

    /// Current `save_state` nesting depth.
    #[inline]
    pub fn saved_depth(&self) -> usize {
        self.saved.len()
    }
}
