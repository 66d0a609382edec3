//! Predicted single-axis paths and the separation test between them.
//!
//! A `PathTrace` is a time-ordered list of `(time, position)` samples read
//! as a piecewise-linear function.  Before its first sample a trace holds
//! its first position and after its last sample it holds its last one: a
//! crane stays where its operation left it.
//!
//! Sampling is dense enough (see [`PathTrace::record_motions`]) that the
//! linear interpolation stays close to the true quadratic trajectory; the
//! residual is covered by the clearance margin of the caller.

use crate::Motion;
use crate::motion::EPS;

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathSample {
    pub time: f64,
    pub pos:  f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathTrace {
    samples: Vec<PathSample>,
    min:     f64,
    max:     f64,
}

impl PathTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// A trace that holds `pos` forever, starting at `time`.
    pub fn stationary(time: f64, pos: f64) -> Self {
        let mut trace = Self::new();
        trace.push(time, pos);
        trace
    }

    #[inline] pub fn is_empty(&self) -> bool { self.samples.is_empty() }
    #[inline] pub fn len(&self) -> usize { self.samples.len() }
    #[inline] pub fn samples(&self) -> &[PathSample] { &self.samples }
    #[inline] pub fn min(&self) -> f64 { self.min }
    #[inline] pub fn max(&self) -> f64 { self.max }

    pub fn start_time(&self) -> Option<f64> {
        self.samples.first().map(|s| s.time)
    }

    pub fn end_time(&self) -> Option<f64> {
        self.samples.last().map(|s| s.time)
    }

    pub fn end_pos(&self) -> Option<f64> {
        self.samples.last().map(|s| s.pos)
    }

    /// Insert a sample, keeping time order (ties keep insertion order).
    pub fn push(&mut self, time: f64, pos: f64) {
        if self.samples.is_empty() {
            self.min = pos;
            self.max = pos;
        } else {
            self.min = self.min.min(pos);
            self.max = self.max.max(pos);
        }
        let at = self.samples.partition_point(|s| s.time <= time);
        self.samples.insert(at, PathSample { time, pos });
    }

    /// Sample `motions` (contiguous, starting from `start_pos`) at most
    /// `interval` seconds apart, plus every segment boundary.  Returns the
    /// final position.
    pub fn record_motions(&mut self, start_pos: f64, motions: &[Motion], interval: f64) -> f64 {
        let mut pos = start_pos;
        let Some(first) = motions.first() else {
            return pos;
        };
        self.push(first.start, pos);
        for m in motions {
            let steps = (m.duration / interval).ceil().max(1.0) as usize;
            let dt = m.duration / steps as f64;
            for k in 1..=steps {
                let t = m.start + dt * k as f64;
                self.push(t, pos + m.offset_at(t));
            }
            pos += m.displacement();
        }
        pos
    }

    /// Hold the last position up to `time`.
    pub fn extend_to(&mut self, time: f64) {
        if let Some(last) = self.samples.last().copied() {
            if time > last.time + EPS {
                self.push(time, last.pos);
            }
        }
    }

    /// Linear interpolation at `t`, holding the end positions outside the
    /// sampled range.  `None` for an empty trace.
    pub fn position_at(&self, t: f64) -> Option<f64> {
        let first = self.samples.first()?;
        let last = self.samples.last()?;
        if t <= first.time {
            return Some(first.pos);
        }
        if t >= last.time {
            return Some(last.pos);
        }
        let i = self.samples.partition_point(|s| s.time <= t);
        let (a, b) = (self.samples[i - 1], self.samples[i]);
        let span = b.time - a.time;
        if span <= EPS {
            return Some(b.pos);
        }
        Some(a.pos + (b.pos - a.pos) * (t - a.time) / span)
    }

    /// Smallest distance between `self` at `t` and `other` at `t - shift`
    /// (i.e. `other` delayed by `shift` seconds), over the window from the
    /// later start to the later end.
    ///
    /// Both traces are piecewise-linear, so their difference is linear
    /// between merged breakpoints and the minimum is found exactly.
    /// Symmetric: `a.min_separation(b, s) == b.min_separation(a, -s)`.
    /// `None` if either trace is empty.
    pub fn min_separation(&self, other: &PathTrace, shift: f64) -> Option<f64> {
        let (s0, e0) = (self.start_time()?, self.end_time()?);
        let (s1, e1) = (other.start_time()? + shift, other.end_time()? + shift);
        let from = s0.max(s1);
        let to = e0.max(e1).max(from);

        let mut times: Vec<f64> = Vec::with_capacity(self.len() + other.len() + 2);
        times.push(from);
        times.push(to);
        times.extend(self.samples.iter().map(|s| s.time).filter(|&t| t > from && t < to));
        times.extend(
            other.samples.iter().map(|s| s.time + shift).filter(|&t| t > from && t < to),
        );
        times.sort_by(f64::total_cmp);

        let gap = |t: f64| -> Option<f64> {
            Some(self.position_at(t)? - other.position_at(t - shift)?)
        };

        let mut best = f64::INFINITY;
        let mut prev: Option<f64> = None;
        for t in times {
            let g = gap(t)?;
            if let Some(p) = prev {
                if (p < 0.0 && g > 0.0) || (p > 0.0 && g < 0.0) {
                    return Some(0.0);
                }
            }
            best = best.min(g.abs());
            prev = Some(g);
        }
        Some(best)
    }

    /// `true` if the traces come closer than `clearance` at any time.
    pub fn intersects(&self, other: &PathTrace, clearance: f64, shift: f64) -> bool {
        self.min_separation(other, shift).is_some_and(|d| d < clearance)
    }

    /// Smallest distance between the trace envelope and a fixed position.
    pub fn distance_to(&self, pos: f64) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        if pos < self.min {
            Some(self.min - pos)
        } else if pos > self.max {
            Some(pos - self.max)
        } else {
            Some(0.0)
        }
    }
}
