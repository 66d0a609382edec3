//! Constant-acceleration motion segments.

use std::fmt;

/// Durations at or below this are treated as zero.
pub const EPS: f64 = 1e-9;

/// One constant-acceleration segment of an axis trajectory.
///
/// All quantities are signed along the axis; displacement is closed-form.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Motion {
    pub start:         f64,
    pub duration:      f64,
    pub v0:            f64,
    pub accel:         f64,
    pub interruptible: bool,
}

impl Motion {
    pub fn new(start: f64, duration: f64, v0: f64, accel: f64, interruptible: bool) -> Self {
        Self { start, duration, v0, accel, interruptible }
    }

    /// Standstill segment.
    pub fn dwell(start: f64, duration: f64, interruptible: bool) -> Self {
        Self::new(start, duration, 0.0, 0.0, interruptible)
    }

    #[inline]
    pub fn finish(&self) -> f64 {
        self.start + self.duration
    }

    #[inline]
    pub fn displacement(&self) -> f64 {
        self.offset_after(self.duration)
    }

    #[inline]
    pub fn finish_velocity(&self) -> f64 {
        self.v0 + self.accel * self.duration
    }

    /// Displacement accumulated `dt` seconds into the segment.
    #[inline]
    fn offset_after(&self, dt: f64) -> f64 {
        self.v0 * dt + 0.5 * self.accel * dt * dt
    }

    /// Displacement from the segment start at absolute time `t`, clamped to
    /// the segment.
    pub fn offset_at(&self, t: f64) -> f64 {
        self.offset_after((t - self.start).clamp(0.0, self.duration))
    }

    /// Velocity at absolute time `t`, clamped to the segment.
    pub fn velocity_at(&self, t: f64) -> f64 {
        self.v0 + self.accel * (t - self.start).clamp(0.0, self.duration)
    }

    /// Cut the segment at `t`.  Returns the elapsed head; `self` becomes the
    /// tail, starting at `t` with the hand-off velocity.
    pub fn split(&mut self, t: f64) -> Motion {
        let dt = (t - self.start).clamp(0.0, self.duration);
        let head = Motion::new(self.start, dt, self.v0, self.accel, self.interruptible);
        self.v0 += self.accel * dt;
        self.duration -= dt;
        self.start += dt;
        head
    }
}

impl fmt::Display for Motion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.2}+{:.2}s v0={:.2} a={:.2}{}]",
            self.start,
            self.duration,
            self.v0,
            self.accel,
            if self.interruptible { " int" } else { "" }
        )
    }
}
