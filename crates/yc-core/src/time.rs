//! Simulation time model.
//!
//! # Design
//!
//! Time is continuous: crane kinematics produce durations in fractional
//! seconds, so every timestamp is an `f64` of simulated seconds since the
//! start of the run.  `SimTime` wraps the raw value wherever a *total* order
//! is needed (event queue keys, clock), using `f64::total_cmp`.
//!
//! Ties at the same instant are broken by [`Priority`], an ordered domain of
//! activation reasons, and then by insertion order inside the event queue.

use std::cmp::Ordering;
use std::fmt;

// ── SimTime ───────────────────────────────────────────────────────────────────

/// An absolute simulation timestamp in seconds.
#[derive(Copy, Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);

    /// "Never": the activation time of a process with nothing to do.
    pub const FOREVER: SimTime = SimTime(f64::INFINITY);

    #[inline]
    pub fn secs(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn is_forever(self) -> bool {
        self.0.is_infinite()
    }

    /// Return the time `dt` seconds after `self`.
    #[inline]
    pub fn after(self, dt: f64) -> SimTime {
        SimTime(self.0 + dt)
    }
}

impl PartialEq for SimTime {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for SimTime {}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl From<f64> for SimTime {
    #[inline]
    fn from(secs: f64) -> Self {
        SimTime(secs)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_forever() {
            write!(f, "t=∞")
        } else {
            write!(f, "t={:.2}s", self.0)
        }
    }
}

// ── Priority ──────────────────────────────────────────────────────────────────

/// Tie-break order for activations scheduled at the same instant.
///
/// Lower variants run first.  The order matters: workflow callbacks (lock
/// releases, box state changes) must land before an equipment process that
/// wakes at the same time reads yard state, and a scheduler must only run
/// after all state changes of that instant have settled.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Priority {
    Callback,
    Interrupt,
    InterferenceRelease,
    OperationFinish,
    Request,
    TaskArrival,
    Schedule,
    Probe,
    Observe,
    Forever,
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// The monotonic virtual clock owned by the simulation context.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    now: SimTime,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Move the clock to `t`.  Returns `false` (and leaves the clock alone)
    /// if `t` lies in the past.
    #[inline]
    pub fn advance_to(&mut self, t: SimTime) -> bool {
        if t < self.now {
            return false;
        }
        self.now = t;
        true
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.now.0.max(0.0) as u64;
        write!(
            f,
            "{} ({:02}:{:02}:{:02})",
            self.now,
            secs / 3_600,
            (secs % 3_600) / 60,
            secs % 60
        )
    }
}
