//! Kinematic limits of one axis.

use std::fmt;

use crate::{MotionError, MotionResult};

/// Velocity / acceleration / deceleration limits for one axis under one load.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotionSpec {
    /// Maximum speed (m/s).
    pub v_max: f64,
    /// Acceleration magnitude (m/s²).
    pub accel: f64,
    /// Deceleration magnitude (m/s²).
    pub decel: f64,
}

impl MotionSpec {
    pub fn new(v_max: f64, accel: f64, decel: f64) -> Self {
        Self { v_max, accel, decel }
    }

    /// Same magnitude for acceleration and deceleration.
    pub fn symmetric(v_max: f64, accel: f64) -> Self {
        Self::new(v_max, accel, accel)
    }

    /// Shortest distance covered by a full accelerate-cruise-decelerate
    /// profile starting and ending at rest: `vm²(a+d) / 2ad`.
    #[inline]
    pub fn w0(&self) -> f64 {
        self.v_max * self.v_max * (self.accel + self.decel) / (2.0 * self.accel * self.decel)
    }

    /// Reduced acceleration `2ad / (a+d)` of the triangular profile.
    #[inline]
    pub fn w1(&self) -> f64 {
        2.0 * self.accel * self.decel / (self.accel + self.decel)
    }

    /// Distance needed to stop from speed `v`.
    #[inline]
    pub fn braking_distance(&self, v: f64) -> f64 {
        v * v / (2.0 * self.decel)
    }

    pub fn validate(&self) -> MotionResult<()> {
        if !(self.v_max > 0.0 && self.accel > 0.0 && self.decel > 0.0) {
            return Err(MotionError::InvalidSpec(format!(
                "all limits must be > 0, got {self}"
            )));
        }
        Ok(())
    }
}

impl fmt::Display for MotionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v={} a={} d={}", self.v_max, self.accel, self.decel)
    }
}

// ── LoadState ─────────────────────────────────────────────────────────────────

/// Whether the spreader carries a box.  Hoists are usually slower loaded.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LoadState {
    #[default]
    Empty,
    Loaded,
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoadState::Empty => "empty",
            LoadState::Loaded => "loaded",
        })
    }
}

// ── SpecTable ─────────────────────────────────────────────────────────────────

/// Limits of one axis keyed by load state.  `loaded` falls back to `empty`
/// when the axis does not derate under load.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpecTable {
    pub empty:  MotionSpec,
    #[cfg_attr(feature = "serde", serde(default))]
    pub loaded: Option<MotionSpec>,
}

impl SpecTable {
    /// One spec for every load state.
    pub fn uniform(spec: MotionSpec) -> Self {
        Self { empty: spec, loaded: None }
    }

    pub fn with_loaded(empty: MotionSpec, loaded: MotionSpec) -> Self {
        Self { empty, loaded: Some(loaded) }
    }

    #[inline]
    pub fn get(&self, load: LoadState) -> &MotionSpec {
        match load {
            LoadState::Empty => &self.empty,
            LoadState::Loaded => self.loaded.as_ref().unwrap_or(&self.empty),
        }
    }

    pub fn validate(&self) -> MotionResult<()> {
        self.empty.validate()?;
        if let Some(loaded) = &self.loaded {
            loaded.validate()?;
        }
        Ok(())
    }
}

impl From<MotionSpec> for SpecTable {
    fn from(spec: MotionSpec) -> Self {
        SpecTable::uniform(spec)
    }
}
