//! Serializable summaries of a planned workflow.

use yc_core::Axis;
use yc_motion::LoadState;

/// One committed axis move, times relative to the operation start.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotionRecord {
    pub axis:     Axis,
    pub load:     LoadState,
    pub start:    f64,
    pub duration: f64,
    pub from:     f64,
    pub to:       f64,
}

impl MotionRecord {
    #[inline]
    pub fn distance(&self) -> f64 {
        (self.to - self.from).abs()
    }
}

/// Distance and moving time of one axis under one load, over a workflow.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisTotal {
    pub axis:     Axis,
    pub load:     LoadState,
    pub distance: f64,
    pub time:     f64,
}
