//! Yard-wide simulation configuration.
//!
//! Typically built in code via `YardConfig::default()` and struct update
//! syntax, or (with the `serde` feature) loaded from a TOML file.  Missing
//! TOML keys fall back to the defaults below.

use crate::{CoreError, CoreResult};

/// Timing and safety parameters shared by every block and crane.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct YardConfig {
    /// Master seed for scenario drivers.  The same seed always produces
    /// identical runs.
    pub seed: u64,

    /// Simulated seconds after which `Yard::run` stops.
    pub end_time: f64,

    /// Seconds the spreader needs to lock onto a box.
    pub grasp_time: f64,

    /// Seconds the spreader needs to release a box.
    pub release_time: f64,

    /// Declared minimum gantry-to-gantry distance on a shared rail (metres).
    pub clearance: f64,

    /// Extra padding added to `clearance` in the interference test, covering
    /// the gap between sampled paths and the exact trajectories.
    pub clearance_margin: f64,

    /// Height the spreader keeps above the tallest stack it crosses.
    pub height_clearance: f64,

    /// Maximum spacing (seconds) between predicted path samples inside one
    /// motion segment.
    pub path_sample_interval: f64,

    /// Fixed delay before a request rejected because its box was busy is
    /// made ready again.
    pub retry_backoff: f64,

    /// Stop the run with an error when a request fails with an `Undefined`
    /// rejection (no slot available) instead of only reporting it.
    pub abort_on_undefined: bool,
}

impl Default for YardConfig {
    fn default() -> Self {
        Self {
            seed:                 42,
            end_time:             86_400.0,
            grasp_time:           6.0,
            release_time:         6.0,
            clearance:            32.5,
            clearance_margin:     5.0,
            height_clearance:     1.0,
            path_sample_interval: 1.0,
            retry_backoff:        60.0,
            abort_on_undefined:   false,
        }
    }
}

impl YardConfig {
    /// Distance used when testing paths for interference.
    #[inline]
    pub fn check_clearance(&self) -> f64 {
        self.clearance + self.clearance_margin
    }

    /// Reject physically meaningless parameter sets.
    pub fn validate(&self) -> CoreResult<()> {
        let positive = [
            ("grasp_time", self.grasp_time),
            ("release_time", self.release_time),
            ("path_sample_interval", self.path_sample_interval),
            ("retry_backoff", self.retry_backoff),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(CoreError::Config(format!("{name} must be > 0, got {value}")));
            }
        }
        let non_negative = [
            ("clearance", self.clearance),
            ("clearance_margin", self.clearance_margin),
            ("height_clearance", self.height_clearance),
            ("end_time", self.end_time),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0) {
                return Err(CoreError::Config(format!("{name} must be >= 0, got {value}")));
            }
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    #[cfg(feature = "serde")]
    pub fn from_toml_str(text: &str) -> CoreResult<Self> {
        let config: YardConfig =
            toml::from_str(text).map_err(|e| CoreError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a TOML file.
    #[cfg(feature = "serde")]
    pub fn from_toml_file(path: &std::path::Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
