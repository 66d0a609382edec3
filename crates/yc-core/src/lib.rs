//! `yc-core`: foundational types for the yard-crane choreography simulator.
//!
//! This crate is a dependency of every other `yc-*` crate.  It intentionally
//! has no `yc-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`/`toml`).
//!
//! # What lives here
//!
//! | Module     | Contents                                                    |
//! |------------|-------------------------------------------------------------|
//! | [`ids`]    | `EquipmentId`, `RequestId`, `OperationId`, `BoxId`, …        |
//! | [`geom`]   | `Axis`, `V3`, `Cell`, `Column`                               |
//! | [`time`]   | `SimTime`, `Priority`, `SimClock`                            |
//! | [`config`] | `YardConfig`                                                 |
//! | [`rng`]    | `SimRng` (seeded scenario streams)                           |
//! | [`error`]  | `CoreError`, `CoreResult`                                    |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types and      |
//! |         | enables `YardConfig::from_toml_str`.                        |

pub mod config;
pub mod error;
pub mod geom;
pub mod ids;
pub mod rng;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::YardConfig;
pub use error::{CoreError, CoreResult};
pub use geom::{Axis, Cell, Column, V3};
pub use ids::{BlockId, BoxId, EquipmentId, LaneId, OperationId, RequestId};
pub use rng::SimRng;
pub use time::{Priority, SimClock, SimTime};
