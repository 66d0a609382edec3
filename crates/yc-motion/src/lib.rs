//! `yc-motion`: per-axis kinematics for the yard-crane simulator.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                        |
//! |------------|-----------------------------------------------------------------|
//! | [`spec`]   | `MotionSpec`, `SpecTable`, `LoadState`: axis limits            |
//! | [`motion`] | `Motion`: one constant-acceleration segment                    |
//! | [`mover`]  | `Mover`: authoritative axis state + motion queue, [`profile`]  |
//! | [`path`]   | `PathTrace`: sampled path and the separation test              |
//! | [`error`]  | `MotionError`, `MotionResult<T>`                                |
//!
//! # Motion model
//!
//! Each crane axis (gantry, trolley, hoist) is a [`Mover`].  Moves are
//! minimal-time trapezoidal (or triangular, for short moves) velocity
//! profiles ending at rest:
//!
//! 1. `Mover::create_motions` plans the segments of one move from the
//!    planning cursor without touching the queue.
//! 2. `Mover::commit_motions` appends them to the queue.
//! 3. `Mover::run_until(t)` retires elapsed segments, splitting the one
//!    running at `t`, and updates the authoritative position/velocity.
//!
//! Speculative planning wraps step 1 in `save_state` / `restore_state`.

pub mod error;
pub mod motion;
pub mod mover;
pub mod path;
pub mod spec;


pub use error::{MotionError, MotionResult};
pub use motion::Motion;
pub use mover::{Mover, profile};
pub use path::{PathSample, PathTrace};
pub use spec::{LoadState, MotionSpec, SpecTable};
