//! `yc-workflow`: the step algebra crane operations are built from.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                     |
//! |--------------|--------------------------------------------------------------|
//! | [`step`]     | `StepId`, `StepKind`, `StepNode`                             |
//! | [`workflow`] | `Workflow<E>`, `MoverSet`, `CallbackSink<E>`                 |
//! | [`record`]   | `MotionRecord`, `AxisTotal`: serializable plan summaries    |
//! | [`error`]    | `WorkflowError`, `WorkflowResult<T>`                         |
//!
//! # Two-phase execution
//!
//! An operation first builds its steps (axis moves, waits, callbacks and the
//! `Seq` / `All` / `AnyOf` combinators, plus explicit predecessor edges via
//! `Workflow::after`).  `Workflow::dry_run` then resolves every step's
//! start/finish on a snapshot of the movers and records predicted paths,
//! so the caller can test the plan for interference.  Only an accepted plan
//! is passed to `Workflow::commit`, which queues the motions for real.

pub mod error;
pub mod record;
pub mod step;
pub mod workflow;


pub use error::{WorkflowError, WorkflowResult};
pub use record::{AxisTotal, MotionRecord};
pub use step::{StepId, StepKind, StepNode};
pub use workflow::{CallbackSink, MoverSet, Workflow};
