//! `yc-sim`: discrete-event runtime for rail-mounted gantry cranes
//! working a container stacking block.
//!
//! # Event loop
//!
//! ```text
//! while next event time <= end:
//!   pop (time, priority, seq) and advance the clock
//!   Submit(r)        → block dispatcher queues r, wakes the cranes that may take it
//!   Schedule(eq)     → eq's scheduler picks the best candidate → Task
//!   Equipment(eq)    → crane process: finish the running operation, then
//!                      plan next op → dry run → interference check
//!                          clear    → commit motions, queue signals
//!                          conflict → reject; maybe ADJUST the peer
//!   Signal(r, op, s) → handler linked to s for r (box moves, lock releases)
//!   Retry(r)         → r becomes ready again after a backoff
//!   Sample           → observer gets every crane position
//! ```
//!
//! # Modules
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | `yard`          | [`Yard`]: request API, run loop, crane process        |
//! | `builder`       | [`YardBuilder`]: layout, rails, reach windows         |
//! | `handler`       | Job advancement and rejection handling                |
//! | `scheduler`     | [`JobPolicy`], per-crane scheduling                   |
//! | `interference`  | Gantry path checks between cranes                     |
//! | `allocator`     | [`SlotAllocator`] for stores and relocations          |
//! | `domain`        | Boxes and the signal handlers that move them          |
//! | `observer`      | [`YardObserver`] and probe events                     |
//!
//! # Cargo features
//!
//! | Feature   | Effect                                                  |
//! |-----------|---------------------------------------------------------|
//! | `serde`   | Serialize/Deserialize for records and configs.          |
//! | `fx-hash` | FxHash for the stack lock tables and request pools.     |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use yc_core::{LaneId, YardConfig};
//! use yc_sim::{CraneConfig, GridLayout, NoopObserver, YardBuilder};
//!
//! let mut b = YardBuilder::new(YardConfig::default());
//! let block = b.block(GridLayout::new(16, 6, 6));
//! b.crane(block, CraneConfig::default());
//! let mut yard = b.build()?;
//! let (box_id, _) = yard.store(0.0, block, LaneId(0), None)?;
//! yard.retrieve(600.0, box_id, LaneId(0))?;
//! yard.run(&mut NoopObserver)?;
//! ```

pub mod allocator;
pub mod block;
pub mod builder;
pub mod domain;
pub mod equipment;
pub mod error;
pub mod event;
mod handler;
pub mod interference;
pub mod layout;
pub mod observer;
pub(crate) mod op_builder;
pub mod operation;
pub mod scheduler;
pub mod yard;

#[cfg(test)]
mod tests;

pub use allocator::{NearestColumnAllocator, SlotAllocator, StackView};
pub use block::Block;
pub use builder::YardBuilder;
pub use domain::{BoxRecord, BoxState, SignalContext, SignalHandler, link_default_handlers};
pub use equipment::{CraneConfig, Equipment, EquipmentState, Task};
pub use error::{SimError, SimResult};
pub use event::{Entry, Event, EventQueue};
pub use interference::Interference;
pub use layout::{BlockLayout, GridLayout, LaneSpec};
pub use observer::{NoopObserver, OperationRecord, ProbeEvent, RequestRecord, YardObserver};
pub use operation::{OpKind, OpState, Operation};
pub use scheduler::{DefaultPolicy, IdleAction, JobPolicy};
pub use yard::Yard;
