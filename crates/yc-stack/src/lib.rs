//! `yc-stack`: stacking-column locks.
//!
//! A crane that is about to put a box down on, or pick a box up from, a
//! column holds that column's lock until the box has physically arrived or
//! left.  Locks are per `(bay, row)` column; the tier is projected out.
//!
//! | Module       | Contents                                          |
//! |--------------|---------------------------------------------------|
//! | [`table`]    | `StackLockTable<W>`                               |
//! | [`listener`] | `LockListener<W>`, `LockEvent<W>`                 |
//! | [`error`]    | `StackError`, `StackResult<T>`                    |
//!
//! # Feature flags
//!
//! | Flag      | Effect                                          |
//! |-----------|-------------------------------------------------|
//! | `fx-hash` | Use `rustc_hash::FxHashMap` for the column map. |

pub mod error;
pub mod listener;
pub mod table;

#[cfg(test)]
mod tests;

pub use error::{StackError, StackResult};
pub use listener::{LockEvent, LockListener};
pub use table::StackLockTable;
