//! `yc-request`: what clients ask the yard for, and how those asks move
//! through their lifecycle.
//!
//! | Module         | Contents                                               |
//! |----------------|--------------------------------------------------------|
//! | [`state`]      | `RequestState` bitflags and group masks                |
//! | [`kind`]       | `RequestKind`, `Intent`                                |
//! | [`signal`]     | `Signal`, `SignalTable<H>`                             |
//! | [`rejection`]  | `Rejection` (closed set of refusal reasons)            |
//! | [`request`]    | `Request<H>` and its transitions                       |
//! | [`pool`]       | `RequestPool`: free, per-unit and per-lane FIFO queues |
//! | [`dispatcher`] | `Dispatcher`, `Wake`                                   |
//! | [`error`]      | `RequestError`, `RequestResult<T>`                     |
//!
//! Nothing here knows about cranes or boxes in the block; `H` is whatever
//! handler type the simulator links into each request's signal table.

pub mod dispatcher;
pub mod error;
pub mod kind;
pub mod pool;
pub mod rejection;
pub mod request;
pub mod signal;
pub mod state;

#[cfg(test)]
mod tests;

pub use dispatcher::{Dispatcher, Wake};
pub use error::{RequestError, RequestResult};
pub use kind::{Intent, RequestKind};
pub use pool::{PoolSlot, RequestPool};
pub use rejection::Rejection;
pub use request::Request;
pub use signal::{Signal, SignalTable};
pub use state::RequestState;
