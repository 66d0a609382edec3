//! Observer hooks and the probe events the yard reports.

use yc_core::{BoxId, Cell, EquipmentId, OperationId, RequestId, V3};
use yc_request::{Rejection, RequestKind, RequestState};
use yc_workflow::MotionRecord;

use crate::{OpKind, OpState};

/// Callbacks invoked by [`Yard::run`][crate::Yard::run] as the simulation
/// advances.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example: separation monitor
///
/// ```rust,ignore
/// struct MinGap(f64);
///
/// impl YardObserver for MinGap {
///     fn on_sample(&mut self, _time: f64, positions: &[(EquipmentId, V3)]) {
///         if let [(_, a), (_, b)] = positions {
///             self.0 = self.0.min((a.x - b.x).abs());
///         }
///     }
/// }
/// ```
pub trait YardObserver {
    /// A probe fired.  Probes raised while handling one event are delivered
    /// together once that event is done.
    fn on_probe(&mut self, _time: f64, _event: &ProbeEvent) {}

    /// Spreader positions of every crane, every `sample_interval` seconds
    /// while there is work pending.
    fn on_sample(&mut self, _time: f64, _positions: &[(EquipmentId, V3)]) {}

    /// Called once when `run` returns.
    fn on_run_end(&mut self, _time: f64) {}
}

/// A [`YardObserver`] that does nothing.
pub struct NoopObserver;

impl YardObserver for NoopObserver {}

/// Snapshot of an operation, motions relative to `start`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OperationRecord {
    pub op:        OperationId,
    pub kind:      OpKind,
    pub equipment: EquipmentId,
    pub request:   Option<RequestId>,
    pub box_id:    Option<BoxId>,
    pub state:     OpState,
    pub start:     f64,
    pub finish:    f64,
    pub motions:   Vec<MotionRecord>,
}

/// Snapshot of a request at the end of its life.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestRecord {
    pub request:      RequestId,
    pub kind:         RequestKind,
    pub box_id:       Option<BoxId>,
    pub equipment:    Option<EquipmentId>,
    pub state:        RequestState,
    pub arrival:      f64,
    pub ready:        Option<f64>,
    pub start:        Option<f64>,
    pub finish:       Option<f64>,
    pub reject_count: u32,
    pub failure:      Option<Rejection>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ProbeEvent {
    OperationStart { op: OperationId, kind: OpKind, equipment: EquipmentId, request: Option<RequestId> },
    OperationFinish(OperationRecord),
    RequestRejected { request: RequestId, equipment: EquipmentId, reason: Rejection },
    RequestFinished(RequestRecord),
    RequestFailed(RequestRecord),
    BoxAlloc { box_id: BoxId, cell: Cell },
    Scheduled { request: RequestId, equipment: EquipmentId },
    /// `equipment` blocks until `adjust` has moved `peer` out of the way.
    EquipmentConflict { equipment: EquipmentId, peer: EquipmentId, adjust: RequestId },
    AllocatorFail { request: RequestId, box_id: BoxId },
}

impl ProbeEvent {
    /// Dotted probe name, e.g. `operation.start`.
    pub fn name(&self) -> &'static str {
        match self {
            ProbeEvent::OperationStart { .. } => "operation.start",
            ProbeEvent::OperationFinish(_) => "operation.finish",
            ProbeEvent::RequestRejected { .. } => "request.rejected",
            ProbeEvent::RequestFinished(_) => "request.finished",
            ProbeEvent::RequestFailed(_) => "request.failed",
            ProbeEvent::BoxAlloc { .. } => "box.alloc",
            ProbeEvent::Scheduled { .. } => "scheduler.scheduled",
            ProbeEvent::EquipmentConflict { .. } => "equipment.conflict",
            ProbeEvent::AllocatorFail { .. } => "allocator.fail",
        }
    }
}
