//! The client-visible request and its state machine.

use std::collections::BTreeSet;

use tracing::debug;
use yc_core::{BlockId, BoxId, Column, EquipmentId, LaneId, OperationId, RequestId};

use crate::{Intent, Rejection, RequestError, RequestKind, RequestResult, RequestState, SignalTable};

/// A store / retrieve / relocate / adjust intent and its lifecycle.
///
/// ```text
/// INIT ──ready──▶ READY ──schedule──▶ SCHEDULED ──start_or_resume──▶ STARTED ──sync──▶ SYNCED
///                   ▲                     │                             │                │
///                   │                     └───────────reject────────────┤                │
///              RESUME_READY ◀──ready── REJECTED ◀───────────────────────┘                │
///                                                        FINISHED ◀──finish_or_fail──────┘
/// ```
///
/// `H` is the signal handler type linked into `signals`.
#[derive(Clone, Debug)]
pub struct Request<H> {
    pub id:               RequestId,
    pub intent:           Intent,
    pub block:            BlockId,
    pub state:            RequestState,
    /// Unit the request is bound to (always set for ADJUST).
    pub equipment:        Option<EquipmentId>,
    /// Request queued ahead of this one at the same access lane.
    pub predecessor:      Option<RequestId>,
    /// Do not resubmit after a rejection.
    pub one_time_attempt: bool,

    pub arrival_time: f64,
    pub ready_time:   Option<f64>,
    pub start_time:   Option<f64>,
    pub finish_time:  Option<f64>,
    pub reject_time:  Option<f64>,
    pub resume_time:  Option<f64>,
    pub sync_time:    Option<f64>,

    pub reject_count:   u32,
    pub last_rejection: Option<Rejection>,
    /// Set when an unrecoverable rejection ended the request.
    pub failure:        Option<Rejection>,

    /// Locked columns this request waits on.
    pub pending_columns: BTreeSet<Column>,
    /// Operations generated so far, in order.
    pub ops:             Vec<OperationId>,
    pub signals:         SignalTable<H>,
}

impl<H: Copy> Request<H> {
    pub fn new(id: RequestId, intent: Intent, block: BlockId, time: f64) -> Self {
        let kind = intent.kind();
        Self {
            id,
            intent,
            block,
            state: RequestState::INIT,
            equipment: None,
            predecessor: None,
            one_time_attempt: false,
            arrival_time: time,
            ready_time: None,
            start_time: None,
            finish_time: None,
            reject_time: None,
            resume_time: None,
            sync_time: None,
            reject_count: 0,
            last_rejection: None,
            failure: None,
            pending_columns: BTreeSet::new(),
            ops: Vec::new(),
            signals: SignalTable::new(kind),
        }
    }
}

impl<H> Request<H> {
    #[inline]
    pub fn kind(&self) -> RequestKind {
        self.intent.kind()
    }

    #[inline]
    pub fn box_id(&self) -> Option<BoxId> {
        self.intent.box_id()
    }

    #[inline]
    pub fn lane(&self) -> Option<LaneId> {
        self.intent.lane()
    }

    #[inline] pub fn is_ready(&self) -> bool { self.state.is_ready() }
    #[inline] pub fn has_started(&self) -> bool { self.state.has_started() }
    #[inline] pub fn is_finished(&self) -> bool { self.state == RequestState::FINISHED }
    #[inline] pub fn is_failed(&self) -> bool { self.failure.is_some() }

    /// Scheduling timestamp: when the request last became ready.
    pub fn ready_since(&self) -> f64 {
        if self.state == RequestState::RESUME_READY {
            self.resume_time.unwrap_or(self.arrival_time)
        } else {
            self.ready_time.unwrap_or(self.arrival_time)
        }
    }

    fn invalid(&self, action: &'static str) -> RequestError {
        RequestError::InvalidTransition { id: self.id, from: self.state, action }
    }

    /// INIT → READY, or REJECTED → RESUME_READY.  Already-ready requests are
    /// left alone.
    pub fn ready(&mut self, time: f64) -> RequestResult<()> {
        if self.state == RequestState::INIT {
            self.state = RequestState::READY;
            self.ready_time = Some(time);
        } else if self.state == RequestState::REJECTED && self.failure.is_none() {
            self.state = RequestState::RESUME_READY;
            self.resume_time = Some(time);
        } else if !self.state.is_ready() {
            return Err(self.invalid("ready"));
        }
        Ok(())
    }

    /// READY / RESUME_READY → SCHEDULED, bound to `equipment`.
    pub fn schedule(&mut self, equipment: EquipmentId) -> RequestResult<()> {
        if !self.state.is_ready() {
            return Err(self.invalid("schedule"));
        }
        self.state = RequestState::SCHEDULED;
        self.equipment = Some(equipment);
        Ok(())
    }

    /// → STARTED at the physical start of the first operation.  Repeated
    /// calls while running are no-ops.
    pub fn start_or_resume(&mut self, time: f64) -> RequestResult<()> {
        if self.state.is_running() {
            return Ok(());
        }
        if !(self.state == RequestState::SCHEDULED || self.state.is_ready()) {
            return Err(self.invalid("start"));
        }
        self.state = RequestState::STARTED;
        self.start_time = Some(time);
        Ok(())
    }

    /// SCHEDULED / STARTED → REJECTED.  Resets start/finish timestamps and
    /// counts the rejection.  Returns `true` if the request should go back
    /// to its dispatcher (recoverable and not a one-time attempt).
    pub fn reject(&mut self, time: f64, why: Rejection) -> RequestResult<bool> {
        if !(self.state == RequestState::SCHEDULED || self.state == RequestState::STARTED) {
            return Err(self.invalid("reject"));
        }
        self.state = RequestState::REJECTED;
        self.start_time = None;
        self.finish_time = None;
        self.reject_time = Some(time);
        self.reject_count += 1;
        debug!(id = %self.id, reason = why.label(), count = self.reject_count, "request rejected");
        let resubmit = why.is_recoverable() && !self.one_time_attempt;
        if !why.is_recoverable() {
            self.failure = Some(why.clone());
        }
        self.last_rejection = Some(why);
        Ok(resubmit)
    }

    /// STARTED → SYNCED.
    pub fn sync(&mut self, time: f64) -> RequestResult<()> {
        if self.state == RequestState::STARTED {
            self.state = RequestState::SYNCED;
            self.sync_time = Some(time);
        } else if self.state != RequestState::SYNCED {
            return Err(self.invalid("sync"));
        }
        Ok(())
    }

    /// → FINISHED unless rejected.  Returns whether the request finished.
    pub fn finish_or_fail(&mut self, time: f64) -> bool {
        if self.state == RequestState::REJECTED || self.state == RequestState::FINISHED {
            return false;
        }
        self.state = RequestState::FINISHED;
        self.finish_time = Some(time);
        true
    }

    /// Remember that `column` blocked an acquisition.
    pub fn wait_on(&mut self, column: Column) {
        self.pending_columns.insert(column);
    }

    /// `column` was released.  Returns `true` when that was the last column
    /// this request waited on; releases it never waited on are ignored.
    pub fn on_resource_release(&mut self, column: Column) -> bool {
        self.pending_columns.remove(&column) && self.pending_columns.is_empty()
    }
}
