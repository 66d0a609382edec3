//! Named lifecycle points an operation fires at exact physical times.
//!
//! The workflow only knows that "signal X of request R" happens at time t;
//! what it means for boxes and locks is decided by the handler linked into
//! the request's `SignalTable`.

use std::fmt;

use crate::{RequestError, RequestKind, RequestResult};

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Signal {
    /// The request's first operation begins (or a rejected one resumes).
    StartOrResume,
    /// The request's last operation ends, successfully or not.
    FinishOrFail,
    /// STORE: the box has been lifted off the vehicle.
    OffAgv,
    /// STORE: the box has been set down in the block.
    InBlock,
    /// RETRIEVE: the box has been lifted out of the block.
    OffBlock,
    /// RETRIEVE: the box has been set down on the vehicle.
    OnAgv,
    /// A relocation move begins.
    RelocateStart,
    /// A relocated box has been lifted off its old column.
    PickUp,
    /// A relocated box has been set down on its new column.
    PutDown,
    /// A relocation move ends.
    RelocateFinish,
}

impl Signal {
    pub const COUNT: usize = 10;

    pub const ALL: [Signal; Self::COUNT] = [
        Signal::StartOrResume,
        Signal::FinishOrFail,
        Signal::OffAgv,
        Signal::InBlock,
        Signal::OffBlock,
        Signal::OnAgv,
        Signal::RelocateStart,
        Signal::PickUp,
        Signal::PutDown,
        Signal::RelocateFinish,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Signal::StartOrResume => "start_or_resume",
            Signal::FinishOrFail => "finish_or_fail",
            Signal::OffAgv => "off_agv",
            Signal::InBlock => "in_block",
            Signal::OffBlock => "off_block",
            Signal::OnAgv => "on_agv",
            Signal::RelocateStart => "relocate_start",
            Signal::PickUp => "pick_up",
            Signal::PutDown => "put_down",
            Signal::RelocateFinish => "relocate_finish",
        }
    }

    /// Whether requests of `kind` may carry this signal.
    pub fn allowed_for(self, kind: RequestKind) -> bool {
        use Signal::*;
        match self {
            StartOrResume | FinishOrFail => true,
            OffAgv | InBlock => kind == RequestKind::Store,
            OffBlock | OnAgv => kind == RequestKind::Retrieve,
            RelocateStart | PickUp | PutDown | RelocateFinish => {
                matches!(kind, RequestKind::Retrieve | RequestKind::Relocate)
            }
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One handler slot per signal, checked against the request kind on link.
#[derive(Clone, Debug)]
pub struct SignalTable<H> {
    kind:  RequestKind,
    slots: [Option<H>; Signal::COUNT],
}

impl<H: Copy> SignalTable<H> {
    pub fn new(kind: RequestKind) -> Self {
        Self { kind, slots: [None; Signal::COUNT] }
    }

    /// Attach `handler` to `signal`, replacing any previous one.
    pub fn link(&mut self, signal: Signal, handler: H) -> RequestResult<()> {
        if !signal.allowed_for(self.kind) {
            return Err(RequestError::SignalNotAllowed { kind: self.kind, signal });
        }
        self.slots[signal.index()] = Some(handler);
        Ok(())
    }

    #[inline]
    pub fn get(&self, signal: Signal) -> Option<H> {
        self.slots[signal.index()]
    }

    pub fn is_linked(&self, signal: Signal) -> bool {
        self.slots[signal.index()].is_some()
    }
}
