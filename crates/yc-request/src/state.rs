//! Request lifecycle states.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Lifecycle state of a request.  Exactly one state bit is set at a
    /// time; the `*_FLAG` masks group states for membership tests.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RequestState: u16 {
        /// Created, never made ready.
        const INIT         = 0x0001;
        /// Eligible for scheduling for the first time.
        const READY        = 0x0002;
        /// Picked by a scheduler and bound to an equipment unit.
        const SCHEDULED    = 0x0004;
        /// First operation has begun.
        const STARTED      = 0x0008;
        /// An operation was refused; waiting to be made ready again.
        const REJECTED     = 0x0010;
        /// Eligible again after a rejection.
        const RESUME_READY = 0x0020;
        /// Past the physically meaningful midpoint.
        const SYNCED       = 0x0040;
        /// Done.
        const FINISHED     = 0x0080;
    }
}

impl RequestState {
    pub const READY_FLAG: Self = Self::from_bits_truncate(
        Self::READY.bits()
            | Self::RESUME_READY.bits()
            | Self::STARTED.bits()
            | Self::SYNCED.bits()
            | Self::FINISHED.bits(),
    );

    pub const RUNNING_FLAG: Self =
        Self::from_bits_truncate(Self::STARTED.bits() | Self::SYNCED.bits());

    pub const SYNCED_FLAG: Self =
        Self::from_bits_truncate(Self::SYNCED.bits() | Self::FINISHED.bits());

    /// States past "started" (a rejected request has started at least once).
    pub const STARTED_FLAG: Self = Self::from_bits_truncate(
        Self::STARTED.bits()
            | Self::REJECTED.bits()
            | Self::RESUME_READY.bits()
            | Self::SYNCED.bits()
            | Self::FINISHED.bits(),
    );

    /// Waiting in a pool for a scheduler.
    #[inline]
    pub const fn is_ready(self) -> bool {
        self.intersects(Self::from_bits_truncate(Self::READY.bits() | Self::RESUME_READY.bits()))
    }

    #[inline]
    pub const fn is_running(self) -> bool {
        self.intersects(Self::RUNNING_FLAG)
    }

    #[inline]
    pub const fn has_started(self) -> bool {
        self.intersects(Self::STARTED_FLAG)
    }

    #[inline]
    pub const fn is_synced(self) -> bool {
        self.intersects(Self::SYNCED_FLAG)
    }

    pub fn name(self) -> &'static str {
        match self {
            s if s == Self::INIT => "INIT",
            s if s == Self::READY => "READY",
            s if s == Self::SCHEDULED => "SCHEDULED",
            s if s == Self::STARTED => "STARTED",
            s if s == Self::REJECTED => "REJECTED",
            s if s == Self::RESUME_READY => "RESUME_READY",
            s if s == Self::SYNCED => "SYNCED",
            s if s == Self::FINISHED => "FINISHED",
            _ => "MIXED",
        }
    }
}

impl Default for RequestState {
    fn default() -> Self {
        Self::INIT
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
