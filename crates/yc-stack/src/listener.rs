//! Lock notification hooks.

use yc_core::Column;

/// Receives per-column lock notifications.
///
/// All methods default to no-ops so implementors only override what they
/// need.  `W` identifies acquirers (typically a request id).
pub trait LockListener<W> {
    /// `who` found `column` locked and now waits on it.
    fn on_acquire_fail(&mut self, _time: f64, _who: W, _column: Column) {}

    /// `who` now holds `column`.
    fn on_acquire_success(&mut self, _time: f64, _who: W, _column: Column) {}

    /// `column`, which `who` was waiting on, has been released.
    fn on_resource_release(&mut self, _time: f64, _who: W, _column: Column) {}
}

/// Listener that ignores everything.
impl<W> LockListener<W> for () {}

/// A recorded lock notification.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum LockEvent<W> {
    AcquireFail { time: f64, who: W, column: Column },
    AcquireSuccess { time: f64, who: W, column: Column },
    Released { time: f64, who: W, column: Column },
}

/// Collects notifications so the caller can apply them once the lock
/// table is no longer borrowed.
impl<W> LockListener<W> for Vec<LockEvent<W>> {
    fn on_acquire_fail(&mut self, time: f64, who: W, column: Column) {
        self.push(LockEvent::AcquireFail { time, who, column });
    }

    fn on_acquire_success(&mut self, time: f64, who: W, column: Column) {
        self.push(LockEvent::AcquireSuccess { time, who, column });
    }

    fn on_resource_release(&mut self, time: f64, who: W, column: Column) {
        self.push(LockEvent::Released { time, who, column });
    }
}
