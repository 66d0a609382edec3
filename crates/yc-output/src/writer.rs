//! The `OutputWriter` trait implemented by all backend writers.

use crate::{MotionRow, OperationRow, OutputResult, RequestRow};

/// Trait implemented by output backends.
///
/// All methods are infallible from the observer's perspective; errors are
/// stored internally and retrieved with
/// [`RecordingObserver::take_error`][crate::RecordingObserver::take_error].
pub trait OutputWriter {
    fn write_operation(&mut self, row: &OperationRow) -> OutputResult<()>;

    fn write_motions(&mut self, rows: &[MotionRow]) -> OutputResult<()>;

    fn write_request(&mut self, row: &RequestRow) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent: safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
