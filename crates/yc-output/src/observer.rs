//! `RecordingObserver<W>`: bridges `YardObserver` to an `OutputWriter`.

use tracing::warn;
use yc_sim::{OperationRecord, ProbeEvent, RequestRecord, YardObserver};

use crate::row::{MotionRow, OperationRow, RequestRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

const NONE: u32 = u32::MAX;

/// A [`YardObserver`] that writes finished operations, their motions and
/// closed requests to any [`OutputWriter`] backend.
///
/// Errors from the writer are stored internally because `YardObserver`
/// methods have no return value.  After `yard.run()` returns, check for
/// errors with [`take_error`][Self::take_error].
pub struct RecordingObserver<W: OutputWriter> {
    writer:     W,
    operations: usize,
    requests:   usize,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> RecordingObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, operations: 0, requests: 0, last_error: None }
    }

    /// Take the stored write error (if any) after `yard.run()` returns.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Operation and request rows written so far.
    pub fn counts(&self) -> (usize, usize) {
        (self.operations, self.requests)
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            warn!(error = %e, "output write failed");
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }

    fn record_operation(&mut self, rec: &OperationRecord) -> OutputResult<()> {
        let op = rec.op.0;
        let equipment = rec.equipment.0;
        self.writer.write_operation(&OperationRow {
            op,
            kind: rec.kind.name(),
            equipment,
            request: rec.request.map_or(NONE, |r| r.0),
            box_id: rec.box_id.map_or(NONE, |b| b.0),
            state: rec.state.name(),
            start: rec.start,
            finish: rec.finish,
        })?;
        let motions: Vec<MotionRow> = rec
            .motions
            .iter()
            .map(|m| MotionRow {
                op,
                equipment,
                axis: m.axis,
                load: m.load,
                start: rec.start + m.start,
                duration: m.duration,
                from: m.from,
                to: m.to,
            })
            .collect();
        if !motions.is_empty() {
            self.writer.write_motions(&motions)?;
        }
        self.operations += 1;
        Ok(())
    }

    fn record_request(&mut self, rec: &RequestRecord) -> OutputResult<()> {
        self.writer.write_request(&RequestRow {
            request:      rec.request.0,
            kind:         rec.kind.name(),
            box_id:       rec.box_id.map_or(NONE, |b| b.0),
            equipment:    rec.equipment.map_or(NONE, |e| e.0),
            state:        if rec.failure.is_some() { "FAILED" } else { rec.state.name() },
            arrival:      rec.arrival,
            start:        rec.start.unwrap_or(f64::NAN),
            finish:       rec.finish.unwrap_or(f64::NAN),
            reject_count: rec.reject_count,
            failure:      rec.failure.as_ref().map(|f| f.label().to_owned()).unwrap_or_default(),
        })?;
        self.requests += 1;
        Ok(())
    }
}

impl<W: OutputWriter> YardObserver for RecordingObserver<W> {
    fn on_probe(&mut self, _time: f64, event: &ProbeEvent) {
        let result = match event {
            ProbeEvent::OperationFinish(rec) => self.record_operation(rec),
            ProbeEvent::RequestFinished(rec) | ProbeEvent::RequestFailed(rec) => self.record_request(rec),
            _ => Ok(()),
        };
        self.store_err(result);
    }

    fn on_run_end(&mut self, _time: f64) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
