//! CSV output backend.
//!
//! Creates three files in the configured output directory:
//! - `operations.csv`
//! - `motions.csv`
//! - `requests.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{MotionRow, OperationRow, OutputResult, RequestRow};

pub const OPERATION_HEADER: [&str; 8] =
    ["op", "kind", "equipment", "request", "box", "state", "start", "finish"];

pub const MOTION_HEADER: [&str; 8] =
    ["op", "equipment", "axis", "load", "start", "duration", "from", "to"];

pub const REQUEST_HEADER: [&str; 10] = [
    "request", "kind", "box", "equipment", "state", "arrival", "start", "finish", "rejections",
    "failure",
];

/// Writes yard output to three CSV files.
pub struct CsvWriter {
    operations: Writer<File>,
    motions:    Writer<File>,
    requests:   Writer<File>,
    finished:   bool,
}

impl CsvWriter {
    /// Open (or create) the CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut operations = Writer::from_path(dir.join("operations.csv"))?;
        operations.write_record(OPERATION_HEADER)?;

        let mut motions = Writer::from_path(dir.join("motions.csv"))?;
        motions.write_record(MOTION_HEADER)?;

        let mut requests = Writer::from_path(dir.join("requests.csv"))?;
        requests.write_record(REQUEST_HEADER)?;

        Ok(Self { operations, motions, requests, finished: false })
    }
}

/// Missing ids are written as empty fields.
fn id(v: u32) -> String {
    if v == u32::MAX { String::new() } else { v.to_string() }
}

fn secs(v: f64) -> String {
    if v.is_nan() { String::new() } else { format!("{v:.3}") }
}

impl OutputWriter for CsvWriter {
    fn write_operation(&mut self, row: &OperationRow) -> OutputResult<()> {
        self.operations.write_record(&[
            row.op.to_string(),
            row.kind.to_owned(),
            row.equipment.to_string(),
            id(row.request),
            id(row.box_id),
            row.state.to_owned(),
            secs(row.start),
            secs(row.finish),
        ])?;
        Ok(())
    }

    fn write_motions(&mut self, rows: &[MotionRow]) -> OutputResult<()> {
        for row in rows {
            self.motions.write_record(&[
                row.op.to_string(),
                row.equipment.to_string(),
                row.axis.to_string(),
                row.load.to_string(),
                secs(row.start),
                secs(row.duration),
                format!("{:.3}", row.from),
                format!("{:.3}", row.to),
            ])?;
        }
        Ok(())
    }

    fn write_request(&mut self, row: &RequestRow) -> OutputResult<()> {
        self.requests.write_record(&[
            row.request.to_string(),
            row.kind.to_owned(),
            id(row.box_id),
            id(row.equipment),
            row.state.to_owned(),
            secs(row.arrival),
            secs(row.start),
            secs(row.finish),
            row.reject_count.to_string(),
            row.failure.clone(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.operations.flush()?;
        self.motions.flush()?;
        self.requests.flush()?;
        Ok(())
    }
}
