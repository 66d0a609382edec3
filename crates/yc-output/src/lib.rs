//! `yc-output`: yard output writers.
//!
//! | Backend | Files created                                     |
//! |---------|---------------------------------------------------|
//! | CSV     | `operations.csv`, `motions.csv`, `requests.csv`   |
//!
//! Backends implement [`OutputWriter`] and are driven by
//! [`RecordingObserver`], which implements `yc_sim::YardObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use yc_output::{CsvWriter, RecordingObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut obs = RecordingObserver::new(writer);
//! yard.run(&mut obs)?;
//! obs.take_error().map(|e| eprintln!("output error: {e}"));
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(test)]
mod tests;

pub use self::csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::RecordingObserver;
pub use row::{MotionRow, OperationRow, RequestRow};
pub use writer::OutputWriter;
