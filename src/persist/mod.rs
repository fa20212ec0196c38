//! Durable persistence for accepted measurements.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use csv::{Writer, WriterBuilder};
use serde::Serialize;

use crate::acquire::data::Measurement;
use crate::error::{MonitorError, Result};

/// Append-only sink for accepted measurements. One record per call, no
/// updates, no deletions.
pub trait MeasurementSink: Send {
    /// Persist one measurement.
    fn record(&mut self, measurement: &Measurement) -> Result<()>;
}

/// One persisted row. Field order is part of the log format: local time,
/// actual value, setpoint.
#[derive(Serialize)]
struct LogRecord {
    timestamp: String,
    actual: f64,
    setpoint: f64,
}

/// CSV-backed [`MeasurementSink`].
///
/// The destination is opened in append mode and never truncated, so restarts
/// extend the same log. No exclusive lock is taken; external readers may
/// tail the file while acquisition runs.
pub struct CsvSink {
    writer: Writer<File>,
    path: PathBuf,
}

impl CsvSink {
    /// Open `path` for appending, creating the file if absent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                MonitorError::persist_error(format!("{}: {e}", path.display()))
            })?;
        let writer = WriterBuilder::new().has_headers(false).from_writer(file);
        Ok(Self { writer, path })
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MeasurementSink for CsvSink {
    fn record(&mut self, measurement: &Measurement) -> Result<()> {
        let record = LogRecord {
            timestamp: measurement.log_time(),
            actual: measurement.actual,
            setpoint: measurement.setpoint,
        };
        self.writer
            .serialize(record)
            .map_err(|e| MonitorError::persist_error(e.to_string()))?;
        // flush per record: an unflushed row is not durable
        self.writer
            .flush()
            .map_err(|e| MonitorError::persist_error(e.to_string()))?;
        Ok(())
    }
}

/// In-memory sink for tests and development.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Vec<Measurement>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far, in arrival order.
    pub fn records(&self) -> &[Measurement] {
        &self.records
    }
}

impl MeasurementSink for MemorySink {
    fn record(&mut self, measurement: &Measurement) -> Result<()> {
        self.records.push(measurement.clone());
        Ok(())
    }
}
