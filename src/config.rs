//! Acquisition configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the acquisition pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Serial device path (e.g. "/dev/ttyUSB0", "COM3")
    pub device: String,
    /// Serial baud rate
    pub baud_rate: u32,
    /// Polling period in milliseconds
    pub poll_interval_ms: u64,
    /// Timeout for a single serial read in milliseconds
    pub read_timeout_ms: u64,
    /// Path of the append-only CSV log
    pub log_path: PathBuf,
    /// Keep only the newest N measurements in memory; unbounded when `None`
    pub retention: Option<usize>,
    /// Stop acquisition after this many consecutive persistence failures;
    /// never stop when `None`
    pub persist_failure_limit: Option<u32>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            device: "/dev/ttyUSB0".to_string(),
            baud_rate: crate::DEFAULT_BAUD_RATE,
            poll_interval_ms: crate::DEFAULT_POLL_INTERVAL_MS,
            read_timeout_ms: crate::DEFAULT_READ_TIMEOUT_MS,
            log_path: PathBuf::from("measurements.csv"),
            retention: None,
            persist_failure_limit: None,
        }
    }
}

impl MonitorConfig {
    /// Create a new configuration with a custom device and baud rate.
    pub fn new(device: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            device: device.into(),
            baud_rate,
            ..Default::default()
        }
    }

    /// Set the serial device path.
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = device.into();
        self
    }

    /// Set the baud rate.
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set the polling period in milliseconds.
    pub fn with_poll_interval_ms(mut self, interval_ms: u64) -> Self {
        self.poll_interval_ms = interval_ms;
        self
    }

    /// Set the serial read timeout in milliseconds.
    pub fn with_read_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.read_timeout_ms = timeout_ms;
        self
    }

    /// Set the CSV log path.
    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = path.into();
        self
    }

    /// Set the in-memory retention cap.
    pub fn with_retention(mut self, retention: Option<usize>) -> Self {
        self.retention = retention;
        self
    }

    /// Set the consecutive persist-failure limit.
    pub fn with_persist_failure_limit(mut self, limit: Option<u32>) -> Self {
        self.persist_failure_limit = limit;
        self
    }

    /// Polling period as a `Duration`.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Read timeout as a `Duration`, capped at [`crate::MAX_READ_TIMEOUT_MS`].
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms.min(crate::MAX_READ_TIMEOUT_MS))
    }
}
