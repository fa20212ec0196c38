//! Data structures for decoded measurements.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// A single decoded observation: the device's target value and its reported
/// actual value at one point in time.
///
/// Immutable once constructed; the series store and the sink both consume it
/// by value or by reference, never by mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Wall-clock time the frame was decoded
    pub timestamp: DateTime<Local>,
    /// Target value reported by the device
    pub setpoint: f64,
    /// Actual value reported by the device
    pub actual: f64,
}

impl Measurement {
    /// Create a measurement stamped with the current local time.
    pub fn now(setpoint: f64, actual: f64) -> Self {
        Self {
            timestamp: Local::now(),
            setpoint,
            actual,
        }
    }

    /// Timestamp in the `HH:MM:SS` form used by log records.
    pub fn log_time(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

/// Payload handed to observers once per accepted measurement.
#[derive(Debug, Clone, Serialize)]
pub struct AcquisitionUpdate {
    /// Setpoint of the most recently accepted measurement
    pub setpoint: f64,
    /// The measurement that triggered this update
    pub measurement: Measurement,
    /// Independent copy of the series, oldest first
    pub history: Vec<Measurement>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_time_has_second_resolution() {
        let m = Measurement::now(25.0, 24.7);
        let text = m.log_time();
        assert_eq!(text.len(), 8);
        assert_eq!(text.matches(':').count(), 2);
    }

    #[test]
    fn test_measurement_serializes_roundtrip() {
        let m = Measurement::now(25.0, 24.7);
        let json = serde_json::to_string(&m).unwrap();
        let back: Measurement = serde_json::from_str(&json).unwrap();
        assert_eq!(back.setpoint, 25.0);
        assert_eq!(back.actual, 24.7);
    }
}
