//! Error handling for the thermotrace acquisition pipeline.

use crate::acquire::frame::ParseError;

/// A specialized `Result` type for thermotrace operations.
pub type Result<T> = std::result::Result<T, MonitorError>;

/// The main error type for acquisition operations.
///
/// Every variant is handled locally by the component that detects it and
/// surfaced through the log; only an explicit shutdown (or the opt-in
/// persist-failure limit) ends acquisition.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport never opened or already closed; acquisition cannot start
    #[error("transport unavailable: {0}")]
    TransportUnavailable(String),

    /// A single poll's read failed; the loop continues
    #[error("transport read failed: {0}")]
    TransportRead(String),

    /// A received line did not match the framing format
    #[error("frame rejected: {0}")]
    Parse(#[from] ParseError),

    /// Durable write failed; in-memory state still updates
    #[error("persist error: {0}")]
    Persist(String),

    /// Outbound setpoint request failed local validation
    #[error("command rejected: {0}")]
    CommandRejected(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl MonitorError {
    /// Create a new transport-unavailable error
    pub fn transport_unavailable(msg: impl Into<String>) -> Self {
        Self::TransportUnavailable(msg.into())
    }

    /// Create a new transport-read error
    pub fn transport_read(msg: impl Into<String>) -> Self {
        Self::TransportRead(msg.into())
    }

    /// Create a new persist error
    pub fn persist_error(msg: impl Into<String>) -> Self {
        Self::Persist(msg.into())
    }

    /// Create a new command-rejected error
    pub fn command_rejected(msg: impl Into<String>) -> Self {
        Self::CommandRejected(msg.into())
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
