//! # thermotrace - Serial Setpoint Monitor
//!
//! A small Rust crate for polling a serial device that periodically reports a
//! setpoint/process-value pair, keeping a time-ordered series of observations
//! and appending every accepted observation to a CSV log.
//!
//! ## Features
//!
//! - **Periodic acquisition**: one serialized poll cycle per interval, driven
//!   by a single tokio task that owns the serial link
//! - **Compact text framing**: `Z<setpoint>A<actual>` inbound, `Z<value>`
//!   outbound, decoded and rejected with typed errors
//! - **Durable logging**: append-only CSV, one row per accepted measurement
//! - **Synchronous observers**: display layers register a hook and receive a
//!   copy of the series after every accepted frame
//! - **Library + Binary**: use as a crate or as a standalone monitor
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use thermotrace::{AcquisitionLoop, AcquisitionUpdate, CsvSink, MonitorConfig, SerialTransport};
//!
//! #[tokio::main]
//! async fn main() -> thermotrace::Result<()> {
//!     let config = MonitorConfig::default();
//!     let transport =
//!         SerialTransport::open(&config.device, config.baud_rate, config.read_timeout())?;
//!     let sink = CsvSink::open(&config.log_path)?;
//!
//!     let mut acquisition = AcquisitionLoop::new(transport, sink, config);
//!     acquisition.add_observer(|update: &AcquisitionUpdate| {
//!         println!("setpoint {:.2}  actual {:.2}", update.setpoint, update.measurement.actual);
//!     });
//!
//!     let handle = acquisition.spawn()?;
//!     tokio::signal::ctrl_c().await?;
//!     handle.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod acquire;
pub mod config;
pub mod error;
pub mod persist;
pub mod transport;

// Re-export public API
pub use acquire::{
    data::{AcquisitionUpdate, Measurement},
    frame::{encode_setpoint, is_valid_decimal, parse_line, ParseError},
    runner::{AcquisitionHandle, AcquisitionLoop, LoopState},
    series::SeriesStore,
    traits::UpdateObserver,
};
pub use config::MonitorConfig;
pub use error::{MonitorError, Result};
pub use persist::{CsvSink, MeasurementSink, MemorySink};
pub use transport::{list_ports, MockTransport, PortListing, SerialTransport, Transport};

/// The default polling interval in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// The default serial baud rate
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// The default serial read timeout in milliseconds
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1000;

/// Hard cap on a single transport read, so a stalled device cannot wedge a
/// poll cycle past this bound
pub const MAX_READ_TIMEOUT_MS: u64 = 1000;
