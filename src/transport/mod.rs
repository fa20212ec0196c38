//! Byte-stream transport abstraction over the serial link.

mod mock;
mod serial;

pub use mock::MockTransport;
pub use serial::{list_ports, PortListing, SerialTransport};

use std::io;
use std::time::Duration;

/// The capability set the acquisition loop needs from the link.
///
/// The loop is the only component that touches the transport; everything else
/// goes through it, so implementations never see interleaved partial reads.
pub trait Transport: Send {
    /// Whether the underlying link is open.
    fn is_open(&self) -> bool;

    /// Whether at least one line is waiting to be read. May report true on
    /// partial data; `read_line` resolves that with its bounded timeout.
    fn has_buffered_line(&mut self) -> bool;

    /// Read one line, without its terminator. `Ok(None)` means no complete
    /// line arrived within `timeout`; the data read so far is kept for the
    /// next call.
    fn read_line(&mut self, timeout: Duration) -> io::Result<Option<String>>;

    /// Write one line, appending the `\n` terminator.
    fn write_line(&mut self, line: &str) -> io::Result<()>;

    /// Close the link. Subsequent reads and writes fail; reopening means
    /// building a new transport.
    fn close(&mut self);
}
