//! Scripted transport for tests and hardware-free development.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use crate::transport::Transport;

/// In-memory [`Transport`] fed with scripted inbound lines.
///
/// Reads pop lines in order; writes are captured for inspection. A single
/// read failure can be injected to exercise the loop's fault tolerance.
#[derive(Debug, Default)]
pub struct MockTransport {
    incoming: VecDeque<String>,
    sent: Vec<String>,
    open: bool,
    fail_next_read: bool,
}

impl MockTransport {
    /// Create an open transport with no buffered input.
    pub fn new() -> Self {
        Self {
            open: true,
            ..Self::default()
        }
    }

    /// Create a transport that was never opened.
    pub fn closed() -> Self {
        Self::default()
    }

    /// Create an open transport preloaded with inbound lines.
    pub fn with_lines<I, L>(lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        let mut transport = Self::new();
        for line in lines {
            transport.push_line(line);
        }
        transport
    }

    /// Queue one inbound line.
    pub fn push_line(&mut self, line: impl Into<String>) {
        self.incoming.push_back(line.into());
    }

    /// Make the next `read_line` fail with an I/O error.
    pub fn fail_next_read(&mut self) {
        self.fail_next_read = true;
    }

    /// Lines written so far, without terminators, oldest first.
    pub fn sent(&self) -> &[String] {
        &self.sent
    }
}

impl Transport for MockTransport {
    fn is_open(&self) -> bool {
        self.open
    }

    fn has_buffered_line(&mut self) -> bool {
        self.open && (self.fail_next_read || !self.incoming.is_empty())
    }

    fn read_line(&mut self, _timeout: Duration) -> io::Result<Option<String>> {
        if !self.open {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "mock transport closed",
            ));
        }
        if self.fail_next_read {
            self.fail_next_read = false;
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "injected read failure",
            ));
        }
        Ok(self.incoming.pop_front())
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        if !self.open {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "mock transport closed",
            ));
        }
        self.sent.push(line.to_string());
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_pop_in_order() {
        let mut transport = MockTransport::with_lines(["one", "two"]);
        assert!(transport.has_buffered_line());
        let timeout = Duration::from_millis(10);
        assert_eq!(transport.read_line(timeout).unwrap().unwrap(), "one");
        assert_eq!(transport.read_line(timeout).unwrap().unwrap(), "two");
        assert_eq!(transport.read_line(timeout).unwrap(), None);
        assert!(!transport.has_buffered_line());
    }

    #[test]
    fn test_closed_transport_refuses_io() {
        let mut transport = MockTransport::closed();
        assert!(!transport.is_open());
        assert!(transport.read_line(Duration::from_millis(10)).is_err());
        assert!(transport.write_line("Z30").is_err());
    }

    #[test]
    fn test_injected_failure_fires_once() {
        let mut transport = MockTransport::with_lines(["Z1A2"]);
        transport.fail_next_read();
        assert!(transport.read_line(Duration::from_millis(10)).is_err());
        assert!(transport.read_line(Duration::from_millis(10)).unwrap().is_some());
    }
}
