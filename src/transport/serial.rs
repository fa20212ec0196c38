//! Real serial-port transport.

use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use serialport::{SerialPort, SerialPortType};
use tracing::debug;

use crate::error::{MonitorError, Result};
use crate::transport::Transport;

/// Line-oriented transport over a serial port.
///
/// Bytes are pulled off the port in chunks and reassembled into lines in an
/// internal buffer, so a frame split across poll cycles is carried over
/// instead of dropped.
pub struct SerialTransport {
    port: Option<Box<dyn SerialPort>>,
    pending: Vec<u8>,
}

impl SerialTransport {
    /// Open `device` at `baud_rate` with the given per-read timeout.
    pub fn open(device: &str, baud_rate: u32, timeout: Duration) -> Result<Self> {
        let port = serialport::new(device, baud_rate)
            .timeout(timeout)
            .open()
            .map_err(|e| {
                MonitorError::transport_unavailable(format!("{device}: {e}"))
            })?;
        debug!(device, baud_rate, "serial port opened");
        Ok(Self {
            port: Some(port),
            pending: Vec::new(),
        })
    }

    fn take_buffered_line(&mut self) -> Option<String> {
        let newline = self.pending.iter().position(|&b| b == b'\n')?;
        let raw: Vec<u8> = self.pending.drain(..=newline).collect();
        Some(String::from_utf8_lossy(&raw).trim_end().to_string())
    }
}

impl Transport for SerialTransport {
    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn has_buffered_line(&mut self) -> bool {
        if self.pending.contains(&b'\n') {
            return true;
        }
        match &self.port {
            Some(port) => port.bytes_to_read().map(|n| n > 0).unwrap_or(false),
            None => false,
        }
    }

    fn read_line(&mut self, timeout: Duration) -> io::Result<Option<String>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(line) = self.take_buffered_line() {
                return Ok(Some(line));
            }

            let port = self.port.as_mut().ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotConnected, "serial port closed")
            })?;

            if Instant::now() >= deadline {
                return Ok(None);
            }

            let mut chunk = [0u8; 256];
            match port.read(&mut chunk) {
                Ok(0) => return Ok(None),
                Ok(n) => self.pending.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::TimedOut => return Ok(None),
                Err(e) => return Err(e),
            }
        }
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let port = self.port.as_mut().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, "serial port closed")
        })?;
        port.write_all(line.as_bytes())?;
        port.write_all(b"\n")?;
        port.flush()
    }

    fn close(&mut self) {
        if let Some(port) = self.port.take() {
            drop(port);
            debug!("serial port closed");
        }
    }
}

/// A detected serial port, with whatever description the backend offers.
#[derive(Debug, Clone)]
pub struct PortListing {
    /// Device path (e.g. "/dev/ttyUSB0", "COM3")
    pub name: String,
    /// Human-readable port description
    pub description: String,
}

/// Enumerate the serial ports visible to the host, sorted by name.
pub fn list_ports() -> Result<Vec<PortListing>> {
    let ports = serialport::available_ports()
        .map_err(|e| MonitorError::transport_unavailable(e.to_string()))?;

    let mut listings: Vec<PortListing> = ports
        .into_iter()
        .map(|p| {
            let description = match p.port_type {
                SerialPortType::UsbPort(info) => {
                    let mut parts = Vec::new();
                    if let Some(manufacturer) = info.manufacturer {
                        parts.push(manufacturer);
                    }
                    if let Some(product) = info.product {
                        parts.push(product);
                    }
                    if parts.is_empty() {
                        "USB serial".to_string()
                    } else {
                        parts.join(" ")
                    }
                }
                SerialPortType::BluetoothPort => "Bluetooth".to_string(),
                SerialPortType::PciPort => "PCI".to_string(),
                SerialPortType::Unknown => String::new(),
            };
            PortListing {
                name: p.port_name,
                description,
            }
        })
        .collect();

    listings.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(listings)
}
