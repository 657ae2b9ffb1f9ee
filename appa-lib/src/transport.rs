//! Byte transport between the driver and the meter.

use crate::config::SerialSettings;
use crate::error::AppaError;
use serialport::{ClearBuffer, FlowControl, SerialPort};
use std::io::{self, Read, Write};
use std::time::Duration;
use tracing::{debug, info};

/// Minimal byte-level I/O the session needs.
pub trait Transport {
    /// Read whatever is buffered right now, possibly nothing.
    fn read_nonblocking(&mut self, buf: &mut [u8]) -> Result<usize, AppaError>;

    /// Wait up to `timeout` for at least one byte. Returns 0 on timeout.
    fn read_blocking(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, AppaError>;

    fn write_blocking(&mut self, data: &[u8], timeout: Duration) -> Result<(), AppaError>;

    /// Drop pending input, e.g. before a handshake.
    fn flush(&mut self) -> Result<(), AppaError> {
        Ok(())
    }
}

pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    path: String,
}

impl SerialTransport {
    pub fn open(path: &str, settings: &SerialSettings) -> Result<Self, AppaError> {
        info!("Opening {} at {}", path, settings);
        let port = serialport::new(path, settings.baud_rate)
            .timeout(Duration::from_millis(100))
            .data_bits(settings.data_bits)
            .parity(settings.parity)
            .stop_bits(settings.stop_bits)
            .flow_control(FlowControl::None)
            .open()?;
        Ok(Self {
            port,
            path: path.to_string(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport").field("path", &self.path).finish()
    }
}

impl Transport for SerialTransport {
    fn read_nonblocking(&mut self, buf: &mut [u8]) -> Result<usize, AppaError> {
        let available = self.port.bytes_to_read()? as usize;
        if available == 0 || buf.is_empty() {
            return Ok(0);
        }
        let len = available.min(buf.len());
        let n = self.port.read(&mut buf[..len])?;
        Ok(n)
    }

    fn read_blocking(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, AppaError> {
        self.port.set_timeout(timeout)?;
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn write_blocking(&mut self, data: &[u8], timeout: Duration) -> Result<(), AppaError> {
        self.port.set_timeout(timeout)?;
        match self.port.write_all(data).and_then(|_| self.port.flush()) {
            Ok(()) => {
                debug!("Sent {} bytes: {}", data.len(), hex::encode(data));
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Err(AppaError::Timeout("serial write")),
            Err(e) => Err(e.into()),
        }
    }

    fn flush(&mut self) -> Result<(), AppaError> {
        self.port.clear(ClearBuffer::Input)?;
        Ok(())
    }
}
