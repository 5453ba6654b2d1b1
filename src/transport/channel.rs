//! Byte-channel abstraction shared by the serial and SSH backends.
//!
//! [`ByteChannel`] is the seam that lets the line and prompt protocols run
//! over real hardware or over the scripted mock in tests.

use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use crate::error::{TransportError, TransportResult};

/// Short poll timeout used for non-blocking-style reads on real ports.
const POLL_TIMEOUT: Duration = Duration::from_millis(20);

/// Raw byte I/O over some device link.
///
/// Reads are poll-style: [`read_available`] returns `Ok(0)` when nothing is
/// buffered right now, and the protocol layers above interleave short sleeps
/// with their own deadlines.
///
/// [`read_available`]: ByteChannel::read_available
pub trait ByteChannel {
    /// Read whatever is currently available, up to `buf.len()` bytes.
    ///
    /// `Ok(0)` means "nothing yet", not end-of-stream.
    fn read_available(&mut self, buf: &mut [u8]) -> TransportResult<usize>;

    /// Write the whole buffer.
    fn write_all(&mut self, data: &[u8]) -> TransportResult<()>;

    /// Identifier for log lines, e.g. the port path or `user@host`.
    fn name(&self) -> &str;

    /// Release the underlying handle. Idempotent; must not fail.
    fn shutdown(&mut self);
}

/// Real serial port implementing [`ByteChannel`] via the `serialport` crate.
pub struct SerialChannel {
    /// `None` once shut down; the handle closes when dropped.
    port: Option<Box<dyn serialport::SerialPort>>,
    name: String,
}

impl SerialChannel {
    /// Open `port_name` at `baud`, 8N1, with a short poll timeout.
    pub fn open(port_name: &str, baud: u32) -> TransportResult<Self> {
        let port = serialport::new(port_name, baud)
            .timeout(POLL_TIMEOUT)
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => {
                    TransportError::config(format!("could not open serial port {port_name:?}: {e}"))
                }
                serialport::ErrorKind::InvalidInput => TransportError::config(e.to_string()),
                _ => TransportError::Serial(e),
            })?;
        tracing::debug!(port = port_name, baud, "serial port opened");
        Ok(Self {
            port: Some(port),
            name: port_name.to_string(),
        })
    }
}

impl ByteChannel for SerialChannel {
    fn read_available(&mut self, buf: &mut [u8]) -> TransportResult<usize> {
        let Some(port) = self.port.as_mut() else {
            return Err(closed_error(&self.name));
        };
        match port.read(buf) {
            Ok(n) => Ok(n),
            // The serialport crate reports an exhausted poll window as an
            // I/O timeout; that is "no data yet" at this layer.
            Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&mut self, data: &[u8]) -> TransportResult<()> {
        let Some(port) = self.port.as_mut() else {
            return Err(closed_error(&self.name));
        };
        port.write_all(data)?;
        port.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn shutdown(&mut self) {
        if self.port.take().is_some() {
            tracing::debug!(port = %self.name, "serial port closed");
        }
    }
}

impl std::fmt::Debug for SerialChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialChannel")
            .field("name", &self.name)
            .field("open", &self.port.is_some())
            .finish()
    }
}

pub(crate) fn closed_error(name: &str) -> TransportError {
    TransportError::Io(std::io::Error::new(
        ErrorKind::NotConnected,
        format!("channel {name} is closed"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_nonexistent_port_fails() {
        let result = SerialChannel::open("/dev/nonexistent_port_12345", 115_200);
        assert!(result.is_err());
    }

    #[test]
    fn test_closed_error_kind() {
        let err = closed_error("MOCK0");
        match err {
            TransportError::Io(e) => assert_eq!(e.kind(), ErrorKind::NotConnected),
            other => panic!("expected Io error, got: {other:?}"),
        }
    }
}
