//! Line-based `STATUS|payload` protocol for minimal firmwares.
//!
//! Request is `<command>\n`; the reply is a single line, either
//! `STATUS|payload` or a bare payload (taken as OK — some devices only
//! print the reading). No line within the timeout means the device did not
//! answer.

use std::time::{Duration, Instant};

use tracing::debug;

use super::channel::ByteChannel;
use super::{Response, Status};
use crate::error::TransportResult;

const POLL_SLEEP: Duration = Duration::from_millis(20);

/// Line-based protocol over a byte channel.
pub struct LineSerial<C: ByteChannel> {
    chan: C,
    timeout: Duration,
}

impl<C: ByteChannel> LineSerial<C> {
    pub fn new(chan: C, timeout: Duration) -> Self {
        Self { chan, timeout }
    }

    /// Write `command + \n`, read one reply line, and parse it.
    pub fn send(&mut self, command: &str) -> TransportResult<Response> {
        self.chan
            .write_all(format!("{}\n", command.trim()).as_bytes())?;
        let line = self.read_line()?;
        let line = line.trim();
        if line.is_empty() {
            debug!(channel = self.chan.name(), command, "no reply line");
            return Ok(Response::error("timeout/no response"));
        }
        Ok(match line.split_once('|') {
            Some((token, payload)) => Response {
                status: Status::from_token(token),
                payload: payload.to_string(),
            },
            // Devices that only print the payload: any content implies OK.
            None => Response::ok(line),
        })
    }

    /// Accumulate bytes until a newline or the timeout; an expired timeout
    /// yields whatever was captured (possibly nothing).
    fn read_line(&mut self) -> TransportResult<String> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 256];
        let deadline = Instant::now() + self.timeout;
        while Instant::now() < deadline {
            let n = self.chan.read_available(&mut chunk)?;
            if n > 0 {
                buf.extend_from_slice(&chunk[..n]);
                if buf.contains(&b'\n') {
                    break;
                }
            } else {
                std::thread::sleep(POLL_SLEEP);
            }
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Release the channel. Safe to call repeatedly.
    pub fn close(&mut self) {
        self.chan.shutdown();
    }
}
