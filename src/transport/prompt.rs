//! Interactive prompt-session protocol.
//!
//! Drives a text prompt the way a human operator would: wait for the prompt
//! marker, write a command, read until the prompt reappears, then strip the
//! echoed command and prompt noise out of the captured bytes. The session
//! moves through connect → awaiting-prompt → ready → sending →
//! awaiting-response and back to ready; a missed prompt ends the exchange
//! with a timeout error instead.
//!
//! The same logic runs over serial and SSH; only the [`ByteChannel`] and the
//! line terminator differ.

use std::time::{Duration, Instant};

use regex::bytes::Regex;
use tracing::{debug, trace};

use super::channel::ByteChannel;
use super::{Response, Status};
use crate::error::{TransportError, TransportResult};

/// Sleep between polls while waiting for inbound bytes.
const POLL_SLEEP: Duration = Duration::from_millis(20);

const READ_CHUNK: usize = 4096;

/// Line terminator appended to outbound commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    /// `\r\n` — serial consoles.
    CrLf,
    /// `\n` — SSH shells.
    Lf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CrLf => "\r\n",
            Self::Lf => "\n",
        }
    }
}

/// One interactive prompt session over a byte channel.
pub struct PromptSession<C: ByteChannel> {
    chan: C,
    prompt: Regex,
    timeout: Duration,
    ending: LineEnding,
}

impl<C: ByteChannel> PromptSession<C> {
    /// Take ownership of an open channel and block until the first prompt
    /// appears (or the timeout elapses).
    pub fn connect(
        chan: C,
        prompt: &str,
        timeout: Duration,
        ending: LineEnding,
    ) -> TransportResult<Self> {
        let prompt = Regex::new(prompt)
            .map_err(|e| TransportError::config(format!("invalid prompt pattern {prompt:?}: {e}")))?;
        let mut session = Self {
            chan,
            prompt,
            timeout,
            ending,
        };
        debug!(channel = session.chan.name(), "waiting for initial prompt");
        session.read_until_prompt()?;
        Ok(session)
    }

    /// Send one command and collect everything up to the next prompt.
    pub fn send(&mut self, command: &str) -> TransportResult<Response> {
        let cmd = command.trim();
        self.chan
            .write_all(format!("{cmd}{}", self.ending.as_str()).as_bytes())?;
        let raw = self.read_until_prompt()?;
        let text = String::from_utf8_lossy(&raw);
        trace!(channel = self.chan.name(), bytes = raw.len(), "prompt exchange captured");

        // Drop blank lines and any line the prompt pattern matches, then a
        // leading line that is just our own command echoed back.
        let mut lines: Vec<&str> = text
            .lines()
            .filter(|ln| !ln.trim().is_empty() && !self.prompt.is_match(ln.as_bytes()))
            .collect();
        if lines.first().map(|ln| ln.trim() == cmd).unwrap_or(false) {
            lines.remove(0);
        }
        let body = lines.join("\n").trim().to_string();
        Ok(classify(body))
    }

    /// Accumulate inbound bytes until the prompt pattern matches.
    fn read_until_prompt(&mut self) -> TransportResult<Vec<u8>> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; READ_CHUNK];
        let deadline = Instant::now() + self.timeout;
        while Instant::now() < deadline {
            let n = self.chan.read_available(&mut chunk)?;
            if n > 0 {
                buf.extend_from_slice(&chunk[..n]);
                if self.prompt.is_match(&buf) {
                    return Ok(buf);
                }
            } else {
                std::thread::sleep(POLL_SLEEP);
            }
        }
        debug!(channel = self.chan.name(), "prompt timeout");
        Err(TransportError::timeout(self.timeout))
    }

    /// Release the channel. Safe to call repeatedly.
    pub fn close(&mut self) {
        self.chan.shutdown();
    }
}

/// Status heuristic for free-form prompt output.
///
/// OK iff the body is non-empty and does not contain "error" (any case).
/// This is a text heuristic, not a structured protocol; it lives here alone
/// so a structured classification can replace it without touching callers.
fn classify(body: String) -> Response {
    let status = if !body.is_empty() && !body.to_lowercase().contains("error") {
        Status::Ok
    } else {
        Status::Error
    };
    Response {
        status,
        payload: body,
    }
}
