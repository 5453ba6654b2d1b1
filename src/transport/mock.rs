//! Scripted in-memory channel for testing protocol logic without hardware.
//!
//! A [`MockChannel`] holds a read queue and a write log behind shared state,
//! so a test can keep a handle while the channel itself is moved into a
//! protocol backend. Stubbed responses are enqueued as a reaction to writes,
//! which is enough to script full prompt exchanges.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::channel::{closed_error, ByteChannel};
use crate::error::{TransportError, TransportResult};

#[derive(Debug, Default)]
struct MockState {
    /// Bytes to be returned by subsequent reads.
    read_queue: VecDeque<u8>,
    /// Every buffer passed to `write_all`, in order.
    write_log: Vec<Vec<u8>>,
    /// (trimmed command, raw bytes enqueued when that command is written).
    stubs: Vec<(String, Vec<u8>)>,
    /// When set, the next read fails with this I/O error kind.
    fail_next_read: Option<std::io::ErrorKind>,
    shutdown: bool,
}

/// In-memory [`ByteChannel`] with a scripted request/response table.
#[derive(Clone)]
pub struct MockChannel {
    name: String,
    state: Arc<Mutex<MockState>>,
}

impl MockChannel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Enqueue bytes to be returned by subsequent reads.
    pub fn enqueue_read(&self, data: &[u8]) {
        let mut state = self.state.lock().unwrap();
        state.read_queue.extend(data);
    }

    /// When `command` (compared after trimming the written line) is sent,
    /// enqueue `response` for reading. Later stubs win over earlier ones.
    pub fn stub(&self, command: impl Into<String>, response: &[u8]) {
        let mut state = self.state.lock().unwrap();
        state.stubs.push((command.into(), response.to_vec()));
    }

    /// Make the next read fail with the given error kind.
    pub fn fail_next_read(&self, kind: std::io::ErrorKind) {
        self.state.lock().unwrap().fail_next_read = Some(kind);
    }

    /// Everything written so far, one entry per `write_all` call.
    pub fn write_log(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().write_log.clone()
    }

    pub fn was_shutdown(&self) -> bool {
        self.state.lock().unwrap().shutdown
    }
}

impl ByteChannel for MockChannel {
    fn read_available(&mut self, buf: &mut [u8]) -> TransportResult<usize> {
        let mut state = self.state.lock().unwrap();
        if state.shutdown {
            return Err(closed_error(&self.name));
        }
        if let Some(kind) = state.fail_next_read.take() {
            return Err(TransportError::Io(std::io::Error::new(
                kind,
                "injected read failure",
            )));
        }
        let mut n = 0;
        for slot in buf.iter_mut() {
            match state.read_queue.pop_front() {
                Some(byte) => {
                    *slot = byte;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }

    fn write_all(&mut self, data: &[u8]) -> TransportResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.shutdown {
            return Err(closed_error(&self.name));
        }
        state.write_log.push(data.to_vec());

        let written = String::from_utf8_lossy(data);
        let written = written.trim();
        if let Some((_, response)) = state
            .stubs
            .iter()
            .rev()
            .find(|(command, _)| command == written)
        {
            let response = response.clone();
            state.read_queue.extend(response);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn shutdown(&mut self) {
        self.state.lock().unwrap().shutdown = true;
    }
}

impl std::fmt::Debug for MockChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().unwrap();
        f.debug_struct("MockChannel")
            .field("name", &self.name)
            .field("queued", &state.read_queue.len())
            .field("writes", &state.write_log.len())
            .finish()
    }
}
