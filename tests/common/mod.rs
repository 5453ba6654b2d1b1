//! Shared test utilities for botdiags integration tests.

#![allow(dead_code)]

use std::path::Path;

use botdiags::transport::MockChannel;

/// Read an exported JSON artifact back as generic values.
pub fn read_json_records(path: impl AsRef<Path>) -> Vec<serde_json::Value> {
    let text = std::fs::read_to_string(path.as_ref())
        .unwrap_or_else(|e| panic!("read {}: {e}", path.as_ref().display()));
    serde_json::from_str(&text).expect("artifact is a JSON array")
}

/// A mock channel that already shows the diagnostics prompt, plus stubbed
/// exchanges for each `(command, body_line)` pair: the device echoes the
/// command, prints the body and re-arms the prompt.
pub fn prompt_device(exchanges: &[(&str, &str)]) -> MockChannel {
    let chan = MockChannel::new("MOCK0");
    chan.enqueue_read(b"Diags$ ");
    for (command, body) in exchanges {
        chan.stub(
            *command,
            format!("{command}\r\n{body}\r\nDiags$ ").as_bytes(),
        );
    }
    chan
}

/// A mock channel stubbed with line-protocol replies.
pub fn line_device(exchanges: &[(&str, &str)]) -> MockChannel {
    let chan = MockChannel::new("MOCK0");
    for (command, reply) in exchanges {
        chan.stub(*command, format!("{reply}\n").as_bytes());
    }
    chan
}
