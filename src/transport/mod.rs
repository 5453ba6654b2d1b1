//! Transport abstraction over heterogeneous DUT links.
//!
//! Every backend speaks the same `(Status, payload)` contract, so the test
//! sequencer and the shell never care whether a reading came from an
//! in-process simulator, a line-based serial device, or an interactive
//! prompt over serial or SSH.
//!
//! The backend is selected once, at construction, by [`TransportMode`];
//! after that dispatch is a plain enum match with no runtime inspection.

pub mod channel;
pub mod line;
pub mod mock;
pub mod prompt;
pub mod ssh;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::device::SimulatedDevice;
use crate::error::{TransportError, TransportResult};
pub use channel::{ByteChannel, SerialChannel};
pub use line::LineSerial;
pub use mock::MockChannel;
pub use prompt::{LineEnding, PromptSession};
pub use ssh::SshChannel;

/// Default prompt pattern emitted by the diagnostics firmware.
pub const DEFAULT_PROMPT: &str = r"Diags\$ ";

/// Default baud rate for serial links.
pub const DEFAULT_BAUD: u32 = 115_200;

/// Default per-exchange timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 3_000;

/// Outcome of one command/response exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Ok,
    Error,
}

impl Status {
    /// Map a wire status token to a typed status.
    ///
    /// Only the exact token `OK` counts as success; anything else a device
    /// prints (including third-value tokens) is an error.
    pub fn from_token(token: &str) -> Self {
        if token == "OK" {
            Self::Ok
        } else {
            Self::Error
        }
    }

    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// A `(Status, payload)` pair returned by every transport exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub payload: String,
}

impl Response {
    pub fn ok(payload: impl Into<String>) -> Self {
        Self {
            status: Status::Ok,
            payload: payload.into(),
        }
    }

    pub fn error(payload: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            payload: payload.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }
}

/// Which backend a [`Transport`] drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    /// In-process simulated DUT; safe for tests and demos.
    Simulated,
    /// Plain line-based serial; expects `STATUS|payload` lines.
    LineSerial,
    /// Interactive prompt over a serial port.
    PromptSerial,
    /// Interactive prompt over an SSH PTY.
    PromptSsh,
}

impl std::str::FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "simulated" => Ok(Self::Simulated),
            "line_serial" => Ok(Self::LineSerial),
            "prompt_serial" => Ok(Self::PromptSerial),
            "prompt_ssh" => Ok(Self::PromptSsh),
            other => Err(format!(
                "mode must be one of: simulated, line_serial, prompt_serial, prompt_ssh (got {other:?})"
            )),
        }
    }
}

/// Connection parameters for a [`Transport`].
///
/// Which fields are required depends on the mode; validation happens in
/// [`Transport::connect`] before any handle is opened.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub mode: TransportMode,
    /// Serial port path, e.g. `/dev/ttyUSB0` or `COM3`.
    pub port: Option<String>,
    pub baud: u32,
    pub timeout_ms: u64,
    /// Prompt regular expression for the prompt-driven modes.
    pub prompt: String,
    /// SSH target host (`host` or `host:port`).
    pub host: Option<String>,
    pub user: Option<String>,
    /// Never read from or written to config files.
    #[serde(skip)]
    pub password: Option<String>,
    pub key_file: Option<std::path::PathBuf>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            mode: TransportMode::Simulated,
            port: None,
            baud: DEFAULT_BAUD,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            prompt: DEFAULT_PROMPT.to_string(),
            host: None,
            user: None,
            password: None,
            key_file: None,
        }
    }
}

impl TransportConfig {
    pub fn simulated() -> Self {
        Self::default()
    }

    pub fn line_serial(port: impl Into<String>) -> Self {
        Self {
            mode: TransportMode::LineSerial,
            port: Some(port.into()),
            ..Self::default()
        }
    }

    pub fn prompt_serial(port: impl Into<String>) -> Self {
        Self {
            mode: TransportMode::PromptSerial,
            port: Some(port.into()),
            ..Self::default()
        }
    }

    pub fn prompt_ssh(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            mode: TransportMode::PromptSsh,
            host: Some(host.into()),
            user: Some(user.into()),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// The active backend. One variant per mode; each owns its I/O handle.
enum Backend {
    Simulated(SimulatedDevice),
    LineSerial(LineSerial<SerialChannel>),
    PromptSerial(PromptSession<SerialChannel>),
    PromptSsh(PromptSession<SshChannel>),
}

/// Unified transport to a device under test.
///
/// Exactly one underlying I/O handle, exclusively owned. Call [`close`] when
/// done; it is idempotent and swallows cleanup errors so that resource
/// release never masks a test result.
///
/// [`close`]: Transport::close
pub struct Transport {
    backend: Backend,
}

impl Transport {
    /// Open the backend selected by `config.mode`.
    ///
    /// Fails fast with [`TransportError::Config`] when a required parameter
    /// is missing: serial modes need `port`, SSH needs `host` and `user`.
    pub fn connect(config: &TransportConfig) -> TransportResult<Self> {
        let backend = match config.mode {
            TransportMode::Simulated => Backend::Simulated(SimulatedDevice::new()),
            TransportMode::LineSerial => {
                let port = config.port.as_deref().ok_or_else(|| {
                    TransportError::config("port is required for mode 'line_serial'")
                })?;
                let chan = SerialChannel::open(port, config.baud)?;
                Backend::LineSerial(LineSerial::new(chan, config.timeout()))
            }
            TransportMode::PromptSerial => {
                let port = config.port.as_deref().ok_or_else(|| {
                    TransportError::config("port is required for mode 'prompt_serial'")
                })?;
                let chan = SerialChannel::open(port, config.baud)?;
                Backend::PromptSerial(PromptSession::connect(
                    chan,
                    &config.prompt,
                    config.timeout(),
                    LineEnding::CrLf,
                )?)
            }
            TransportMode::PromptSsh => {
                let (host, user) = match (config.host.as_deref(), config.user.as_deref()) {
                    (Some(h), Some(u)) => (h, u),
                    _ => {
                        return Err(TransportError::config(
                            "host and user are required for mode 'prompt_ssh'",
                        ))
                    }
                };
                let chan = SshChannel::connect(
                    host,
                    user,
                    config.password.as_deref(),
                    config.key_file.as_deref(),
                    config.timeout(),
                )?;
                Backend::PromptSsh(PromptSession::connect(
                    chan,
                    &config.prompt,
                    config.timeout(),
                    LineEnding::Lf,
                )?)
            }
        };
        Ok(Self { backend })
    }

    /// Send one command and return the unified `(Status, payload)` response.
    ///
    /// Blank commands are rejected up front without touching the backend.
    /// Timeouts and channel failures surface as `Err`; callers that want the
    /// log-and-continue policy flatten them into an ERROR response.
    pub fn send(&mut self, command: &str) -> TransportResult<Response> {
        if command.trim().is_empty() {
            return Ok(Response::error("invalid command"));
        }
        match &mut self.backend {
            Backend::Simulated(dev) => Ok(dev.handle(command)),
            Backend::LineSerial(link) => link.send(command),
            Backend::PromptSerial(session) => session.send(command),
            Backend::PromptSsh(session) => session.send(command),
        }
    }

    // Convenience accessors for the fixed diagnostic vocabulary.
    pub fn ping(&mut self) -> TransportResult<Response> {
        self.send("ping")
    }

    pub fn read_voltage(&mut self) -> TransportResult<Response> {
        self.send("read_voltage")
    }

    pub fn read_temperature(&mut self) -> TransportResult<Response> {
        self.send("read_temperature")
    }

    pub fn read_current(&mut self) -> TransportResult<Response> {
        self.send("read_current")
    }

    pub fn read_status(&mut self) -> TransportResult<Response> {
        self.send("read_status")
    }

    pub fn reset_device(&mut self) -> TransportResult<Response> {
        self.send("reset_device")
    }

    /// Release the underlying handle. Idempotent; never fails.
    pub fn close(&mut self) {
        match &mut self.backend {
            Backend::Simulated(_) => {}
            Backend::LineSerial(link) => link.close(),
            Backend::PromptSerial(session) => session.close(),
            Backend::PromptSsh(session) => session.close(),
        }
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match &self.backend {
            Backend::Simulated(_) => "simulated",
            Backend::LineSerial(_) => "line_serial",
            Backend::PromptSerial(_) => "prompt_serial",
            Backend::PromptSsh(_) => "prompt_ssh",
        };
        f.debug_struct("Transport").field("mode", &mode).finish()
    }
}
