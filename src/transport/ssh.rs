//! SSH PTY channel implementing [`ByteChannel`].
//!
//! Opens an SSH connection, authenticates, allocates a pseudo-terminal and
//! starts the remote shell, then switches the session to non-blocking so the
//! prompt layer can poll it like any other channel.

use std::io::{ErrorKind, Read, Write};
use std::net::TcpStream;
use std::path::Path;
use std::time::Duration;

use ssh2::Session;
use tracing::debug;

use super::channel::{closed_error, ByteChannel};
use crate::error::TransportResult;

/// Sleep between retries when a non-blocking write would block.
const WRITE_RETRY_SLEEP: Duration = Duration::from_millis(5);

/// PTY geometry requested for the remote shell.
const PTY_SIZE: (u32, u32) = (120, 40);

/// SSH-tunneled PTY shell.
pub struct SshChannel {
    session: Session,
    /// `None` once shut down.
    channel: Option<ssh2::Channel>,
    name: String,
}

impl SshChannel {
    /// Connect, authenticate and start a PTY shell on `host` as `user`.
    ///
    /// Authentication order mirrors common client behavior: explicit
    /// password, then an explicit key file, then the SSH agent.
    pub fn connect(
        host: &str,
        user: &str,
        password: Option<&str>,
        key_file: Option<&Path>,
        timeout: Duration,
    ) -> TransportResult<Self> {
        let addr = if host.contains(':') {
            host.to_string()
        } else {
            format!("{host}:22")
        };
        let tcp = TcpStream::connect(&addr)?;

        let mut session = Session::new()?;
        session.set_timeout(timeout.as_millis() as u32);
        session.set_tcp_stream(tcp);
        session.handshake()?;

        if let Some(password) = password {
            session.userauth_password(user, password)?;
        } else if let Some(key) = key_file {
            session.userauth_pubkey_file(user, None, key, None)?;
        } else {
            session.userauth_agent(user)?;
        }

        let mut channel = session.channel_session()?;
        channel.request_pty("xterm", None, Some((PTY_SIZE.0, PTY_SIZE.1, 0, 0)))?;
        channel.shell()?;

        // The prompt layer polls; reads must not block.
        session.set_blocking(false);

        let name = format!("{user}@{addr}");
        debug!(target = %name, "ssh pty shell established");
        Ok(Self {
            session,
            channel: Some(channel),
            name,
        })
    }
}

impl ByteChannel for SshChannel {
    fn read_available(&mut self, buf: &mut [u8]) -> TransportResult<usize> {
        let Some(channel) = self.channel.as_mut() else {
            return Err(closed_error(&self.name));
        };
        match channel.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&mut self, data: &[u8]) -> TransportResult<()> {
        let Some(channel) = self.channel.as_mut() else {
            return Err(closed_error(&self.name));
        };
        let mut written = 0;
        while written < data.len() {
            match channel.write(&data[written..]) {
                Ok(0) => {
                    return Err(std::io::Error::new(
                        ErrorKind::WriteZero,
                        "ssh channel refused write",
                    )
                    .into())
                }
                Ok(n) => written += n,
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    std::thread::sleep(WRITE_RETRY_SLEEP)
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn shutdown(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            // Cleanup must not fail the run; errors here are discarded.
            self.session.set_blocking(true);
            let _ = channel.close();
            let _ = channel.wait_close();
            let _ = self.session.disconnect(None, "session closed", None);
            debug!(target = %self.name, "ssh channel closed");
        }
    }
}

impl std::fmt::Debug for SshChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshChannel")
            .field("name", &self.name)
            .field("open", &self.channel.is_some())
            .finish()
    }
}
