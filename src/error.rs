//! Transport-level error types.
//!
//! Defines the errors a transport backend can raise, separate from the
//! `(Status, payload)` results a device itself produces. Per-step device
//! failures travel inside [`crate::transport::Response`]; this type is for
//! the channel underneath it.

use thiserror::Error;

/// Errors that can occur while constructing or driving a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// A required connection parameter is missing or invalid.
    ///
    /// Raised at construction time only; construction fails fast and leaves
    /// no partially-open handle behind.
    #[error("Configuration error: {0}")]
    Config(String),

    /// No response (or no prompt) within the configured bound.
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// An I/O error occurred on the underlying channel.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A serialport-specific error occurred.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// An SSH-layer error occurred (handshake, auth, channel setup).
    #[error("SSH error: {0}")]
    Ssh(#[from] ssh2::Error),
}

impl TransportError {
    /// Create a Config error from a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a Timeout error from a duration.
    pub fn timeout(duration: std::time::Duration) -> Self {
        Self::Timeout(duration)
    }

    /// True if this error is a timeout rather than a channel failure.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// A specialized `Result` type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TransportError::config("port is required for mode 'line_serial'");
        assert_eq!(
            err.to_string(),
            "Configuration error: port is required for mode 'line_serial'"
        );
    }

    #[test]
    fn test_timeout_error() {
        let duration = std::time::Duration::from_millis(500);
        let err = TransportError::timeout(duration);
        assert!(err.is_timeout());
        assert!(err.to_string().contains("500ms"));
    }

    #[test]
    fn test_io_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        let err: TransportError = io_err.into();
        assert!(!err.is_timeout());
        assert!(matches!(err, TransportError::Io(_)));
    }
}
