//! Error types for POP3 operations.

use std::io;
use std::time::Duration;

/// Result type alias for POP3 operations.
pub type Result<T> = std::result::Result<T, Error>;

/// POP3 error types.
///
/// Every variant is terminal for the operation in flight. Nothing in this
/// crate retries or reconnects on its own.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O failure on the underlying transport, including use after close.
    ///
    /// Terminal for the session.
    #[error("Transport error: {0}")]
    Transport(#[from] io::Error),

    /// Server answered with a failure status (`-ERR`).
    #[error("Server returned error: {0}")]
    Protocol(String),

    /// Server reply could not be parsed.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Caller-supplied command text cannot be sent as one line.
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Server advertised no authentication mechanism we can use.
    #[error("No supported authentication mechanism advertised")]
    AuthUnsupported,

    /// Invalid DNS name for TLS.
    #[error("Invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// Connection establishment timed out.
    #[error("Connection timed out after {0:?}")]
    Timeout(Duration),
}

impl Error {
    /// Creates a malformed-response error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    /// Error returned for any command issued after the session closed.
    #[must_use]
    pub fn closed() -> Self {
        Self::Transport(io::Error::new(
            io::ErrorKind::NotConnected,
            "session is closed",
        ))
    }

    /// Returns true if this is a transport failure.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns true if the server rejected the command.
    #[must_use]
    pub const fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }

    /// Returns true if the server reply could not be parsed.
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedResponse(_))
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_helpers() {
        assert!(Error::closed().is_transport());
        assert!(Error::Protocol("no such message".into()).is_protocol());
        assert!(Error::malformed("abc").is_malformed());
        assert!(!Error::AuthUnsupported.is_transport());
        assert!(!Error::InvalidCommand("a\r\nb".into()).is_protocol());
    }

    #[test]
    fn test_closed_kind() {
        match Error::closed() {
            Error::Transport(e) => assert_eq!(e.kind(), io::ErrorKind::NotConnected),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_display() {
        let err = Error::Protocol("no such message".into());
        assert_eq!(err.to_string(), "Server returned error: no such message");
    }
}
