//! Error types for the chat relay
//!
//! Defines per-session transport errors and application-level errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Transport errors
///
/// Always terminal for the affected session only. Never retried.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Peer closed the connection (possibly mid-line)
    #[error("connection closed by peer")]
    Eof,

    /// Reset or any other IO failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    /// Binding or listener IO failure (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The registry actor has stopped
    #[error("Chat server closed")]
    ServerClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_from_io() {
        let err: TransportError =
            std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset").into();
        assert!(matches!(err, TransportError::Io(_)));
        assert_eq!(err.to_string(), "IO error: reset");
    }

    #[test]
    fn test_app_error_display() {
        assert_eq!(AppError::ServerClosed.to_string(), "Chat server closed");
    }
}
