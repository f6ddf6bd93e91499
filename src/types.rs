//! Basic type definitions for the chat relay
//!
//! Provides newtype wrappers and the transport seam:
//! - `SessionId`: UUID-based unique session identifier
//! - `SessionState`: lifecycle of a session
//! - `Transport`: any bidirectional byte stream a session can own

use tokio::io::{AsyncRead, AsyncWrite};
use uuid::Uuid;

/// Unique session identifier (newtype pattern)
///
/// Wraps a UUID v4 for type-safe session identification.
/// Used as the registry key, so removal handlers only ever hold an id
/// and never a strong reference to the session itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random session ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session lifecycle
///
/// `Active` until the first transport failure, `Closing` until the
/// registry has dropped it, then `Closed` for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Closing,
    Closed,
}

/// Byte stream a session takes exclusive ownership of
pub trait Transport: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

impl<T> Transport for T where T: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_unique() {
        let id1 = SessionId::new();
        let id2 = SessionId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_session_id_display_is_uuid() {
        let id = SessionId::new();
        assert_eq!(id.to_string(), id.0.to_string());
    }

    #[test]
    fn test_duplex_is_transport() {
        fn assert_transport<T: Transport>(_: &T) {}
        let (a, _b) = tokio::io::duplex(16);
        assert_transport(&a);
    }
}
