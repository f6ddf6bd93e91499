//! TCP Chat Relay Library
//!
//! A newline-delimited text relay: every line a client sends is broadcast,
//! prefixed with the sender's address, to every connected client.
//!
//! # Features
//! - Private welcome on connect
//! - Join notice to everyone already connected
//! - Leave notice, exactly once per closed connection
//! - Per-connection FIFO output queue
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatServer` is the central actor owning the session registry
//! - Each connection is a `Session` task with one reader and one writer
//! - No locks on the registry - all membership changes go through message passing
//!
//! # Example
//! ```ignore
//! use chat_relay::Listener;
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = Listener::bind("127.0.0.1:15001".parse().unwrap()).await.unwrap();
//!     listener.run_until_ctrl_c().await.unwrap();
//! }
//! ```

pub mod cli;
pub mod error;
pub mod listener;
pub mod message;
pub mod server;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use cli::Cli;
pub use error::{AppError, TransportError};
pub use listener::Listener;
pub use server::{ChatServer, ServerCommand};
pub use session::{Session, SessionHandle};
pub use types::{SessionId, SessionState, Transport};
