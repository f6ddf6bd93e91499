//! ChatServer Actor implementation
//!
//! The central actor that owns the session registry and performs
//! broadcast fan-out. Every registry mutation arrives as a command on one
//! mpsc channel, so membership changes are serialized without locks.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::message::{NEWCOMER, ONE_LESS, WELCOME};
use crate::session::{Session, SessionHandle};
use crate::types::SessionId;

/// Commands sent to the ChatServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// Newly accepted connection, not yet started
    Connect { session: Session },
    /// Deliver a message to every registered session
    Broadcast { message: String },
    /// Session reported a terminal transport failure
    Disconnect { session_id: SessionId },
    /// Number of registered sessions
    SessionCount { reply: oneshot::Sender<usize> },
}

/// The main ChatServer actor
///
/// Holds a handle for every live session. Session tasks talk back through
/// command senders created from a weak reference, so the actor stops once
/// the listener and every session are gone.
pub struct ChatServer {
    /// All registered sessions: SessionId -> SessionHandle
    sessions: HashMap<SessionId, SessionHandle>,
    /// Used to wire session callbacks back into this actor
    commands: mpsc::WeakUnboundedSender<ServerCommand>,
    /// Command receiver channel
    receiver: mpsc::UnboundedReceiver<ServerCommand>,
}

impl ChatServer {
    /// Create a new ChatServer with the given command channel
    pub fn new(
        commands: &mpsc::UnboundedSender<ServerCommand>,
        receiver: mpsc::UnboundedReceiver<ServerCommand>,
    ) -> Self {
        Self {
            sessions: HashMap::new(),
            commands: commands.downgrade(),
            receiver,
        }
    }

    /// Create a ChatServer together with its command sender
    pub fn channel() -> (Self, mpsc::UnboundedSender<ServerCommand>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        (Self::new(&cmd_tx, cmd_rx), cmd_tx)
    }

    /// Run the ChatServer event loop
    ///
    /// Continuously receives and processes commands until all senders are dropped.
    pub async fn run(mut self) {
        info!("ChatServer started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("ChatServer shutting down");
    }

    /// Process a single command
    fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Connect { session } => self.handle_connect(session),
            ServerCommand::Broadcast { message } => self.broadcast(&message),
            ServerCommand::Disconnect { session_id } => {
                if !self.handle_disconnect(session_id) {
                    debug!("Ignoring repeated disconnect for {}", session_id);
                }
            }
            ServerCommand::SessionCount { reply } => {
                let _ = reply.send(self.sessions.len());
            }
        }
    }

    /// Handle a new connection
    ///
    /// The welcome is private and the newcomer notice goes out before the
    /// session is registered, so it never hears about its own arrival.
    fn handle_connect(&mut self, session: Session) {
        let Some(commands) = self.commands.upgrade() else {
            warn!("ChatServer closing, dropping session {}", session.id());
            return;
        };

        let handle = session.handle();
        let session_id = handle.id();
        info!("Session {} joined from {}", session_id, handle.peer());

        handle.post(WELCOME);
        self.broadcast(NEWCOMER);
        self.sessions.insert(session_id, handle);

        let message_tx = commands.clone();
        session.start(
            move |message| {
                let _ = message_tx.send(ServerCommand::Broadcast { message });
            },
            move || {
                let _ = commands.send(ServerCommand::Disconnect { session_id });
            },
        );

        debug!("Total sessions: {}", self.sessions.len());
    }

    /// Handle a session failure
    ///
    /// Returns true if the session was still registered. Only that first
    /// removal announces the departure.
    fn handle_disconnect(&mut self, session_id: SessionId) -> bool {
        let Some(handle) = self.sessions.remove(&session_id) else {
            return false;
        };

        handle.mark_closed();
        info!("Session {} ({}) left", session_id, handle.peer());

        self.broadcast(ONE_LESS);
        debug!("Total sessions: {}", self.sessions.len());
        true
    }

    /// Fan a message out to every registered session
    fn broadcast(&self, message: &str) {
        debug!(
            "Broadcasting {} bytes to {} sessions",
            message.len(),
            self.sessions.len()
        );

        for handle in self.sessions.values() {
            handle.post(message);
        }
    }
}
