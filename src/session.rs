//! Per-connection session
//!
//! A `Session` owns one client transport and sequences its reads and
//! writes. The registry only ever holds a `SessionHandle`, which can queue
//! outbound messages and observe the lifecycle but never touches the
//! transport directly.
//!
//! Inside the session task the read loop and the write loop run side by
//! side. Each loop has at most one operation in flight, and the outbound
//! queue is drained strictly in `post` order. The first failure of either
//! loop drops the other one, closing the connection, and reports the
//! error exactly once.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::TransportError;
use crate::message::{chat_line, decode_line, DELIMITER};
use crate::types::{SessionId, SessionState, Transport};

/// Registry-side view of a session
///
/// Cheap to clone. Dropping every handle does not close the connection;
/// only a transport failure does.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: SessionId,
    peer: Arc<str>,
    outbound: mpsc::UnboundedSender<String>,
    state: Arc<Mutex<SessionState>>,
}

impl SessionHandle {
    /// Unique identifier of this session
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Remote address description of the client
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        *self.lock_state()
    }

    /// Whether the session still accepts reads and writes
    pub fn is_active(&self) -> bool {
        self.state() == SessionState::Active
    }

    /// Queue a message for delivery to this client
    ///
    /// Messages are written in the order `post` is called. If the writer
    /// is idle it picks the message up immediately, otherwise once the
    /// current write completes. Returns false, dropping the message, when
    /// the session is no longer active.
    pub fn post(&self, message: impl Into<String>) -> bool {
        if !self.is_active() {
            debug!("Dropping message for inactive session {}", self.id);
            return false;
        }

        self.outbound.send(message.into()).is_ok()
    }

    /// Mark the session as closed once the registry has let go of it
    pub fn mark_closed(&self) {
        *self.lock_state() = SessionState::Closed;
    }

    /// Move from Active to Closing
    ///
    /// Returns true only for the call that performed the transition.
    fn begin_closing(&self) -> bool {
        let mut state = self.lock_state();
        if *state != SessionState::Active {
            return false;
        }
        *state = SessionState::Closing;
        true
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A client connection that has not been started yet
pub struct Session {
    handle: SessionHandle,
    transport: Box<dyn Transport>,
    outbound: mpsc::UnboundedReceiver<String>,
}

impl Session {
    /// Wrap an accepted transport
    ///
    /// `peer` is the sender identity prepended to every inbound line.
    pub fn new<T: Transport>(transport: T, peer: impl Into<String>) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let peer: String = peer.into();

        Self {
            handle: SessionHandle {
                id: SessionId::new(),
                peer: peer.into(),
                outbound: outbound_tx,
                state: Arc::new(Mutex::new(SessionState::Active)),
            },
            transport: Box::new(transport),
            outbound: outbound_rx,
        }
    }

    pub fn id(&self) -> SessionId {
        self.handle.id
    }

    /// Get a handle for posting to this session
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Spawn the session task
    ///
    /// `on_message` receives every complete inbound line, already prefixed
    /// with the peer identity. `on_error` runs once, after the connection
    /// has been closed by the first failure in either direction.
    pub fn start<M, E>(self, on_message: M, on_error: E) -> JoinHandle<()>
    where
        M: FnMut(String) + Send + 'static,
        E: FnOnce() + Send + 'static,
    {
        tokio::spawn(self.run(on_message, on_error))
    }

    async fn run<M, E>(self, mut on_message: M, on_error: E)
    where
        M: FnMut(String) + Send + 'static,
        E: FnOnce() + Send + 'static,
    {
        let Session {
            handle,
            transport,
            mut outbound,
        } = self;

        debug!("Session {} started for {}", handle.id, handle.peer);

        let (reader, writer) = tokio::io::split(transport);

        // Whichever loop finishes first drops the other along with its
        // half of the transport.
        let result = tokio::select! {
            result = read_loop(&handle, BufReader::new(reader), &mut on_message) => result,
            result = write_loop(&handle, writer, &mut outbound) => result,
        };

        match &result {
            Err(TransportError::Eof) => {
                info!("Session {} ({}) closed by peer", handle.id, handle.peer)
            }
            Err(e) => warn!("Session {} ({}) failed: {}", handle.id, handle.peer, e),
            Ok(()) => debug!("Session {} stopped", handle.id),
        }

        if handle.begin_closing() {
            on_error();
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.handle.id)
            .field("peer", &self.handle.peer)
            .finish()
    }
}

/// Read delimited lines until the transport fails
async fn read_loop<R, M>(
    handle: &SessionHandle,
    mut reader: R,
    on_message: &mut M,
) -> Result<(), TransportError>
where
    R: AsyncBufRead + Unpin,
    M: FnMut(String),
{
    let mut buffer = Vec::new();

    loop {
        let read = reader.read_until(DELIMITER, &mut buffer).await?;

        // A trailing fragment without delimiter means the peer went away mid-line
        if read == 0 || buffer.last() != Some(&DELIMITER) {
            return Err(TransportError::Eof);
        }

        // The registry may have closed us through a Disconnect sent by
        // another holder of the command channel
        if !handle.is_active() {
            return Ok(());
        }

        let line = decode_line(&buffer);
        buffer.clear();

        debug!("Session {} read {} bytes", handle.id, read);
        on_message(chat_line(handle.peer(), &line));
    }
}

/// Drain the outbound queue one write at a time
async fn write_loop<W>(
    handle: &SessionHandle,
    mut writer: W,
    outbound: &mut mpsc::UnboundedReceiver<String>,
) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = outbound.recv().await {
        // Same stray-Disconnect guard as the read loop
        if !handle.is_active() {
            break;
        }

        writer.write_all(message.as_bytes()).await?;
        writer.flush().await?;
    }

    Ok(())
}
