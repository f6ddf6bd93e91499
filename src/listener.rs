//! TCP accept loop
//!
//! Accepts connections, wraps each one in a `Session` and hands it to the
//! ChatServer actor, which owns everything from there on.

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::error::AppError;
use crate::server::{ChatServer, ServerCommand};
use crate::session::Session;

/// Pause before retrying after a failed accept (e.g. fd exhaustion)
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Listening endpoint of the relay
pub struct Listener {
    listener: TcpListener,
}

impl Listener {
    pub fn new(listener: TcpListener) -> Self {
        Self { listener }
    }

    /// Bind a new listener on `addr`
    pub async fn bind(addr: SocketAddr) -> Result<Self, AppError> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self::new(listener))
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Start the ChatServer actor and accept connections until `shutdown` resolves
    ///
    /// Accept failures are logged and retried; they never end the loop.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), AppError>
    where
        F: Future<Output = ()> + Send,
    {
        let (server, cmd_tx) = ChatServer::channel();
        tokio::spawn(server.run());

        info!("Chat relay listening on {}", self.local_addr()?);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Listener shutting down");
                    break;
                }
                result = self.listener.accept() => match result {
                    Ok((stream, peer)) => accept_session(stream, peer, &cmd_tx)?,
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                        if backoff(shutdown.as_mut()).await {
                            info!("Listener shutting down");
                            break;
                        }
                    }
                },
            }
        }

        Ok(())
    }

    /// Accept connections until Ctrl-C
    pub async fn run_until_ctrl_c(self) -> Result<(), AppError> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to install Ctrl-C handler: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }
}

/// Wait out the accept backoff
///
/// Returns true if `shutdown` resolved while waiting.
async fn backoff<F>(shutdown: Pin<&mut F>) -> bool
where
    F: Future<Output = ()>,
{
    tokio::select! {
        _ = shutdown => true,
        _ = tokio::time::sleep(ACCEPT_BACKOFF) => false,
    }
}

/// Wrap an accepted stream and register it with the actor
fn accept_session(
    stream: TcpStream,
    peer: SocketAddr,
    cmd_tx: &mpsc::UnboundedSender<ServerCommand>,
) -> Result<(), AppError> {
    info!("New connection from {}", peer);

    if let Err(e) = stream.set_nodelay(true) {
        warn!("Failed to set TCP_NODELAY for {}: {}", peer, e);
    }

    let session = Session::new(stream, peer.to_string());
    cmd_tx
        .send(ServerCommand::Connect { session })
        .map_err(|_| AppError::ServerClosed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let listener = Listener::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn test_run_until_returns_on_shutdown() {
        let listener = Listener::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let result = listener.run_until(async {}).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_backoff_cut_short_by_shutdown() {
        let shutdown = std::future::ready(());
        tokio::pin!(shutdown);
        let result =
            tokio::time::timeout(ACCEPT_BACKOFF / 2, backoff(shutdown.as_mut())).await;
        assert_eq!(result.ok(), Some(true));
    }

    #[tokio::test]
    async fn test_backoff_elapses_without_shutdown() {
        let shutdown = std::future::pending::<()>();
        tokio::pin!(shutdown);
        assert!(!backoff(shutdown.as_mut()).await);
    }
}
