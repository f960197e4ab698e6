//! Serialized request/response access to a LISY board.
//!
//! The LISY protocol has no framing or request ids: a reply is matched to
//! its request purely by order. `Connection` therefore keeps the framed
//! stream behind one async mutex and holds it for the whole
//! send-then-read of every [`request`](Connection::request), so the switch
//! poll task and device commands can share the board without ever
//! interleaving inside a pair.
//!
//! # Architecture
//!
//! ```text
//! Poll task ─────┐
//!                ├─> Mutex<Framed<BoxedStream, LisyCodec>> ──> serial / TCP
//! Device handles ┘
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use lisy_network::{Connection, TransportConfig};
//! use lisy_protocol::Command;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TransportConfig::network("127.0.0.1", 5963);
//! let connection = Connection::open(&config).await?;
//!
//! let code = connection.request(Command::Reset).await?.into_byte()?;
//! assert_eq!(code, 0);
//!
//! connection.send(Command::LampOn(3)).await?;
//! connection.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Failure Handling
//!
//! - **No automatic retry**: the caller decides.
//! - **No per-command timeout**: a board that stops answering blocks every
//!   user of the connection.
//! - **Fail closed**: after a transport error the stream is dropped and
//!   later calls fail with [`ConnectionError::NotConnected`].
//! - **Abandoned requests**: a [`request`](Connection::request) future
//!   dropped between its write and its reply leaves an unread reply on the
//!   wire, so the stream is dropped as well.

use crate::transport::{self, BoxedStream, ByteStream, DEFAULT_CONNECT_TIMEOUT, TransportConfig};
use crate::ConnectionError;
use futures::{SinkExt, StreamExt};
use lisy_protocol::{Command, LisyCodec, Response};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::codec::Framed;
use tracing::{debug, error, info, warn};

type FramedStream = Framed<BoxedStream, LisyCodec>;

/// Shared connection to one LISY board.
pub struct Connection {
    /// Human-readable peer description for logs.
    peer: String,

    /// Framed stream (None once closed or failed).
    framed: Mutex<Option<FramedStream>>,

    /// Set by [`abort`](Connection::abort); the stream is dropped on next use.
    aborted: AtomicBool,
}

/// One request/response pair holding the connection lock.
///
/// Dropping it before `settled` is set drops the stream.
struct InFlight<'a> {
    slot: MutexGuard<'a, Option<FramedStream>>,
    peer: &'a str,
    settled: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled && self.slot.take().is_some() {
            warn!(
                "Request to {} abandoned before its reply, closing connection",
                self.peer
            );
        }
    }
}

impl Connection {
    /// Open the transport described by `config`.
    ///
    /// # Errors
    ///
    /// See [`transport::open`].
    pub async fn open(config: &TransportConfig) -> Result<Self, ConnectionError> {
        Self::open_with_timeout(config, DEFAULT_CONNECT_TIMEOUT).await
    }

    /// Open the transport with a custom network connect timeout.
    ///
    /// # Errors
    ///
    /// See [`transport::open`].
    pub async fn open_with_timeout(
        config: &TransportConfig,
        connect_timeout: Duration,
    ) -> Result<Self, ConnectionError> {
        let stream = transport::open(config, connect_timeout).await?;
        info!("Connected to {}", config);
        Ok(Self::from_boxed(stream, config.to_string()))
    }

    /// Wrap an already-open byte stream.
    ///
    /// Used with in-memory pipes in tests and by callers that set up their
    /// own transport.
    ///
    /// # Example
    ///
    /// ```
    /// use lisy_network::Connection;
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let (host, _board) = tokio::io::duplex(64);
    /// let connection = Connection::from_stream(host, "duplex");
    /// assert!(connection.is_open().await);
    /// # }
    /// ```
    pub fn from_stream(stream: impl ByteStream + 'static, peer: impl Into<String>) -> Self {
        Self::from_boxed(Box::new(stream), peer.into())
    }

    fn from_boxed(stream: BoxedStream, peer: String) -> Self {
        Self {
            peer,
            framed: Mutex::new(Some(Framed::new(stream, LisyCodec::new()))),
            aborted: AtomicBool::new(false),
        }
    }

    /// Lock the stream slot, dropping the stream if the connection was aborted.
    async fn lock(&self) -> MutexGuard<'_, Option<FramedStream>> {
        let mut guard = self.framed.lock().await;
        if self.aborted.load(Ordering::Acquire) && guard.take().is_some() {
            debug!("Dropped aborted connection to {}", self.peer);
        }
        guard
    }

    /// Peer description (port or host:port).
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Send a command that has no reply.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is closed, the command expects a
    /// reply (use [`request`](Self::request) instead), or the write fails.
    pub async fn send(&self, command: Command) -> Result<(), ConnectionError> {
        if command.expected_response().is_some() {
            return Err(ConnectionError::ReplyExpected(command.to_string()));
        }

        let mut guard = self.lock().await;
        let framed = guard.as_mut().ok_or(ConnectionError::NotConnected)?;

        debug!(%command, "Sending");
        match framed.send(command).await {
            Ok(()) => Ok(()),
            Err(e) => Err(Self::fail(&mut guard, e)),
        }
    }

    /// Send a command and wait for its reply.
    ///
    /// The connection stays locked from the write until the reply has been
    /// decoded. There is no timeout. If the returned future is dropped
    /// before the reply is decoded, the connection is closed.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is closed, the command has no
    /// reply, the write or read fails, or the peer closes the stream.
    pub async fn request(&self, command: Command) -> Result<Response, ConnectionError> {
        if command.expected_response().is_none() {
            return Err(ConnectionError::NoReplyExpected(command.to_string()));
        }

        let slot = self.lock().await;
        if slot.is_none() {
            return Err(ConnectionError::NotConnected);
        }
        let mut pair = InFlight {
            slot,
            peer: &self.peer,
            settled: false,
        };
        let framed = pair.slot.as_mut().ok_or(ConnectionError::NotConnected)?;

        debug!(%command, "Requesting");
        if let Err(e) = framed.send(command).await {
            pair.settled = true;
            return Err(Self::fail(&mut pair.slot, e));
        }

        let reply = framed.next().await;
        pair.settled = true;
        match reply {
            Some(Ok(response)) => {
                debug!(?response, "Received");
                Ok(response)
            }
            Some(Err(e)) => Err(Self::fail(&mut pair.slot, e)),
            None => {
                warn!("Connection closed by {}", self.peer);
                pair.slot.take();
                Err(ConnectionError::ConnectionLost(format!(
                    "{} closed the connection",
                    self.peer
                )))
            }
        }
    }

    /// Whether the stream is still open.
    pub async fn is_open(&self) -> bool {
        self.lock().await.is_some()
    }

    /// Close the connection without waiting.
    ///
    /// For use from `Drop`. The stream is dropped now if it is idle,
    /// otherwise by the next caller to lock it; nothing is flushed.
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::Release);
        if let Ok(mut slot) = self.framed.try_lock() {
            if slot.take().is_some() {
                info!("Aborted connection to {}", self.peer);
            }
        }
    }

    /// Close the connection.
    ///
    /// Idempotent. Flush and shutdown are each bounded to 500ms so a dead
    /// link cannot hang the close.
    ///
    /// # Errors
    ///
    /// Never fails today; problems during close are logged.
    pub async fn close(&self) -> Result<(), ConnectionError> {
        let Some(mut framed) = self.lock().await.take() else {
            return Ok(());
        };
        info!("Closing connection to {}", self.peer);

        let flush_timeout = Duration::from_millis(500);
        match tokio::time::timeout(flush_timeout, SinkExt::<Command>::flush(&mut framed)).await {
            Ok(Ok(())) => debug!("Flush completed successfully"),
            Ok(Err(e)) => warn!("Error flushing during close: {}", e),
            Err(_) => warn!("Flush timeout during close ({}ms)", flush_timeout.as_millis()),
        }

        let mut stream = framed.into_inner();
        let shutdown_timeout = Duration::from_millis(500);
        match tokio::time::timeout(shutdown_timeout, stream.shutdown()).await {
            Ok(Ok(())) => debug!("Shutdown completed successfully"),
            Ok(Err(e)) => warn!("Error during shutdown: {}", e),
            Err(_) => warn!(
                "Shutdown timeout during close ({}ms)",
                shutdown_timeout.as_millis()
            ),
        }

        debug!("Connection closed");
        Ok(())
    }

    /// Drop the stream after an I/O failure; keep it after a codec error.
    fn fail(guard: &mut Option<FramedStream>, error: lisy_core::Error) -> ConnectionError {
        match error {
            lisy_core::Error::Io(e) => {
                error!("Transport failure: {}", e);
                guard.take();
                ConnectionError::Io(e)
            }
            other => {
                error!("Protocol failure: {}", other);
                ConnectionError::Protocol(other)
            }
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("peer", &self.peer)
            .finish_non_exhaustive()
    }
}
