//! Transport layer for LISY boards.
//!
//! This crate opens the serial or TCP link to a board and wraps it in a
//! [`Connection`] that serializes request/response pairs over the
//! [`LisyCodec`](lisy_protocol::LisyCodec).
//!
//! # Components
//!
//! - **TransportConfig / transport::open**: serial port or TCP socket
//! - **Connection**: locked send and send-then-read access to the board
//!
//! # Example
//!
//! ```no_run
//! use lisy_network::{Connection, TransportConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TransportConfig::serial("/dev/ttyUSB0", 115_200);
//! let connection = Connection::open(&config).await?;
//! # Ok(())
//! # }
//! ```

mod connection;
pub mod transport;

pub use connection::Connection;
pub use transport::{BoxedStream, ByteStream, TransportConfig};

use thiserror::Error;

/// Errors that can occur on a LISY connection
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Connection is closed or was never opened
    #[error("Not connected to LISY")]
    NotConnected,

    /// Connection attempt timed out
    #[error("Connection timeout after {0}ms")]
    ConnectionTimeout(u64),

    /// Peer closed the connection during an operation
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// Serial port could not be opened
    #[error("Serial port error: {0}")]
    Serial(String),

    /// Command expects a reply but was sent without reading one
    #[error("Command {0} expects a reply")]
    ReplyExpected(String),

    /// Command has no reply but a reply was requested
    #[error("Command {0} has no reply")]
    NoReplyExpected(String),

    /// Protocol-level error from LisyCodec
    #[error("Protocol error: {0}")]
    Protocol(#[from] lisy_core::Error),

    /// Low-level I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConnectionError {
    /// Whether the link itself is gone (as opposed to a rejected command).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::NotConnected
                | Self::ConnectionTimeout(_)
                | Self::ConnectionLost(_)
                | Self::Serial(_)
                | Self::Io(_)
        )
    }
}
