//! Byte-stream transports to a LISY board.
//!
//! A board is reached either over a serial line or over TCP (the LISY
//! network server). Both end up as the same boxed [`ByteStream`] so the
//! [`Connection`](crate::Connection) above does not care which one it got.

use crate::ConnectionError;
use std::fmt;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_serial::SerialPortBuilderExt;
use tracing::{info, warn};

/// Default timeout for establishing a network connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(3000);

/// Ordered, reliable, bidirectional byte stream.
pub trait ByteStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T> ByteStream for T where T: AsyncRead + AsyncWrite + Send + Unpin {}

/// Type-erased transport stream.
pub type BoxedStream = Box<dyn ByteStream>;

/// Where the board is and how to reach it.
///
/// # Example
///
/// ```
/// use lisy_network::TransportConfig;
///
/// let serial = TransportConfig::serial("/dev/ttyUSB0", 115_200);
/// assert_eq!(serial.to_string(), "/dev/ttyUSB0 at 115200bps");
///
/// let network = TransportConfig::network("lisy.local", 5963);
/// assert_eq!(network.to_string(), "lisy.local:5963");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportConfig {
    /// Serial port with baud rate.
    Serial { port: String, baud: u32 },

    /// TCP host and port.
    Network { host: String, port: u16 },
}

impl TransportConfig {
    pub fn serial(port: impl Into<String>, baud: u32) -> Self {
        Self::Serial {
            port: port.into(),
            baud,
        }
    }

    pub fn network(host: impl Into<String>, port: u16) -> Self {
        Self::Network {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serial { port, baud } => write!(f, "{port} at {baud}bps"),
            Self::Network { host, port } => write!(f, "{host}:{port}"),
        }
    }
}

/// Open the transport described by `config`.
///
/// Network connections are bounded by `connect_timeout`; serial ports
/// open synchronously.
///
/// # Errors
///
/// Returns an error if the serial port cannot be opened, the host refuses
/// or does not answer in time, or the address does not resolve.
pub async fn open(
    config: &TransportConfig,
    connect_timeout: Duration,
) -> Result<BoxedStream, ConnectionError> {
    info!("Connecting to {}", config);

    match config {
        TransportConfig::Serial { port, baud } => {
            let stream = tokio_serial::new(port.as_str(), *baud)
                .open_native_async()
                .map_err(|e| ConnectionError::Serial(format!("{port}: {e}")))?;
            Ok(Box::new(stream))
        }
        TransportConfig::Network { host, port } => {
            let stream = match tokio::time::timeout(
                connect_timeout,
                TcpStream::connect((host.as_str(), *port)),
            )
            .await
            {
                Ok(Ok(stream)) => stream,
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => {
                    warn!(
                        "Connection timeout after {}ms",
                        connect_timeout.as_millis()
                    );
                    return Err(ConnectionError::ConnectionTimeout(
                        connect_timeout.as_millis() as u64,
                    ));
                }
            };

            // Every poll cycle is a one-byte request; Nagle would batch them.
            if let Err(e) = stream.set_nodelay(true) {
                warn!("Failed to set TCP_NODELAY: {} - polling latency may suffer", e);
            }

            Ok(Box::new(stream))
        }
    }
}
