//! Error types for LISY platform operations.
//!
//! This module defines the failure taxonomy of the platform: protocol
//! violations during the handshake or polling, rejected hardware rules,
//! configuration-time range errors, and lost transports.

use lisy_network::ConnectionError;

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during LISY platform operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// The board sent a reply that breaks the protocol.
    #[error("Protocol violation: {message}")]
    ProtocolViolation { message: String },

    /// Operation is not supported by LISY hardware.
    #[error("Unsupported operation: {operation}")]
    Unsupported { operation: String },

    /// A device number is out of range or malformed.
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    /// A command argument cannot be encoded.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// The connection is closed (after shutdown or a transport failure).
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// The link to the board failed.
    #[error("Transport error: {0}")]
    Transport(ConnectionError),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    /// Create a new protocol violation error.
    pub fn protocol_violation(message: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            message: message.into(),
        }
    }

    /// Create a new unsupported operation error.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    /// Create a new configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    /// Create a new invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Whether the error ended the connection.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Disconnected { .. } | Self::Io(_)
        )
    }
}

impl From<lisy_core::Error> for HardwareError {
    fn from(error: lisy_core::Error) -> Self {
        match error {
            lisy_core::Error::Io(e) => Self::Io(e),
            e @ (lisy_core::Error::InvalidPulseTime(_)
            | lisy_core::Error::InvalidDisplay(_)
            | lisy_core::Error::InvalidDisplayText(_)) => Self::invalid_data(e.to_string()),
            other => Self::protocol_violation(other.to_string()),
        }
    }
}

impl From<ConnectionError> for HardwareError {
    fn from(error: ConnectionError) -> Self {
        match error {
            ConnectionError::NotConnected => Self::disconnected(lisy_core::constants::BOARD_NAME),
            ConnectionError::Protocol(e) => e.into(),
            other => Self::Transport(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_error() {
        let error = HardwareError::unsupported("set_pulse_on_hit_rule");
        assert!(matches!(error, HardwareError::Unsupported { .. }));
        assert_eq!(
            error.to_string(),
            "Unsupported operation: set_pulse_on_hit_rule"
        );
    }

    #[test]
    fn test_configuration_error() {
        let error = HardwareError::configuration("Invalid display number 9");
        assert_eq!(
            error.to_string(),
            "Configuration error: Invalid display number 9"
        );
        assert!(!error.is_transport());
    }

    #[test]
    fn test_not_connected_maps_to_disconnected() {
        let error = HardwareError::from(ConnectionError::NotConnected);
        assert!(matches!(error, HardwareError::Disconnected { .. }));
        assert_eq!(error.to_string(), "Device disconnected: LISY");
        assert!(error.is_transport());
    }

    #[test]
    fn test_codec_error_maps_to_protocol_violation() {
        let error = HardwareError::from(ConnectionError::Protocol(
            lisy_core::Error::UnsolicitedData(2),
        ));
        assert!(matches!(error, HardwareError::ProtocolViolation { .. }));
    }

    #[test]
    fn test_unencodable_argument_maps_to_invalid_data() {
        let error = HardwareError::from(ConnectionError::Protocol(
            lisy_core::Error::InvalidDisplayText("contains NUL".into()),
        ));
        assert!(matches!(error, HardwareError::InvalidData { .. }));
        assert!(!error.is_transport());
    }

    #[test]
    fn test_lost_connection_maps_to_transport() {
        let error = HardwareError::from(ConnectionError::ConnectionLost("eof".into()));
        assert!(matches!(error, HardwareError::Transport(_)));
        assert!(error.is_transport());
    }

    #[test]
    fn test_core_io_maps_to_io() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        let error = HardwareError::from(lisy_core::Error::Io(io));
        assert!(matches!(error, HardwareError::Io(_)));
    }
}
