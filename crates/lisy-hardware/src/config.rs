//! Platform configuration.
//!
//! Mirrors the host's `lisy:` configuration section and loads from JSON:
//!
//! ```json
//! {
//!   "connection": "network",
//!   "network_host": "192.168.1.40",
//!   "network_port": 5963
//! }
//! ```

use crate::error::{HardwareError, Result};
use lisy_core::constants::{DEFAULT_BAUD_RATE, DEFAULT_NETWORK_PORT, DEFAULT_POLL_INTERVAL_MS};
use lisy_network::TransportConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default capacity of the host event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 100;

/// How the board is attached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    #[default]
    Serial,
    Network,
}

/// LISY platform configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LisyConfig {
    pub connection: ConnectionKind,

    /// Serial device path.
    pub port: Option<String>,
    pub baud: u32,

    pub network_host: Option<String>,
    pub network_port: u16,

    /// Capacity of the switch event channel.
    pub event_capacity: usize,

    /// Idle time between polls that reported no change.
    pub poll_interval_ms: u64,
}

impl Default for LisyConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionKind::Serial,
            port: None,
            baud: DEFAULT_BAUD_RATE,
            network_host: None,
            network_port: DEFAULT_NETWORK_PORT,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl LisyConfig {
    /// Parse a JSON document.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| HardwareError::configuration(format!("invalid LISY config: {e}")))
    }

    /// Load a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, or a configuration
    /// error if it is malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Transport described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the serial port or network host
    /// required by `connection` is missing.
    pub fn transport(&self) -> Result<TransportConfig> {
        match self.connection {
            ConnectionKind::Serial => {
                let port = self.port.as_deref().ok_or_else(|| {
                    HardwareError::configuration("serial connection requires \"port\"")
                })?;
                Ok(TransportConfig::serial(port, self.baud))
            }
            ConnectionKind::Network => {
                let host = self.network_host.as_deref().ok_or_else(|| {
                    HardwareError::configuration("network connection requires \"network_host\"")
                })?;
                Ok(TransportConfig::network(host, self.network_port))
            }
        }
    }

    /// Runtime options for the platform.
    pub fn options(&self) -> PlatformOptions {
        PlatformOptions {
            event_capacity: self.event_capacity.max(1),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }
}

/// Runtime options of a started platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformOptions {
    pub event_capacity: usize,
    pub poll_interval: Duration,
}

impl Default for PlatformOptions {
    fn default() -> Self {
        LisyConfig::default().options()
    }
}
