//! Settings and events exchanged with the host framework.
//!
//! These types carry what the host hands to the platform when it configures
//! devices or installs rules, and what the platform reports back.

use lisy_core::{HardwareProfile, SwitchNumber};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Snapshot of switch states keyed by matrix address.
pub type SwitchStates = HashMap<SwitchNumber, bool>;

/// How to pulse a driver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PulseSettings {
    /// Requested power (0.0-1.0). LISY always pulses at full power.
    pub power: f32,

    /// Pulse length in milliseconds.
    pub duration: u32,
}

impl PulseSettings {
    /// Full-power pulse of `duration` milliseconds.
    pub fn new(duration: u32) -> Self {
        Self {
            power: 1.0,
            duration,
        }
    }
}

/// How to hold a driver after its initial pulse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoldSettings {
    /// Requested hold power (0.0-1.0). Ignored by LISY.
    pub power: f32,
}

impl Default for HoldSettings {
    fn default() -> Self {
        Self { power: 1.0 }
    }
}

/// Host-side switch configuration, passed through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchConfig {
    pub name: String,
    pub invert: bool,
    pub debounce: bool,
}

/// Host-side driver configuration, passed through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverConfig {
    pub name: String,
    pub default_pulse_ms: Option<u32>,
}

/// Switch side of a hardware rule request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchSettings {
    pub number: String,
    pub invert: bool,
    pub debounce: bool,
}

/// Driver side of a hardware rule request.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverSettings {
    pub number: String,
    pub pulse_settings: Option<PulseSettings>,
    pub hold_settings: Option<HoldSettings>,
    pub recycle: bool,
}

/// A single addressable channel of a light.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightChannel {
    pub number: String,
}

/// A switch changed state on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchEvent {
    /// Matrix address of the switch.
    pub number: SwitchNumber,

    /// New state (true = active/closed).
    pub active: bool,

    /// Name of the platform that reported the change.
    pub source: &'static str,
}

/// Event sent from the platform to the host.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum PlatformEvent {
    /// A switch changed state.
    SwitchChanged(SwitchEvent),

    /// The poll loop stopped on an error. No further events follow.
    PollFailed {
        /// Error message.
        error: String,
    },
}

/// Firmware identification strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareInfo {
    pub lisy_version: String,
    pub api_version: String,
}

/// What the handshake learned about the board.
#[derive(Debug, Clone, PartialEq)]
pub struct HandshakeOutcome {
    pub profile: HardwareProfile,
    pub switches: SwitchStates,
}
