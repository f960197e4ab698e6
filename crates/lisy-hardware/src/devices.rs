//! Device handles handed out by [`LisyPlatform`](crate::LisyPlatform).
//!
//! Every handle except [`LisySwitch`] shares the platform's
//! [`Connection`] and sends its commands through it, so device calls and
//! the poll loop never interleave inside a request/response pair.

use crate::error::Result;
use crate::traits::{
    DriverPlatformInterface, LightPlatformInterface, SegmentDisplayPlatformInterface,
    SwitchPlatformInterface,
};
use crate::types::{DriverConfig, HoldSettings, PulseSettings, SwitchConfig};
use lisy_core::constants::BOARD_NAME;
use lisy_core::{PulseTime, SwitchNumber};
use lisy_network::Connection;
use lisy_protocol::Command;
use std::sync::Arc;
use tracing::debug;

/// A switch in the LISY matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LisySwitch {
    number: SwitchNumber,
    config: SwitchConfig,
}

impl LisySwitch {
    pub(crate) fn new(number: SwitchNumber, config: SwitchConfig) -> Self {
        Self { number, config }
    }
}

impl SwitchPlatformInterface for LisySwitch {
    fn number(&self) -> SwitchNumber {
        self.number
    }

    fn config(&self) -> &SwitchConfig {
        &self.config
    }
}

/// A solenoid.
///
/// The board keeps one pulse time per solenoid. The handle remembers the
/// last value it sent and only reprograms the board when a pulse asks for a
/// different duration.
#[derive(Debug)]
pub struct LisyDriver {
    number: u8,
    config: DriverConfig,
    connection: Arc<Connection>,

    /// Last pulse time acknowledged by a successful send.
    pulse_time: Option<PulseTime>,
}

impl LisyDriver {
    pub(crate) fn new(number: u8, config: DriverConfig, connection: Arc<Connection>) -> Self {
        Self {
            number,
            config,
            connection,
            pulse_time: None,
        }
    }

    /// Host configuration the driver was created with.
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Pulse time currently programmed on the board, if any.
    pub fn pulse_time(&self) -> Option<PulseTime> {
        self.pulse_time
    }

    async fn configure_pulse_time(&mut self, duration: u32) -> Result<()> {
        let pulse = PulseTime::new(duration)?;
        if self.pulse_time == Some(pulse) {
            return Ok(());
        }

        debug!(solenoid = self.number, %pulse, "Setting pulse time");
        self.connection
            .send(Command::SetSolenoidPulseTime {
                solenoid: self.number,
                pulse,
            })
            .await?;
        self.pulse_time = Some(pulse);
        Ok(())
    }
}

impl DriverPlatformInterface for LisyDriver {
    async fn pulse(&mut self, pulse_settings: PulseSettings) -> Result<()> {
        self.configure_pulse_time(pulse_settings.duration).await?;
        self.connection
            .send(Command::SolenoidPulse(self.number))
            .await?;
        Ok(())
    }

    async fn enable(
        &mut self,
        pulse_settings: PulseSettings,
        _hold_settings: HoldSettings,
    ) -> Result<()> {
        self.configure_pulse_time(pulse_settings.duration).await?;
        self.connection.send(Command::SolenoidOn(self.number)).await?;
        Ok(())
    }

    async fn disable(&mut self) -> Result<()> {
        self.connection
            .send(Command::SolenoidOff(self.number))
            .await?;
        Ok(())
    }

    fn number(&self) -> u8 {
        self.number
    }

    fn board_name(&self) -> &str {
        BOARD_NAME
    }
}

/// A lamp. LISY lamps are on/off only.
#[derive(Debug)]
pub struct LisyLight {
    number: u8,
    connection: Arc<Connection>,
}

impl LisyLight {
    pub(crate) fn new(number: u8, connection: Arc<Connection>) -> Self {
        Self { number, connection }
    }
}

impl LightPlatformInterface for LisyLight {
    async fn set_brightness(&mut self, brightness: f32) -> Result<()> {
        let command = if brightness > 0.0 {
            Command::LampOn(self.number)
        } else {
            Command::LampOff(self.number)
        };
        self.connection.send(command).await?;
        Ok(())
    }

    fn number(&self) -> u8 {
        self.number
    }
}

/// A segment display.
#[derive(Debug)]
pub struct LisyDisplay {
    number: u8,
    connection: Arc<Connection>,
}

impl LisyDisplay {
    pub(crate) fn new(number: u8, connection: Arc<Connection>) -> Self {
        Self { number, connection }
    }
}

impl SegmentDisplayPlatformInterface for LisyDisplay {
    async fn set_text(&mut self, text: &str) -> Result<()> {
        self.connection
            .send(Command::SetDisplay {
                display: self.number,
                text: text.to_string(),
            })
            .await?;
        Ok(())
    }

    fn number(&self) -> u8 {
        self.number
    }
}
