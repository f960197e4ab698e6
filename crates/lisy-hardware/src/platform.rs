//! The LISY platform.
//!
//! [`LisyPlatform`] owns the connection to one board. Starting it runs the
//! handshake and spawns the switch poll loop; the host receives switch
//! events on the returned channel and creates device handles through the
//! platform traits.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐   SwitchChanged    ┌──────────────┐
//! │ Poll task  │───────────────────►│ Host (mpsc)  │
//! └─────┬──────┘                    └──────────────┘
//!       │ request/response
//!       ▼
//! ┌────────────┐       ┌────────────────────────────────┐
//! │ Connection │◄──────│ LisyDriver / LisyLight / ...   │
//! └────────────┘       └────────────────────────────────┘
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use lisy_hardware::{LisyConfig, LisyPlatform, PlatformEvent};
//! use lisy_hardware::traits::{DriverPlatform, DriverPlatformInterface};
//! use lisy_hardware::types::{DriverConfig, PulseSettings};
//!
//! #[tokio::main]
//! async fn main() -> lisy_hardware::Result<()> {
//!     let config = LisyConfig::load("lisy.json")?;
//!     let (mut platform, mut events) = LisyPlatform::connect(&config).await?;
//!
//!     let mut coil = platform.configure_driver("1", DriverConfig::default())?;
//!     coil.pulse(PulseSettings::new(25)).await?;
//!
//!     if let Some(PlatformEvent::SwitchChanged(event)) = events.recv().await {
//!         println!("switch {} -> {}", event.number, event.active);
//!     }
//!
//!     platform.shutdown().await
//! }
//! ```

use crate::config::{LisyConfig, PlatformOptions};
use crate::devices::{LisyDisplay, LisyDriver, LisyLight, LisySwitch};
use crate::error::{HardwareError, Result};
use crate::handshake::Handshake;
use crate::poll::PollLoop;
use crate::traits::{DriverPlatform, LightsPlatform, SegmentDisplayPlatform, SwitchPlatform};
use crate::types::{
    DriverConfig, DriverSettings, FirmwareInfo, LightChannel, PlatformEvent, SwitchConfig,
    SwitchSettings, SwitchStates,
};
use lisy_core::{HardwareProfile, SwitchNumber};
use lisy_network::Connection;
use lisy_protocol::Command;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A running LISY board.
#[derive(Debug)]
pub struct LisyPlatform {
    connection: Arc<Connection>,
    profile: HardwareProfile,

    /// Last known switch states, written only by the poll task.
    switches: Arc<RwLock<SwitchStates>>,

    cancel: CancellationToken,
    poll_task: Option<JoinHandle<Result<()>>>,
}

impl LisyPlatform {
    /// Open the transport from `config` and start the platform.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an incomplete config, a transport
    /// error if the board cannot be reached, or the handshake error.
    pub async fn connect(config: &LisyConfig) -> Result<(Self, mpsc::Receiver<PlatformEvent>)> {
        let transport = config.transport()?;
        let connection = Connection::open(&transport).await?;
        Self::initialize(connection, config.options()).await
    }

    /// Run the handshake on an open connection and start polling.
    ///
    /// The connection is closed if the handshake fails.
    ///
    /// # Errors
    ///
    /// Returns the handshake error.
    pub async fn initialize(
        connection: Connection,
        options: PlatformOptions,
    ) -> Result<(Self, mpsc::Receiver<PlatformEvent>)> {
        let connection = Arc::new(connection);

        let outcome = match Handshake::new(&connection).run().await {
            Ok(outcome) => outcome,
            Err(e) => {
                let _ = connection.close().await;
                return Err(e);
            }
        };

        let switches = Arc::new(RwLock::new(outcome.switches));
        let (tx, rx) = mpsc::channel(options.event_capacity);
        let cancel = CancellationToken::new();

        let poll_task = PollLoop::new(
            Arc::clone(&connection),
            Arc::clone(&switches),
            tx,
            options.poll_interval,
            cancel.clone(),
        )
        .spawn();

        info!(peer = connection.peer(), "LISY platform running");
        let platform = Self {
            connection,
            profile: outcome.profile,
            switches,
            cancel,
            poll_task: Some(poll_task),
        };
        Ok((platform, rx))
    }

    /// Identity and capacities reported by the board.
    pub fn profile(&self) -> HardwareProfile {
        self.profile
    }

    /// Whether the poll task is still running.
    pub fn is_polling(&self) -> bool {
        self.poll_task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Query the firmware and API version strings.
    ///
    /// # Errors
    ///
    /// Returns a transport error or a protocol violation if a reply is not
    /// a string.
    pub async fn firmware_info(&self) -> Result<FirmwareInfo> {
        let lisy_version = self.query_string(Command::GetLisyVersion).await?;
        let api_version = self.query_string(Command::GetApiVersion).await?;
        Ok(FirmwareInfo {
            lisy_version,
            api_version,
        })
    }

    async fn query_string(&self, command: Command) -> Result<String> {
        let bytes = self.connection.request(command).await?.into_string()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Stop polling and close the connection.
    ///
    /// Idempotent. Device handles created earlier fail with
    /// [`HardwareError::Disconnected`] afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be closed.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.cancel.cancel();

        if let Some(task) = self.poll_task.take() {
            match task.await {
                Ok(Ok(())) => debug!("Poll task stopped"),
                Ok(Err(e)) => warn!("Poll task had already failed: {}", e),
                Err(e) if e.is_cancelled() => debug!("Poll task cancelled"),
                Err(e) => warn!("Poll task panicked: {}", e),
            }
            info!("LISY platform shut down");
        }

        self.connection.close().await?;
        Ok(())
    }

    fn parse_index(kind: &str, number: &str) -> Result<u8> {
        number
            .trim()
            .parse()
            .map_err(|_| HardwareError::configuration(format!("Invalid {kind} number {number}")))
    }

    fn range_hint(&self, count: u8) -> String {
        if count == 0 {
            return format!("{} has none", self.profile.system_type);
        }
        let base = u16::from(self.profile.system_type.index_base());
        format!(
            "{} has {}-{}",
            self.profile.system_type,
            base,
            base + u16::from(count) - 1
        )
    }
}

impl Drop for LisyPlatform {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.connection.abort();
    }
}

impl SwitchPlatform for LisyPlatform {
    type Switch = LisySwitch;

    fn configure_switch(&self, number: &str, config: SwitchConfig) -> Result<LisySwitch> {
        let number: SwitchNumber = number
            .parse()
            .map_err(|e: lisy_core::Error| HardwareError::configuration(e.to_string()))?;
        Ok(LisySwitch::new(number, config))
    }

    fn hw_switch_states(&self) -> SwitchStates {
        self.switches.read().clone()
    }
}

impl DriverPlatform for LisyPlatform {
    type Driver = LisyDriver;

    fn configure_driver(&self, number: &str, config: DriverConfig) -> Result<LisyDriver> {
        let index = Self::parse_index("solenoid", number)?;
        if !self.profile.has_solenoid(index) {
            return Err(HardwareError::configuration(format!(
                "Invalid solenoid number {index} ({} solenoids)",
                self.range_hint(self.profile.solenoid_count)
            )));
        }
        Ok(LisyDriver::new(index, config, Arc::clone(&self.connection)))
    }

    fn set_pulse_on_hit_rule(&self, _: &SwitchSettings, _: &DriverSettings) -> Result<()> {
        Err(HardwareError::unsupported("set_pulse_on_hit_rule"))
    }

    fn set_pulse_on_hit_and_release_rule(
        &self,
        _: &SwitchSettings,
        _: &DriverSettings,
    ) -> Result<()> {
        Err(HardwareError::unsupported("set_pulse_on_hit_and_release_rule"))
    }

    fn set_pulse_on_hit_and_enable_and_release_rule(
        &self,
        _: &SwitchSettings,
        _: &DriverSettings,
    ) -> Result<()> {
        Err(HardwareError::unsupported(
            "set_pulse_on_hit_and_enable_and_release_rule",
        ))
    }

    fn set_pulse_on_hit_and_enable_and_release_and_disable_rule(
        &self,
        _: &SwitchSettings,
        _: &SwitchSettings,
        _: &DriverSettings,
    ) -> Result<()> {
        Err(HardwareError::unsupported(
            "set_pulse_on_hit_and_enable_and_release_and_disable_rule",
        ))
    }

    fn clear_hw_rule(&self, _: &SwitchSettings, _: &DriverSettings) -> Result<()> {
        Err(HardwareError::unsupported("clear_hw_rule"))
    }
}

impl LightsPlatform for LisyPlatform {
    type Light = LisyLight;

    fn configure_light(&self, number: &str, _subtype: Option<&str>) -> Result<LisyLight> {
        let index = Self::parse_index("light", number)?;
        if !self.profile.has_lamp(index) {
            return Err(HardwareError::configuration(format!(
                "Invalid light number {index} ({} lamps)",
                self.range_hint(self.profile.lamp_count)
            )));
        }
        Ok(LisyLight::new(index, Arc::clone(&self.connection)))
    }

    fn parse_light_number_to_channels(
        &self,
        number: &str,
        _subtype: Option<&str>,
    ) -> Result<Vec<LightChannel>> {
        Self::parse_index("light", number)?;
        Ok(vec![LightChannel {
            number: number.to_string(),
        }])
    }
}

impl SegmentDisplayPlatform for LisyPlatform {
    type Display = LisyDisplay;

    fn configure_segment_display(&self, number: &str) -> Result<LisyDisplay> {
        let index = Self::parse_index("display", number)?;
        if !self.profile.has_display(index) {
            return Err(HardwareError::configuration(format!(
                "Invalid display number {index} ({} displays)",
                self.profile.display_count
            )));
        }
        Ok(LisyDisplay::new(index, Arc::clone(&self.connection)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockController;
    use rstest::rstest;

    async fn start(board: MockController) -> LisyPlatform {
        let (connection, _handle) = board.spawn();
        let (platform, _events) = LisyPlatform::initialize(connection, PlatformOptions::default())
            .await
            .unwrap();
        platform
    }

    #[rstest]
    #[case("LISY1", "0", false)]
    #[case("LISY1", "1", true)]
    #[case("LISY1", "36", true)]
    #[case("LISY1", "37", false)]
    #[case("LISY80", "0", true)]
    #[case("LISY80", "35", true)]
    #[case("LISY80", "36", false)]
    #[case("LISY80", "lamp", false)]
    #[tokio::test]
    async fn test_light_ranges(#[case] identifier: &str, #[case] number: &str, #[case] ok: bool) {
        let mut platform = start(MockController::new().identifier(identifier).lamps(36)).await;
        assert_eq!(platform.configure_light(number, None).is_ok(), ok);
        platform.shutdown().await.unwrap();
    }

    #[rstest]
    #[case("LISY1", "0", false)]
    #[case("LISY1", "9", true)]
    #[case("LISY80", "0", true)]
    #[case("LISY80", "9", false)]
    #[tokio::test]
    async fn test_solenoid_ranges(
        #[case] identifier: &str,
        #[case] number: &str,
        #[case] ok: bool,
    ) {
        let mut platform = start(MockController::new().identifier(identifier).solenoids(9)).await;
        assert_eq!(platform.configure_driver(number, DriverConfig::default()).is_ok(), ok);
        platform.shutdown().await.unwrap();
    }

    #[rstest]
    #[case(5, "4", true)]
    #[case(5, "5", false)]
    #[case(9, "6", true)]
    #[case(9, "7", false)]
    #[tokio::test]
    async fn test_display_ranges(#[case] count: u8, #[case] number: &str, #[case] ok: bool) {
        let mut platform = start(MockController::new().displays(count)).await;
        assert_eq!(platform.configure_segment_display(number).is_ok(), ok);
        platform.shutdown().await.unwrap();
    }

    #[rstest]
    #[case("0", true)]
    #[case("77", true)]
    #[case("78", false)]
    #[case("80", false)]
    #[case("x1", false)]
    #[tokio::test]
    async fn test_switch_ranges(#[case] number: &str, #[case] ok: bool) {
        let mut platform = start(MockController::new()).await;
        let result = platform.configure_switch(number, SwitchConfig::default());
        match result {
            Ok(switch) => {
                assert!(ok);
                assert_eq!(
                    crate::traits::SwitchPlatformInterface::number(&switch).to_string(),
                    number
                );
            }
            Err(e) => {
                assert!(!ok);
                assert!(matches!(e, HardwareError::ConfigurationError { .. }));
            }
        }
        platform.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_light_channels() {
        let mut platform = start(MockController::new()).await;
        let channels = platform.parse_light_number_to_channels("12", None).unwrap();
        assert_eq!(
            channels,
            vec![LightChannel {
                number: "12".to_string()
            }]
        );
        assert!(platform.parse_light_number_to_channels("a", None).is_err());
        platform.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_firmware_info() {
        let mut platform = start(MockController::new().versions("5.28", "0.09")).await;
        let info = platform.firmware_info().await.unwrap();
        assert_eq!(info.lisy_version, "5.28");
        assert_eq!(info.api_version, "0.09");
        platform.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let mut platform = start(MockController::new()).await;
        assert!(platform.is_polling());

        platform.shutdown().await.unwrap();
        platform.shutdown().await.unwrap();
        assert!(!platform.is_polling());
    }
}
