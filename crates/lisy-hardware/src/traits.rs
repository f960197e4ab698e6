//! Platform capability trait definitions.
//!
//! A pinball host drives many interchangeable hardware backends. These
//! traits are the contract between the host and one backend: device traits
//! (`*PlatformInterface`) describe a single configured switch, driver,
//! light or display, and platform traits (`*Platform`) describe the
//! factories that validate a device number and hand back such a device.
//!
//! LISY implements every trait here through [`LisyPlatform`](crate::LisyPlatform).
//!
//! Device operations that talk to the board use native `async fn` methods
//! (Rust 1.90 + Edition 2024 RPITIT). Configuration is synchronous: it only
//! validates numbers against the hardware profile and never sends bytes.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::types::{
    DriverConfig, DriverSettings, HoldSettings, LightChannel, PulseSettings, SwitchConfig,
    SwitchSettings, SwitchStates,
};
use lisy_core::SwitchNumber;

/// A configured switch.
///
/// Switches are identity holders. Their live state is owned by the
/// platform and read through [`SwitchPlatform::hw_switch_states`].
pub trait SwitchPlatformInterface: Send + Sync {
    /// Matrix address of the switch.
    fn number(&self) -> SwitchNumber;

    /// Host configuration the switch was created with.
    fn config(&self) -> &SwitchConfig;
}

/// A configured driver (solenoid or other coil).
///
/// # Examples
///
/// ```no_run
/// use lisy_hardware::traits::DriverPlatformInterface;
/// use lisy_hardware::types::PulseSettings;
/// use lisy_hardware::Result;
///
/// async fn kick<D: DriverPlatformInterface>(coil: &mut D) -> Result<()> {
///     coil.pulse(PulseSettings::new(30)).await
/// }
/// ```
pub trait DriverPlatformInterface: Send + Sync {
    /// Pulse the driver once.
    ///
    /// # Errors
    ///
    /// Returns an error if the duration cannot be encoded or the command
    /// cannot be sent.
    async fn pulse(&mut self, pulse_settings: PulseSettings) -> Result<()>;

    /// Pulse, then keep the driver energized until [`disable`](Self::disable).
    ///
    /// # Errors
    ///
    /// Returns an error if the duration cannot be encoded or the command
    /// cannot be sent.
    async fn enable(&mut self, pulse_settings: PulseSettings, hold_settings: HoldSettings)
    -> Result<()>;

    /// Release the driver.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be sent.
    async fn disable(&mut self) -> Result<()>;

    /// Hardware number of the driver.
    fn number(&self) -> u8;

    /// Name of the board the driver lives on.
    fn board_name(&self) -> &str;
}

/// A configured light.
pub trait LightPlatformInterface: Send + Sync {
    /// Set the brightness (0.0-1.0).
    ///
    /// Backends without dimming switch the light on for any value above
    /// zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be sent.
    async fn set_brightness(&mut self, brightness: f32) -> Result<()>;

    /// Hardware number of the light.
    fn number(&self) -> u8;
}

/// A configured segment display.
pub trait SegmentDisplayPlatformInterface: Send + Sync {
    /// Show `text` on the display.
    ///
    /// # Errors
    ///
    /// Returns an error if the text cannot be encoded or the command cannot
    /// be sent.
    async fn set_text(&mut self, text: &str) -> Result<()>;

    /// Index of the display.
    fn number(&self) -> u8;
}

/// Factory and state source for switches.
pub trait SwitchPlatform {
    type Switch: SwitchPlatformInterface;

    /// Validate `number` and create a switch.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `number` is not a matrix address.
    fn configure_switch(&self, number: &str, config: SwitchConfig) -> Result<Self::Switch>;

    /// Current state of every switch the platform knows.
    fn hw_switch_states(&self) -> SwitchStates;
}

/// Factory for drivers and the hardware rule interface.
///
/// Hardware rules let a board fire a coil on its own when a switch closes
/// (flippers, slingshots). Backends that cannot do this must reject every
/// rule call with an error rather than accept it silently.
pub trait DriverPlatform {
    type Driver: DriverPlatformInterface;

    /// Validate `number` and create a driver.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `number` is not a driver on this
    /// hardware.
    fn configure_driver(&self, number: &str, config: DriverConfig) -> Result<Self::Driver>;

    /// Pulse `coil` whenever `enable_switch` activates.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend has no hardware rules.
    fn set_pulse_on_hit_rule(&self, enable_switch: &SwitchSettings, coil: &DriverSettings)
    -> Result<()>;

    /// Pulse `coil` on activation and cut it on release.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend has no hardware rules.
    fn set_pulse_on_hit_and_release_rule(
        &self,
        enable_switch: &SwitchSettings,
        coil: &DriverSettings,
    ) -> Result<()>;

    /// Pulse then hold `coil` while `enable_switch` is active.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend has no hardware rules.
    fn set_pulse_on_hit_and_enable_and_release_rule(
        &self,
        enable_switch: &SwitchSettings,
        coil: &DriverSettings,
    ) -> Result<()>;

    /// Pulse then hold `coil` until `enable_switch` releases or
    /// `disable_switch` activates.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend has no hardware rules.
    fn set_pulse_on_hit_and_enable_and_release_and_disable_rule(
        &self,
        enable_switch: &SwitchSettings,
        disable_switch: &SwitchSettings,
        coil: &DriverSettings,
    ) -> Result<()>;

    /// Remove any rule linking `switch` and `coil`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend has no hardware rules.
    fn clear_hw_rule(&self, switch: &SwitchSettings, coil: &DriverSettings) -> Result<()>;
}

/// Factory for lights.
pub trait LightsPlatform {
    type Light: LightPlatformInterface;

    /// Validate `number` and create a light.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `number` is not a lamp on this
    /// hardware.
    fn configure_light(&self, number: &str, subtype: Option<&str>) -> Result<Self::Light>;

    /// Split a light number into the channels it drives.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `number` is malformed.
    fn parse_light_number_to_channels(
        &self,
        number: &str,
        subtype: Option<&str>,
    ) -> Result<Vec<LightChannel>>;
}

/// Factory for segment displays.
pub trait SegmentDisplayPlatform {
    type Display: SegmentDisplayPlatformInterface;

    /// Validate `number` and create a segment display.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `number` is not a display on this
    /// hardware.
    fn configure_segment_display(&self, number: &str) -> Result<Self::Display>;
}
