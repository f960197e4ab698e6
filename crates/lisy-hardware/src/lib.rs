//! LISY pinball controller platform.
//!
//! This crate drives a LISY board (Gottlieb System 1 and System 80
//! replacements) for a pinball host. It runs the startup handshake, polls
//! the board for switch changes in the background, and hands out device
//! handles for solenoids, lamps and segment displays.
//!
//! # Design Philosophy
//!
//! - **Async-first**: device operations are native `async fn` in traits
//!   (Rust 1.90 + Edition 2024 RPITIT).
//! - **Serialized**: one connection is shared by the poll task and every
//!   device handle; each request/response pair runs under one lock.
//! - **Validate early**: device numbers are checked against the board's
//!   reported capacities when a device is configured, before any byte is
//!   sent.
//! - **Fail loudly**: protocol violations end the handshake or the poll
//!   loop; nothing is retried.
//!
//! # Capability Traits
//!
//! The host talks to the platform through the traits in [`traits`]:
//!
//! ```no_run
//! use lisy_hardware::traits::{LightPlatformInterface, LightsPlatform};
//! use lisy_hardware::Result;
//!
//! async fn attract<P: LightsPlatform>(platform: &P) -> Result<()> {
//!     for number in ["1", "2", "3"] {
//!         let mut lamp = platform.configure_light(number, None)?;
//!         lamp.set_brightness(1.0).await?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Switch Events
//!
//! Switch changes arrive on the channel returned by
//! [`LisyPlatform::connect`]; the current state of every switch is always
//! available from [`SwitchPlatform::hw_switch_states`](traits::SwitchPlatform::hw_switch_states).
//!
//! # Mock Implementations
//!
//! [`mock::MockController`] simulates a board over an in-memory pipe for
//! development and testing without physical hardware.

pub mod config;
pub mod devices;
pub mod error;
pub mod handshake;
pub mod mock;
pub mod platform;
pub mod poll;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use config::{ConnectionKind, LisyConfig, PlatformOptions};
pub use devices::{LisyDisplay, LisyDriver, LisyLight, LisySwitch};
pub use error::{HardwareError, Result};
pub use handshake::{Handshake, HandshakeState};
pub use platform::LisyPlatform;
pub use poll::PollLoop;
pub use types::{FirmwareInfo, PlatformEvent, SwitchEvent, SwitchStates};
