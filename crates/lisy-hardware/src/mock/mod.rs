//! Mock hardware for testing and development.
//!
//! This module provides a simulated LISY board that can be scripted
//! programmatically without requiring physical hardware.

pub mod controller;

pub use controller::{MockController, MockControllerHandle};
