//! Core constants for the LISY controller protocol.
//!
//! LISY boards (System 1 and System 80) speak a strict request/response
//! protocol over a serial line or TCP socket. Every request starts with a
//! single command byte, optionally followed by a payload:
//!
//! ```text
//! <CMD>                       e.g. reset, get changed switches
//! <CMD><ADDR>                 e.g. lamp on, solenoid pulse
//! <CMD><ADDR><HI><LO>         set solenoid pulse time
//! <CMD><TEXT...><NUL>         set display N
//! ```
//!
//! Replies are either a single byte or a NUL-terminated string, depending
//! on the command. Fire-and-forget commands get no reply at all.
//!
//! # Usage
//!
//! ```
//! use lisy_core::constants::*;
//!
//! assert_eq!(CMD_RESET, 100);
//! assert_eq!(CMD_SET_DISPLAY_BASE + 2, 32);
//! assert_eq!(SWITCH_STATUS_NO_CHANGE, 0b0111_1111);
//! ```
//!
//! # Protocol Compliance
//!
//! Command codes are fixed by the LISY firmware. Modifying them breaks
//! compatibility with real boards.

// ============================================================================
// Info Commands
// ============================================================================

/// Ask which LISY hardware is connected. Reply: string (`LISY1`/`LISY80`).
pub const CMD_GET_CONNECTED_HARDWARE: u8 = 0;

/// Ask for the LISY firmware version. Reply: string.
pub const CMD_GET_LISY_VERSION: u8 = 1;

/// Ask for the API version. Reply: string.
pub const CMD_GET_API_VERSION: u8 = 2;

/// Ask for the number of lamps. Reply: byte.
pub const CMD_GET_NUMBER_OF_LAMPS: u8 = 3;

/// Ask for the number of solenoids. Reply: byte.
pub const CMD_GET_NUMBER_OF_SOLENOIDS: u8 = 4;

/// Ask for the number of displays. Reply: byte.
pub const CMD_GET_NUMBER_OF_DISPLAYS: u8 = 6;

// ============================================================================
// Lamp Commands
// ============================================================================

/// Turn a lamp on. Payload: lamp number.
pub const CMD_LAMP_ON: u8 = 11;

/// Turn a lamp off. Payload: lamp number.
pub const CMD_LAMP_OFF: u8 = 12;

// ============================================================================
// Solenoid Commands
// ============================================================================

/// Energize a solenoid continuously. Payload: solenoid number.
pub const CMD_SOLENOID_ON: u8 = 21;

/// Release a solenoid. Payload: solenoid number.
pub const CMD_SOLENOID_OFF: u8 = 22;

/// Pulse a solenoid with its configured pulse time. Payload: solenoid number.
pub const CMD_SOLENOID_PULSE: u8 = 23;

/// Configure the pulse time of a solenoid.
///
/// Payload: solenoid number, then the pulse time in milliseconds split
/// into high and low bytes.
pub const CMD_SET_SOLENOID_PULSE_TIME: u8 = 24;

// ============================================================================
// Display Commands
// ============================================================================

/// Command code of "set display 0". Display `N` uses `CMD_SET_DISPLAY_BASE + N`.
///
/// # Examples
///
/// ```
/// use lisy_core::constants::{CMD_SET_DISPLAY_BASE, MAX_DISPLAYS};
///
/// let last = CMD_SET_DISPLAY_BASE + (MAX_DISPLAYS - 1);
/// assert_eq!(last, 36);
/// ```
pub const CMD_SET_DISPLAY_BASE: u8 = 30;

/// Number of "set display N" codes in the command enumeration (displays 0-6).
pub const MAX_DISPLAYS: u8 = 7;

// ============================================================================
// Switch Commands
// ============================================================================

/// Read the state of one switch. Payload: switch number. Reply: 0 or 1.
pub const CMD_GET_SWITCH_STATUS: u8 = 40;

/// Ask for the next changed switch. Reply: status byte.
///
/// See [`SWITCH_STATUS_NO_CHANGE`] and [`SWITCH_STATE_BIT`].
pub const CMD_GET_CHANGED_SWITCHES: u8 = 41;

// ============================================================================
// General Commands
// ============================================================================

/// Reset the board. Reply: 0 on success.
pub const CMD_RESET: u8 = 100;

// ============================================================================
// Replies
// ============================================================================

/// Reply to [`CMD_RESET`] that signals success.
pub const RESET_OK: u8 = 0;

/// Status byte meaning "no switch changed since the last poll".
pub const SWITCH_STATUS_NO_CHANGE: u8 = 0b0111_1111;

/// Bit of a changed-switch status byte that carries the new state.
pub const SWITCH_STATE_BIT: u8 = 0b1000_0000;

/// Bits of a changed-switch status byte that carry the switch number.
pub const SWITCH_NUMBER_MASK: u8 = 0b0111_1111;

/// Terminator of string payloads and string replies.
pub const STRING_TERMINATOR: u8 = 0x00;

/// Longest string reply accepted before a terminator must appear.
pub const MAX_STRING_RESPONSE_LENGTH: usize = 256;

/// Identifier returned by System 1 boards.
pub const HARDWARE_ID_SYSTEM_1: &[u8] = b"LISY1";

/// Identifier returned by System 80 boards.
pub const HARDWARE_ID_SYSTEM_80: &[u8] = b"LISY80";

// ============================================================================
// Switch Matrix
// ============================================================================

/// Rows in the switch matrix.
pub const SWITCH_ROWS: u8 = 8;

/// Columns in the switch matrix.
///
/// A switch number is `row * 10 + column`, so the decimal units digit is
/// always a column in `0..=7`.
pub const SWITCH_COLUMNS: u8 = 8;

/// Highest valid switch number (row 7, column 7).
pub const MAX_SWITCH_NUMBER: u8 = 77;

// ============================================================================
// Timing
// ============================================================================

/// Idle time after a "no change" poll reply, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1;

/// Default serial baud rate.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default TCP port of the LISY network server.
pub const DEFAULT_NETWORK_PORT: u16 = 5963;

/// Name reported for every LISY device handle.
pub const BOARD_NAME: &str = "LISY";
