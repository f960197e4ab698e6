//! LISY command set and wire encoding.
//!
//! Every request is one command byte, optionally followed by a payload.
//! [`Command`] is the typed form; [`encode_command`] and [`encode_string`]
//! are the two raw encodings every variant reduces to.

use bytes::{BufMut, BytesMut};
use lisy_core::constants::*;
use lisy_core::{Error, PulseTime, Result, SwitchNumber};
use std::fmt;

/// Shape of the reply a command expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// Exactly one byte.
    Byte,
    /// Bytes up to (and excluding) a NUL terminator.
    String,
}

/// A request to the LISY board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Reset,
    GetConnectedHardware,
    GetLisyVersion,
    GetApiVersion,
    GetNumberOfLamps,
    GetNumberOfSolenoids,
    GetNumberOfDisplays,
    GetSwitchStatus(SwitchNumber),
    GetChangedSwitches,
    LampOn(u8),
    LampOff(u8),
    SolenoidOn(u8),
    SolenoidOff(u8),
    SolenoidPulse(u8),
    SetSolenoidPulseTime { solenoid: u8, pulse: PulseTime },
    SetDisplay { display: u8, text: String },
}

impl Command {
    /// Command byte sent first on the wire.
    ///
    /// ```
    /// use lisy_protocol::Command;
    ///
    /// assert_eq!(Command::Reset.code(), 100);
    /// assert_eq!(Command::SetDisplay { display: 3, text: String::new() }.code(), 33);
    /// ```
    pub fn code(&self) -> u8 {
        match self {
            Command::Reset => CMD_RESET,
            Command::GetConnectedHardware => CMD_GET_CONNECTED_HARDWARE,
            Command::GetLisyVersion => CMD_GET_LISY_VERSION,
            Command::GetApiVersion => CMD_GET_API_VERSION,
            Command::GetNumberOfLamps => CMD_GET_NUMBER_OF_LAMPS,
            Command::GetNumberOfSolenoids => CMD_GET_NUMBER_OF_SOLENOIDS,
            Command::GetNumberOfDisplays => CMD_GET_NUMBER_OF_DISPLAYS,
            Command::GetSwitchStatus(_) => CMD_GET_SWITCH_STATUS,
            Command::GetChangedSwitches => CMD_GET_CHANGED_SWITCHES,
            Command::LampOn(_) => CMD_LAMP_ON,
            Command::LampOff(_) => CMD_LAMP_OFF,
            Command::SolenoidOn(_) => CMD_SOLENOID_ON,
            Command::SolenoidOff(_) => CMD_SOLENOID_OFF,
            Command::SolenoidPulse(_) => CMD_SOLENOID_PULSE,
            Command::SetSolenoidPulseTime { .. } => CMD_SET_SOLENOID_PULSE_TIME,
            Command::SetDisplay { display, .. } => CMD_SET_DISPLAY_BASE.saturating_add(*display),
        }
    }

    /// Reply the board sends for this command, if any.
    pub fn expected_response(&self) -> Option<ResponseKind> {
        match self {
            Command::Reset
            | Command::GetNumberOfLamps
            | Command::GetNumberOfSolenoids
            | Command::GetNumberOfDisplays
            | Command::GetSwitchStatus(_)
            | Command::GetChangedSwitches => Some(ResponseKind::Byte),
            Command::GetConnectedHardware | Command::GetLisyVersion | Command::GetApiVersion => {
                Some(ResponseKind::String)
            }
            Command::LampOn(_)
            | Command::LampOff(_)
            | Command::SolenoidOn(_)
            | Command::SolenoidOff(_)
            | Command::SolenoidPulse(_)
            | Command::SetSolenoidPulseTime { .. }
            | Command::SetDisplay { .. } => None,
        }
    }

    /// Append the wire form of this command to `dst`.
    ///
    /// # Errors
    /// Returns an error if a display index has no command code or display
    /// text contains a NUL byte.
    pub fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        let code = self.code();
        match self {
            Command::GetSwitchStatus(number) => encode_command(code, &[number.as_u8()], dst),
            Command::LampOn(n)
            | Command::LampOff(n)
            | Command::SolenoidOn(n)
            | Command::SolenoidOff(n)
            | Command::SolenoidPulse(n) => encode_command(code, &[*n], dst),
            Command::SetSolenoidPulseTime { solenoid, pulse } => {
                let [high, low] = pulse.to_bytes();
                encode_command(code, &[*solenoid, high, low], dst);
            }
            Command::SetDisplay { display, text } => {
                if *display >= MAX_DISPLAYS {
                    return Err(Error::InvalidDisplay(format!(
                        "display {display} has no command code (max {})",
                        MAX_DISPLAYS - 1
                    )));
                }
                encode_string(code, text, dst)?;
            }
            _ => encode_command(code, &[], dst),
        }
        Ok(())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Command::GetSwitchStatus(number) => write!(f, "GetSwitchStatus({number})"),
            Command::SetSolenoidPulseTime { solenoid, pulse } => {
                write!(f, "SetSolenoidPulseTime({solenoid}, {pulse})")
            }
            Command::SetDisplay { display, text } => write!(f, "SetDisplay({display}, {text:?})"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Write a command byte followed by a raw payload.
pub fn encode_command(code: u8, payload: &[u8], dst: &mut BytesMut) {
    dst.reserve(1 + payload.len());
    dst.put_u8(code);
    dst.put_slice(payload);
}

/// Write a command byte, the text bytes and a NUL terminator.
///
/// # Errors
/// Returns `Error::InvalidDisplayText` if `text` itself contains a NUL,
/// which would end the string early on the board.
pub fn encode_string(code: u8, text: &str, dst: &mut BytesMut) -> Result<()> {
    if text.as_bytes().contains(&STRING_TERMINATOR) {
        return Err(Error::InvalidDisplayText(format!(
            "{text:?} contains a NUL byte"
        )));
    }
    dst.reserve(2 + text.len());
    dst.put_u8(code);
    dst.put_slice(text.as_bytes());
    dst.put_u8(STRING_TERMINATOR);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn encoded(command: Command) -> Vec<u8> {
        let mut buffer = BytesMut::new();
        command.encode(&mut buffer).unwrap();
        buffer.to_vec()
    }

    #[rstest]
    #[case(Command::Reset, vec![100])]
    #[case(Command::GetConnectedHardware, vec![0])]
    #[case(Command::GetNumberOfLamps, vec![3])]
    #[case(Command::GetNumberOfSolenoids, vec![4])]
    #[case(Command::GetNumberOfDisplays, vec![6])]
    #[case(Command::GetChangedSwitches, vec![41])]
    #[case(Command::GetSwitchStatus(SwitchNumber::new(57).unwrap()), vec![40, 57])]
    #[case(Command::LampOn(7), vec![11, 7])]
    #[case(Command::LampOff(7), vec![12, 7])]
    #[case(Command::SolenoidOn(2), vec![21, 2])]
    #[case(Command::SolenoidOff(2), vec![22, 2])]
    #[case(Command::SolenoidPulse(2), vec![23, 2])]
    fn test_encode_bytes(#[case] command: Command, #[case] expected: Vec<u8>) {
        assert_eq!(encoded(command), expected);
    }

    #[test]
    fn test_encode_pulse_time_splits_duration() {
        let command = Command::SetSolenoidPulseTime {
            solenoid: 5,
            pulse: PulseTime::from_millis(1000),
        };
        assert_eq!(encoded(command), vec![24, 5, 3, 232]);
    }

    #[test]
    fn test_encode_display_text_is_nul_terminated() {
        let command = Command::SetDisplay {
            display: 2,
            text: "1234".to_string(),
        };
        assert_eq!(encoded(command), vec![32, b'1', b'2', b'3', b'4', 0]);
    }

    #[test]
    fn test_encode_empty_display_text() {
        let command = Command::SetDisplay {
            display: 0,
            text: String::new(),
        };
        assert_eq!(encoded(command), vec![30, 0]);
    }

    #[test]
    fn test_encode_display_out_of_enumeration() {
        let mut buffer = BytesMut::new();
        let result = Command::SetDisplay {
            display: 7,
            text: "X".to_string(),
        }
        .encode(&mut buffer);
        assert!(matches!(result, Err(Error::InvalidDisplay(_))));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_encode_display_text_with_nul() {
        let mut buffer = BytesMut::new();
        let result = Command::SetDisplay {
            display: 1,
            text: "AB\0CD".to_string(),
        }
        .encode(&mut buffer);
        assert!(matches!(result, Err(Error::InvalidDisplayText(_))));
        assert!(buffer.is_empty());
    }

    #[rstest]
    #[case(Command::Reset, Some(ResponseKind::Byte))]
    #[case(Command::GetChangedSwitches, Some(ResponseKind::Byte))]
    #[case(Command::GetConnectedHardware, Some(ResponseKind::String))]
    #[case(Command::GetLisyVersion, Some(ResponseKind::String))]
    #[case(Command::LampOn(1), None)]
    #[case(Command::SolenoidPulse(1), None)]
    fn test_expected_response(#[case] command: Command, #[case] expected: Option<ResponseKind>) {
        assert_eq!(command.expected_response(), expected);
    }

    #[test]
    fn test_display_format() {
        assert_eq!(Command::Reset.to_string(), "Reset");
        assert_eq!(Command::LampOn(3).to_string(), "LampOn(3)");
        let pulse = Command::SetSolenoidPulseTime {
            solenoid: 1,
            pulse: PulseTime::from_millis(30),
        };
        assert_eq!(pulse.to_string(), "SetSolenoidPulseTime(1, 30ms)");
    }
}
