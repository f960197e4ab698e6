use crate::{
    Result,
    constants::{
        HARDWARE_ID_SYSTEM_1, HARDWARE_ID_SYSTEM_80, MAX_DISPLAYS, MAX_SWITCH_NUMBER,
        SWITCH_COLUMNS, SWITCH_NUMBER_MASK, SWITCH_ROWS, SWITCH_STATE_BIT, SWITCH_STATUS_NO_CHANGE,
    },
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Switch matrix address (`row * 10 + column`).
///
/// The units digit is the column and must be in `0..=7`; the tens digit is
/// the row, also `0..=7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SwitchNumber(u8);

impl SwitchNumber {
    /// Create a new switch number with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidSwitchNumber` if the column digit is above 7 or
    /// the number is above 77.
    pub fn new(number: u8) -> Result<Self> {
        if number > MAX_SWITCH_NUMBER || number % 10 >= SWITCH_COLUMNS {
            return Err(Error::InvalidSwitchNumber(format!(
                "{number} (row and column must both be 0-7)"
            )));
        }
        Ok(SwitchNumber(number))
    }

    /// Build a switch number from its matrix position.
    ///
    /// # Errors
    /// Returns `Error::InvalidSwitchNumber` if `row` or `col` is above 7.
    pub fn from_row_col(row: u8, col: u8) -> Result<Self> {
        if row >= SWITCH_ROWS || col >= SWITCH_COLUMNS {
            return Err(Error::InvalidSwitchNumber(format!(
                "row {row}, column {col}"
            )));
        }
        Ok(SwitchNumber(row * 10 + col))
    }

    /// Every address of the 8x8 matrix, row by row.
    ///
    /// ```
    /// use lisy_core::SwitchNumber;
    ///
    /// let all: Vec<_> = SwitchNumber::all().collect();
    /// assert_eq!(all.len(), 64);
    /// assert_eq!(all[8].as_u8(), 10);
    /// ```
    pub fn all() -> impl Iterator<Item = SwitchNumber> {
        (0..SWITCH_ROWS).flat_map(|row| (0..SWITCH_COLUMNS).map(move |col| SwitchNumber(row * 10 + col)))
    }

    #[must_use]
    pub fn as_u8(&self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn row(&self) -> u8 {
        self.0 / 10
    }

    #[must_use]
    pub fn col(&self) -> u8 {
        self.0 % 10
    }
}

impl fmt::Display for SwitchNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SwitchNumber {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let number: u8 = s
            .trim()
            .parse()
            .map_err(|_| Error::InvalidSwitchNumber(s.to_string()))?;
        SwitchNumber::new(number)
    }
}

impl TryFrom<u8> for SwitchNumber {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        SwitchNumber::new(value)
    }
}

impl From<SwitchNumber> for u8 {
    fn from(number: SwitchNumber) -> u8 {
        number.0
    }
}

/// Decoded reply to a "get changed switches" poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchStatus {
    /// Nothing changed since the last poll.
    NoChange,
    /// One switch changed to `active`.
    Changed { number: SwitchNumber, active: bool },
}

impl SwitchStatus {
    /// Decode a status byte.
    ///
    /// Bit 7 is the new state, bits 0-6 the switch number. `0x7F` means no
    /// change.
    ///
    /// ```
    /// use lisy_core::{SwitchNumber, SwitchStatus};
    ///
    /// assert_eq!(SwitchStatus::from_byte(127).unwrap(), SwitchStatus::NoChange);
    /// assert_eq!(
    ///     SwitchStatus::from_byte(0b1000_0101).unwrap(),
    ///     SwitchStatus::Changed { number: SwitchNumber::new(5).unwrap(), active: true },
    /// );
    /// ```
    ///
    /// # Errors
    /// Returns `Error::InvalidSwitchNumber` if the low bits do not form a
    /// valid matrix address.
    pub fn from_byte(status: u8) -> Result<Self> {
        if status == SWITCH_STATUS_NO_CHANGE {
            return Ok(SwitchStatus::NoChange);
        }
        let number = SwitchNumber::new(status & SWITCH_NUMBER_MASK)?;
        Ok(SwitchStatus::Changed {
            number,
            active: status & SWITCH_STATE_BIT != 0,
        })
    }
}

/// LISY hardware family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemType {
    /// Gottlieb System 1.
    System1,
    /// Gottlieb System 80.
    System80,
}

impl SystemType {
    /// Map the identify reply to a system type.
    ///
    /// # Errors
    /// Returns `Error::UnknownHardware` for anything other than `LISY1` or
    /// `LISY80`.
    pub fn from_identifier(identifier: &[u8]) -> Result<Self> {
        match identifier {
            HARDWARE_ID_SYSTEM_1 => Ok(SystemType::System1),
            HARDWARE_ID_SYSTEM_80 => Ok(SystemType::System80),
            other => Err(Error::UnknownHardware(
                String::from_utf8_lossy(other).into_owned(),
            )),
        }
    }

    /// Numeric system type (1 or 80).
    pub fn to_u8(self) -> u8 {
        match self {
            SystemType::System1 => 1,
            SystemType::System80 => 80,
        }
    }

    /// First valid lamp and solenoid index on this hardware.
    ///
    /// System 80 numbers its outputs from zero, System 1 from one.
    pub fn index_base(self) -> u8 {
        match self {
            SystemType::System80 => 0,
            SystemType::System1 => 1,
        }
    }
}

impl fmt::Display for SystemType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "System {}", self.to_u8())
    }
}

/// Hardware identity and capacities learned during the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareProfile {
    pub system_type: SystemType,
    pub lamp_count: u8,
    pub solenoid_count: u8,
    pub display_count: u8,
}

impl HardwareProfile {
    /// Whether `index` names an existing lamp.
    ///
    /// ```
    /// use lisy_core::{HardwareProfile, SystemType};
    ///
    /// let profile = HardwareProfile {
    ///     system_type: SystemType::System1,
    ///     lamp_count: 36,
    ///     solenoid_count: 8,
    ///     display_count: 5,
    /// };
    /// assert!(!profile.has_lamp(0));
    /// assert!(profile.has_lamp(36));
    /// ```
    pub fn has_lamp(&self, index: u8) -> bool {
        self.indexed_within(index, self.lamp_count)
    }

    /// Whether `index` names an existing solenoid.
    pub fn has_solenoid(&self, index: u8) -> bool {
        self.indexed_within(index, self.solenoid_count)
    }

    /// Whether `index` names an existing display with a command code.
    pub fn has_display(&self, index: u8) -> bool {
        index < self.display_count && index < MAX_DISPLAYS
    }

    fn indexed_within(&self, index: u8, count: u8) -> bool {
        let base = self.system_type.index_base();
        index >= base && u16::from(index) < u16::from(base) + u16::from(count)
    }
}

impl fmt::Display for HardwareProfile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} ({} lamps, {} solenoids, {} displays)",
            self.system_type, self.lamp_count, self.solenoid_count, self.display_count
        )
    }
}

/// Solenoid pulse time in milliseconds.
///
/// Travels on the wire as two bytes, high byte first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PulseTime(u16);

impl PulseTime {
    /// Create a pulse time with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidPulseTime` if `ms` does not fit in two bytes.
    pub fn new(ms: u32) -> Result<Self> {
        u16::try_from(ms)
            .map(PulseTime)
            .map_err(|_| Error::InvalidPulseTime(format!("{ms}ms exceeds {}ms", u16::MAX)))
    }

    #[must_use]
    pub fn from_millis(ms: u16) -> Self {
        PulseTime(ms)
    }

    #[must_use]
    pub fn as_millis(&self) -> u16 {
        self.0
    }

    /// Wire representation: `[ms / 256, ms % 256]`.
    ///
    /// ```
    /// use lisy_core::PulseTime;
    ///
    /// assert_eq!(PulseTime::from_millis(1000).to_bytes(), [3, 232]);
    /// ```
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 2] {
        self.0.to_be_bytes()
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 2]) -> Self {
        PulseTime(u16::from_be_bytes(bytes))
    }
}

impl fmt::Display for PulseTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("0", 0)]
    #[case("5", 5)]
    #[case("07", 7)]
    #[case("10", 10)]
    #[case("77", 77)]
    fn test_switch_number_valid(#[case] input: &str, #[case] expected: u8) {
        let number: SwitchNumber = input.parse().unwrap();
        assert_eq!(number.as_u8(), expected);
    }

    #[rstest]
    #[case("8")] // column 8
    #[case("19")] // column 9
    #[case("78")] // column 8 in last row
    #[case("80")] // row 8
    #[case("200")] // out of u8 range for a matrix
    #[case("abc")] // non-numeric
    #[case("-1")] // negative
    fn test_switch_number_invalid(#[case] input: &str) {
        let result: Result<SwitchNumber> = input.parse();
        assert!(result.is_err());
    }

    #[test]
    fn test_switch_number_row_col() {
        let number = SwitchNumber::from_row_col(3, 6).unwrap();
        assert_eq!(number.as_u8(), 36);
        assert_eq!(number.row(), 3);
        assert_eq!(number.col(), 6);
        assert!(SwitchNumber::from_row_col(8, 0).is_err());
        assert!(SwitchNumber::from_row_col(0, 8).is_err());
    }

    #[test]
    fn test_switch_number_all_covers_matrix() {
        let all: Vec<SwitchNumber> = SwitchNumber::all().collect();
        assert_eq!(all.len(), 64);
        assert_eq!(all.first().unwrap().as_u8(), 0);
        assert_eq!(all.last().unwrap().as_u8(), 77);
        assert!(all.iter().all(|n| n.col() <= 7 && n.row() <= 7));
    }

    #[test]
    fn test_switch_number_display() {
        assert_eq!(SwitchNumber::new(5).unwrap().to_string(), "5");
        assert_eq!(SwitchNumber::new(42).unwrap().to_string(), "42");
    }

    #[test]
    fn test_switch_number_serde_validates() {
        let number: SwitchNumber = serde_json::from_str("42").unwrap();
        assert_eq!(number.as_u8(), 42);
        assert_eq!(serde_json::to_string(&number).unwrap(), "42");
        assert!(serde_json::from_str::<SwitchNumber>("48").is_err());
    }

    #[rstest]
    #[case(127, None)]
    #[case(0b1000_0101, Some((5, true)))]
    #[case(0b0000_0101, Some((5, false)))]
    #[case(0b1100_1101, Some((77, true)))]
    #[case(0, Some((0, false)))]
    fn test_switch_status_decoding(#[case] byte: u8, #[case] expected: Option<(u8, bool)>) {
        let status = SwitchStatus::from_byte(byte).unwrap();
        match expected {
            None => assert_eq!(status, SwitchStatus::NoChange),
            Some((number, active)) => assert_eq!(
                status,
                SwitchStatus::Changed {
                    number: SwitchNumber::new(number).unwrap(),
                    active
                }
            ),
        }
    }

    #[test]
    fn test_switch_status_invalid_column() {
        // column 9
        assert!(SwitchStatus::from_byte(0b1000_1001).is_err());
        // 0xFF would be switch 127
        assert!(SwitchStatus::from_byte(0xFF).is_err());
    }

    #[rstest]
    #[case(b"LISY1", SystemType::System1)]
    #[case(b"LISY80", SystemType::System80)]
    fn test_system_type_identifier(#[case] id: &[u8], #[case] expected: SystemType) {
        assert_eq!(SystemType::from_identifier(id).unwrap(), expected);
    }

    #[rstest]
    #[case(b"")]
    #[case(b"LISY35")]
    #[case(b"lisy1")]
    #[case(b"LISY80 ")]
    fn test_system_type_unknown(#[case] id: &[u8]) {
        let result = SystemType::from_identifier(id);
        assert!(matches!(result, Err(Error::UnknownHardware(_))));
    }

    fn profile(system_type: SystemType) -> HardwareProfile {
        HardwareProfile {
            system_type,
            lamp_count: 10,
            solenoid_count: 4,
            display_count: 3,
        }
    }

    #[rstest]
    #[case(SystemType::System80, 0, true)]
    #[case(SystemType::System80, 9, true)]
    #[case(SystemType::System80, 10, false)]
    #[case(SystemType::System1, 0, false)]
    #[case(SystemType::System1, 1, true)]
    #[case(SystemType::System1, 10, true)]
    #[case(SystemType::System1, 11, false)]
    fn test_lamp_index_base(#[case] system: SystemType, #[case] index: u8, #[case] valid: bool) {
        assert_eq!(profile(system).has_lamp(index), valid);
    }

    #[rstest]
    #[case(SystemType::System80, 3, true)]
    #[case(SystemType::System80, 4, false)]
    #[case(SystemType::System1, 4, true)]
    #[case(SystemType::System1, 0, false)]
    fn test_solenoid_index_base(
        #[case] system: SystemType,
        #[case] index: u8,
        #[case] valid: bool,
    ) {
        assert_eq!(profile(system).has_solenoid(index), valid);
    }

    #[test]
    fn test_display_range() {
        let p = profile(SystemType::System1);
        assert!(p.has_display(0));
        assert!(p.has_display(2));
        assert!(!p.has_display(3));

        let wide = HardwareProfile {
            display_count: 20,
            ..p
        };
        assert!(wide.has_display(6));
        assert!(!wide.has_display(7));
    }

    #[test]
    fn test_zero_capacity_rejects_everything() {
        let empty = HardwareProfile {
            system_type: SystemType::System1,
            lamp_count: 0,
            solenoid_count: 0,
            display_count: 0,
        };
        assert!(!empty.has_lamp(0));
        assert!(!empty.has_lamp(1));
        assert!(!empty.has_display(0));
    }

    #[test]
    fn test_pulse_time_bytes() {
        let pulse = PulseTime::from_millis(1000);
        assert_eq!(pulse.to_bytes(), [3, 232]);
        assert_eq!(PulseTime::from_bytes([3, 232]).as_millis(), 1000);
        assert_eq!(PulseTime::from_millis(255).to_bytes(), [0, 255]);
        assert_eq!(PulseTime::from_millis(256).to_bytes(), [1, 0]);
    }

    #[test]
    fn test_pulse_time_limits() {
        assert_eq!(PulseTime::new(65535).unwrap().as_millis(), u16::MAX);
        assert!(matches!(
            PulseTime::new(65536),
            Err(Error::InvalidPulseTime(_))
        ));
    }
}
