use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Protocol errors
    #[error("Unexpected response: expected {expected}, got {actual}")]
    UnexpectedResponse { expected: String, actual: String },

    #[error("Received {0} byte(s) while no reply was pending")]
    UnsolicitedData(usize),

    #[error("String reply exceeds {max_len} bytes without terminator")]
    StringTooLong { max_len: usize },

    #[error("Unknown hardware identifier: {0}")]
    UnknownHardware(String),

    // Value errors
    #[error("Invalid switch number: {0}")]
    InvalidSwitchNumber(String),

    #[error("Invalid pulse time: {0}")]
    InvalidPulseTime(String),

    #[error("Invalid display: {0}")]
    InvalidDisplay(String),

    #[error("Invalid display text: {0}")]
    InvalidDisplayText(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
