//! Replies from the LISY board.

use lisy_core::{Error, Result};

/// A decoded reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Single unsigned byte.
    Byte(u8),
    /// String reply with the NUL terminator stripped.
    String(Vec<u8>),
}

impl Response {
    /// Unwrap a byte reply.
    ///
    /// # Errors
    /// Returns `Error::UnexpectedResponse` for a string reply.
    pub fn into_byte(self) -> Result<u8> {
        match self {
            Response::Byte(value) => Ok(value),
            other => Err(other.mismatch("byte")),
        }
    }

    /// Unwrap a string reply.
    ///
    /// # Errors
    /// Returns `Error::UnexpectedResponse` for a byte reply.
    pub fn into_string(self) -> Result<Vec<u8>> {
        match self {
            Response::String(data) => Ok(data),
            other => Err(other.mismatch("string")),
        }
    }

    /// Unwrap a byte reply that must be 0 or 1.
    ///
    /// # Errors
    /// Returns `Error::UnexpectedResponse` for a string reply or any other
    /// byte value.
    pub fn into_bool(self) -> Result<bool> {
        match self.into_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(Error::UnexpectedResponse {
                expected: "0 or 1".to_string(),
                actual: other.to_string(),
            }),
        }
    }

    fn mismatch(&self, expected: &str) -> Error {
        let actual = match self {
            Response::Byte(value) => format!("byte {value}"),
            Response::String(data) => format!("string {:?}", String::from_utf8_lossy(data)),
        };
        Error::UnexpectedResponse {
            expected: expected.to_string(),
            actual,
        }
    }
}
