//! Tokio codec for the LISY byte protocol.
//!
//! LISY replies carry no framing of their own: a reply is one byte or a
//! NUL-terminated string, and only the command that was just sent tells
//! which. `LisyCodec` therefore remembers the reply shape of the last
//! encoded command and decodes exactly that.
//!
//! # Architecture
//!
//! ```text
//! Command -> Encoder -> [code][payload]        -> serial/TCP
//! serial/TCP -> Decoder (expects Byte | String) -> Response
//! ```
//!
//! # Usage with Tokio Framed
//!
//! ```rust,no_run
//! use futures::{SinkExt, StreamExt};
//! use tokio::net::TcpStream;
//! use tokio_util::codec::Framed;
//! use lisy_protocol::{Command, LisyCodec};
//!
//! # async fn example() -> lisy_core::Result<()> {
//! let stream = TcpStream::connect("127.0.0.1:5963").await?;
//! let mut framed = Framed::new(stream, LisyCodec::new());
//!
//! framed.send(Command::Reset).await?;
//! if let Some(Ok(response)) = framed.next().await {
//!     println!("Reset returned {:?}", response);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Request/Response Discipline
//!
//! The protocol has no pipelining. Encoding any command while a reply is
//! still outstanding is rejected, and bytes that arrive while no reply is
//! expected are reported as [`Error::UnsolicitedData`]. Callers that share
//! one stream between tasks must hold a lock across each send and its read.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::{Command, Response, ResponseKind};
use lisy_core::constants::{MAX_STRING_RESPONSE_LENGTH, STRING_TERMINATOR};
use lisy_core::{Error, Result};

/// Tokio codec for LISY commands and replies.
#[derive(Debug, Default)]
pub struct LisyCodec {
    /// Reply shape of the last command that expects one.
    pending: Option<ResponseKind>,
}

impl LisyCodec {
    /// Create a codec with no reply outstanding.
    pub fn new() -> Self {
        Self { pending: None }
    }

    /// Reply the decoder is waiting for, if any.
    pub fn pending(&self) -> Option<ResponseKind> {
        self.pending
    }
}

impl Decoder for LisyCodec {
    type Item = Response;
    type Error = Error;

    /// Decode the outstanding reply.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Response))` - The reply is complete
    /// - `Ok(None)` - Need more data
    /// - `Err(Error)` - Data arrived unasked, or a string reply overran
    ///   [`MAX_STRING_RESPONSE_LENGTH`]
    ///
    /// # Example
    ///
    /// ```
    /// use bytes::BytesMut;
    /// use tokio_util::codec::{Decoder, Encoder};
    /// use lisy_protocol::{Command, LisyCodec, Response};
    ///
    /// let mut codec = LisyCodec::new();
    /// let mut out = BytesMut::new();
    /// codec.encode(Command::GetConnectedHardware, &mut out).unwrap();
    ///
    /// let mut input = BytesMut::from(&b"LISY80\0"[..]);
    /// let reply = codec.decode(&mut input).unwrap();
    /// assert_eq!(reply, Some(Response::String(b"LISY80".to_vec())));
    /// ```
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        let Some(kind) = self.pending else {
            if src.is_empty() {
                return Ok(None);
            }
            return Err(Error::UnsolicitedData(src.len()));
        };

        match kind {
            ResponseKind::Byte => {
                if src.is_empty() {
                    return Ok(None);
                }
                self.pending = None;
                Ok(Some(Response::Byte(src.get_u8())))
            }
            ResponseKind::String => {
                match src.iter().position(|&b| b == STRING_TERMINATOR) {
                    Some(end) => {
                        let data = src.split_to(end);
                        src.advance(1);
                        self.pending = None;
                        Ok(Some(Response::String(data.to_vec())))
                    }
                    None if src.len() > MAX_STRING_RESPONSE_LENGTH => Err(Error::StringTooLong {
                        max_len: MAX_STRING_RESPONSE_LENGTH,
                    }),
                    None => Ok(None),
                }
            }
        }
    }
}

impl Encoder<Command> for LisyCodec {
    type Error = Error;

    /// Encode a command and arm the decoder for its reply.
    ///
    /// # Errors
    ///
    /// Returns an error if a reply is still outstanding or the command
    /// payload is invalid. Nothing is written in either case.
    fn encode(&mut self, item: Command, dst: &mut BytesMut) -> Result<()> {
        if let Some(kind) = self.pending {
            return Err(Error::UnexpectedResponse {
                expected: format!("{kind:?} reply to be read before {item}"),
                actual: "new command".to_string(),
            });
        }

        item.encode(dst)?;
        self.pending = item.expected_response();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lisy_core::{PulseTime, SwitchNumber};

    fn armed(command: Command) -> LisyCodec {
        let mut codec = LisyCodec::new();
        let mut buffer = BytesMut::new();
        codec.encode(command, &mut buffer).unwrap();
        codec
    }

    #[test]
    fn test_codec_new() {
        let codec = LisyCodec::new();
        assert_eq!(codec.pending(), None);
    }

    #[test]
    fn test_encode_arms_reply() {
        assert_eq!(armed(Command::Reset).pending(), Some(ResponseKind::Byte));
        assert_eq!(
            armed(Command::GetConnectedHardware).pending(),
            Some(ResponseKind::String)
        );
        assert_eq!(armed(Command::LampOn(1)).pending(), None);
    }

    #[test]
    fn test_decode_byte() {
        let mut codec = armed(Command::GetChangedSwitches);
        let mut buffer = BytesMut::from(&[133u8][..]);

        let reply = codec.decode(&mut buffer).unwrap();
        assert_eq!(reply, Some(Response::Byte(133)));
        assert!(buffer.is_empty());
        assert_eq!(codec.pending(), None);
    }

    #[test]
    fn test_decode_byte_waits_for_data() {
        let mut codec = armed(Command::GetNumberOfLamps);
        let mut buffer = BytesMut::new();

        assert_eq!(codec.decode(&mut buffer).unwrap(), None);
        assert_eq!(codec.pending(), Some(ResponseKind::Byte));
    }

    #[test]
    fn test_decode_byte_takes_exactly_one() {
        let mut codec = armed(Command::GetSwitchStatus(SwitchNumber::new(0).unwrap()));
        let mut buffer = BytesMut::from(&[1u8, 0][..]);

        assert_eq!(codec.decode(&mut buffer).unwrap(), Some(Response::Byte(1)));
        assert_eq!(buffer.len(), 1);
        // The leftover byte was never asked for.
        assert!(matches!(
            codec.decode(&mut buffer),
            Err(Error::UnsolicitedData(1))
        ));
    }

    #[test]
    fn test_decode_partial_string() {
        let mut codec = armed(Command::GetConnectedHardware);
        let mut buffer = BytesMut::from(&b"LIS"[..]);

        assert_eq!(codec.decode(&mut buffer).unwrap(), None);

        buffer.extend_from_slice(b"Y1\0");
        assert_eq!(
            codec.decode(&mut buffer).unwrap(),
            Some(Response::String(b"LISY1".to_vec()))
        );
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_decode_empty_string() {
        let mut codec = armed(Command::GetApiVersion);
        let mut buffer = BytesMut::from(&b"\0"[..]);

        assert_eq!(
            codec.decode(&mut buffer).unwrap(),
            Some(Response::String(Vec::new()))
        );
    }

    #[test]
    fn test_decode_string_too_long() {
        let mut codec = armed(Command::GetLisyVersion);
        let mut buffer = BytesMut::from(&vec![b'A'; MAX_STRING_RESPONSE_LENGTH + 1][..]);

        let result = codec.decode(&mut buffer);
        assert!(matches!(result, Err(Error::StringTooLong { .. })));
    }

    #[test]
    fn test_decode_unsolicited() {
        let mut codec = LisyCodec::new();
        let mut buffer = BytesMut::from(&[0u8, 1, 2][..]);

        let result = codec.decode(&mut buffer);
        assert!(matches!(result, Err(Error::UnsolicitedData(3))));
    }

    #[test]
    fn test_decode_empty_buffer_without_pending() {
        let mut codec = LisyCodec::new();
        let mut buffer = BytesMut::new();
        assert_eq!(codec.decode(&mut buffer).unwrap(), None);
    }

    #[test]
    fn test_encode_rejects_pipelining() {
        let mut codec = LisyCodec::new();
        let mut buffer = BytesMut::new();

        codec.encode(Command::Reset, &mut buffer).unwrap();
        let written = buffer.len();

        let result = codec.encode(Command::LampOn(1), &mut buffer);
        assert!(result.is_err());
        assert_eq!(buffer.len(), written);
    }

    #[test]
    fn test_fire_and_forget_commands_chain() {
        let mut codec = LisyCodec::new();
        let mut buffer = BytesMut::new();

        codec
            .encode(
                Command::SetSolenoidPulseTime {
                    solenoid: 3,
                    pulse: PulseTime::from_millis(30),
                },
                &mut buffer,
            )
            .unwrap();
        codec.encode(Command::SolenoidPulse(3), &mut buffer).unwrap();

        assert_eq!(&buffer[..], &[24, 3, 0, 30, 23, 3]);
        assert_eq!(codec.pending(), None);
    }

    #[test]
    fn test_invalid_command_does_not_arm() {
        let mut codec = LisyCodec::new();
        let mut buffer = BytesMut::new();

        let result = codec.encode(
            Command::SetDisplay {
                display: 9,
                text: "X".to_string(),
            },
            &mut buffer,
        );
        assert!(result.is_err());
        assert_eq!(codec.pending(), None);
    }
}
