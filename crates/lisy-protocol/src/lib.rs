pub mod codec;
pub mod command;
pub mod response;

pub use codec::LisyCodec;
pub use command::{Command, ResponseKind, encode_command, encode_string};
pub use response::Response;
