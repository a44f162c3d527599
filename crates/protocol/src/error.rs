//! Protocol error types.

use thiserror::Error;

/// Errors that can occur during protocol parsing.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid packet opcode: {0:#04x}")]
    InvalidOpcode(u8),

    #[error("Unexpected end of data")]
    UnexpectedEof,

    #[error("Invalid facing code: {0}")]
    InvalidFacing(u8),

    #[error("Trailing bytes after packet: {0}")]
    TrailingBytes(usize),
}
