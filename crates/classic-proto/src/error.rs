//! Protocol-level errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("buffer too short: need {needed} more bytes, have {remaining}")]
    BufferTooShort { needed: usize, remaining: usize },

    #[error("unknown opcode: 0x{0:02x}")]
    UnknownOpcode(u8),

    #[error("opcode mismatch: expected 0x{expected:02x}, got 0x{got:02x}")]
    OpcodeMismatch { expected: u8, got: u8 },

    #[error("level compression error: {0}")]
    Compress(String),
}
