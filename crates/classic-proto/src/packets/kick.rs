//! Kick (0x0e) — Server → Client.

use bytes::{Buf, BufMut};

use crate::codec::{expect_opcode, read_string, write_string, PacketDecode, PacketEncode};
use crate::error::ProtoError;
use crate::packets::id;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kick {
    pub reason: String,
}

impl Kick {
    pub const FRAME_LEN: usize = 65;

    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl PacketEncode for Kick {
    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(id::KICK);
        write_string(buf, &self.reason);
    }
}

impl PacketDecode for Kick {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        expect_opcode(buf, id::KICK)?;
        let reason = read_string(buf)?;
        Ok(Self { reason })
    }
}
