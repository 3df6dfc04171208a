//! LevelInit (0x02), LevelChunk (0x03), LevelFinal (0x04) — Server → Client.
//!
//! The map transfer: an init marker, a run of 1024-byte gzip chunks with a
//! progress percentage, then the map dimensions.

use bytes::{Buf, BufMut};

use crate::codec::{expect_opcode, PacketDecode, PacketEncode};
use crate::error::ProtoError;
use crate::packets::id;

/// Payload bytes carried by every LevelChunk frame. Short tails are
/// zero-padded; `length` says how much is real.
pub const CHUNK_LEN: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelInit;

impl LevelInit {
    pub const FRAME_LEN: usize = 1;
}

impl PacketEncode for LevelInit {
    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(id::LEVEL_INIT);
    }
}

impl PacketDecode for LevelInit {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        expect_opcode(buf, id::LEVEL_INIT)?;
        Ok(Self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelChunk {
    pub length: i16,
    pub data: [u8; CHUNK_LEN],
    pub percent: u8,
}

impl LevelChunk {
    pub const FRAME_LEN: usize = 1028;

    /// Wrap up to [`CHUNK_LEN`] payload bytes, zero-padding the remainder.
    pub fn new(payload: &[u8], percent: u8) -> Self {
        let mut data = [0u8; CHUNK_LEN];
        let n = payload.len().min(CHUNK_LEN);
        data[..n].copy_from_slice(&payload[..n]);
        Self {
            length: n as i16,
            data,
            percent,
        }
    }

    /// The real payload slice.
    pub fn payload(&self) -> &[u8] {
        &self.data[..(self.length.max(0) as usize).min(CHUNK_LEN)]
    }
}

impl PacketEncode for LevelChunk {
    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(id::LEVEL_CHUNK);
        buf.put_i16(self.length);
        buf.put_slice(&self.data);
        buf.put_u8(self.percent);
    }
}

impl PacketDecode for LevelChunk {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        expect_opcode(buf, id::LEVEL_CHUNK)?;
        if buf.remaining() < Self::FRAME_LEN - 1 {
            return Err(ProtoError::BufferTooShort {
                needed: Self::FRAME_LEN - 1,
                remaining: buf.remaining(),
            });
        }
        let length = buf.get_i16();
        let mut data = [0u8; CHUNK_LEN];
        buf.copy_to_slice(&mut data);
        let percent = buf.get_u8();
        Ok(Self {
            length,
            data,
            percent,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelFinal {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl LevelFinal {
    pub const FRAME_LEN: usize = 7;
}

impl PacketEncode for LevelFinal {
    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(id::LEVEL_FINAL);
        buf.put_i16(self.x);
        buf.put_i16(self.y);
        buf.put_i16(self.z);
    }
}

impl PacketDecode for LevelFinal {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        expect_opcode(buf, id::LEVEL_FINAL)?;
        Ok(Self {
            x: buf.get_i16(),
            y: buf.get_i16(),
            z: buf.get_i16(),
        })
    }
}
