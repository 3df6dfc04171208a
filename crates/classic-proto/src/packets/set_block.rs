//! SetBlockRequest (0x05, Client → Server) and SetBlock (0x06, Server → Client).

use bytes::{Buf, BufMut};

use crate::codec::{expect_opcode, PacketDecode, PacketEncode};
use crate::error::ProtoError;
use crate::packets::id;

/// Vanilla v7 block vocabulary.
pub mod block {
    pub const AIR: u8 = 0x00;
    pub const STONE: u8 = 0x01;
    /// Highest block id vanilla v7 defines (obsidian).
    pub const MAX_VANILLA: u8 = 0x31;

    /// Map ids the vanilla protocol does not define to stone, so a modified
    /// client cannot desynchronise vanilla peers.
    pub fn sanitize(id: u8) -> u8 {
        if id > MAX_VANILLA {
            STONE
        } else {
            id
        }
    }
}

/// Block change mode sent by the client.
pub mod mode {
    pub const DESTROY: u8 = 0x00;
    pub const CREATE: u8 = 0x01;
}

/// A client asking to place or destroy a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetBlockRequest {
    pub x: i16,
    pub y: i16,
    pub z: i16,
    pub mode: u8,
    pub block: u8,
}

impl SetBlockRequest {
    pub const FRAME_LEN: usize = 9;
}

impl PacketEncode for SetBlockRequest {
    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(id::SET_BLOCK_REQUEST);
        buf.put_i16(self.x);
        buf.put_i16(self.y);
        buf.put_i16(self.z);
        buf.put_u8(self.mode);
        buf.put_u8(self.block);
    }
}

impl PacketDecode for SetBlockRequest {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        expect_opcode(buf, id::SET_BLOCK_REQUEST)?;
        Ok(Self {
            x: buf.get_i16(),
            y: buf.get_i16(),
            z: buf.get_i16(),
            mode: buf.get_u8(),
            block: buf.get_u8(),
        })
    }
}

/// The authoritative block value broadcast by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetBlock {
    pub x: i16,
    pub y: i16,
    pub z: i16,
    pub block: u8,
}

impl SetBlock {
    pub const FRAME_LEN: usize = 8;
}

impl PacketEncode for SetBlock {
    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(id::SET_BLOCK);
        buf.put_i16(self.x);
        buf.put_i16(self.y);
        buf.put_i16(self.z);
        buf.put_u8(self.block);
    }
}

impl PacketDecode for SetBlock {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        expect_opcode(buf, id::SET_BLOCK)?;
        Ok(Self {
            x: buf.get_i16(),
            y: buf.get_i16(),
            z: buf.get_i16(),
            block: buf.get_u8(),
        })
    }
}
