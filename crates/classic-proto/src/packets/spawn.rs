//! Spawn (0x07) and Despawn (0x0c) — Server → Client.

use bytes::{Buf, BufMut};

use crate::codec::{expect_opcode, read_string, write_string, PacketDecode, PacketEncode};
use crate::error::ProtoError;
use crate::packets::id;

/// Materialise a player model. A pid of -1 spawns the receiver's own avatar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spawn {
    pub pid: i8,
    pub name: String,
    pub x: i16,
    pub y: i16,
    pub z: i16,
    pub yaw: u8,
    pub pitch: u8,
}

impl Spawn {
    pub const FRAME_LEN: usize = 74;
}

impl PacketEncode for Spawn {
    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(id::SPAWN);
        buf.put_i8(self.pid);
        write_string(buf, &self.name);
        buf.put_i16(self.x);
        buf.put_i16(self.y);
        buf.put_i16(self.z);
        buf.put_u8(self.yaw);
        buf.put_u8(self.pitch);
    }
}

impl PacketDecode for Spawn {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        expect_opcode(buf, id::SPAWN)?;
        let pid = buf.get_i8();
        let name = read_string(buf)?;
        Ok(Self {
            pid,
            name,
            x: buf.get_i16(),
            y: buf.get_i16(),
            z: buf.get_i16(),
            yaw: buf.get_u8(),
            pitch: buf.get_u8(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Despawn {
    pub pid: i8,
}

impl Despawn {
    pub const FRAME_LEN: usize = 2;
}

impl PacketEncode for Despawn {
    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(id::DESPAWN);
        buf.put_i8(self.pid);
    }
}

impl PacketDecode for Despawn {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        expect_opcode(buf, id::DESPAWN)?;
        Ok(Self { pid: buf.get_i8() })
    }
}
