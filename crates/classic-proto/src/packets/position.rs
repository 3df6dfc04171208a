//! Position (0x08) — Bidirectional.
//!
//! Inbound carries the client's own pose (pid is the self marker); outbound
//! is the absolute teleport the server fans out with the mover's real pid.
//! Coordinates are signed 16-bit fixed point in 1/32-block units.

use bytes::{Buf, BufMut};

use crate::codec::{expect_opcode, PacketDecode, PacketEncode};
use crate::error::ProtoError;
use crate::packets::id;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub pid: i8,
    pub x: i16,
    pub y: i16,
    pub z: i16,
    pub yaw: u8,
    pub pitch: u8,
}

impl Position {
    pub const FRAME_LEN: usize = 10;
}

impl PacketEncode for Position {
    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(id::POSITION);
        buf.put_i8(self.pid);
        buf.put_i16(self.x);
        buf.put_i16(self.y);
        buf.put_i16(self.z);
        buf.put_u8(self.yaw);
        buf.put_u8(self.pitch);
    }
}

impl PacketDecode for Position {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        expect_opcode(buf, id::POSITION)?;
        Ok(Self {
            pid: buf.get_i8(),
            x: buf.get_i16(),
            y: buf.get_i16(),
            z: buf.get_i16(),
            yaw: buf.get_u8(),
            pitch: buf.get_u8(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn roundtrip() {
        let pkt = Position {
            pid: -1,
            x: 4096,
            y: 1072,
            z: -4096,
            yaw: 128,
            pitch: 64,
        };
        let mut buf = BytesMut::new();
        pkt.encode(&mut buf);
        assert_eq!(buf.len(), Position::FRAME_LEN);
        let decoded = Position::decode(&mut buf.freeze()).unwrap();
        assert_eq!(decoded, pkt);
    }

    #[test]
    fn negative_fixed_point() {
        let pkt = Position {
            pid: 3,
            x: -32,
            y: 0,
            z: 0,
            yaw: 0,
            pitch: 0,
        };
        let mut buf = BytesMut::new();
        pkt.encode(&mut buf);
        let decoded = Position::decode(&mut buf.freeze()).unwrap();
        assert_eq!(decoded.x, -32);
    }
}
