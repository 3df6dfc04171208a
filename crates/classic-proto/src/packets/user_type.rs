//! UserType (0x0f) — Server → Client.

use bytes::{Buf, BufMut};

use crate::codec::{expect_opcode, PacketDecode, PacketEncode};
use crate::error::ProtoError;
use crate::packets::id;

/// User-type bytes carried by ServerInfo, Spawn-adjacent state, and this
/// packet.
pub const NORMAL: u8 = 0x00;
pub const OPERATOR: u8 = 0x64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserType {
    pub user_type: u8,
}

impl UserType {
    pub const FRAME_LEN: usize = 2;
}

impl PacketEncode for UserType {
    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(id::USER_TYPE);
        buf.put_u8(self.user_type);
    }
}

impl PacketDecode for UserType {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        expect_opcode(buf, id::USER_TYPE)?;
        Ok(Self {
            user_type: buf.get_u8(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn roundtrip() {
        let pkt = UserType { user_type: OPERATOR };
        let mut buf = BytesMut::new();
        pkt.encode(&mut buf);
        assert_eq!(buf.len(), UserType::FRAME_LEN);
        let decoded = UserType::decode(&mut buf.freeze()).unwrap();
        assert_eq!(decoded, pkt);
    }
}
