//! Auth (0x00) — Client → Server.
//!
//! The first packet a client sends: protocol version, player name, and the
//! salted-MD5 verification key from the listing service.

use bytes::{Buf, BufMut};

use crate::codec::{expect_opcode, read_string, write_string, PacketDecode, PacketEncode};
use crate::error::ProtoError;
use crate::packets::id;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Auth {
    pub protocol_version: u8,
    pub name: String,
    pub key: String,
    pub padding: u8,
}

impl Auth {
    /// Total frame length, opcode included.
    pub const FRAME_LEN: usize = 131;
}

impl PacketEncode for Auth {
    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(id::AUTH);
        buf.put_u8(self.protocol_version);
        write_string(buf, &self.name);
        write_string(buf, &self.key);
        buf.put_u8(self.padding);
    }
}

impl PacketDecode for Auth {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        expect_opcode(buf, id::AUTH)?;
        let protocol_version = buf.get_u8();
        let name = read_string(buf)?;
        let key = read_string(buf)?;
        let padding = buf.get_u8();
        Ok(Self {
            protocol_version,
            name,
            key,
            padding,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn roundtrip() {
        let pkt = Auth {
            protocol_version: 0x07,
            name: "alice".into(),
            key: "d41d8cd98f00b204e9800998ecf8427e".into(),
            padding: 0x00,
        };
        let mut buf = BytesMut::new();
        pkt.encode(&mut buf);
        assert_eq!(buf.len(), Auth::FRAME_LEN);
        let decoded = Auth::decode(&mut buf.freeze()).unwrap();
        assert_eq!(decoded, pkt);
    }

    #[test]
    fn byte_identity() {
        let pkt = Auth {
            protocol_version: 0x07,
            name: "bob".into(),
            key: String::new(),
            padding: 0x00,
        };
        let mut buf = BytesMut::new();
        pkt.encode(&mut buf);
        let bytes = buf.freeze();
        let decoded = Auth::decode(&mut bytes.clone()).unwrap();
        let mut reencoded = BytesMut::new();
        decoded.encode(&mut reencoded);
        assert_eq!(reencoded.freeze(), bytes);
    }
}
