//! ServerInfo (0x00) — Server → Client.
//!
//! Sent once after a successful auth: server identity plus the user-type
//! byte that unlocks operator-only client features.

use bytes::{Buf, BufMut};

use crate::codec::{expect_opcode, read_string, write_string, PacketDecode, PacketEncode};
use crate::error::ProtoError;
use crate::packets::id;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub protocol_version: u8,
    pub name: String,
    pub motd: String,
    pub user_type: u8,
}

impl ServerInfo {
    pub const FRAME_LEN: usize = 131;
}

impl PacketEncode for ServerInfo {
    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(id::SERVER_INFO);
        buf.put_u8(self.protocol_version);
        write_string(buf, &self.name);
        write_string(buf, &self.motd);
        buf.put_u8(self.user_type);
    }
}

impl PacketDecode for ServerInfo {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        expect_opcode(buf, id::SERVER_INFO)?;
        let protocol_version = buf.get_u8();
        let name = read_string(buf)?;
        let motd = read_string(buf)?;
        let user_type = buf.get_u8();
        Ok(Self {
            protocol_version,
            name,
            motd,
            user_type,
        })
    }
}
