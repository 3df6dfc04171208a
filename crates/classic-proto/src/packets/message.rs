//! Message (0x0d) — Bidirectional.
//!
//! Inbound chat from a client; outbound chat line tagged with the speaker's
//! pid (or a negative pid for server-originated lines).

use bytes::{Buf, BufMut};

use crate::codec::{expect_opcode, read_string, write_string, PacketDecode, PacketEncode};
use crate::error::ProtoError;
use crate::packets::id;

/// Inbound chat. The leading byte is unused by vanilla clients (0xff).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub unused: u8,
    pub text: String,
}

impl Message {
    pub const FRAME_LEN: usize = 66;
}

impl PacketEncode for Message {
    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(id::MESSAGE);
        buf.put_u8(self.unused);
        write_string(buf, &self.text);
    }
}

impl PacketDecode for Message {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        expect_opcode(buf, id::MESSAGE)?;
        let unused = buf.get_u8();
        let text = read_string(buf)?;
        Ok(Self { unused, text })
    }
}

/// Outbound chat line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub pid: i8,
    pub text: String,
}

impl ChatMessage {
    pub const FRAME_LEN: usize = 66;

    /// A server-originated line with no speaking player.
    pub fn server(text: impl Into<String>) -> Self {
        Self {
            pid: -1,
            text: text.into(),
        }
    }
}

impl PacketEncode for ChatMessage {
    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(id::MESSAGE);
        buf.put_i8(self.pid);
        write_string(buf, &self.text);
    }
}

impl PacketDecode for ChatMessage {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        expect_opcode(buf, id::MESSAGE)?;
        let pid = buf.get_i8();
        let text = read_string(buf)?;
        Ok(Self { pid, text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn inbound_roundtrip() {
        let pkt = Message {
            unused: 0xff,
            text: "hello world".into(),
        };
        let mut buf = BytesMut::new();
        pkt.encode(&mut buf);
        assert_eq!(buf.len(), Message::FRAME_LEN);
        let decoded = Message::decode(&mut buf.freeze()).unwrap();
        assert_eq!(decoded, pkt);
    }

    #[test]
    fn outbound_roundtrip() {
        let pkt = ChatMessage {
            pid: 4,
            text: "&7bob&f: hi".into(),
        };
        let mut buf = BytesMut::new();
        pkt.encode(&mut buf);
        assert_eq!(buf.len(), ChatMessage::FRAME_LEN);
        let decoded = ChatMessage::decode(&mut buf.freeze()).unwrap();
        assert_eq!(decoded, pkt);
    }

    #[test]
    fn server_line() {
        let pkt = ChatMessage::server("&e[SYSTEM]: hi");
        assert_eq!(pkt.pid, -1);
    }
}
