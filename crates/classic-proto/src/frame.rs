//! Inbound frame boundary.
//!
//! Every client packet has a fixed length keyed by its opcode byte, so
//! framing is a length check: either the whole frame is buffered and gets
//! consumed in one step, or the buffer is left untouched.

use crate::codec::PacketDecode;
use crate::error::ProtoError;
use crate::packets::{id, Auth, Message, Position, SetBlockRequest};

/// A complete inbound packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientPacket {
    Auth(Auth),
    SetBlock(SetBlockRequest),
    Position(Position),
    Message(Message),
}

/// Fixed frame length for a client opcode, or `None` for opcodes clients
/// never send.
pub fn frame_len(opcode: u8) -> Option<usize> {
    match opcode {
        id::AUTH => Some(Auth::FRAME_LEN),
        id::SET_BLOCK_REQUEST => Some(SetBlockRequest::FRAME_LEN),
        id::POSITION => Some(Position::FRAME_LEN),
        id::MESSAGE => Some(Message::FRAME_LEN),
        _ => None,
    }
}

/// Try to decode one client packet from the head of `buf`.
///
/// `Ok(Some((packet, consumed)))` on a complete frame; `Ok(None)` when more
/// bytes are needed (the buffer is not advanced); `Err(UnknownOpcode)` when
/// the head byte is not a client opcode.
pub fn decode_client_packet(buf: &[u8]) -> Result<Option<(ClientPacket, usize)>, ProtoError> {
    let Some(&opcode) = buf.first() else {
        return Ok(None);
    };
    let len = frame_len(opcode).ok_or(ProtoError::UnknownOpcode(opcode))?;
    if buf.len() < len {
        return Ok(None);
    }

    let mut frame = &buf[..len];
    let packet = match opcode {
        id::AUTH => ClientPacket::Auth(Auth::decode(&mut frame)?),
        id::SET_BLOCK_REQUEST => ClientPacket::SetBlock(SetBlockRequest::decode(&mut frame)?),
        id::POSITION => ClientPacket::Position(Position::decode(&mut frame)?),
        id::MESSAGE => ClientPacket::Message(Message::decode(&mut frame)?),
        _ => unreachable!("frame_len gated the opcode"),
    };
    Ok(Some((packet, len)))
}
