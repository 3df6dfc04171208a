//! Protocol encoding/decoding traits and helpers.

use bytes::{Buf, BufMut};

use crate::error::ProtoError;

/// Classic protocol strings occupy exactly this many bytes on the wire.
pub const STRING_LEN: usize = 64;

/// Encode a packet onto a buffer, opcode byte included.
pub trait PacketEncode {
    fn encode(&self, buf: &mut impl BufMut);
}

/// Decode a packet from a buffer holding a complete frame, opcode byte included.
pub trait PacketDecode: Sized {
    fn decode(buf: &mut impl Buf) -> Result<Self, ProtoError>;
}

/// Write a Classic protocol string: 64 bytes, right-padded with 0x20.
/// Longer strings are truncated.
pub fn write_string(buf: &mut impl BufMut, s: &str) {
    let bytes = s.as_bytes();
    let n = bytes.len().min(STRING_LEN);
    buf.put_slice(&bytes[..n]);
    for _ in n..STRING_LEN {
        buf.put_u8(0x20);
    }
}

/// Read a Classic protocol string, stripping trailing 0x20 padding.
pub fn read_string(buf: &mut impl Buf) -> Result<String, ProtoError> {
    if buf.remaining() < STRING_LEN {
        return Err(ProtoError::BufferTooShort {
            needed: STRING_LEN,
            remaining: buf.remaining(),
        });
    }
    let mut raw = [0u8; STRING_LEN];
    buf.copy_to_slice(&mut raw);
    let end = raw
        .iter()
        .rposition(|&b| b != 0x20)
        .map_or(0, |pos| pos + 1);
    Ok(String::from_utf8_lossy(&raw[..end]).into_owned())
}

/// Consume and verify the opcode byte at the start of a frame.
pub fn expect_opcode(buf: &mut impl Buf, expected: u8) -> Result<(), ProtoError> {
    if buf.remaining() < 1 {
        return Err(ProtoError::BufferTooShort {
            needed: 1,
            remaining: 0,
        });
    }
    let got = buf.get_u8();
    if got != expected {
        return Err(ProtoError::OpcodeMismatch { expected, got });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn string_roundtrip() {
        let mut buf = BytesMut::new();
        write_string(&mut buf, "alice");
        assert_eq!(buf.len(), STRING_LEN);
        let result = read_string(&mut buf.freeze()).unwrap();
        assert_eq!(result, "alice");
    }

    #[test]
    fn string_padding() {
        let mut buf = BytesMut::new();
        write_string(&mut buf, "bob");
        assert_eq!(&buf[..3], b"bob");
        assert!(buf[3..].iter().all(|&b| b == 0x20));
        let result = read_string(&mut buf.freeze()).unwrap();
        assert_eq!(result, "bob");
    }

    #[test]
    fn string_truncates_oversize() {
        let long = "x".repeat(100);
        let mut buf = BytesMut::new();
        write_string(&mut buf, &long);
        assert_eq!(buf.len(), STRING_LEN);
        let result = read_string(&mut buf.freeze()).unwrap();
        assert_eq!(result.len(), STRING_LEN);
    }

    #[test]
    fn string_empty() {
        let mut buf = BytesMut::new();
        write_string(&mut buf, "");
        let result = read_string(&mut buf.freeze()).unwrap();
        assert_eq!(result, "");
    }

    #[test]
    fn string_interior_spaces_kept() {
        let mut buf = BytesMut::new();
        write_string(&mut buf, "a b");
        let result = read_string(&mut buf.freeze()).unwrap();
        assert_eq!(result, "a b");
    }

    #[test]
    fn string_buffer_too_short() {
        let short = [0x20u8; 10];
        assert!(read_string(&mut &short[..]).is_err());
    }

    #[test]
    fn opcode_mismatch() {
        let raw = [0x05u8];
        assert!(matches!(
            expect_opcode(&mut &raw[..], 0x00),
            Err(ProtoError::OpcodeMismatch {
                expected: 0x00,
                got: 0x05
            })
        ));
    }
}
