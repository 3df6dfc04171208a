//! Level transfer stream.
//!
//! The map payload is a big-endian u32 cell count followed by the raw block
//! array, gzip-compressed and cut into [`LevelChunk`] frames with an
//! ascending progress percentage.

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::ProtoError;
use crate::packets::level_data::{LevelChunk, CHUNK_LEN};

/// Compress a block array into the chunk sequence sent between LevelInit
/// and LevelFinal. The last chunk always reports 100 percent.
pub fn encode_level_chunks(blocks: &[u8]) -> Result<Vec<LevelChunk>, ProtoError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&(blocks.len() as u32).to_be_bytes())
        .and_then(|_| encoder.write_all(blocks))
        .map_err(|e| ProtoError::Compress(e.to_string()))?;
    let stream = encoder
        .finish()
        .map_err(|e| ProtoError::Compress(e.to_string()))?;

    let total = stream.len();
    let mut chunks = Vec::with_capacity(total.div_ceil(CHUNK_LEN));
    let mut sent = 0usize;
    for piece in stream.chunks(CHUNK_LEN) {
        sent += piece.len();
        let percent = (sent * 100 / total) as u8;
        chunks.push(LevelChunk::new(piece, percent));
    }
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn reassemble(chunks: &[LevelChunk]) -> Vec<u8> {
        let stream: Vec<u8> = chunks.iter().flat_map(|c| c.payload().to_vec()).collect();
        let mut decoder = GzDecoder::new(&stream[..]);
        let mut out = Vec::new();
        decoder.read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn stream_roundtrip() {
        let blocks: Vec<u8> = (0..u8::MAX).cycle().take(16 * 16 * 16).collect();
        let chunks = encode_level_chunks(&blocks).unwrap();
        let raw = reassemble(&chunks);
        assert_eq!(&raw[..4], &(blocks.len() as u32).to_be_bytes());
        assert_eq!(&raw[4..], &blocks[..]);
    }

    #[test]
    fn percent_ascends_to_100() {
        let blocks = vec![0x03u8; 256 * 64 * 256];
        let chunks = encode_level_chunks(&blocks).unwrap();
        assert!(chunks.len() > 1);
        let percents: Vec<u8> = chunks.iter().map(|c| c.percent).collect();
        assert!(percents.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*percents.last().unwrap(), 100);
    }

    #[test]
    fn every_chunk_within_wire_limit() {
        let blocks = vec![0u8; 64 * 64 * 64];
        let chunks = encode_level_chunks(&blocks).unwrap();
        assert!(chunks
            .iter()
            .all(|c| (1..=CHUNK_LEN as i16).contains(&c.length)));
    }
}
