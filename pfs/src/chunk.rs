//! Chunked deflate streams.
//!
//! A stored file is a back-to-back sequence of
//! `{deflated_len: u32, inflated_len: u32, payload[deflated_len]}` triples,
//! each payload an independent zlib stream. Payloads are split at
//! [`MAX_BLOCK_SIZE`] before compression so no single compressed unit
//! exceeds the size ceiling the client expects; writers must preserve this
//! bound for interoperability.
//!
//! The stream carries no total-length field of its own. Decoding stops once
//! the accumulated inflated bytes reach the caller's expected total, which
//! comes from the directory record.

use crate::cursor::ByteCursor;
use crate::{Error, Result};
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use std::io::{Read, Write};
use tracing::trace;

/// Maximum number of payload bytes per chunk, before compression.
pub const MAX_BLOCK_SIZE: usize = 8192;

/// Deflate `payload` into a chunk stream. An empty payload produces an
/// empty stream (zero triples).
pub fn compress_blocks(payload: &[u8]) -> Result<Vec<u8>> {
    let mut stream = Vec::new();
    for block in payload.chunks(MAX_BLOCK_SIZE) {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(block)?;
        let deflated = encoder.finish()?;

        trace!("deflated block: {} -> {} bytes", block.len(), deflated.len());
        stream.extend_from_slice(&(deflated.len() as u32).to_le_bytes());
        stream.extend_from_slice(&(block.len() as u32).to_le_bytes());
        stream.extend_from_slice(&deflated);
    }
    Ok(stream)
}

/// Inflate a chunk stream back into the original payload.
///
/// Every chunk's actual inflated length is checked against its declared
/// `inflated_len`; a mismatch fails with [`Error::ChunkSizeMismatch`].
pub fn decompress_blocks(stream: &[u8], expected_inflated: u32) -> Result<Vec<u8>> {
    let mut cursor = ByteCursor::new(stream);
    let mut out = Vec::with_capacity(expected_inflated as usize);

    while (out.len() as u32) < expected_inflated {
        let deflated_len = cursor.read_u32()?;
        let inflated_len = cursor.read_u32()?;
        let payload = cursor.read_bytes(deflated_len as usize)?;

        let mut block = Vec::with_capacity(inflated_len as usize);
        ZlibDecoder::new(payload)
            .read_to_end(&mut block)
            .map_err(|e| Error::DecompressionFailed(e.to_string()))?;

        if block.len() as u32 != inflated_len {
            return Err(Error::ChunkSizeMismatch {
                declared: inflated_len,
                actual: block.len() as u32,
            });
        }

        trace!("inflated block: {} -> {} bytes", deflated_len, inflated_len);
        out.extend_from_slice(&block);
    }

    Ok(out)
}

/// Walk a chunk stream without inflating it, returning the raw stream
/// bytes and leaving the cursor at the first byte past the stream.
///
/// Used on the archive read path to bound each entry's chunk region so
/// inflation can happen lazily.
pub fn scan_blocks<'a>(
    cursor: &mut ByteCursor<'a>,
    expected_inflated: u32,
) -> Result<&'a [u8]> {
    let start = cursor.position();
    let mut inflated_total = 0u32;

    while inflated_total < expected_inflated {
        let deflated_len = cursor.read_u32()?;
        let inflated_len = cursor.read_u32()?;
        cursor.skip(u64::from(deflated_len))?;
        inflated_total = inflated_total.saturating_add(inflated_len);
    }

    let end = cursor.position();
    cursor.set_position(start)?;
    let stream = cursor.read_bytes((end - start) as usize)?;
    Ok(stream)
}
