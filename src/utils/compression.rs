//! Optional compression of binary frame payloads.
//!
//! Compression is only ever applied to the binary encoding and is recorded in the
//! frame flags, so decoding never has to guess. Decompression output is capped at
//! [`MAX_FRAME_SIZE`] to stop decompression bombs.

use crate::config::MAX_FRAME_SIZE;
use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::io::Read;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionKind {
    Lz4,
    Zstd,
}

impl CompressionKind {
    pub fn name(self) -> &'static str {
        match self {
            CompressionKind::Lz4 => "lz4",
            CompressionKind::Zstd => "zstd",
        }
    }
}

/// Largest output decompression may produce
const MAX_DECOMPRESSION_SIZE: usize = MAX_FRAME_SIZE;

/// Samples at or above this many bits of entropy per byte are left uncompressed.
/// Only near-random data (already compressed media, ciphertext) scores this high;
/// MessagePack field names, ids and text stay well below it.
const MIN_ENTROPY_THRESHOLD: f64 = 7.0;

/// Bytes sampled from the front of a payload for the entropy estimate
const ENTROPY_SAMPLE_SIZE: usize = 512;

/// Shannon entropy of `data` in bits per byte (0.0 for constant data, 8.0 for noise)
fn calculate_entropy(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    let mut freq = [0u32; 256];
    for &byte in data {
        freq[byte as usize] += 1;
    }

    let len = data.len() as f64;
    freq.iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = f64::from(count) / len;
            -p * p.log2()
        })
        .sum()
}

/// Compress `data` with `kind`
pub fn compress(data: &[u8], kind: CompressionKind) -> Result<Vec<u8>> {
    match kind {
        CompressionKind::Lz4 => Ok(lz4_flex::compress_prepend_size(data)),
        CompressionKind::Zstd => {
            let mut out = Vec::new();
            zstd::stream::copy_encode(data, &mut out, 1)
                .map_err(|_| ProtocolError::CompressionFailure)?;
            Ok(out)
        }
    }
}

/// Decompress `data` that was compressed with `kind`.
///
/// # Errors
/// Returns [`ProtocolError::DecompressionFailure`] for corrupt input or when the
/// output would exceed the frame ceiling.
pub fn decompress(data: &[u8], kind: CompressionKind) -> Result<Vec<u8>> {
    match kind {
        CompressionKind::Lz4 => {
            // lz4_flex prepends the uncompressed length as u32 LE; check it before
            // the decoder allocates that much
            let Some(prefix) = data.get(..4) else {
                return Err(ProtocolError::DecompressionFailure);
            };
            let claimed = u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
            if claimed > MAX_DECOMPRESSION_SIZE {
                return Err(ProtocolError::DecompressionFailure);
            }

            lz4_flex::decompress_size_prepended(data)
                .map_err(|_| ProtocolError::DecompressionFailure)
        }
        CompressionKind::Zstd => {
            let decoder = zstd::stream::Decoder::new(data)
                .map_err(|_| ProtocolError::DecompressionFailure)?;

            // read at most one byte past the limit so oversize output is detectable
            let mut out = Vec::new();
            decoder
                .take(MAX_DECOMPRESSION_SIZE as u64 + 1)
                .read_to_end(&mut out)
                .map_err(|_| ProtocolError::DecompressionFailure)?;

            if out.len() > MAX_DECOMPRESSION_SIZE {
                return Err(ProtocolError::DecompressionFailure);
            }
            Ok(out)
        }
    }
}

/// Compress `data` only when it is at least `threshold_bytes` long, looks
/// compressible, and actually shrinks. Returns `None` when the payload should be
/// sent as-is.
pub fn compress_if_worthwhile(
    data: &[u8],
    kind: CompressionKind,
    threshold_bytes: usize,
) -> Result<Option<Vec<u8>>> {
    if data.len() < threshold_bytes {
        return Ok(None);
    }

    if data.len() >= 1024 {
        let sample = &data[..data.len().min(ENTROPY_SAMPLE_SIZE)];
        if calculate_entropy(sample) >= MIN_ENTROPY_THRESHOLD {
            return Ok(None);
        }
    }

    let compressed = compress(data, kind)?;
    if compressed.len() < data.len() {
        Ok(Some(compressed))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_roundtrip_both_kinds() {
        let original = b"SillyChat frame payload, SillyChat frame payload, SillyChat frame payload";
        for kind in [CompressionKind::Lz4, CompressionKind::Zstd] {
            let packed = compress(original, kind).unwrap();
            let unpacked = decompress(&packed, kind).unwrap();
            assert_eq!(unpacked, original, "{}", kind.name());
        }
    }

    #[test]
    fn test_lz4_claimed_size_over_limit() {
        let mut bomb = ((MAX_DECOMPRESSION_SIZE + 1) as u32).to_le_bytes().to_vec();
        bomb.extend_from_slice(&[0u8; 16]);
        assert!(decompress(&bomb, CompressionKind::Lz4).is_err());
    }

    #[test]
    fn test_lz4_short_and_corrupt_input() {
        assert!(decompress(&[0x2b, 0x60], CompressionKind::Lz4).is_err());
        assert!(decompress(&[0x10, 0, 0, 0, 0xff, 0xff, 0xff], CompressionKind::Lz4).is_err());
    }

    #[test]
    fn test_zstd_garbage_rejected() {
        assert!(decompress(b"definitely not zstd", CompressionKind::Zstd).is_err());
    }

    #[test]
    fn test_entropy_estimate() {
        assert!(calculate_entropy(&[0u8; 100]) < 0.1);
        let spread: Vec<u8> = (0..=255).cycle().take(1000).collect();
        assert!(calculate_entropy(&spread) > 7.0);
    }

    #[test]
    fn test_below_threshold_left_alone() {
        assert!(compress_if_worthwhile(b"tiny", CompressionKind::Lz4, 512)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_repetitive_payload_compressed() {
        let data = vec![b'a'; 4096];
        let packed = compress_if_worthwhile(&data, CompressionKind::Zstd, 512)
            .unwrap()
            .unwrap();
        assert!(packed.len() < data.len());
        assert_eq!(decompress(&packed, CompressionKind::Zstd).unwrap(), data);
    }

    #[test]
    fn test_structured_payload_compressed() {
        // field names and ids mixed with repeated text, like an encoded message
        let mut data = Vec::new();
        for i in 0..200 {
            data.extend_from_slice(
                format!("{{\"id\":\"msg-lx3k{i:04}-a8f3k2m9q\",\"text\":\"compressible \"}}").as_bytes(),
            );
        }
        assert!(calculate_entropy(&data[..ENTROPY_SAMPLE_SIZE]) < MIN_ENTROPY_THRESHOLD);

        for kind in [CompressionKind::Lz4, CompressionKind::Zstd] {
            let packed = compress_if_worthwhile(&data, kind, 512).unwrap().unwrap();
            assert!(packed.len() < data.len(), "{}", kind.name());
            assert_eq!(decompress(&packed, kind).unwrap(), data);
        }
    }

    #[test]
    fn test_high_entropy_payload_skipped() {
        let data: Vec<u8> = (0..=255).cycle().take(2048).collect();
        assert!(compress_if_worthwhile(&data, CompressionKind::Lz4, 512)
            .unwrap()
            .is_none());
    }
}
