//! Integrity digests for encoded payloads and file chunks.
//!
//! Every digest in the protocol is the lowercase hex SHA-256 of the raw bytes, so a
//! receiver can detect transport corruption without decoding anything.

use crate::error::{ProtocolError, Result};
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `data`
pub fn checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Recompute the digest of `data` and compare it to `expected`.
///
/// Comparison ignores ASCII case so digests produced by uppercase-hex peers still match.
pub fn verify_checksum(data: &[u8], expected: &str) -> Result<()> {
    let actual = checksum(data);
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(ProtocolError::ChecksumMismatch {
            expected: expected.to_string(),
            actual,
        })
    }
}
