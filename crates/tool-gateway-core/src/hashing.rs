// crates/tool-gateway-core/src/hashing.rs
// ============================================================================
// Module: Content Hashing
// Description: SHA-256 digests over extracted text.
// Purpose: Provide stable content hashes for fetch envelopes.
// Dependencies: sha2
// ============================================================================

//! ## Overview
//! Fetch envelopes carry a lowercase hex SHA-256 digest of the UTF-8 bytes of
//! `extracted_text`. Empty text has no hash.

use sha2::Digest;
use sha2::Sha256;

/// Returns the lowercase hex SHA-256 digest of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex_encode(&Sha256::digest(bytes))
}

/// Returns the content hash for extracted text, or `None` when it is empty.
#[must_use]
pub fn content_hash(text: &str) -> Option<String> {
    if text.is_empty() { None } else { Some(sha256_hex(text.as_bytes())) }
}

/// Encodes bytes as lowercase hex.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[usize::from(byte >> 4)] as char);
        out.push(HEX[usize::from(byte & 0x0f)] as char);
    }
    out
}
