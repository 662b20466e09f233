//! Content hashing.

use xxhash_rust::xxh3::xxh3_64;

/// Computes a 64-bit hash of chunk text.
#[must_use]
pub fn content_hash(text: &str) -> u64 {
    xxh3_64(text.as_bytes())
}

/// Computes a 64-bit checksum of a persisted file's bytes.
#[must_use]
pub fn checksum(bytes: &[u8]) -> u64 {
    xxh3_64(bytes)
}
