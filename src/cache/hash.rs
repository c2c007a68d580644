//! Content hashing for round-trip baselines.

use std::path::Path;

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of raw bytes.
///
/// Returns a 64-character lowercase hexadecimal string.
pub fn compute_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Read `path` and hash its bytes.
pub fn hash_file(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(compute_hash(&bytes))
}
