//! Round-trip integrity validation.
//!
//! A baseline hash is recorded when a file is imported; after export the
//! written file is hashed again and compared byte-for-byte. This guards
//! against encoding drift between two files that are meant to be identical.
//! It is not a diff tool: any intentional edit also fails validation.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::cache::{compute_hash, hash_file, MetadataKey, MetadataStore, StoreResult};
use crate::encoding::{codec, EncodingInfo};

/// Outcome of a round-trip comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    /// Baseline hash; empty when no baseline was recorded.
    pub original_hash: String,
    pub exported_hash: String,
    /// True iff both hashes are equal.
    pub passed: bool,
    pub message: String,
}

impl ValidationResult {
    fn compare(subject: &str, original_hash: String, exported_hash: String) -> Self {
        let passed = !original_hash.is_empty() && original_hash == exported_hash;
        let message = if passed {
            format!("{subject}: round trip preserved the file byte-for-byte")
        } else {
            format!(
                "{subject}: exported content differs from the original ({} != {})",
                short(&original_hash),
                short(&exported_hash)
            )
        };
        Self {
            original_hash,
            exported_hash,
            passed,
            message,
        }
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.passed { "PASS" } else { "FAIL" };
        write!(f, "[{status}] {}", self.message)
    }
}

fn short(hash: &str) -> &str {
    &hash[..hash.len().min(12)]
}

/// Records baseline hashes and validates exports against them.
pub struct RoundTripValidator {
    store: Arc<MetadataStore>,
}

impl RoundTripValidator {
    pub fn new(store: Arc<MetadataStore>) -> Self {
        Self { store }
    }

    /// Hash `file` and record it as the baseline for the key.
    pub fn save_file_hash(
        &self,
        table_name: &str,
        map_variant: &str,
        file: &Path,
    ) -> StoreResult<String> {
        let hash = hash_file(file)?;
        self.store
            .save_file_hash(table_name, map_variant, file, &hash)?;
        Ok(hash)
    }

    /// Record the hash of in-memory `bytes` as the baseline for the key.
    ///
    /// `file` is only recorded alongside the hash.
    pub fn save_hash_for_bytes(
        &self,
        table_name: &str,
        map_variant: &str,
        file: &Path,
        bytes: &[u8],
    ) -> StoreResult<String> {
        let hash = compute_hash(bytes);
        self.store
            .save_file_hash(table_name, map_variant, file, &hash)?;
        Ok(hash)
    }

    /// Compare `candidate` against the stored baseline for the key.
    pub fn validate_round_trip(
        &self,
        table_name: &str,
        map_variant: &str,
        candidate: &Path,
    ) -> StoreResult<ValidationResult> {
        let bytes = std::fs::read(candidate)?;
        self.validate_bytes(table_name, map_variant, &bytes)
    }

    /// Compare in-memory `bytes` against the stored baseline for the key.
    pub fn validate_bytes(
        &self,
        table_name: &str,
        map_variant: &str,
        bytes: &[u8],
    ) -> StoreResult<ValidationResult> {
        let key = MetadataKey::new(table_name, map_variant);
        let exported_hash = compute_hash(bytes);

        let Some(original_hash) = self.store.find_file_hash(table_name, map_variant)? else {
            warn!(%key, "no baseline hash recorded");
            return Ok(ValidationResult {
                original_hash: String::new(),
                exported_hash,
                passed: false,
                message: format!("{key}: no baseline hash recorded, save one before exporting"),
            });
        };

        let result = ValidationResult::compare(&key.to_string(), original_hash, exported_hash);
        if result.passed {
            info!(%key, "round trip validated");
        } else {
            warn!(%key, original = %result.original_hash, exported = %result.exported_hash, "round trip mismatch");
        }
        Ok(result)
    }

    /// Decode and re-encode `bytes` under `info` and compare the result with
    /// the input, without touching the store.
    pub fn check_codec_round_trip(bytes: &[u8], info: &EncodingInfo) -> ValidationResult {
        let decoded = codec::decode(bytes, info);
        let exported = codec::encode(&decoded.text, info);
        ValidationResult::compare(
            &format!("codec {info}"),
            compute_hash(bytes),
            compute_hash(&exported),
        )
    }
}
