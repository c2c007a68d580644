//! Detection with historical fallback and confidence scoring.
//!
//! Files for the same logical table are assumed to keep their encoding over
//! time, so a weak raw guess defers to what was recorded for the table before.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::{codec, EncodingDetector, EncodingInfo};
use crate::cache::{MetadataStore, StoreResult};

/// Default minimum confidence for trusting a raw detector guess.
pub const DEFAULT_MIN_CONFIDENCE: u8 = 80;

/// Confidence lost per percentage point of replaced characters.
const CONFIDENCE_PENALTY: usize = 10;

/// Where a detection decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionSource {
    /// The raw detector guess was confident enough.
    Detected,
    /// The raw guess was weak; the table's stored encoding was used.
    Historical,
    /// Nothing was confident; UTF-8 without BOM.
    Default,
}

/// Result of [`FallbackStrategy::detect_with_fallback`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionOutcome {
    pub info: EncodingInfo,
    /// Confidence (0-100) of `info` against the file's bytes.
    pub confidence: u8,
    pub source: DetectionSource,
}

/// Score how cleanly `bytes` decode under `info`.
///
/// 100 means every character decoded; each percentage point of replacement
/// characters costs ten points, floored at 0. Empty input scores 100.
pub fn calculate_confidence(info: &EncodingInfo, bytes: &[u8]) -> u8 {
    let decoded = codec::decode(bytes, info);
    if decoded.char_count == 0 {
        return 100;
    }
    let penalty = (decoded.replacements * 100 * CONFIDENCE_PENALTY).div_ceil(decoded.char_count);
    100usize.saturating_sub(penalty) as u8
}

/// Orchestrates the detector and the stored per-table history.
pub struct FallbackStrategy {
    detector: EncodingDetector,
    store: Arc<MetadataStore>,
    min_confidence: u8,
}

impl FallbackStrategy {
    pub fn new(detector: EncodingDetector, store: Arc<MetadataStore>) -> Self {
        Self {
            detector,
            store,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }

    /// Set the minimum confidence for trusting a raw guess.
    pub fn with_min_confidence(mut self, min_confidence: u8) -> Self {
        self.min_confidence = min_confidence.min(100);
        self
    }

    pub fn detector(&self) -> &EncodingDetector {
        &self.detector
    }

    /// Decide how to decode `bytes`, the content of a file for `table_name`.
    ///
    /// The store is only consulted when the raw guess is weak. Store
    /// failures propagate.
    pub fn detect_with_fallback(
        &self,
        bytes: &[u8],
        table_name: &str,
    ) -> StoreResult<DetectionOutcome> {
        let raw = self.detector.detect(bytes);
        let raw_confidence = calculate_confidence(&raw, bytes);

        if raw_confidence >= self.min_confidence {
            debug!(table = table_name, encoding = %raw, confidence = raw_confidence, "raw guess accepted");
            return Ok(DetectionOutcome {
                info: raw,
                confidence: raw_confidence,
                source: DetectionSource::Detected,
            });
        }

        if let Some(stored) = self.store.find_for_table(table_name)? {
            let confidence = calculate_confidence(&stored, bytes);
            warn!(
                table = table_name,
                raw = %raw,
                raw_confidence,
                stored = %stored,
                confidence,
                "weak raw guess, using stored encoding"
            );
            return Ok(DetectionOutcome {
                info: stored,
                confidence,
                source: DetectionSource::Historical,
            });
        }

        let info = EncodingInfo::default();
        let confidence = calculate_confidence(&info, bytes);
        warn!(
            table = table_name,
            raw = %raw,
            raw_confidence,
            "weak raw guess and no history, using default encoding"
        );
        Ok(DetectionOutcome {
            info,
            confidence,
            source: DetectionSource::Default,
        })
    }

    /// Confidence of `info` against `bytes`.
    pub fn calculate_confidence(&self, info: &EncodingInfo, bytes: &[u8]) -> u8 {
        calculate_confidence(info, bytes)
    }
}
