//! Encoding detection, fallback and codec behaviour across the public API.

use std::path::Path;
use std::sync::Arc;

use proptest::prelude::*;
use relic::cache::MetadataStore;
use relic::encoding::{
    calculate_confidence, decode, encode, DetectionSource, EncodingDetector, EncodingInfo,
    FallbackStrategy, LegacyCharset,
};

fn euc_kr(text: &str) -> Vec<u8> {
    let (bytes, _, had_errors) = encoding_rs::EUC_KR.encode(text);
    assert!(!had_errors);
    bytes.into_owned()
}

fn strategy() -> (FallbackStrategy, Arc<MetadataStore>) {
    let store = Arc::new(MetadataStore::open_in_memory().unwrap());
    let strategy = FallbackStrategy::new(EncodingDetector::default(), Arc::clone(&store));
    (strategy, store)
}

/// Bytes that are neither UTF-8 nor valid EUC-KR.
const GARBLED: &[u8] = b"<name>\xFF\xFFabc</name>";

#[test]
fn test_korean_table_round_trips_byte_exact() {
    let original = euc_kr("<items><item><name>전설의 검</name><desc>공격력 +5</desc></item></items>");
    let info = EncodingDetector::default().detect(&original);
    assert_eq!(info.encoding_label, "EUC-KR");

    let decoded = decode(&original, &info);
    assert!(decoded.text.contains("전설의 검"));
    assert_eq!(encode(&decoded.text, &info), original);
}

#[test]
fn test_bom_is_preserved_on_round_trip() {
    let mut original = vec![0xEF, 0xBB, 0xBF];
    original.extend_from_slice("<t>é</t>".as_bytes());

    let info = EncodingDetector::default().detect(&original);
    assert!(info.has_bom);

    let decoded = decode(&original, &info);
    assert_eq!(decoded.text, "<t>é</t>");
    assert_eq!(encode(&decoded.text, &info), original);
}

#[test]
fn test_shift_jis_detector() {
    let (bytes, _, _) = encoding_rs::SHIFT_JIS.encode("<name>ｱｲｳ 剣</name>");
    let detector = EncodingDetector::new(LegacyCharset::ShiftJis);
    assert_eq!(detector.detect(&bytes).encoding_label, "Shift_JIS");
}

#[test]
fn test_confident_guess_is_used_directly() {
    let (strategy, _) = strategy();
    let outcome = strategy
        .detect_with_fallback(&euc_kr("<n>검</n>"), "items")
        .unwrap();

    assert_eq!(outcome.source, DetectionSource::Detected);
    assert_eq!(outcome.info.encoding_label, "EUC-KR");
    assert_eq!(outcome.confidence, 100);
}

#[test]
fn test_weak_guess_prefers_history() {
    let (strategy, store) = strategy();
    store
        .save_metadata("items", "", Path::new("items.xml"), &EncodingInfo::new("EUC-KR", false))
        .unwrap();

    let outcome = strategy.detect_with_fallback(GARBLED, "items").unwrap();
    assert_eq!(outcome.source, DetectionSource::Historical);
    assert_eq!(outcome.info, EncodingInfo::new("EUC-KR", false));
}

#[test]
fn test_weak_guess_without_history_defaults() {
    let (strategy, _) = strategy();
    let outcome = strategy.detect_with_fallback(GARBLED, "items").unwrap();
    assert_eq!(outcome.source, DetectionSource::Default);
    assert_eq!(outcome.info, EncodingInfo::utf8());
}

#[test]
fn test_history_is_per_table() {
    let (strategy, store) = strategy();
    store
        .save_metadata("npcs", "", Path::new("npcs.xml"), &EncodingInfo::new("EUC-KR", false))
        .unwrap();

    let outcome = strategy.detect_with_fallback(GARBLED, "items").unwrap();
    assert_eq!(outcome.source, DetectionSource::Default);
}

#[test]
fn test_lower_threshold_accepts_weak_guess() {
    let (strategy, _) = strategy();
    let strategy = strategy.with_min_confidence(0);
    let outcome = strategy.detect_with_fallback(GARBLED, "items").unwrap();
    assert_eq!(outcome.source, DetectionSource::Detected);
}

proptest! {
    #[test]
    fn confidence_is_bounded(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let info = EncodingDetector::default().detect(&bytes);
        prop_assert!(calculate_confidence(&info, &bytes) <= 100);
    }

    #[test]
    fn confidence_never_rises_with_more_errors(
        clean in 1usize..200,
        fewer in 0usize..40,
        extra in 0usize..40,
    ) {
        let sample = |bad: usize| {
            let mut bytes = vec![b'a'; clean];
            bytes.extend(std::iter::repeat(0xFFu8).take(bad));
            bytes
        };

        let info = EncodingInfo::utf8();
        let better = calculate_confidence(&info, &sample(fewer));
        let worse = calculate_confidence(&info, &sample(fewer + extra));
        prop_assert!(better >= worse);
    }

    #[test]
    fn fallback_confidence_never_rises_with_more_errors(
        clean in 1usize..200,
        fewer in 0usize..40,
        extra in 0usize..40,
        with_history in any::<bool>(),
    ) {
        let sample = |bad: usize| {
            let mut bytes = b"<name>".to_vec();
            bytes.extend(std::iter::repeat(b'a').take(clean));
            bytes.extend(std::iter::repeat(0xFFu8).take(bad));
            bytes.extend_from_slice(b"</name>");
            bytes
        };

        let (strategy, store) = strategy();
        if with_history {
            store
                .save_metadata("items", "", Path::new("items.xml"), &EncodingInfo::new("EUC-KR", false))
                .unwrap();
        }

        let better = strategy.detect_with_fallback(&sample(fewer), "items").unwrap();
        let worse = strategy.detect_with_fallback(&sample(fewer + extra), "items").unwrap();
        prop_assert!(better.confidence <= 100);
        prop_assert!(worse.confidence <= 100);
        prop_assert!(better.confidence >= worse.confidence);
    }

    #[test]
    fn clean_ascii_is_fully_confident(text in "[ -~]{0,200}") {
        let bytes = text.as_bytes();
        let info = EncodingDetector::default().detect(bytes);
        prop_assert_eq!(info, EncodingInfo::utf8());
        prop_assert_eq!(calculate_confidence(&EncodingInfo::utf8(), bytes), 100);
    }
}
