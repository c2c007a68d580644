//! Round-trip validation against recorded baselines.

use std::fs;
use std::sync::Arc;

use proptest::prelude::*;
use relic::cache::{compute_hash, MetadataStore};
use relic::encoding::EncodingInfo;
use relic::validation::RoundTripValidator;
use tempfile::TempDir;

fn validator() -> RoundTripValidator {
    RoundTripValidator::new(Arc::new(MetadataStore::open_in_memory().unwrap()))
}

#[test]
fn test_unmodified_copy_passes() {
    let dir = TempDir::new().unwrap();
    let original = dir.path().join("items.xml");
    let exported = dir.path().join("items.export.xml");
    fs::write(&original, b"<items><item id=\"1\"/></items>").unwrap();
    fs::copy(&original, &exported).unwrap();

    let validator = validator();
    let hash = validator.save_file_hash("items", "", &original).unwrap();
    assert_eq!(hash.len(), 64);

    let result = validator
        .validate_round_trip("items", "", &exported)
        .unwrap();
    assert!(result.passed, "{result}");
    assert_eq!(result.original_hash, hash);
    assert_eq!(result.exported_hash, hash);
}

#[test]
fn test_edited_export_fails() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("items.xml");
    fs::write(&file, b"<items><item id=\"1\"/></items>").unwrap();

    let validator = validator();
    validator.save_file_hash("items", "", &file).unwrap();
    fs::write(&file, b"<items><item id=\"2\"/></items>").unwrap();

    let result = validator.validate_round_trip("items", "", &file).unwrap();
    assert!(!result.passed);
    assert_ne!(result.original_hash, result.exported_hash);
    assert!(result.to_string().starts_with("[FAIL]"));
}

#[test]
fn test_missing_baseline_fails_with_message() {
    let result = validator().validate_bytes("items", "map02", b"<t/>").unwrap();
    assert!(!result.passed);
    assert!(result.original_hash.is_empty());
    assert_eq!(result.exported_hash, compute_hash(b"<t/>"));
    insta::assert_snapshot!(
        result.message,
        @"items[map02]: no baseline hash recorded, save one before exporting"
    );
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    assert!(validator()
        .save_file_hash("items", "", &dir.path().join("absent.xml"))
        .is_err());
}

#[test]
fn test_variants_have_separate_baselines() {
    let validator = validator();
    let path = std::path::Path::new("npcs.xml");
    validator
        .save_hash_for_bytes("npcs", "map01", path, b"one")
        .unwrap();
    validator
        .save_hash_for_bytes("npcs", "map02", path, b"two")
        .unwrap();

    assert!(validator.validate_bytes("npcs", "map01", b"one").unwrap().passed);
    assert!(!validator.validate_bytes("npcs", "map01", b"two").unwrap().passed);
    assert!(validator.validate_bytes("npcs", "map02", b"two").unwrap().passed);
}

#[test]
fn test_codec_round_trip_check() {
    let (bytes, _, _) = encoding_rs::EUC_KR.encode("<name>방패</name>");
    let result =
        RoundTripValidator::check_codec_round_trip(&bytes, &EncodingInfo::new("EUC-KR", false));
    assert!(result.passed, "{result}");

    // Undecodable under UTF-8: replacement characters re-encode differently.
    let result = RoundTripValidator::check_codec_round_trip(&bytes, &EncodingInfo::utf8());
    assert!(!result.passed);
}

proptest! {
    #[test]
    fn identical_bytes_always_pass(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        let validator = validator();
        validator
            .save_hash_for_bytes("t", "", std::path::Path::new("t.xml"), &bytes)
            .unwrap();
        prop_assert!(validator.validate_bytes("t", "", &bytes).unwrap().passed);
    }

    #[test]
    fn single_byte_change_fails(
        bytes in proptest::collection::vec(any::<u8>(), 1..512),
        index in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        let validator = validator();
        validator
            .save_hash_for_bytes("t", "", std::path::Path::new("t.xml"), &bytes)
            .unwrap();

        let mut modified = bytes.clone();
        let i = index.index(modified.len());
        modified[i] ^= flip;

        prop_assert!(!validator.validate_bytes("t", "", &modified).unwrap().passed);
    }
}
