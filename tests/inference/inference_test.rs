//! Column inference over realistic game-table column names and values.

use relic::inference::slot::{self, extract_slot_info, is_bonus_attr_field, parse_value};
use relic::inference::{
    DomainKind, FieldType, FieldTypeInferrer, PatternCategoryCatalog, ReferenceDetector,
    SlotCategory, SlotInfo, ValueDomainAnalyzer,
};

#[test]
fn test_field_types_of_an_item_table() {
    let inferrer = FieldTypeInferrer::new();
    let cases = [
        ("id", FieldType::Id, 90),
        ("item_id", FieldType::Id, 90),
        ("is_tradable", FieldType::Boolean, 90),
        ("can_enchant", FieldType::Boolean, 90),
        ("item_type", FieldType::Enum, 75),
        ("level", FieldType::Numeric, 60),
        ("max_stack_count", FieldType::Numeric, 60),
        ("desc", FieldType::String, 30),
    ];

    for (name, field_type, confidence) in cases {
        let result = inferrer.infer_from_name(name);
        assert_eq!(result.field_type, field_type, "{name}");
        assert_eq!(result.confidence, confidence, "{name}");
    }
}

#[test]
fn test_confidences_are_bounded() {
    let inferrer = FieldTypeInferrer::new();
    let detector = ReferenceDetector::new();
    for name in ["", "id", "npc_id", "x", "bonus_attr_a12", "reward_item3", "is_"] {
        assert!(inferrer.infer_from_name(name).confidence <= 100);
        assert!(detector.detect_field(name).confidence <= 100);
    }
}

#[test]
fn test_reference_detection() {
    let detector = ReferenceDetector::new();

    let item = detector.detect_field("item_id");
    assert!(item.is_reference);
    assert_eq!(item.target_table_name.as_deref(), Some("items"));
    assert_eq!(item.target_field_name.as_deref(), Some("id"));
    assert!(item.confidence >= 60);

    let name = detector.detect_field("name");
    assert!(!name.is_reference);
    assert_eq!(name.confidence, 0);
    assert!(name.target_table_name.is_none());
}

#[test]
fn test_reference_to_corpus_table() {
    let detector = ReferenceDetector::new().with_known_tables(["abilities"]);
    let result = detector.detect_field("ability_id");
    assert_eq!(result.target_table_name.as_deref(), Some("abilities"));
    assert_eq!(result.confidence, 90);
}

#[test]
fn test_slot_fields() {
    assert!(is_bonus_attr_field("bonus_attr1"));
    assert_eq!(
        extract_slot_info("bonus_attr1"),
        Some(SlotInfo {
            category: SlotCategory::Generic,
            slot_index: 1
        })
    );

    assert!(is_bonus_attr_field("physical_bonus_attr3"));
    assert_eq!(
        extract_slot_info("physical_bonus_attr3"),
        Some(SlotInfo {
            category: SlotCategory::Physical,
            slot_index: 3
        })
    );

    assert!(!is_bonus_attr_field("item_id"));
    assert_eq!(extract_slot_info("item_id"), None);
}

#[test]
fn test_slot_values() {
    let value = parse_value("max_hp 500").unwrap();
    assert_eq!(value.attr_code, "max_hp");
    assert_eq!(value.value, 500.0);

    assert!(parse_value("max_hp").is_none());
    assert!(parse_value("max_hp five").is_none());
}

#[test]
fn test_slot_families_report_gaps() {
    let names = [
        "id",
        "bonus_attr1",
        "bonus_attr2",
        "bonus_attr4",
        "magical_bonus_attr_a1",
    ];
    let families = slot::analyze_fields(names);

    let generic = families
        .iter()
        .find(|f| f.category == SlotCategory::Generic)
        .unwrap();
    assert_eq!(generic.indices, vec![1, 2, 4]);
    assert!(!generic.contiguous);
    assert_eq!(generic.missing_indices(), vec![3]);

    let magical = families
        .iter()
        .find(|f| f.category == SlotCategory::Magical)
        .unwrap();
    assert!(magical.contiguous);
}

#[test]
fn test_value_domains() {
    let analyzer = ValueDomainAnalyzer::default();

    let numeric = analyzer.analyze_field(1, &["100", "200", "150", "180", "100", "200", "150"]);
    assert_eq!(numeric.kind, DomainKind::Numeric);
    assert_eq!(numeric.numeric_range, Some((100.0, 200.0)));

    let grades = analyzer.analyze_field(2, &["NORMAL", "RARE", "EPIC", "NORMAL", "RARE", "NORMAL"]);
    assert_eq!(grades.kind, DomainKind::Enum);
    assert_eq!(grades.distinct_count, 3);
    assert_eq!(grades.sample_size, 6);

    let ids = analyzer.analyze_field(3, &["item1", "item2", "item1", "npc3", "item1", "item2"]);
    assert_eq!(ids.kind, DomainKind::Mixed);
    assert_eq!(ids.distinct_count, 3);
    assert_eq!(ids.sample_size, 6);
}

#[test]
fn test_values_refine_unnamed_columns() {
    let inferrer = FieldTypeInferrer::new();
    let result = inferrer.infer("quality", &["1", "0", "0", "1"]);
    assert_eq!(result.field_type, FieldType::Boolean);
}

#[test]
fn test_catalog() {
    assert_eq!(PatternCategoryCatalog::len(), 27);
    let quest = PatternCategoryCatalog::get("quest").unwrap();
    insta::assert_snapshot!(
        format!("{} {} {}", quest.mechanism_icon, quest.mechanism_code, quest.mechanism_name),
        @"📜 quest Quests"
    );
}
