//! Corpus analysis over a small on-disk table export set.

use std::fs;
use std::path::{Path, PathBuf};

use relic::analysis::{collect_table_files, AnalysisError, TableReport};
use relic::config::Settings;
use relic::encoding::{DetectionSource, EncodingInfo};
use relic::inference::{DomainKind, FieldType, SlotCategory};
use relic::Session;
use tempfile::TempDir;

const ITEMS: &str = r#"<?xml version="1.0" encoding="euc-kr"?>
<items>
  <item id="1"><name>검</name><grade>NORMAL</grade><npc_id>7</npc_id><bonus_attr1>max_hp 50</bonus_attr1><bonus_attr2>crit 3</bonus_attr2></item>
  <item id="2"><name>방패</name><grade>RARE</grade><npc_id>8</npc_id><bonus_attr1>max_hp 60</bonus_attr1><bonus_attr2>broken</bonus_attr2></item>
  <item id="3"><name>활</name><grade>NORMAL</grade><npc_id>7</npc_id><bonus_attr1>max_mp 20</bonus_attr1><bonus_attr2></bonus_attr2></item>
  <item id="4"><name>지팡이</name><grade>RARE</grade><npc_id>9</npc_id><bonus_attr1>max_hp 70</bonus_attr1></item>
</items>
"#;

const NPCS: &str = r#"<npcs><npc id="7" name="Guard" is_vendor="1"/><npc id="8" name="Smith" is_vendor="0"/></npcs>"#;

struct Corpus {
    dir: TempDir,
}

impl Corpus {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let tables = dir.path().join("tables");
        fs::create_dir_all(&tables).unwrap();

        let (items, _, had_errors) = encoding_rs::EUC_KR.encode(ITEMS);
        assert!(!had_errors);
        fs::write(tables.join("items.xml"), &items).unwrap();

        let mut npcs = vec![0xEF, 0xBB, 0xBF];
        npcs.extend_from_slice(NPCS.as_bytes());
        fs::write(tables.join("npcs.xml"), npcs).unwrap();

        fs::write(tables.join("broken.xml"), "<t><r></t>").unwrap();
        fs::write(tables.join("notes.txt"), "not a table").unwrap();

        Self { dir }
    }

    fn root(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    fn table(&self, name: &str) -> PathBuf {
        self.dir.path().join("tables").join(format!("{name}.xml"))
    }
}

fn session() -> Session {
    Session::open_in_memory(Settings::default()).unwrap()
}

fn analyze(session: &Session, corpus: &Corpus) -> Vec<Result<TableReport, AnalysisError>> {
    let files = collect_table_files(&[corpus.root()]).unwrap();
    session.corpus_analyzer().unwrap().analyze_files(&files)
}

fn rendered(report: &TableReport) -> String {
    report
        .columns
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn test_collects_only_xml_exports() {
    let corpus = Corpus::new();
    let files = collect_table_files(&[corpus.root()]).unwrap();
    let names: Vec<_> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["broken.xml", "items.xml", "npcs.xml"]);
}

#[cfg(unix)]
#[test]
fn test_symlinked_directories_are_not_followed() {
    let corpus = Corpus::new();
    let tables = corpus.root().join("tables");
    std::os::unix::fs::symlink(&tables, tables.join("loop")).unwrap();
    std::os::unix::fs::symlink(&tables, corpus.root().join("mirror")).unwrap();

    let files = collect_table_files(&[corpus.root()]).unwrap();
    assert_eq!(files.len(), 3);
    assert!(files.iter().all(|p| p.parent() == Some(tables.as_path())));
}

#[test]
fn test_item_table_report() {
    let corpus = Corpus::new();
    let session = session();
    let report = session
        .corpus_analyzer()
        .unwrap()
        .analyze_file(&corpus.table("items"))
        .unwrap();

    assert_eq!(report.table_name, "items");
    assert_eq!(report.record_count, 4);
    assert_eq!(report.encoding.info, EncodingInfo::new("EUC-KR", false));
    assert_eq!(report.encoding.source, DetectionSource::Detected);
    assert_eq!(report.replacements, 0);

    insta::assert_snapshot!(rendered(&report), @r"
    id id(90) numeric [1..4]
    name string(30) mixed 4/4 distinct
    grade string(30) enum {NORMAL, RARE}
    npc_id id(90) -> npcs.id(90) numeric [7..9]
    bonus_attr1 numeric(60) slot generic#1 mixed 4/4 distinct
    bonus_attr2 numeric(60) slot generic#2 (1 unparsed) mixed 2/2 distinct
    ");

    assert_eq!(report.slot_families.len(), 1);
    assert_eq!(report.slot_families[0].category, SlotCategory::Generic);
    assert!(report.slot_families[0].contiguous);
}

#[test]
fn test_corpus_analysis_continues_past_failures() {
    let corpus = Corpus::new();
    let session = session();
    let results = analyze(&session, &corpus);
    assert_eq!(results.len(), 3);

    assert!(matches!(&results[0], Err(AnalysisError::Xml { table, .. }) if table == "broken"));

    let npcs = results[2].as_ref().unwrap();
    assert_eq!(npcs.encoding.info, EncodingInfo::new("UTF-8", true));
    let vendor = npcs.column("is_vendor").unwrap();
    assert_eq!(vendor.field_type.field_type, FieldType::Boolean);
    assert_eq!(vendor.domain.kind, DomainKind::Numeric);
}

#[test]
fn test_detected_encodings_are_recorded() {
    let corpus = Corpus::new();
    let session = session();
    analyze(&session, &corpus);

    assert_eq!(
        session.find_metadata("items", "").unwrap(),
        Some(EncodingInfo::new("EUC-KR", false))
    );
    assert_eq!(
        session.find_metadata("npcs", "").unwrap(),
        Some(EncodingInfo::new("UTF-8", true))
    );
}

#[test]
fn test_no_persist_leaves_store_empty() {
    let corpus = Corpus::new();
    let session = session();
    let files = collect_table_files(&[corpus.root()]).unwrap();
    session
        .corpus_analyzer()
        .unwrap()
        .with_persist(false)
        .analyze_files(&files);

    assert!(session.list_metadata().unwrap().is_empty());
}

#[test]
fn test_sample_limit_caps_values() {
    let corpus = Corpus::new();
    let session = session();
    let report = session
        .corpus_analyzer()
        .unwrap()
        .with_sample_limit(2)
        .analyze_file(&corpus.table("items"))
        .unwrap();

    let id = report.column("id").unwrap();
    assert_eq!(id.domain.sample_size, 2);
    assert_eq!(id.domain.numeric_range, Some((1.0, 2.0)));
}

#[test]
fn test_missing_file_is_reported() {
    let session = session();
    let result = session
        .corpus_analyzer()
        .unwrap()
        .analyze_file(Path::new("/nonexistent/relic/items.xml"));
    assert!(matches!(result, Err(AnalysisError::Io { .. })));
}

#[test]
fn test_reports_serialize_to_json() {
    let corpus = Corpus::new();
    let session = session();
    let report = session
        .corpus_analyzer()
        .unwrap()
        .analyze_file(&corpus.table("npcs"))
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["table_name"], "npcs");
    assert_eq!(json["encoding"]["source"], "detected");
    assert_eq!(json["columns"][0]["field_type"]["field_type"], "id");
}
