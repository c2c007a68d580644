//! Metadata store persistence and cache coherence.

use std::path::Path;
use std::sync::Arc;
use std::thread;

use relic::cache::{MetadataCache, MetadataStore, StoreError};
use relic::encoding::EncodingInfo;
use tempfile::TempDir;

fn euc_kr() -> EncodingInfo {
    EncodingInfo::new("EUC-KR", false)
}

fn utf8_bom() -> EncodingInfo {
    EncodingInfo::new("UTF-8", true)
}

fn store_in(dir: &TempDir) -> MetadataStore {
    MetadataStore::open_at(dir.path().join("nested").join("metadata.db")).unwrap()
}

#[test]
fn test_entries_survive_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let store = store_in(&dir);
        store
            .save_metadata("items", "", Path::new("data/items.xml"), &euc_kr())
            .unwrap();
        store
            .save_file_hash("items", "", Path::new("data/items.xml"), "abc123")
            .unwrap();
    }

    let store = store_in(&dir);
    assert_eq!(store.get_metadata("items", "").unwrap(), euc_kr());
    assert_eq!(
        store.find_file_hash("items", "").unwrap().as_deref(),
        Some("abc123")
    );

    let records = store.list_metadata().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].file_path, Path::new("data/items.xml").to_string_lossy());
}

#[test]
fn test_newer_schema_is_refused() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("metadata.db");
    drop(MetadataStore::open_at(&path).unwrap());

    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute("UPDATE meta SET value = '99' WHERE key = 'version'", [])
        .unwrap();
    drop(conn);

    assert!(matches!(
        MetadataStore::open_at(&path),
        Err(StoreError::SchemaVersion { found: 99, .. })
    ));
}

#[test]
fn test_absent_key_defaults_to_utf8() {
    let store = MetadataStore::open_in_memory().unwrap();
    assert_eq!(store.get_metadata("nothing", "").unwrap(), EncodingInfo::utf8());
    assert_eq!(store.find_metadata("nothing", "").unwrap(), None);
}

#[test]
fn test_cached_reads_are_idempotent() {
    let store = Arc::new(MetadataStore::open_in_memory().unwrap());
    store
        .save_metadata("npcs", "map01", Path::new("npcs.xml"), &utf8_bom())
        .unwrap();
    let cache = MetadataCache::new(Arc::clone(&store));

    let first = cache.get_with_cache("npcs", "map01").unwrap();
    let reads_after_first = store.read_count();
    let second = cache.get_with_cache("npcs", "map01").unwrap();

    assert_eq!(first, second);
    assert_eq!(first, utf8_bom());
    assert_eq!(store.read_count(), reads_after_first);

    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses, stats.size), (1, 1, 1));
}

#[test]
fn test_save_through_cache_is_visible_immediately() {
    let store = Arc::new(MetadataStore::open_in_memory().unwrap());
    let cache = MetadataCache::new(Arc::clone(&store));

    cache
        .save_metadata("items", "", Path::new("items.xml"), &euc_kr())
        .unwrap();
    assert_eq!(cache.get_with_cache("items", "").unwrap(), euc_kr());

    cache
        .save_metadata("items", "", Path::new("items.xml"), &utf8_bom())
        .unwrap();
    assert_eq!(cache.get_with_cache("items", "").unwrap(), utf8_bom());
    assert_eq!(store.get_metadata("items", "").unwrap(), utf8_bom());
}

#[test]
fn test_concurrent_writers_leave_cache_and_store_in_agreement() {
    let store = Arc::new(MetadataStore::open_in_memory().unwrap());
    let cache = MetadataCache::new(Arc::clone(&store));
    let candidates = &[euc_kr(), utf8_bom(), EncodingInfo::utf8()];

    thread::scope(|scope| {
        for i in 0..8 {
            let cache = &cache;
            let info = candidates[i % candidates.len()].clone();
            scope.spawn(move || {
                for _ in 0..25 {
                    cache
                        .save_metadata("items", "", Path::new("items.xml"), &info)
                        .unwrap();
                    let seen = cache.get_with_cache("items", "").unwrap();
                    assert!(candidates.contains(&seen));
                }
            });
        }
    });

    let cached = cache.get_with_cache("items", "").unwrap();
    assert_eq!(cached, store.get_metadata("items", "").unwrap());
    assert_eq!(store.list_metadata().unwrap().len(), 1);
}

#[test]
fn test_delete_through_cache_keeps_store_in_agreement() {
    let store = Arc::new(MetadataStore::open_in_memory().unwrap());
    let cache = MetadataCache::new(Arc::clone(&store));
    cache
        .save_metadata("items", "", Path::new("items.xml"), &euc_kr())
        .unwrap();
    assert_eq!(cache.get_with_cache("items", "").unwrap(), euc_kr());

    assert!(cache.delete_metadata("items", "").unwrap());
    assert_eq!(store.find_metadata("items", "").unwrap(), None);
    assert_eq!(
        cache.get_with_cache("items", "").unwrap(),
        store.get_metadata("items", "").unwrap()
    );
}

#[test]
fn test_invalidate_rereads_store() {
    let store = Arc::new(MetadataStore::open_in_memory().unwrap());
    let cache = MetadataCache::new(Arc::clone(&store));
    cache
        .save_metadata("items", "", Path::new("items.xml"), &euc_kr())
        .unwrap();

    assert!(cache.invalidate("items", ""));
    let reads = store.read_count();
    assert_eq!(cache.get_with_cache("items", "").unwrap(), euc_kr());
    assert_eq!(store.read_count(), reads + 1);
}
