//! Read-through cache in front of [`MetadataStore`].
//!
//! Writes and deletes hold the key's shard lock across the store write and
//! the cache update, and misses repopulate under the same lock, so once a
//! save or delete has returned no reader can observe the value it replaced.
//! Writes must go through the cache for this to hold.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use tracing::debug;

use super::{MetadataKey, MetadataStore, StoreResult};
use crate::encoding::EncodingInfo;

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Number of cached entries.
    pub size: usize,
}

impl CacheStats {
    /// Fraction of lookups served from the cache (0.0 when unused).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// In-memory cache of encoding decisions.
pub struct MetadataCache {
    store: Arc<MetadataStore>,
    entries: DashMap<MetadataKey, EncodingInfo>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MetadataCache {
    pub fn new(store: Arc<MetadataStore>) -> Self {
        Self {
            store,
            entries: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// The backing store.
    pub(crate) fn store(&self) -> &Arc<MetadataStore> {
        &self.store
    }

    /// Look up a key, reading through to the store on a miss.
    ///
    /// Absent keys resolve to UTF-8 without BOM and are not cached.
    pub fn get_with_cache(&self, table_name: &str, map_variant: &str) -> StoreResult<EncodingInfo> {
        let key = MetadataKey::new(table_name, map_variant);

        let cached = self.entries.get(&key).map(|entry| entry.value().clone());
        if let Some(info) = cached {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(info);
        }

        match self.entries.entry(key) {
            Entry::Occupied(entry) => {
                // Populated by a concurrent reader or writer since the check above.
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(entry.get().clone())
            }
            Entry::Vacant(entry) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                match self.store.find_metadata(table_name, map_variant)? {
                    Some(info) => {
                        debug!(key = %entry.key(), encoding = %info, "cache populated");
                        entry.insert(info.clone());
                        Ok(info)
                    }
                    None => Ok(EncodingInfo::default()),
                }
            }
        }
    }

    /// Save through to the store and overwrite the cached entry.
    ///
    /// If the store write fails the cached entry is left untouched.
    pub fn save_metadata(
        &self,
        table_name: &str,
        map_variant: &str,
        file: &Path,
        info: &EncodingInfo,
    ) -> StoreResult<()> {
        let entry = self.entries.entry(MetadataKey::new(table_name, map_variant));
        self.store.save_metadata(table_name, map_variant, file, info)?;
        entry.insert(info.clone());
        Ok(())
    }

    /// Delete through to the store and drop the cached entry.
    ///
    /// Returns true if the store held a record for the key. If the store
    /// delete fails the cached entry is left untouched.
    pub fn delete_metadata(&self, table_name: &str, map_variant: &str) -> StoreResult<bool> {
        let entry = self.entries.entry(MetadataKey::new(table_name, map_variant));
        let deleted = self.store.delete_metadata(table_name, map_variant)?;
        if let Entry::Occupied(entry) = entry {
            entry.remove();
        }
        Ok(deleted)
    }

    /// Drop the cached entry for a key. Returns true if one was cached.
    pub fn invalidate(&self, table_name: &str, map_variant: &str) -> bool {
        self.entries
            .remove(&MetadataKey::new(table_name, map_variant))
            .is_some()
    }

    /// Drop every cached entry. Statistics are kept.
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: self.entries.len(),
        }
    }
}
