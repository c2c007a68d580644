//! SQLite-backed encoding metadata store.
//!
//! Persists the encoding decision for every `(table_name, map_variant)` so a
//! file re-opened later decodes the same way, plus the round-trip baseline
//! hashes. The store lives in `~/.relic/metadata.db` unless configured
//! otherwise.
//!
//! # Design
//!
//! - Upsert by key, last write wins
//! - No TTL - entries persist until deleted
//! - Versioned schema - a newer on-disk version is refused rather than cleared
//!
//! # Tables
//!
//! ```text
//! encoding_metadata  (table_name, map_variant) -> encoding, has_bom, file_path
//! file_hashes        (table_name, map_variant) -> hash, file_path
//! ```

mod hash;
pub mod memory;

pub use hash::{compute_hash, hash_file};
pub use memory::{CacheStats, MetadataCache};

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info};

use crate::encoding::EncodingInfo;

/// Current store schema version. Bump this when the table layout changes.
const SCHEMA_VERSION: i32 = 1;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to determine store directory")]
    NoStoreDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store schema version {found} is newer than supported version {expected}")]
    SchemaVersion { found: i32, expected: i32 },

    #[error("Store lock poisoned")]
    LockPoisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Primary key of the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MetadataKey {
    pub table_name: String,
    /// Empty when the file is not scoped to a map.
    pub map_variant: String,
}

impl MetadataKey {
    pub fn new(table_name: impl Into<String>, map_variant: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            map_variant: map_variant.into(),
        }
    }
}

impl fmt::Display for MetadataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.map_variant.is_empty() {
            write!(f, "{}", self.table_name)
        } else {
            write!(f, "{}[{}]", self.table_name, self.map_variant)
        }
    }
}

/// A stored encoding decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataRecord {
    pub key: MetadataKey,
    pub file_path: String,
    pub info: EncodingInfo,
    pub updated_at: i64,
}

/// Store statistics.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    /// Number of stored encoding decisions.
    pub encoding_entries: usize,
    /// Number of stored baseline hashes.
    pub hash_entries: usize,
    /// Point reads served since the store was opened.
    pub reads: u64,
}

/// SQLite-based metadata store.
pub struct MetadataStore {
    conn: Mutex<Connection>,
    reads: AtomicU64,
}

impl MetadataStore {
    /// Open or create the store at the default location.
    pub fn open() -> StoreResult<Self> {
        Self::open_at(Self::default_path()?)
    }

    /// Open or create the store at `path`.
    pub fn open_at<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        let store = Self::from_connection(conn);
        store.init()?;
        debug!(path = %path.display(), "metadata store opened");

        Ok(store)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self::from_connection(conn);
        store.init()?;
        Ok(store)
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            reads: AtomicU64::new(0),
        }
    }

    /// Get the default path of the store database.
    pub fn default_path() -> StoreResult<PathBuf> {
        let base = dirs::home_dir().ok_or(StoreError::NoStoreDir)?;
        Ok(base.join(".relic").join("metadata.db"))
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Initialize the schema and check version.
    fn init(&self) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS encoding_metadata (
                table_name TEXT NOT NULL,
                map_variant TEXT NOT NULL,
                file_path TEXT NOT NULL,
                encoding TEXT NOT NULL,
                has_bom INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                PRIMARY KEY (table_name, map_variant)
            );

            CREATE TABLE IF NOT EXISTS file_hashes (
                table_name TEXT NOT NULL,
                map_variant TEXT NOT NULL,
                file_path TEXT NOT NULL,
                hash TEXT NOT NULL,
                updated_at INTEGER NOT NULL,
                PRIMARY KEY (table_name, map_variant)
            );

            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;

        let stored_version: Option<i32> = conn
            .query_row("SELECT value FROM meta WHERE key = 'version'", [], |row| {
                let s: String = row.get(0)?;
                Ok(s.parse().unwrap_or(0))
            })
            .optional()?;

        match stored_version {
            Some(v) if v == SCHEMA_VERSION => {}
            Some(v) if v > SCHEMA_VERSION => {
                return Err(StoreError::SchemaVersion {
                    found: v,
                    expected: SCHEMA_VERSION,
                });
            }
            _ => {
                conn.execute(
                    "INSERT OR REPLACE INTO meta (key, value) VALUES ('version', ?)",
                    params![SCHEMA_VERSION.to_string()],
                )?;
            }
        }

        Ok(())
    }

    /// Record the encoding of `file` for a key. Last write wins.
    pub fn save_metadata(
        &self,
        table_name: &str,
        map_variant: &str,
        file: &Path,
        info: &EncodingInfo,
    ) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO encoding_metadata
                (table_name, map_variant, file_path, encoding, has_bom, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                table_name,
                map_variant,
                file.to_string_lossy().into_owned(),
                info.encoding_label,
                info.has_bom,
                now()
            ],
        )?;
        info!(
            key = %MetadataKey::new(table_name, map_variant),
            encoding = %info,
            "encoding metadata saved"
        );
        Ok(())
    }

    /// Look up the encoding for a key.
    pub fn find_metadata(
        &self,
        table_name: &str,
        map_variant: &str,
    ) -> StoreResult<Option<EncodingInfo>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let conn = self.lock()?;
        let info = conn
            .query_row(
                "SELECT encoding, has_bom FROM encoding_metadata
                 WHERE table_name = ? AND map_variant = ?",
                params![table_name, map_variant],
                |row| Ok(EncodingInfo::new(row.get::<_, String>(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(info)
    }

    /// Look up the encoding for a key, falling back to UTF-8 without BOM.
    ///
    /// File-opening code always needs some deterministic answer; use
    /// [`find_metadata`](Self::find_metadata) to distinguish absence.
    pub fn get_metadata(&self, table_name: &str, map_variant: &str) -> StoreResult<EncodingInfo> {
        Ok(self
            .find_metadata(table_name, map_variant)?
            .unwrap_or_default())
    }

    /// Best stored encoding for a table across all variants.
    ///
    /// Prefers the unscoped entry, then the most recently written variant.
    pub fn find_for_table(&self, table_name: &str) -> StoreResult<Option<EncodingInfo>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let conn = self.lock()?;
        let info = conn
            .query_row(
                "SELECT encoding, has_bom FROM encoding_metadata
                 WHERE table_name = ?
                 ORDER BY (map_variant = '') DESC, updated_at DESC, rowid DESC
                 LIMIT 1",
                params![table_name],
                |row| Ok(EncodingInfo::new(row.get::<_, String>(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(info)
    }

    /// List every stored encoding decision, ordered by key.
    pub fn list_metadata(&self) -> StoreResult<Vec<MetadataRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT table_name, map_variant, file_path, encoding, has_bom, updated_at
             FROM encoding_metadata ORDER BY table_name, map_variant",
        )?;

        let records = stmt
            .query_map([], |row| {
                Ok(MetadataRecord {
                    key: MetadataKey::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?),
                    file_path: row.get(2)?,
                    info: EncodingInfo::new(row.get::<_, String>(3)?, row.get(4)?),
                    updated_at: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Delete the encoding decision for a key.
    ///
    /// Returns true if an entry was deleted.
    pub fn delete_metadata(&self, table_name: &str, map_variant: &str) -> StoreResult<bool> {
        let conn = self.lock()?;
        let rows = conn.execute(
            "DELETE FROM encoding_metadata WHERE table_name = ? AND map_variant = ?",
            params![table_name, map_variant],
        )?;
        Ok(rows > 0)
    }

    /// Record the baseline hash of `file` for a key. Last write wins.
    pub fn save_file_hash(
        &self,
        table_name: &str,
        map_variant: &str,
        file: &Path,
        hash: &str,
    ) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO file_hashes
                (table_name, map_variant, file_path, hash, updated_at)
             VALUES (?, ?, ?, ?, ?)",
            params![table_name, map_variant, file.to_string_lossy().into_owned(), hash, now()],
        )?;
        debug!(key = %MetadataKey::new(table_name, map_variant), hash, "baseline hash saved");
        Ok(())
    }

    /// Look up the baseline hash for a key.
    pub fn find_file_hash(&self, table_name: &str, map_variant: &str) -> StoreResult<Option<String>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let conn = self.lock()?;
        let hash = conn
            .query_row(
                "SELECT hash FROM file_hashes WHERE table_name = ? AND map_variant = ?",
                params![table_name, map_variant],
                |row| row.get(0),
            )
            .optional()?;
        Ok(hash)
    }

    /// Number of point reads served so far.
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Get store statistics.
    pub fn stats(&self) -> StoreResult<StoreStats> {
        let conn = self.lock()?;
        let encoding_entries: i64 =
            conn.query_row("SELECT COUNT(*) FROM encoding_metadata", [], |row| row.get(0))?;
        let hash_entries: i64 =
            conn.query_row("SELECT COUNT(*) FROM file_hashes", [], |row| row.get(0))?;

        Ok(StoreStats {
            encoding_entries: encoding_entries as usize,
            hash_entries: hash_entries as usize,
            reads: self.read_count(),
        })
    }
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
