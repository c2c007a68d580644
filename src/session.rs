//! Process-wide lifecycle object.
//!
//! A [`Session`] owns the metadata store and everything layered on it. Open
//! one per process (or per test) and pass it around instead of reaching for
//! globals.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::analysis::{AnalysisResult, CorpusAnalyzer};
use crate::cache::{MetadataCache, MetadataRecord, MetadataStore, StoreError, StoreStats};
use crate::config::{Settings, SettingsError};
use crate::encoding::{
    codec, DecodedText, DetectionOutcome, DetectionSource, EncodingDetector, EncodingInfo,
    FallbackStrategy,
};
use crate::inference::{FieldTypeInferrer, ReferenceDetector, ValueDomainAnalyzer};
use crate::validation::RoundTripValidator;

/// Errors raised by session-level file operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Configuration error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// A table file decoded for editing.
#[derive(Debug, Clone)]
pub struct OpenedTable {
    pub text: DecodedText,
    pub encoding: DetectionOutcome,
}

pub struct Session {
    settings: Settings,
    store: Arc<MetadataStore>,
    cache: Arc<MetadataCache>,
    fallback: Arc<FallbackStrategy>,
    validator: RoundTripValidator,
}

impl Session {
    /// Open the store named by `settings` (or the default location).
    pub fn open(settings: Settings) -> SessionResult<Self> {
        let path = settings.store_path()?;
        let store = MetadataStore::open_at(&path)?;
        info!(store = %path.display(), "session opened");
        Self::with_store(settings, store)
    }

    /// Open a session backed by a throwaway in-memory store.
    pub fn open_in_memory(settings: Settings) -> SessionResult<Self> {
        Self::with_store(settings, MetadataStore::open_in_memory()?)
    }

    fn with_store(settings: Settings, store: MetadataStore) -> SessionResult<Self> {
        settings.validate()?;
        let store = Arc::new(store);
        let detector = EncodingDetector::new(settings.legacy_charset()?);
        let fallback = FallbackStrategy::new(detector, Arc::clone(&store))
            .with_min_confidence(settings.detection.min_confidence);

        Ok(Self {
            cache: Arc::new(MetadataCache::new(Arc::clone(&store))),
            fallback: Arc::new(fallback),
            validator: RoundTripValidator::new(Arc::clone(&store)),
            store,
            settings,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn cache(&self) -> &Arc<MetadataCache> {
        &self.cache
    }

    pub fn fallback(&self) -> &FallbackStrategy {
        &self.fallback
    }

    pub fn validator(&self) -> &RoundTripValidator {
        &self.validator
    }

    pub fn field_type_inferrer(&self) -> FieldTypeInferrer {
        FieldTypeInferrer::new()
    }

    /// Reference detector primed with the configured known tables.
    pub fn reference_detector(&self) -> ReferenceDetector {
        ReferenceDetector::new().with_known_tables(&self.settings.inference.known_tables)
    }

    pub fn domain_analyzer(&self) -> ValueDomainAnalyzer {
        self.settings.domain_analyzer()
    }

    /// Corpus analyzer configured from `[analysis]` and `[inference]`.
    pub fn corpus_analyzer(&self) -> AnalysisResult<CorpusAnalyzer> {
        Ok(CorpusAnalyzer::new(
            self.settings.worker_count(),
            Arc::clone(&self.fallback),
            Arc::clone(&self.cache),
        )?
        .with_domain_analyzer(self.domain_analyzer())
        .with_known_tables(self.settings.inference.known_tables.clone())
        .with_sample_limit(self.settings.analysis.sample_limit))
    }

    /// Recorded encoding for a key, if any.
    pub fn find_metadata(
        &self,
        table_name: &str,
        map_variant: &str,
    ) -> SessionResult<Option<EncodingInfo>> {
        Ok(self.store.find_metadata(table_name, map_variant)?)
    }

    pub fn list_metadata(&self) -> SessionResult<Vec<MetadataRecord>> {
        Ok(self.store.list_metadata()?)
    }

    pub fn store_stats(&self) -> SessionResult<StoreStats> {
        Ok(self.store.stats()?)
    }

    /// Forget the recorded encoding for a key. Returns true if one existed.
    pub fn delete_metadata(&self, table_name: &str, map_variant: &str) -> SessionResult<bool> {
        Ok(self.cache.delete_metadata(table_name, map_variant)?)
    }

    /// Decide the encoding of `bytes` for `table_name`.
    pub fn detect(&self, bytes: &[u8], table_name: &str) -> SessionResult<DetectionOutcome> {
        Ok(self.fallback.detect_with_fallback(bytes, table_name)?)
    }

    /// Read and decode a table file, recording the encoding decision and the
    /// baseline hash so a later export can be checked.
    ///
    /// A decision that fell back to the default encoding is not recorded.
    pub fn open_table(
        &self,
        table_name: &str,
        map_variant: &str,
        path: &Path,
    ) -> SessionResult<OpenedTable> {
        let bytes = fs::read(path)?;
        let encoding = self.detect(&bytes, table_name)?;
        if encoding.source != DetectionSource::Default {
            self.cache
                .save_metadata(table_name, map_variant, path, &encoding.info)?;
        }
        self.validator
            .save_hash_for_bytes(table_name, map_variant, path, &bytes)?;

        Ok(OpenedTable {
            text: codec::decode(&bytes, &encoding.info),
            encoding,
        })
    }

    /// Encode `text` with the key's recorded encoding and write it to `path`.
    pub fn save_table(
        &self,
        table_name: &str,
        map_variant: &str,
        path: &Path,
        text: &str,
    ) -> SessionResult<EncodingInfo> {
        let info = self.cache.get_with_cache(table_name, map_variant)?;
        fs::write(path, codec::encode(text, &info))?;
        info!(table = table_name, variant = map_variant, encoding = %info, "table saved");
        Ok(info)
    }
}
