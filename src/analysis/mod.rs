//! Corpus analysis.
//!
//! Runs the encoding layer and the column analyzers over a set of exported
//! table files on a bounded worker pool. Files are independent, and so are
//! the columns within a file, so both levels fan out in parallel.
//!
//! Each column report carries the analyzers' hypotheses side by side; they
//! are not merged into a single schema decision.

pub mod table;

pub use table::{parse_table, TableColumn, TableData};

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::cache::{MetadataCache, StoreError};
use crate::encoding::{codec, DetectionOutcome, DetectionSource, FallbackStrategy};
use crate::inference::{
    slot, FieldTypeInferrer, InferenceResult, ReferenceDetectionResult, ReferenceDetector,
    SlotFamily, SlotInfo, ValueDomainAnalyzer, ValueDomainStatistics,
};

/// File extension of table exports.
const TABLE_EXTENSION: &str = "xml";

/// Errors that can occur while analyzing a table file.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed table {table}: {message}")]
    Xml { table: String, message: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Hypotheses for one column.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnReport {
    pub name: String,
    pub field_type: InferenceResult,
    pub reference: ReferenceDetectionResult,
    pub slot: Option<SlotInfo>,
    /// Slot cells that did not parse as `<attr_code> <number>`.
    pub slot_parse_failures: usize,
    pub domain: ValueDomainStatistics,
}

impl fmt::Display for ColumnReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}({})",
            self.name, self.field_type.field_type, self.field_type.confidence
        )?;

        if let (Some(table), Some(field)) = (
            &self.reference.target_table_name,
            &self.reference.target_field_name,
        ) {
            write!(f, " -> {table}.{field}({})", self.reference.confidence)?;
        }

        if let Some(slot) = &self.slot {
            write!(f, " slot {}#{}", slot.category, slot.slot_index)?;
            if self.slot_parse_failures > 0 {
                write!(f, " ({} unparsed)", self.slot_parse_failures)?;
            }
        }

        let domain = &self.domain;
        write!(f, " {}", domain.kind)?;
        match (&domain.numeric_range, &domain.frequency_table) {
            (Some((min, max)), _) => write!(f, " [{min}..{max}]"),
            (None, Some(table)) => {
                let labels: Vec<&str> = table.keys().map(String::as_str).collect();
                write!(f, " {{{}}}", labels.join(", "))
            }
            (None, None) => write!(f, " {}/{} distinct", domain.distinct_count, domain.sample_size),
        }
    }
}

/// Analysis of one table file.
#[derive(Debug, Clone, Serialize)]
pub struct TableReport {
    pub table_name: String,
    pub path: PathBuf,
    pub encoding: DetectionOutcome,
    /// Replacement characters produced while decoding.
    pub replacements: usize,
    pub record_count: usize,
    pub columns: Vec<ColumnReport>,
    pub slot_families: Vec<SlotFamily>,
}

impl TableReport {
    pub fn column(&self, name: &str) -> Option<&ColumnReport> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Parallel analyzer over a set of table files.
pub struct CorpusAnalyzer {
    pool: ThreadPool,
    fallback: Arc<FallbackStrategy>,
    cache: Arc<MetadataCache>,
    field_types: FieldTypeInferrer,
    domains: ValueDomainAnalyzer,
    known_tables: Vec<String>,
    sample_limit: usize,
    persist: bool,
}

impl CorpusAnalyzer {
    /// Create an analyzer with `workers` threads.
    pub fn new(
        workers: usize,
        fallback: Arc<FallbackStrategy>,
        cache: Arc<MetadataCache>,
    ) -> AnalysisResult<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("relic-analyze-{i}"))
            .build()?;

        Ok(Self {
            pool,
            fallback,
            cache,
            field_types: FieldTypeInferrer::new(),
            domains: ValueDomainAnalyzer::default(),
            known_tables: Vec::new(),
            sample_limit: usize::MAX,
            persist: true,
        })
    }

    pub fn with_domain_analyzer(mut self, domains: ValueDomainAnalyzer) -> Self {
        self.domains = domains;
        self
    }

    /// Table names treated as exact reference targets besides the analyzed files.
    pub fn with_known_tables(mut self, tables: Vec<String>) -> Self {
        self.known_tables = tables;
        self
    }

    /// Maximum values per column fed to the analyzers.
    pub fn with_sample_limit(mut self, sample_limit: usize) -> Self {
        self.sample_limit = sample_limit.max(1);
        self
    }

    /// Whether detected encodings are saved to the metadata store.
    pub fn with_persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    pub fn worker_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Analyze every file, in input order. One failed file does not stop the rest.
    pub fn analyze_files(&self, paths: &[PathBuf]) -> Vec<AnalysisResult<TableReport>> {
        let detector = self.reference_detector(paths);
        info!(files = paths.len(), workers = self.worker_count(), "analyzing corpus");

        self.pool.install(|| {
            paths
                .par_iter()
                .map(|path| self.analyze_file_with(path, &detector))
                .collect()
        })
    }

    /// Analyze a single file.
    pub fn analyze_file(&self, path: &Path) -> AnalysisResult<TableReport> {
        let detector = self.reference_detector(std::slice::from_ref(&path.to_path_buf()));
        self.pool.install(|| self.analyze_file_with(path, &detector))
    }

    fn reference_detector(&self, paths: &[PathBuf]) -> ReferenceDetector {
        ReferenceDetector::new()
            .with_known_tables(&self.known_tables)
            .with_known_tables(paths.iter().filter_map(|p| table_name(p)))
    }

    fn analyze_file_with(
        &self,
        path: &Path,
        detector: &ReferenceDetector,
    ) -> AnalysisResult<TableReport> {
        let table_name = table_name(path).unwrap_or_default();
        let bytes = fs::read(path).map_err(|source| AnalysisError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let encoding = self.fallback.detect_with_fallback(&bytes, &table_name)?;
        if self.persist && encoding.source != DetectionSource::Default {
            self.cache
                .save_metadata(&table_name, "", path, &encoding.info)?;
        }

        let decoded = codec::decode(&bytes, &encoding.info);
        if decoded.had_errors() {
            warn!(
                table = %table_name,
                encoding = %encoding.info,
                replacements = decoded.replacements,
                "lossy decode"
            );
        }

        let table = parse_table(&decoded.text).map_err(|e| AnalysisError::Xml {
            table: table_name.clone(),
            message: e.to_string(),
        })?;

        let columns: Vec<ColumnReport> = table
            .columns
            .par_iter()
            .enumerate()
            .map(|(idx, column)| self.analyze_column(idx as i64, column, detector))
            .collect();
        let slot_families = slot::analyze_fields(table.column_names());

        debug!(
            table = %table_name,
            records = table.record_count,
            columns = columns.len(),
            "table analyzed"
        );

        Ok(TableReport {
            table_name,
            path: path.to_path_buf(),
            encoding,
            replacements: decoded.replacements,
            record_count: table.record_count,
            columns,
            slot_families,
        })
    }

    fn analyze_column(
        &self,
        field_id: i64,
        column: &TableColumn,
        detector: &ReferenceDetector,
    ) -> ColumnReport {
        let sample = &column.values[..column.values.len().min(self.sample_limit)];
        let slot = slot::extract_slot_info(&column.name);

        let slot_parse_failures = if slot.is_some() {
            sample
                .iter()
                .filter(|v| !v.trim().is_empty() && slot::parse_value(v).is_none())
                .count()
        } else {
            0
        };

        ColumnReport {
            name: column.name.clone(),
            field_type: self.field_types.infer(&column.name, sample),
            reference: detector.detect_field(&column.name),
            slot,
            slot_parse_failures,
            domain: self.domains.analyze_field(field_id, sample),
        }
    }
}

/// Table name of an export: its file stem.
pub fn table_name(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().into_owned())
}

/// Expand directories into the table exports they contain, recursively.
///
/// Files named explicitly are kept whatever their extension. Symlinks inside
/// a directory are not followed. The result is sorted and deduplicated.
pub fn collect_table_files(inputs: &[PathBuf]) -> std::io::Result<Vec<PathBuf>> {
    let mut files = BTreeSet::new();
    for input in inputs {
        if !input.is_dir() {
            files.insert(input.clone());
            continue;
        }
        for entry in WalkDir::new(input) {
            let entry = entry?;
            if entry.file_type().is_file() && is_table_export(entry.path()) {
                files.insert(entry.into_path());
            }
        }
    }
    Ok(files.into_iter().collect())
}

fn is_table_export(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(TABLE_EXTENSION))
}
