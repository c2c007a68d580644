//! # relic
//!
//! Encoding transparency and schema inference for legacy game-server table
//! exports.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                 Table export (XML bytes)                 │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [encoding]
//! ┌─────────────────────────────────────────────────────────┐
//! │   EncodingDetector → FallbackStrategy → MetadataCache    │
//! │   (BOM, DBCS scan)   (confidence,       (SQLite store)   │
//! │                       history)                           │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [analysis::table]
//! ┌─────────────────────────────────────────────────────────┐
//! │                 Columns of raw values                    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [inference]
//! ┌─────────────────────────────────────────────────────────┐
//! │  field type │ reference │ slot pattern │ value domain    │
//! │        (independent, confidence-scored hypotheses)       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Exports are guarded by [`validation::RoundTripValidator`], which compares
//! content hashes against the baseline recorded when the file was opened.

pub mod analysis;
pub mod cache;
pub mod config;
pub mod encoding;
pub mod inference;
pub mod session;
pub mod validation;

pub use session::{Session, SessionError, SessionResult};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::analysis::{ColumnReport, CorpusAnalyzer, TableReport};
    pub use crate::cache::{MetadataCache, MetadataStore, StoreError, StoreResult};
    pub use crate::config::Settings;
    pub use crate::encoding::{
        DetectionOutcome, DetectionSource, EncodingDetector, EncodingInfo, FallbackStrategy,
        LegacyCharset,
    };
    pub use crate::inference::{
        DomainKind, FieldType, FieldTypeInferrer, ReferenceDetector, SlotCategory,
        ValueDomainAnalyzer,
    };
    pub use crate::session::Session;
    pub use crate::validation::{RoundTripValidator, ValidationResult};
}
