//! Pattern and schema inference for undocumented table columns.
//!
//! Each analyzer produces an independent, confidence-scored hypothesis about
//! one column. Nothing here merges hypotheses; that is left to the caller.
//!
//! # Analyzers
//!
//! | Analyzer | Input | Output |
//! |----------|-------|--------|
//! | [`FieldTypeInferrer`] | column name (+ values) | [`InferenceResult`] |
//! | [`ReferenceDetector`] | column name | [`ReferenceDetectionResult`] |
//! | [`slot`] | column name / raw value | [`SlotInfo`], [`BonusAttrValue`] |
//! | [`ValueDomainAnalyzer`] | column values | [`ValueDomainStatistics`] |
//!
//! # Example
//!
//! ```ignore
//! use relic::inference::{FieldTypeInferrer, ReferenceDetector};
//!
//! let field_type = FieldTypeInferrer::new().infer_from_name("item_id");
//! let reference = ReferenceDetector::new().detect_field("item_id");
//! assert_eq!(reference.target_table_name.as_deref(), Some("items"));
//! ```

pub mod catalog;
pub mod field_type;
pub mod inflection;
pub mod reference;
pub mod slot;
pub mod value_domain;

pub use catalog::{PatternCategory, PatternCategoryCatalog};
pub use field_type::{FieldType, FieldTypeInferrer, InferenceResult};
pub use inflection::{pluralize, singularize};
pub use reference::{ReferenceDetectionResult, ReferenceDetector};
pub use slot::{BonusAttrValue, SlotCategory, SlotFamily, SlotInfo};
pub use value_domain::{DomainKind, ValueDomainAnalyzer, ValueDomainStatistics};

/// Centralized confidence scores and domain thresholds.
///
/// These are heuristic tuning values, not exact requirements.
pub mod thresholds {
    /// Confidence scores (0 to 100).
    pub mod confidence {
        /// The name exactly matches an unambiguous rule.
        pub const EXACT_RULE: u8 = 90;
        /// Strong but not conclusive name pattern.
        pub const STRONG_RULE: u8 = 75;
        /// Keyword evidence in the name.
        pub const KEYWORD_RULE: u8 = 60;
        /// Observed values agree on a type.
        pub const VALUE_EVIDENCE: u8 = 70;
        /// No positive signal; default guess.
        pub const DEFAULT_GUESS: u8 = 30;
        /// Reference target guessed by pluralization only.
        pub const PLURAL_GUESS: u8 = 60;
        /// No evidence at all.
        pub const NONE: u8 = 0;
    }

    /// Value-domain classification limits.
    pub mod domain {
        /// Maximum distinct values for an enumerated column.
        pub const ENUM_MAX_DISTINCT: usize = 32;
        /// Maximum ratio of distinct values to sample size for an enumerated column.
        pub const ENUM_MAX_RATIO: f64 = 0.5;
    }
}
