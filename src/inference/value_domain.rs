//! Value-domain statistics.
//!
//! Classifies a column's observed values as numeric, enumerated, or mixed
//! and keeps the summary that goes with each kind: the numeric range for
//! numeric columns, the frequency table for enumerated ones.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::field_type::parse_number;
use super::thresholds::domain;

/// Shape of a column's value domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainKind {
    Numeric,
    Enum,
    Mixed,
}

impl fmt::Display for DomainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Numeric => "numeric",
            Self::Enum => "enum",
            Self::Mixed => "mixed",
        };
        write!(f, "{name}")
    }
}

/// Summary of one column's sampled values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueDomainStatistics {
    pub field_id: i64,
    pub kind: DomainKind,
    pub distinct_count: usize,
    /// Non-blank values examined.
    pub sample_size: usize,
    /// `(min, max)`, set iff `kind == Numeric`.
    pub numeric_range: Option<(f64, f64)>,
    /// Value counts, set iff `kind == Enum`.
    pub frequency_table: Option<BTreeMap<String, usize>>,
}

/// Statistical column classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueDomainAnalyzer {
    enum_max_distinct: usize,
    enum_max_ratio: f64,
}

impl Default for ValueDomainAnalyzer {
    fn default() -> Self {
        Self::new(domain::ENUM_MAX_DISTINCT, domain::ENUM_MAX_RATIO)
    }
}

impl ValueDomainAnalyzer {
    pub fn new(enum_max_distinct: usize, enum_max_ratio: f64) -> Self {
        Self {
            enum_max_distinct,
            enum_max_ratio: enum_max_ratio.clamp(0.0, 1.0),
        }
    }

    pub fn enum_max_distinct(&self) -> usize {
        self.enum_max_distinct
    }

    pub fn enum_max_ratio(&self) -> f64 {
        self.enum_max_ratio
    }

    /// Classify a column from an ordered sample of raw values.
    ///
    /// Values are trimmed and blanks are skipped. An empty sample is Mixed.
    pub fn analyze_field<S: AsRef<str>>(&self, field_id: i64, values: &[S]) -> ValueDomainStatistics {
        let present: Vec<&str> = values
            .iter()
            .map(|v| v.as_ref().trim())
            .filter(|v| !v.is_empty())
            .collect();

        let mut frequencies: BTreeMap<String, usize> = BTreeMap::new();
        for value in &present {
            *frequencies.entry((*value).to_string()).or_default() += 1;
        }

        let mut stats = ValueDomainStatistics {
            field_id,
            kind: DomainKind::Mixed,
            distinct_count: frequencies.len(),
            sample_size: present.len(),
            numeric_range: None,
            frequency_table: None,
        };

        if present.is_empty() {
            return stats;
        }

        if let Some(range) = numeric_range(&present) {
            stats.kind = DomainKind::Numeric;
            stats.numeric_range = Some(range);
        } else if self.is_enum(&frequencies, present.len()) {
            stats.kind = DomainKind::Enum;
            stats.frequency_table = Some(frequencies);
        }

        stats
    }

    fn is_enum(&self, frequencies: &BTreeMap<String, usize>, sample_size: usize) -> bool {
        let distinct = frequencies.len();
        let ratio_limit = (sample_size as f64 * self.enum_max_ratio).floor() as usize;

        distinct <= self.enum_max_distinct
            && distinct <= ratio_limit
            && frequencies.values().any(|&count| count > 1)
            && frequencies.keys().all(|value| is_label(value))
    }
}

/// `(min, max)` when every value is a finite number.
fn numeric_range(values: &[&str]) -> Option<(f64, f64)> {
    values.iter().try_fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        let n = parse_number(v)?;
        Some((lo.min(n), hi.max(n)))
    })
}

/// Enumerated labels are symbolic; anything carrying a digit is an identifier.
fn is_label(value: &str) -> bool {
    !value.bytes().any(|b| b.is_ascii_digit())
}
