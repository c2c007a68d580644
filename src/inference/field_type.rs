//! Name-based field-type inference.
//!
//! Rules are evaluated in a fixed order and the first match wins:
//!
//! | # | Rule | Type | Confidence |
//! |---|------|------|------------|
//! | 1 | exactly `id` | Id | 90 |
//! | 2 | ends with `_id` | Id | 90 |
//! | 3 | starts with `is_` / `can_` | Boolean | 90 |
//! | 4 | ends with `_type` | Enum | 75 |
//! | 5 | a token is a stat keyword (`level`, `attr`, ...) | Numeric | 60 |
//! | 6 | anything else | String | 30 |
//!
//! A bare `level` therefore infers as Numeric: rule 5 precedes the default.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use super::thresholds::confidence;

/// Inferred storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Id,
    Boolean,
    Enum,
    Numeric,
    String,
    /// Only produced for empty or degenerate input.
    Unknown,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Id => "id",
            Self::Boolean => "boolean",
            Self::Enum => "enum",
            Self::Numeric => "numeric",
            Self::String => "string",
            Self::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

/// A field-type hypothesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InferenceResult {
    pub field_type: FieldType,
    /// Confidence (0-100).
    pub confidence: u8,
}

impl InferenceResult {
    pub fn new(field_type: FieldType, confidence: u8) -> Self {
        Self {
            field_type,
            confidence: confidence.min(100),
        }
    }

    pub fn unknown() -> Self {
        Self::new(FieldType::Unknown, confidence::NONE)
    }
}

/// Keywords that mark a stat-like numeric column.
const STAT_KEYWORDS: &[&str] = &[
    "attr", "level", "ratio", "bonus", "rate", "count", "min", "max", "hp", "mp", "dp", "exp",
    "price", "cost", "chance", "prob", "amount", "time", "delay", "duration", "cooldown", "speed",
    "power", "damage", "range", "weight", "limit", "stack", "percent",
];

/// Values accepted as boolean flags.
const BOOLEAN_VALUES: &[&str] = &["0", "1", "true", "false"];

/// A name-type rule.
#[derive(Debug, Clone)]
pub struct TypeRule {
    /// Rule identifier.
    pub name: &'static str,
    pub field_type: FieldType,
    pub confidence: u8,
    pattern: NamePattern,
}

#[derive(Debug, Clone)]
enum NamePattern {
    Exact(&'static str),
    Suffix(&'static str),
    AnyPrefix(&'static [&'static str]),
    StatKeyword,
    Always,
}

impl TypeRule {
    fn matches(&self, name: &str, keywords: &HashSet<&'static str>) -> bool {
        match &self.pattern {
            NamePattern::Exact(exact) => name == *exact,
            NamePattern::Suffix(suffix) => name.len() > suffix.len() && name.ends_with(suffix),
            NamePattern::AnyPrefix(prefixes) => prefixes
                .iter()
                .any(|p| name.len() > p.len() && name.starts_with(p)),
            NamePattern::StatKeyword => name
                .split('_')
                .map(|token| token.trim_end_matches(|c: char| c.is_ascii_digit()))
                .any(|token| keywords.contains(token)),
            NamePattern::Always => true,
        }
    }
}

/// Returns the default rules in evaluation order.
pub fn default_type_rules() -> Vec<TypeRule> {
    vec![
        TypeRule {
            name: "exact_id",
            field_type: FieldType::Id,
            confidence: confidence::EXACT_RULE,
            pattern: NamePattern::Exact("id"),
        },
        TypeRule {
            name: "suffix_id",
            field_type: FieldType::Id,
            confidence: confidence::EXACT_RULE,
            pattern: NamePattern::Suffix("_id"),
        },
        TypeRule {
            name: "boolean_prefix",
            field_type: FieldType::Boolean,
            confidence: confidence::EXACT_RULE,
            pattern: NamePattern::AnyPrefix(&["is_", "can_"]),
        },
        TypeRule {
            name: "suffix_type",
            field_type: FieldType::Enum,
            confidence: confidence::STRONG_RULE,
            pattern: NamePattern::Suffix("_type"),
        },
        TypeRule {
            name: "stat_keyword",
            field_type: FieldType::Numeric,
            confidence: confidence::KEYWORD_RULE,
            pattern: NamePattern::StatKeyword,
        },
        TypeRule {
            name: "default_string",
            field_type: FieldType::String,
            confidence: confidence::DEFAULT_GUESS,
            pattern: NamePattern::Always,
        },
    ]
}

/// Ordered-rule field-type classifier.
#[derive(Debug, Clone)]
pub struct FieldTypeInferrer {
    rules: Vec<TypeRule>,
    keywords: HashSet<&'static str>,
}

impl Default for FieldTypeInferrer {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldTypeInferrer {
    pub fn new() -> Self {
        Self {
            rules: default_type_rules(),
            keywords: STAT_KEYWORDS.iter().copied().collect(),
        }
    }

    /// Get all rules, in evaluation order.
    pub fn rules(&self) -> &[TypeRule] {
        &self.rules
    }

    /// Classify a column by name alone.
    pub fn infer_from_name(&self, field_name: &str) -> InferenceResult {
        let name = field_name.trim().to_lowercase();
        if name.is_empty() {
            return InferenceResult::unknown();
        }

        self.rules
            .iter()
            .find(|rule| rule.matches(&name, &self.keywords))
            .map(|rule| InferenceResult::new(rule.field_type, rule.confidence))
            .unwrap_or_else(InferenceResult::unknown)
    }

    /// Classify a column from observed values alone.
    ///
    /// Blank values are ignored; a column with no non-blank value is Unknown.
    pub fn infer_from_values<S: AsRef<str>>(&self, values: &[S]) -> InferenceResult {
        let present: Vec<&str> = values
            .iter()
            .map(|v| v.as_ref().trim())
            .filter(|v| !v.is_empty())
            .collect();

        if present.is_empty() {
            return InferenceResult::unknown();
        }

        let all_boolean = present
            .iter()
            .all(|v| BOOLEAN_VALUES.iter().any(|b| b.eq_ignore_ascii_case(v)));
        if all_boolean {
            return InferenceResult::new(FieldType::Boolean, confidence::VALUE_EVIDENCE);
        }

        if present.iter().all(|v| parse_number(v).is_some()) {
            return InferenceResult::new(FieldType::Numeric, confidence::VALUE_EVIDENCE);
        }

        InferenceResult::new(FieldType::String, confidence::DEFAULT_GUESS)
    }

    /// Classify a column by name, letting values override the default guess.
    ///
    /// Any named rule other than the default wins outright.
    pub fn infer<S: AsRef<str>>(&self, field_name: &str, values: &[S]) -> InferenceResult {
        let by_name = self.infer_from_name(field_name);
        let is_default_guess = matches!(by_name.field_type, FieldType::String | FieldType::Unknown)
            && by_name.confidence <= confidence::DEFAULT_GUESS;
        if !is_default_guess {
            return by_name;
        }

        let by_values = self.infer_from_values(values);
        if by_values.confidence > by_name.confidence {
            by_values
        } else {
            by_name
        }
    }
}

/// Parse a finite number.
pub(crate) fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}
