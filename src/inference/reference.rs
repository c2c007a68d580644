//! Name-based foreign-reference detection.
//!
//! A column is a reference candidate when its name ends in `_id` (optionally
//! followed by a slot number, `item_id2`) or ends in a known entity name with
//! a slot number (`reward_item1`). The stem is then resolved to a target
//! table through the naming-convention table, the known corpus tables, or a
//! pluralization guess.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use super::inflection::{pluralize, singularize};
use super::thresholds::confidence;

/// `<stem>_id<digits?>`
static ID_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.+)_id(\d*)$").unwrap());

/// `<prefix_?><entity><digits>`
static DIGIT_SUFFIXED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:.*_)?([a-z]+)(\d+)$").unwrap());

/// Stems whose target table is fixed by the corpus naming convention.
static ENTITY_CONVENTIONS: &[(&str, &str)] = &[
    ("item", "items"),
    ("npc", "npcs"),
    ("quest", "quests"),
    ("skill", "skills"),
    ("recipe", "recipes"),
    ("title", "titles"),
    ("world", "worlds"),
    ("zone", "zones"),
    ("spawn", "spawns"),
    ("drop", "drops"),
    ("shop", "shops"),
    ("pet", "pets"),
    ("ride", "rides"),
    ("buff", "abnormals"),
    ("abnormal", "abnormals"),
    ("effect", "abnormals"),
    ("portal", "portals"),
    ("instance", "instances"),
];

/// Target column every convention table is keyed by.
const TARGET_FIELD: &str = "id";

/// A reference hypothesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceDetectionResult {
    pub is_reference: bool,
    /// Set iff `is_reference`.
    pub target_table_name: Option<String>,
    /// Set iff `is_reference`.
    pub target_field_name: Option<String>,
    /// Confidence (0-100).
    pub confidence: u8,
}

impl ReferenceDetectionResult {
    /// Not a reference.
    pub fn none() -> Self {
        Self {
            is_reference: false,
            target_table_name: None,
            target_field_name: None,
            confidence: confidence::NONE,
        }
    }

    pub fn to(table: impl Into<String>, field: impl Into<String>, confidence: u8) -> Self {
        Self {
            is_reference: true,
            target_table_name: Some(table.into()),
            target_field_name: Some(field.into()),
            confidence: confidence.min(100),
        }
    }
}

/// Candidate shapes, in evaluation order.
#[derive(Debug, Clone, Copy)]
enum CandidatePattern {
    /// `reward_item_id`, `item_id2`.
    IdSuffix,
    /// `reward_item1`; only for convention entities.
    DigitSuffixedEntity,
}

const PATTERNS: &[CandidatePattern] = &[
    CandidatePattern::IdSuffix,
    CandidatePattern::DigitSuffixedEntity,
];

/// Naming-convention reference classifier.
#[derive(Debug, Clone, Default)]
pub struct ReferenceDetector {
    /// Table names seen in the corpus (lowercase).
    known_tables: HashSet<String>,
}

impl ReferenceDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register table names present in the corpus as exact targets.
    pub fn with_known_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.known_tables
            .extend(tables.into_iter().map(|t| t.as_ref().to_lowercase()));
        self
    }

    pub fn known_tables(&self) -> &HashSet<String> {
        &self.known_tables
    }

    /// Classify a column by name.
    pub fn detect_field(&self, field_name: &str) -> ReferenceDetectionResult {
        let name = field_name.trim().to_lowercase();
        if name.is_empty() {
            return ReferenceDetectionResult::none();
        }

        let result = PATTERNS
            .iter()
            .find_map(|pattern| self.try_pattern(*pattern, &name))
            .unwrap_or_else(ReferenceDetectionResult::none);

        if result.is_reference {
            debug!(
                field = field_name,
                target = result.target_table_name.as_deref().unwrap_or_default(),
                confidence = result.confidence,
                "reference detected"
            );
        }
        result
    }

    /// Classify every column of a table.
    pub fn detect_fields<'a, I>(&self, field_names: I) -> Vec<(String, ReferenceDetectionResult)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        field_names
            .into_iter()
            .map(|name| (name.to_string(), self.detect_field(name)))
            .collect()
    }

    fn try_pattern(&self, pattern: CandidatePattern, name: &str) -> Option<ReferenceDetectionResult> {
        match pattern {
            CandidatePattern::IdSuffix => {
                let caps = ID_SUFFIX.captures(name)?;
                let stem = caps.get(1)?.as_str();
                Some(self.resolve_stem(stem))
            }
            CandidatePattern::DigitSuffixedEntity => {
                let caps = DIGIT_SUFFIXED.captures(name)?;
                let entity = caps.get(1)?.as_str();
                let table = convention_table(entity)?;
                Some(ReferenceDetectionResult::to(
                    table,
                    TARGET_FIELD,
                    confidence::STRONG_RULE,
                ))
            }
        }
    }

    /// Resolve an `_id` stem to a target table.
    ///
    /// The full stem is tried before its last token, so `reward_item` can hit
    /// a `reward_items` table before falling back to `items`.
    fn resolve_stem(&self, stem: &str) -> ReferenceDetectionResult {
        let stem = stem
            .trim_end_matches(|c: char| c.is_ascii_digit())
            .trim_matches('_');
        if stem.is_empty() {
            return ReferenceDetectionResult::none();
        }

        let last_token = stem.rsplit('_').next().unwrap_or(stem);
        let mut candidates = vec![stem];
        if last_token != stem {
            candidates.push(last_token);
        }

        for candidate in candidates {
            if let Some(table) = self.exact_table(candidate) {
                return ReferenceDetectionResult::to(table, TARGET_FIELD, confidence::EXACT_RULE);
            }
        }

        ReferenceDetectionResult::to(pluralize(last_token), TARGET_FIELD, confidence::PLURAL_GUESS)
    }

    fn exact_table(&self, candidate: &str) -> Option<String> {
        // `items_id` names the table in plural form.
        if let Some(table) =
            convention_table(candidate).or_else(|| convention_table(&singularize(candidate)))
        {
            return Some(table.to_string());
        }
        if self.known_tables.contains(candidate) {
            return Some(candidate.to_string());
        }
        let plural = pluralize(candidate);
        if self.known_tables.contains(&plural) {
            return Some(plural);
        }
        None
    }
}

fn convention_table(stem: &str) -> Option<&'static str> {
    ENTITY_CONVENTIONS
        .iter()
        .find(|(entity, _)| *entity == stem)
        .map(|(_, table)| *table)
}
