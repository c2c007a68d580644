//! Bonus-attribute slot analysis.
//!
//! Item tables carry a fixed-size array of attribute assignments spread over
//! indexed columns: `bonus_attr1`, `bonus_attr2`, ..., optionally prefixed by
//! a damage category (`physical_bonus_attr3`) and optionally using an `_a`
//! separator (`bonus_attr_a1`). Each cell holds `"<attr_code> <value>"`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::field_type::parse_number;

/// `[physical_|magical_]bonus_attr[_a]<digits>`
static BONUS_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(physical|magical)_)?bonus_attr(?:_a)?(\d+)$").unwrap()
});

/// Damage category of a slot family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotCategory {
    Generic,
    Physical,
    Magical,
}

impl fmt::Display for SlotCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Generic => "generic",
            Self::Physical => "physical",
            Self::Magical => "magical",
        };
        write!(f, "{name}")
    }
}

/// Category prefixes, checked in order. No prefix means [`SlotCategory::Generic`].
const CATEGORY_PREFIXES: &[(&str, SlotCategory)] = &[
    ("physical", SlotCategory::Physical),
    ("magical", SlotCategory::Magical),
];

/// Position of a column within its slot family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotInfo {
    pub category: SlotCategory,
    /// 1-based slot number.
    pub slot_index: u32,
}

/// A parsed slot cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BonusAttrValue {
    /// Opaque attribute code, e.g. `max_hp`.
    pub attr_code: String,
    pub value: f64,
}

/// The slot columns of one category found in a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotFamily {
    pub category: SlotCategory,
    /// Slot numbers present, ascending.
    pub indices: Vec<u32>,
    /// True when the slots are exactly `1..=max` with no gaps.
    pub contiguous: bool,
}

impl SlotFamily {
    /// Highest slot number present.
    pub fn max_index(&self) -> u32 {
        self.indices.last().copied().unwrap_or(0)
    }

    /// Slot numbers below the maximum that have no column.
    pub fn missing_indices(&self) -> Vec<u32> {
        let present: BTreeSet<u32> = self.indices.iter().copied().collect();
        (1..=self.max_index())
            .filter(|i| !present.contains(i))
            .collect()
    }
}

/// Whether `name` is a bonus-attribute slot column.
pub fn is_bonus_attr_field(name: &str) -> bool {
    extract_slot_info(name).is_some()
}

/// Category and slot number of a bonus-attribute column.
///
/// `None` when the name does not match or the slot number is 0 or overflows.
pub fn extract_slot_info(name: &str) -> Option<SlotInfo> {
    let lower = name.trim().to_lowercase();
    let caps = BONUS_ATTR.captures(&lower)?;

    let slot_index: u32 = caps.get(2)?.as_str().parse().ok()?;
    if slot_index == 0 {
        return None;
    }

    let category = caps
        .get(1)
        .and_then(|prefix| {
            CATEGORY_PREFIXES
                .iter()
                .find(|(p, _)| *p == prefix.as_str())
                .map(|(_, category)| *category)
        })
        .unwrap_or(SlotCategory::Generic);

    Some(SlotInfo {
        category,
        slot_index,
    })
}

/// Parse a slot cell of the form `"<attr_code> <number>"`.
///
/// Any other token count, or a second token that is not a finite number,
/// yields `None`.
pub fn parse_value(raw: &str) -> Option<BonusAttrValue> {
    let mut tokens = raw.split_whitespace();
    let attr_code = tokens.next()?;
    let value = parse_number(tokens.next()?)?;
    if tokens.next().is_some() {
        return None;
    }

    Some(BonusAttrValue {
        attr_code: attr_code.to_string(),
        value,
    })
}

/// Group a table's slot columns into families, one per category.
pub fn analyze_fields<'a, I>(field_names: I) -> Vec<SlotFamily>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut families: BTreeMap<SlotCategory, BTreeSet<u32>> = BTreeMap::new();
    for info in field_names.into_iter().filter_map(extract_slot_info) {
        families
            .entry(info.category)
            .or_default()
            .insert(info.slot_index);
    }

    families
        .into_iter()
        .map(|(category, indices)| {
            let indices: Vec<u32> = indices.into_iter().collect();
            let contiguous = indices.iter().copied().eq(1..=indices.len() as u32);
            SlotFamily {
                category,
                indices,
                contiguous,
            }
        })
        .collect()
}
