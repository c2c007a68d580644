//! Shared string inflection utilities.
//!
//! Pluralization and singularization for mapping reference stems to table
//! names. Uses the `inflector` crate with additional handling for irregular
//! plurals that show up in game data.

use inflector::Inflector;

/// Irregular plurals that inflector gets wrong or that the corpus spells its own way.
static IRREGULAR_PLURALS: &[(&str, &str)] = &[
    // People
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    // Creatures
    ("mouse", "mice"),
    ("goose", "geese"),
    ("ox", "oxen"),
    ("wolf", "wolves"),
    ("elf", "elves"),
    ("dwarf", "dwarves"),
    ("thief", "thieves"),
    // Equipment
    ("staff", "staves"),
    ("knife", "knives"),
    ("leaf", "leaves"),
    // -o → -oes
    ("hero", "heroes"),
    ("potato", "potatoes"),
    // Uncountable in the corpus
    ("equipment", "equipment"),
    ("armor", "armor"),
    ("data", "data"),
    // Latin/Greek
    ("index", "indices"),
    ("matrix", "matrices"),
    ("criterion", "criteria"),
];

/// Pluralize a word, handling irregulars first then falling back to inflector.
///
/// # Examples
/// ```ignore
/// assert_eq!(pluralize("item"), "items");
/// assert_eq!(pluralize("ability"), "abilities");
/// assert_eq!(pluralize("staff"), "staves");
/// ```
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    let lower = word.to_lowercase();

    for (singular, plural) in IRREGULAR_PLURALS {
        if lower == *singular || lower == *plural {
            return plural.to_string();
        }
    }

    word.to_plural()
}

/// Singularize a word, handling irregulars first then falling back to inflector.
///
/// # Examples
/// ```ignore
/// assert_eq!(singularize("items"), "item");
/// assert_eq!(singularize("wolves"), "wolf");
/// ```
pub fn singularize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    let lower = word.to_lowercase();

    for (singular, plural) in IRREGULAR_PLURALS {
        if lower == *plural || lower == *singular {
            return singular.to_string();
        }
    }

    word.to_singular()
}
