//! Game-mechanism categories used to tag inferred patterns.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::Serialize;

/// A mechanism category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PatternCategory {
    pub mechanism_code: &'static str,
    pub mechanism_icon: &'static str,
    pub mechanism_name: &'static str,
}

const fn category(code: &'static str, icon: &'static str, name: &'static str) -> PatternCategory {
    PatternCategory {
        mechanism_code: code,
        mechanism_icon: icon,
        mechanism_name: name,
    }
}

static CATEGORIES: [PatternCategory; 27] = [
    category("combat", "⚔️", "Combat"),
    category("skill", "✨", "Skills"),
    category("effect", "🌀", "Status Effects"),
    category("stat", "📊", "Character Stats"),
    category("item", "🎒", "Items"),
    category("equipment", "🛡️", "Equipment"),
    category("enchant", "💎", "Enchanting"),
    category("craft", "🔨", "Crafting"),
    category("gather", "⛏️", "Gathering"),
    category("economy", "💰", "Economy"),
    category("shop", "🏪", "Shops"),
    category("drop", "🎁", "Drops & Loot"),
    category("quest", "📜", "Quests"),
    category("npc", "🧙", "NPCs"),
    category("monster", "👹", "Monsters"),
    category("spawn", "📍", "Spawns"),
    category("world", "🗺️", "World & Zones"),
    category("teleport", "🚪", "Teleport"),
    category("instance", "🏰", "Instances"),
    category("pvp", "🏹", "PvP"),
    category("guild", "🏛️", "Guilds"),
    category("pet", "🐾", "Pets"),
    category("mount", "🐎", "Mounts"),
    category("housing", "🏠", "Housing"),
    category("title", "🏅", "Titles"),
    category("achievement", "🏆", "Achievements"),
    category("event", "🎉", "Events"),
];

static BY_CODE: LazyLock<HashMap<&'static str, &'static PatternCategory>> =
    LazyLock::new(|| CATEGORIES.iter().map(|c| (c.mechanism_code, c)).collect());

/// Read-only lookup over the fixed category table.
pub struct PatternCategoryCatalog;

impl PatternCategoryCatalog {
    /// All categories, in display order.
    pub fn all() -> &'static [PatternCategory] {
        &CATEGORIES
    }

    /// Look up a category by code (case-insensitive).
    pub fn get(code: &str) -> Option<&'static PatternCategory> {
        BY_CODE.get(code.trim().to_lowercase().as_str()).copied()
    }

    pub fn len() -> usize {
        CATEGORIES.len()
    }
}
