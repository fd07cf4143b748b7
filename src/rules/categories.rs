use std::collections::BTreeMap;

use crate::rules::MatchTables;
use crate::rules::helpers::normalize;

/// Prefix marking a wildcard item.
pub const CATEGORY_PREFIX: &str = "any ";

/// The keyword of an "Any <category>" item, in the forms used for lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryKeyword {
    /// Everything after "any ", without a trailing " item".
    pub phrase: String,
    /// The phrase with leading and trailing generic words dropped ("bandos armour piece" →
    /// "bandos"). Inner words stay, so "angel of death" is unchanged.
    pub reduced: String,
}

impl CategoryKeyword {
    /// Parse a normalised item name. `None` for literal items and for wildcards that name no
    /// category ("any item", "any weapon drop").
    pub fn parse(name: &str, tables: &MatchTables) -> Option<CategoryKeyword> {
        let rest = name.strip_prefix(CATEGORY_PREFIX)?.trim();
        let phrase = rest
            .strip_suffix(" items")
            .or_else(|| rest.strip_suffix(" item"))
            .unwrap_or(rest)
            .trim()
            .to_string();

        let is_generic = |w: &&str| tables.generic_words.iter().any(|g| g == w);
        let words: Vec<&str> = phrase.split(' ').filter(|w| !w.is_empty()).collect();
        let first = words.iter().position(|w| !is_generic(w))?;
        let last = words.iter().rposition(|w| !is_generic(w))?;
        let reduced = words[first..=last].join(" ");

        Some(CategoryKeyword { phrase, reduced })
    }

    /// True when `name` has the wildcard prefix, whether or not it parses to a keyword.
    pub fn is_wildcard(name: &str) -> bool {
        name.starts_with(CATEGORY_PREFIX)
    }

    /// Lookup keys: the full phrase, then the reduced phrase when it differs.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys = vec![self.phrase.as_str()];
        if self.reduced != self.phrase {
            keys.push(self.reduced.as_str());
        }
        keys
    }

    /// True when any key of this keyword is listed in `categories`.
    pub fn belongs_to(&self, categories: &[String]) -> bool {
        self.keys().iter().any(|k| categories.iter().any(|c| c == k))
    }
}

/// A search term produced for a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTerm {
    pub term: String,
    /// Bare keywords must match on word edges; table entries are plain substrings.
    pub whole_word: bool,
}

impl MatchTables {
    /// Expand a category keyword into its search terms, in lookup order.
    pub fn category_terms(&self, keyword: &CategoryKeyword) -> Vec<CategoryTerm> {
        let mut terms: Vec<CategoryTerm> = Vec::new();
        let mut push = |term: &str, whole_word: bool| {
            if !terms.iter().any(|t| t.term == term) {
                terms.push(CategoryTerm { term: term.to_string(), whole_word });
            }
        };

        for key in keyword.keys() {
            push(key, true);
            if let Some(entries) = self.categories.get(key) {
                for entry in entries {
                    push(entry, false);
                }
            }
        }
        terms
    }
}

pub fn builtin_generic_words() -> Vec<String> {
    [
        "weapon", "weapons", "armor", "armour", "gear", "set", "piece", "pieces", "drop", "drops", "unique",
        "uniques", "item", "items", "equipment", "boss", "of", "the", "a", "an", "and", "from",
    ]
    .iter()
    .map(|w| w.to_string())
    .collect()
}

pub fn builtin() -> BTreeMap<String, Vec<String>> {
    table! {
        "nex" => [
            "virtus mask", "virtus robe top", "virtus robe legs", "virtus gloves", "virtus boots", "virtus wand",
            "virtus book", "pernix cowl", "pernix body", "pernix chaps", "pernix gloves", "pernix boots",
            "torva full helm", "torva platebody", "torva platelegs", "torva gloves", "torva boots", "zaryte bow",
        ],
        "armadyl" => [
            "armadyl helmet", "armadyl chestplate", "armadyl chainskirt", "armadyl gloves", "armadyl boots",
            "armadyl buckler", "armadyl crossbow", "armadyl hilt", "armadyl battlestaff",
        ],
        "kree'arra" => ["armadyl helmet", "armadyl chestplate", "armadyl chainskirt", "armadyl hilt"],
        "bandos" => [
            "bandos helmet", "bandos chestplate", "bandos tassets", "bandos gloves", "bandos boots",
            "bandos warshield", "bandos hilt",
        ],
        "saradomin" => [
            "saradomin sword", "saradomin murmur", "saradomin hiss", "saradomin whisper", "saradomin hilt",
        ],
        "zilyana" => ["saradomin sword", "saradomin murmur", "saradomin hiss", "saradomin whisper", "armadyl crossbow"],
        "zamorak" => [
            "zamorakian spear", "steam battlestaff", "zamorak hilt", "hood of subjugation", "garb of subjugation",
            "gown of subjugation", "gloves of subjugation", "boots of subjugation", "ward of subjugation",
        ],
        "kerapac" => [
            "fractured", "fractured armadyl symbol", "fractured staff of armadyl", "fractured stabilisation gem",
            "staff of armadyl's fractured shaft", "kerapac's wrist wraps", "greater concentrated blast ability codex",
        ],
        "angel of death" => ["praesul wand", "imperium core", "praesul codex", "seren godbow crest", "zaros godsword blade"],
        "aod" => ["praesul wand", "imperium core", "praesul codex", "seren godbow crest", "zaros godsword blade"],
        "vorago" => ["seismic wand", "seismic singularity", "tectonic energy"],
        "araxxor" => [
            "araxxi's fang", "araxxi's eye", "araxxi's web", "spider leg top", "spider leg middle",
            "spider leg bottom", "araxyte pheromone",
        ],
        "telos" => [
            "dormant anima core helm", "dormant anima core body", "dormant anima core legs", "dormant seren godbow",
            "dormant staff of sliske", "dormant zaros godsword",
        ],
        "solak" => ["erethdor's grimoire", "blightbound crossbow", "merethiel's stave"],
        "raksha" => [
            "laceration boots", "blast diffusion boots", "fleeting boots", "shadow spike",
            "greater ricochet ability codex", "greater chain ability codex", "greater flurry ability codex",
            "greater barge ability codex", "greater fury ability codex",
        ],
        "dragon" => [
            "dragon claws", "dragon pickaxe", "dragon hatchet", "dragon rider lance", "dragon platebody",
            "dragon kiteshield", "dragon full helm", "draconic visage",
        ],
        "godsword" => [
            "armadyl godsword", "bandos godsword", "saradomin godsword", "zamorak godsword", "armadyl hilt",
            "bandos hilt", "saradomin hilt", "zamorak hilt", "godsword shard",
        ],
        "barrows" => [
            "ahrim's", "dharok's", "guthan's", "karil's", "torag's", "verac's", "akrisae's", "linza's",
        ],
        "pet" => ["funny feeling", "pet"],
        "codex" => ["ability codex"],
    }
}
