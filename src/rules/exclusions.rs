//! Exclusion guards.
//!
//! Some sources share vocabulary: Kerapac drops a "Fractured Armadyl Symbol", which has nothing
//! to do with Kree'arra's Armadyl armour. An exclusion rule names the two sources (`left` and
//! `right`), the words they share, and the marker phrases that identify each side.
//!
//! A candidate category match is rejected when all of the following hold:
//!
//! - the matched term contains one of the `shared` words,
//! - the category belongs to one side,
//! - the text carries a marker of the *other* side,
//! - the text carries no marker of the category's own side.
//!
//! The rule is evaluated in both directions, so one entry protects both categories.

use serde::{Deserialize, Serialize};

use crate::rules::helpers::{NormalizedText, mentions_any};
use crate::rules::{CategoryKeyword, MatchTables};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionRule {
    pub name: String,
    pub shared: Vec<String>,
    pub left: ExclusionSide,
    pub right: ExclusionSide,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExclusionSide {
    /// Category keywords that belong to this source.
    pub categories: Vec<String>,
    /// Phrases that only this source produces.
    pub markers: Vec<String>,
}

impl ExclusionRule {
    fn rejects(&self, keyword: &CategoryKeyword, term: &str, text: &NormalizedText) -> bool {
        if !mentions_any(term, &self.shared) {
            return false;
        }
        [(&self.left, &self.right), (&self.right, &self.left)].into_iter().any(|(own, other)| {
            keyword.belongs_to(&own.categories) && text.contains_any(&other.markers) && !text.contains_any(&own.markers)
        })
    }
}

impl MatchTables {
    /// The first exclusion rule that rejects `term` as evidence for `keyword` in `text`.
    pub fn exclusion_for(&self, keyword: &CategoryKeyword, term: &str, text: &NormalizedText) -> Option<&ExclusionRule> {
        self.exclusions.iter().find(|rule| rule.rejects(keyword, term, text))
    }
}

pub fn builtin() -> Vec<ExclusionRule> {
    vec![
        exclusion! {
            name: "kerapac-vs-armadyl",
            shared: ["armadyl", "staff", "symbol"],
            left: {
                categories: ["armadyl", "kree'arra", "kreearra"],
                markers: [
                    "armadyl helmet", "armadyl chestplate", "armadyl chainskirt", "armadyl gloves",
                    "armadyl boots", "armadyl buckler", "armadyl crossbow", "armadyl hilt",
                    "armadyl battlestaff", "armadyl godsword",
                ],
            },
            right: {
                categories: ["kerapac", "fractured"],
                markers: ["fractured", "kerapac"],
            },
        },
        exclusion! {
            name: "nex-vs-angel-of-death",
            shared: ["nex"],
            left: {
                categories: ["nex"],
                markers: ["virtus", "pernix", "torva", "zaryte"],
            },
            right: {
                categories: ["angel of death", "aod"],
                markers: ["angel of death", "aod", "praesul", "imperium core"],
            },
        },
        exclusion! {
            name: "kril-vs-lord-of-chaos",
            shared: ["zamorak", "zamorakian"],
            left: {
                categories: ["zamorak", "k'ril", "kril"],
                markers: ["subjugation", "zamorakian spear", "steam battlestaff", "zamorak hilt"],
            },
            right: {
                categories: ["lord of chaos"],
                markers: ["lord of chaos"],
            },
        },
        exclusion! {
            name: "dragon-gear-vs-dragon-drops",
            shared: ["dragon"],
            left: {
                categories: ["dragon"],
                markers: [
                    "dragon claws", "dragon pickaxe", "dragon hatchet", "dragon rider lance", "dragon platebody",
                    "dragon kiteshield", "dragon full helm", "draconic visage",
                ],
            },
            right: {
                categories: [],
                markers: [
                    "dragon bones", "dragonhide", "dragonstone", "dragon impling", "dragonkin", "dragons",
                ],
            },
        },
        exclusion! {
            name: "saradomin-gear-vs-brews",
            shared: ["saradomin"],
            left: {
                categories: ["saradomin", "zilyana"],
                markers: [
                    "saradomin sword", "saradomin murmur", "saradomin hiss", "saradomin whisper", "saradomin hilt",
                ],
            },
            right: {
                categories: [],
                markers: ["saradomin brew"],
            },
        },
    ]
}
