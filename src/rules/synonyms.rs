use serde::{Deserialize, Serialize};

use crate::rules::helpers::replace_phrase;
use crate::rules::MatchTables;

/// Upper bound on variations derived from one item name.
const MAX_VARIATIONS: usize = 64;

/// A canonical word with the spellings players use for it.
///
/// `canonical` is always rewritten to each alias. With `two_way` set the aliases are also
/// rewritten to the canonical word and to each other (scimitar ↔ scim ↔ sword), which suits
/// interchangeable names. Material-tier abbreviations are one-way: "dragon" → "d" is useful,
/// "d" → "dragon" is not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynonymRule {
    pub canonical: String,
    pub aliases: Vec<String>,
    #[serde(default)]
    pub two_way: bool,
}

impl SynonymRule {
    fn rewrites(&self) -> Vec<(&str, &str)> {
        let mut pairs: Vec<(&str, &str)> = self.aliases.iter().map(|a| (self.canonical.as_str(), a.as_str())).collect();
        if self.two_way {
            for alias in &self.aliases {
                pairs.push((alias.as_str(), self.canonical.as_str()));
                for other in &self.aliases {
                    if other != alias {
                        pairs.push((alias.as_str(), other.as_str()));
                    }
                }
            }
        }
        pairs
    }
}

impl MatchTables {
    /// Every spelling of `name` reachable through the synonym rules, `name` first.
    ///
    /// `name` must already be normalised. Rules are applied in table order, each on top of the
    /// variations produced so far, so "dragon scimitar" yields "d scimitar", "dragon scim",
    /// "d scim" and so on.
    pub fn variations(&self, name: &str) -> Vec<String> {
        let mut out = vec![name.to_string()];
        for rule in &self.synonyms {
            let rewrites = rule.rewrites();
            let snapshot = out.clone();
            for variant in &snapshot {
                for (from, to) in &rewrites {
                    if out.len() >= MAX_VARIATIONS {
                        return out;
                    }
                    if let Some(rewritten) = replace_phrase(variant, from, to) {
                        if !out.contains(&rewritten) {
                            out.push(rewritten);
                        }
                    }
                }
            }
        }
        out
    }
}

pub fn builtin() -> Vec<SynonymRule> {
    vec![
        // Material tiers
        synonym!("dragon" => ["d"]),
        synonym!("rune" => ["r"]),
        synonym!("adamant" => ["addy", "adam"]),
        synonym!("mithril" => ["mith"]),
        synonym!("abyssal" => ["aby", "abby"]),
        synonym!("armadyl" => ["arma"]),
        synonym!("bandos" => ["bando"]),
        synonym!("saradomin" => ["sara"]),
        synonym!("zamorak" => ["zammy"]),
        synonym!("third-age" => ["third age", "3rd age", "3a"]),
        // Weapon types
        synonym!("scimitar" => ["scim", "sword"], two_way: true),
        synonym!("crossbow" => ["xbow", "cbow"], two_way: true),
        synonym!("godsword" => ["gs"], two_way: true),
        synonym!("battleaxe" => ["baxe", "battle axe"], two_way: true),
        synonym!("2h sword" => ["2h", "two-handed sword"], two_way: true),
        synonym!("longsword" => ["long sword"], two_way: true),
        synonym!("shortbow" => ["short bow"], two_way: true),
        synonym!("warhammer" => ["war hammer"], two_way: true),
        synonym!("pickaxe" => ["pick"], two_way: true),
        synonym!("hatchet" => ["axe"], two_way: true),
        // Armour slots
        synonym!("platebody" => ["plate body", "plate", "body"], two_way: true),
        synonym!("platelegs" => ["plate legs", "legs"], two_way: true),
        synonym!("plateskirt" => ["skirt"]),
        synonym!("chainbody" => ["chain body", "chain"], two_way: true),
        synonym!("chainskirt" => ["skirt"]),
        synonym!("full helm" => ["helm", "fh"], two_way: true),
        synonym!("kiteshield" => ["kite shield", "kite"], two_way: true),
        synonym!("sq shield" => ["square shield"], two_way: true),
        synonym!("gauntlets" => ["gloves"]),
    ]
}
