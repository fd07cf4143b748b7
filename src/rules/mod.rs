//! Static matching data.
//!
//! Everything the text matcher knows about the game lives here as plain data:
//!
//! - `synonyms.rs`: abbreviation/synonym rules used to derive literal-name variations.
//! - `categories.rs`: "Any <category>" keyword → specific item names, plus the
//!   generic words dropped from multi-word keywords.
//! - `exclusions.rs`: symmetric guards between sources that share vocabulary.
//! - `reverse.rs`: specific item name → category keywords it legitimately belongs to.
//! - `helpers.rs`: normalisation and phrase search shared by all of the above.
//!
//! The built-in tables are assembled once into [`MatchTables::builtin`]. A deployment can extend
//! or replace them from configuration through [`TableOverrides`] without touching code.

pub mod categories;
pub mod exclusions;
pub mod helpers;
pub mod reverse;
pub mod synonyms;


use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use categories::CategoryKeyword;
pub use exclusions::{ExclusionRule, ExclusionSide};
pub use synonyms::SynonymRule;

static BUILTIN: Lazy<MatchTables> = Lazy::new(|| MatchTables {
    synonyms: synonyms::builtin(),
    categories: categories::builtin(),
    generic_words: categories::builtin_generic_words(),
    exclusions: exclusions::builtin(),
    reverse: reverse::builtin(),
});

/// The full set of lookup tables consulted by the matcher.
///
/// All keys and values are stored lower-cased; [`MatchTables::normalized`] enforces this for
/// tables that come from configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchTables {
    pub synonyms: Vec<SynonymRule>,
    pub categories: BTreeMap<String, Vec<String>>,
    pub generic_words: Vec<String>,
    pub exclusions: Vec<ExclusionRule>,
    pub reverse: BTreeMap<String, Vec<String>>,
}

/// Configuration-supplied additions to the built-in tables.
///
/// Entries are merged key by key: category/reverse lists are unioned, synonym rules with the same
/// canonical term and exclusion rules with the same name replace the built-in one.
/// With `replace_builtin` set the built-in tables are ignored entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableOverrides {
    pub replace_builtin: bool,
    pub synonyms: Vec<SynonymRule>,
    pub categories: BTreeMap<String, Vec<String>>,
    pub generic_words: Vec<String>,
    pub exclusions: Vec<ExclusionRule>,
    pub reverse: BTreeMap<String, Vec<String>>,
}

impl TableOverrides {
    pub fn is_empty(&self) -> bool {
        !self.replace_builtin
            && self.synonyms.is_empty()
            && self.categories.is_empty()
            && self.generic_words.is_empty()
            && self.exclusions.is_empty()
            && self.reverse.is_empty()
    }
}

impl MatchTables {
    /// The tables shipped with the crate.
    pub fn builtin() -> &'static MatchTables {
        &BUILTIN
    }

    /// Built-in tables with `overrides` merged on top.
    pub fn with_overrides(overrides: &TableOverrides) -> MatchTables {
        let mut tables = if overrides.replace_builtin { MatchTables::default() } else { BUILTIN.clone() };

        for rule in &overrides.synonyms {
            match tables.synonyms.iter_mut().find(|r| r.canonical.eq_ignore_ascii_case(&rule.canonical)) {
                Some(existing) => *existing = rule.clone(),
                None => tables.synonyms.push(rule.clone()),
            }
        }
        merge_lists(&mut tables.categories, &overrides.categories);
        merge_lists(&mut tables.reverse, &overrides.reverse);
        tables.generic_words.extend(overrides.generic_words.iter().cloned());
        for rule in &overrides.exclusions {
            match tables.exclusions.iter_mut().find(|r| r.name == rule.name) {
                Some(existing) => *existing = rule.clone(),
                None => tables.exclusions.push(rule.clone()),
            }
        }

        tables.normalized()
    }

    /// Lower-case and de-duplicate every entry.
    pub fn normalized(mut self) -> MatchTables {
        for rule in &mut self.synonyms {
            rule.canonical = helpers::normalize(&rule.canonical);
            rule.aliases = dedup_normalized(&rule.aliases);
        }
        self.categories = normalize_map(&self.categories);
        self.reverse = normalize_map(&self.reverse);
        self.generic_words = dedup_normalized(&self.generic_words);
        for rule in &mut self.exclusions {
            rule.shared = dedup_normalized(&rule.shared);
            for side in [&mut rule.left, &mut rule.right] {
                side.categories = dedup_normalized(&side.categories);
                side.markers = dedup_normalized(&side.markers);
            }
        }
        self
    }
}

fn merge_lists(target: &mut BTreeMap<String, Vec<String>>, extra: &BTreeMap<String, Vec<String>>) {
    for (key, values) in extra {
        let entry = target.entry(helpers::normalize(key)).or_default();
        for value in values {
            if !entry.iter().any(|v| v.eq_ignore_ascii_case(value)) {
                entry.push(value.clone());
            }
        }
    }
}

fn normalize_map(map: &BTreeMap<String, Vec<String>>) -> BTreeMap<String, Vec<String>> {
    let mut out: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, values) in map {
        let entry = out.entry(helpers::normalize(key)).or_default();
        entry.extend(values.iter().cloned());
        *entry = dedup_normalized(entry);
    }
    out
}

fn dedup_normalized(values: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = helpers::normalize(value);
        if !value.is_empty() && !out.contains(&value) {
            out.push(value);
        }
    }
    out
}
