//! Text matching of one activity against compiled items.
//!
//! Strategies are tried cheapest first and the first hit wins:
//!
//! 1. object id: the item's game-object id appears as a token,
//! 2. literal: the normalised name appears as a substring,
//! 3. variations: a synonym spelling appears on word boundaries,
//! 4. category: a search term of an "Any <category>" item appears and no exclusion rejects it,
//! 5. reverse: a specific item filed under the category appears and no exclusion rejects it.
//!
//! The matcher is pure. It does not know about boards, windows or teams.

use crate::api::{ItemMatch, MatchReason, MatchStrategies, Options};
use crate::engine::ActivityText;
use crate::engine::compiled_items::{CompiledItem, ItemKind};
use crate::rules::MatchTables;
use crate::rules::categories::{CategoryKeyword, CategoryTerm};

pub(crate) struct Matcher<'a> {
    tables: &'a MatchTables,
    strategies: MatchStrategies,
}

impl<'a> Matcher<'a> {
    pub(crate) fn new(tables: &'a MatchTables, options: &Options) -> Self {
        Matcher { tables, strategies: options.strategies }
    }

    /// All items satisfied by `text`, in the order the items were given.
    pub(crate) fn match_items<'i>(
        &self,
        text: &ActivityText,
        items: impl IntoIterator<Item = &'i CompiledItem>,
    ) -> Vec<ItemMatch> {
        if text.text.is_empty() {
            return Vec::new();
        }
        items
            .into_iter()
            .filter_map(|entry| {
                self.match_item(text, entry).map(|reason| ItemMatch {
                    item_id: entry.item.id,
                    board_id: entry.item.board_id,
                    item_name: entry.item.name.clone(),
                    reason,
                })
            })
            .collect()
    }

    pub(crate) fn match_item(&self, text: &ActivityText, entry: &CompiledItem) -> Option<MatchReason> {
        if self.strategies.contains(MatchStrategies::OBJECT_ID) {
            if let Some(id) = entry.object_id.as_deref().filter(|id| text.tokens.contains(*id)) {
                return Some(MatchReason::ObjectId { id: id.to_string() });
            }
        }

        match &entry.kind {
            ItemKind::Literal { variations } => self.match_literal(text, &entry.name, variations),
            ItemKind::Category { keyword, terms } => self.match_category(text, keyword, terms),
        }
    }

    fn match_literal(&self, text: &ActivityText, name: &str, variations: &[String]) -> Option<MatchReason> {
        if self.strategies.contains(MatchStrategies::LITERAL) && text.text.contains(name) {
            return Some(MatchReason::Literal);
        }
        if self.strategies.contains(MatchStrategies::VARIATIONS) {
            if let Some(variant) = variations.iter().find(|v| text.text.contains_word(v)) {
                tracing::trace!(target: "squarehunt::rules", name, variant = variant.as_str(), "variation hit");
                return Some(MatchReason::Variation { variant: variant.clone() });
            }
        }
        None
    }

    fn match_category(
        &self,
        text: &ActivityText,
        keyword: &CategoryKeyword,
        terms: &[CategoryTerm],
    ) -> Option<MatchReason> {
        if self.strategies.contains(MatchStrategies::CATEGORY) {
            for CategoryTerm { term, whole_word } in terms {
                let found = if *whole_word { text.text.contains_word(term) } else { text.text.contains(term) };
                if !found {
                    continue;
                }
                if let Some(rule) = self.tables.exclusion_for(keyword, term, &text.text) {
                    tracing::trace!(
                        target: "squarehunt::rules",
                        category = keyword.phrase.as_str(),
                        term = term.as_str(),
                        rule = rule.name.as_str(),
                        "category term excluded"
                    );
                    continue;
                }
                tracing::trace!(target: "squarehunt::rules", category = keyword.phrase.as_str(), term = term.as_str(), "category hit");
                return Some(MatchReason::Category { term: term.clone() });
            }
        }

        if self.strategies.contains(MatchStrategies::REVERSE) {
            for specific in self.tables.reverse_hits(keyword, &text.text) {
                if let Some(rule) = self.tables.exclusion_for(keyword, specific, &text.text) {
                    tracing::trace!(
                        target: "squarehunt::rules",
                        category = keyword.phrase.as_str(),
                        specific,
                        rule = rule.name.as_str(),
                        "reverse mapping excluded"
                    );
                    continue;
                }
                return Some(MatchReason::Reverse { specific: specific.to_string() });
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Item;
    use crate::engine::CompiledItems;

    fn run(name: &str, text: &str) -> Option<MatchReason> {
        let items = [Item { id: 1, board_id: 1, name: name.into(), game_object_id: None }];
        let compiled = CompiledItems::new(&items, MatchTables::builtin());
        let matcher = Matcher::new(MatchTables::builtin(), &Options::default());
        let text = ActivityText::scan(text, None);
        compiled.iter().next().and_then(|entry| matcher.match_item(&text, entry))
    }

    #[test]
    fn literal_beats_variation() {
        assert_eq!(run("Dragon Claws", "I found a pair of Dragon Claws"), Some(MatchReason::Literal));
    }

    #[test]
    fn variation_needs_word_boundary() {
        assert_eq!(run("Dragon Claws", "I found d claws"), Some(MatchReason::Variation { variant: "d claws".into() }));
        assert_eq!(run("Dragon Claws", "I found mad claws"), None);
    }

    #[test]
    fn object_id_token_matches() {
        let items = [Item { id: 1, board_id: 1, name: "Abyssal Whip".into(), game_object_id: Some("4151".into()) }];
        let compiled = CompiledItems::new(&items, MatchTables::builtin());
        let matcher = Matcher::new(MatchTables::builtin(), &Options::default());
        let text = ActivityText::scan("Loot received: item 4151", None);
        let entry = compiled.iter().next().unwrap();
        assert_eq!(matcher.match_item(&text, entry), Some(MatchReason::ObjectId { id: "4151".into() }));

        let text = ActivityText::scan("Loot received: item 41512", None);
        assert_eq!(matcher.match_item(&text, entry), None);
    }

    #[test]
    fn excluded_term_falls_through_to_next_term() {
        assert_eq!(run("Any Armadyl Item", "I found a Fractured Armadyl Symbol"), None);
        assert_eq!(
            run("Any Kerapac Item", "I found a Fractured Armadyl Symbol"),
            Some(MatchReason::Category { term: "fractured".into() })
        );
    }

    #[test]
    fn reverse_table_reaches_family_category() {
        assert_eq!(
            run("Any Zaros Item", "I found a Zaryte bow"),
            Some(MatchReason::Reverse { specific: "zaryte bow".into() })
        );
    }

    #[test]
    fn empty_text_matches_nothing() {
        let items = [Item { id: 1, board_id: 1, name: "Dragon Claws".into(), game_object_id: None }];
        let compiled = CompiledItems::new(&items, MatchTables::builtin());
        let matcher = Matcher::new(MatchTables::builtin(), &Options::default());
        assert!(matcher.match_items(&ActivityText::scan("   ", None), compiled.iter()).is_empty());
    }
}
