//! Per-item precomputation.
//!
//! Everything about an item that does not depend on the activity text is worked out once per
//! pass: the normalised name, the synonym variations of a literal name, the search terms of a
//! category, and the object id. Matching an activity then only walks precomputed strings.
//!
//! Items are kept in input order and indexed by board, so the matcher can look at the items of
//! eligible boards only.

use std::collections::HashMap;

use crate::rules::MatchTables;
use crate::rules::categories::{CategoryKeyword, CategoryTerm};
use crate::rules::helpers::normalize;
use crate::{BoardId, Item};

#[derive(Debug, Clone)]
pub(crate) enum ItemKind {
    /// A named item. `variations` excludes the name itself.
    Literal { variations: Vec<String> },
    /// An "Any <category>" item.
    Category { keyword: CategoryKeyword, terms: Vec<CategoryTerm> },
}

#[derive(Debug, Clone)]
pub(crate) struct CompiledItem {
    pub(crate) item: Item,
    pub(crate) name: String,
    pub(crate) kind: ItemKind,
    pub(crate) object_id: Option<String>,
}

impl CompiledItem {
    /// `Err` names why the item can never match.
    fn compile(item: &Item, tables: &MatchTables) -> Result<CompiledItem, &'static str> {
        let name = normalize(&item.name);
        if name.is_empty() {
            return Err("empty name");
        }

        let kind = match CategoryKeyword::parse(&name, tables) {
            Some(keyword) => {
                let terms = tables.category_terms(&keyword);
                ItemKind::Category { keyword, terms }
            }
            None if CategoryKeyword::is_wildcard(&name) => return Err("wildcard names no category"),
            None => {
                let variations = tables.variations(&name).into_iter().skip(1).collect();
                ItemKind::Literal { variations }
            }
        };

        let object_id = item.game_object_id.as_deref().map(normalize).filter(|id| !id.is_empty());

        Ok(CompiledItem { item: item.clone(), name, kind, object_id })
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct CompiledItems {
    items: Vec<CompiledItem>,
    by_board: HashMap<BoardId, Vec<usize>>,
}

impl CompiledItems {
    pub(crate) fn new(items: &[Item], tables: &MatchTables) -> CompiledItems {
        let mut compiled = CompiledItems::default();
        for item in items {
            let entry = match CompiledItem::compile(item, tables) {
                Ok(entry) => entry,
                Err(reason) => {
                    tracing::debug!(item_id = item.id, name = %item.name, reason, "skipping item");
                    continue;
                }
            };
            compiled.by_board.entry(entry.item.board_id).or_default().push(compiled.items.len());
            compiled.items.push(entry);
        }
        compiled
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &CompiledItem> {
        self.items.iter()
    }

    /// Items of the given boards, in input order.
    pub(crate) fn for_boards<'a>(&'a self, boards: &[BoardId]) -> impl Iterator<Item = &'a CompiledItem> + 'a {
        let mut indices: Vec<usize> =
            boards.iter().filter_map(|b| self.by_board.get(b)).flatten().copied().collect();
        indices.sort_unstable();
        indices.dedup();
        indices.into_iter().map(move |i| &self.items[i])
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i64, board_id: i64, name: &str) -> Item {
        Item { id, board_id, name: name.into(), game_object_id: None }
    }

    #[test]
    fn empty_names_are_skipped() {
        let compiled = CompiledItems::new(&[item(1, 1, "  "), item(2, 1, "Dragon Claws")], MatchTables::builtin());
        assert_eq!(compiled.len(), 1);
        assert_eq!(compiled.iter().next().map(|c| c.item.id), Some(2));
    }

    #[test]
    fn wildcards_without_a_category_are_skipped() {
        let compiled = CompiledItems::new(
            &[item(1, 1, "Any Item"), item(2, 1, "Any Weapon Drop"), item(3, 1, "Any Nex Item")],
            MatchTables::builtin(),
        );
        let ids: Vec<_> = compiled.iter().map(|c| c.item.id).collect();
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn literal_variations_exclude_name() {
        let compiled = CompiledItems::new(&[item(1, 1, "Dragon Claws")], MatchTables::builtin());
        let entry = compiled.iter().next().unwrap();
        assert_eq!(entry.name, "dragon claws");
        match &entry.kind {
            ItemKind::Literal { variations } => {
                assert!(!variations.contains(&"dragon claws".to_string()));
                assert!(variations.contains(&"d claws".to_string()));
            }
            other => panic!("expected literal item, got {other:?}"),
        }
    }

    #[test]
    fn category_items_carry_terms() {
        let compiled = CompiledItems::new(&[item(1, 1, "Any Nex Item")], MatchTables::builtin());
        let entry = compiled.iter().next().unwrap();
        assert!(matches!(&entry.kind, ItemKind::Category { keyword, .. } if keyword.phrase == "nex"));
    }

    #[test]
    fn board_filter_keeps_input_order() {
        let compiled = CompiledItems::new(
            &[item(1, 1, "Dragon Claws"), item(2, 2, "Dragon Claws"), item(3, 1, "Abyssal Whip")],
            MatchTables::builtin(),
        );
        let ids: Vec<_> = compiled.for_boards(&[2, 1]).map(|c| c.item.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        let ids: Vec<_> = compiled.for_boards(&[1]).map(|c| c.item.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
