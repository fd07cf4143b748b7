use std::collections::BTreeMap;

use crate::rules::helpers::NormalizedText;
use crate::rules::{CategoryKeyword, MatchTables};

impl MatchTables {
    /// Specific item names in `text` that the reverse table files under `keyword`, in table order.
    pub fn reverse_hits<'a>(&'a self, keyword: &CategoryKeyword, text: &NormalizedText) -> Vec<&'a str> {
        self.reverse
            .iter()
            .filter(|(_, categories)| keyword.belongs_to(categories))
            .filter(|(specific, _)| text.contains(specific))
            .map(|(specific, _)| specific.as_str())
            .collect()
    }
}

pub fn builtin() -> BTreeMap<String, Vec<String>> {
    table! {
        "zaryte bow" => ["nex", "zaros", "bow"],
        "virtus" => ["zaros", "magic"],
        "pernix" => ["zaros", "ranged"],
        "torva" => ["zaros", "melee"],
        "praesul" => ["zaros", "magic"],
        "imperium core" => ["zaros", "magic"],
        "seren godbow" => ["zaros", "bow", "telos"],
        "staff of sliske" => ["zaros", "telos"],
        "zaros godsword" => ["zaros", "godsword", "telos"],
        "armadyl crossbow" => ["saradomin", "zilyana", "crossbow", "god wars", "gwd"],
        "armadyl helmet" => ["god wars", "gwd"],
        "armadyl chestplate" => ["god wars", "gwd"],
        "armadyl chainskirt" => ["god wars", "gwd"],
        "bandos chestplate" => ["god wars", "gwd"],
        "bandos tassets" => ["god wars", "gwd"],
        "saradomin sword" => ["god wars", "gwd", "sword"],
        "zamorakian spear" => ["god wars", "gwd", "spear"],
        "godsword shard" => ["godsword", "god wars", "gwd"],
        "seismic wand" => ["vorago", "wand", "magic"],
        "seismic singularity" => ["vorago", "magic"],
        "dragon claws" => ["dragon", "claws", "melee"],
        "draconic visage" => ["dragon", "king black dragon", "kbd", "shield"],
        "fractured armadyl symbol" => ["kerapac", "fractured"],
        "fractured staff of armadyl" => ["kerapac", "fractured", "staff"],
        "kerapac's wrist wraps" => ["kerapac", "gloves"],
        "ability codex" => ["codex"],
        "funny feeling" => ["pet"],
        "laceration boots" => ["raksha", "boots"],
        "blast diffusion boots" => ["raksha", "boots"],
        "fleeting boots" => ["raksha", "boots"],
        "blightbound crossbow" => ["solak", "crossbow"],
    }
}
