use crate::engine::{ActivityText, CompiledItems, Matcher};
use crate::error::EngineError;
use crate::rules::MatchTables;
use crate::{BoardId, Item, ItemId};

pub use crate::engine::{PassMetrics, PassReport, TeamCredit};

bitflags::bitflags! {
    /// Which matching strategies the text matcher may use.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MatchStrategies: u8 {
        /// Item name as a substring of the activity text.
        const LITERAL    = 1 << 0;
        /// Synonym/abbreviation variations of a literal name.
        const VARIATIONS = 1 << 1;
        /// "Any <category>" expansion through the category table.
        const CATEGORY   = 1 << 2;
        /// Specific item name → category reverse table.
        const REVERSE    = 1 << 3;
        /// Canonical game-object id appearing as a token.
        const OBJECT_ID  = 1 << 4;
    }
}

impl Default for MatchStrategies {
    fn default() -> Self {
        MatchStrategies::all()
    }
}

/// Options that affect matching behavior.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    pub strategies: MatchStrategies,
}

/// Why an item matched an activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchReason {
    /// The item name appears verbatim.
    Literal,
    /// A synonym variation of the item name appears.
    Variation { variant: String },
    /// A search term of the item's category appears.
    Category { term: String },
    /// A specific item the reverse table files under the item's category appears.
    Reverse { specific: String },
    /// The item's canonical game-object id appears.
    ObjectId { id: String },
}

impl std::fmt::Display for MatchReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchReason::Literal => write!(f, "literal name"),
            MatchReason::Variation { variant } => write!(f, "variation \"{variant}\""),
            MatchReason::Category { term } => write!(f, "category term \"{term}\""),
            MatchReason::Reverse { specific } => write!(f, "reverse mapping from \"{specific}\""),
            MatchReason::ObjectId { id } => write!(f, "game object id {id}"),
        }
    }
}

/// An item satisfied by an activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemMatch {
    pub item_id: ItemId,
    pub board_id: BoardId,
    pub item_name: String,
    pub reason: MatchReason,
}

/// Result of [`crate::Engine::dry_run`]: what a single activity would complete, uncommitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DryRun {
    pub actor: String,
    /// Live boards whose window contains the activity.
    pub eligible_boards: Vec<BoardId>,
    pub matches: Vec<ItemMatch>,
    pub teams: Vec<TeamCredit>,
}

impl DryRun {
    /// `(item, team)` pairs that would be committed, ignoring existing completions.
    pub fn pairs(&self) -> Vec<(&ItemMatch, &TeamCredit)> {
        self.matches
            .iter()
            .flat_map(|m| self.teams.iter().filter(move |t| t.board_id == m.board_id).map(move |t| (m, t)))
            .collect()
    }
}

/// Outcome of one [`crate::Engine::process_activities`] trigger.
#[derive(Debug, Clone)]
pub enum PassOutcome {
    /// Another pass was running; this trigger was dropped.
    Skipped,
    /// No board is active and started; nothing was fetched.
    NoLiveBoards,
    Completed(PassReport),
    Failed(EngineError),
}

impl PassOutcome {
    pub fn report(&self) -> Option<&PassReport> {
        match self {
            PassOutcome::Completed(report) => Some(report),
            _ => None,
        }
    }
}

/// Match `text` against `items` using the built-in tables and default options.
///
/// # Example
/// ```
/// use squarehunt::{Item, match_text};
///
/// let items = vec![Item { id: 1, board_id: 1, name: "Abyssal Whip".into(), game_object_id: None }];
/// let out = match_text("I received a drop: Abyssal whip", &items);
/// assert_eq!(out.len(), 1);
/// ```
pub fn match_text(text: &str, items: &[Item]) -> Vec<ItemMatch> {
    match_text_with(text, items, MatchTables::builtin(), &Options::default())
}

/// Match `text` against `items` with explicit tables and options.
pub fn match_text_with(text: &str, items: &[Item], tables: &MatchTables, options: &Options) -> Vec<ItemMatch> {
    let compiled = CompiledItems::new(items, tables);
    let text = ActivityText::scan(text, None);
    Matcher::new(tables, options).match_items(&text, compiled.iter())
}

/// Decide whether `text` satisfies a single item name, using the built-in tables.
pub fn match_item(text: &str, item_name: &str) -> Option<MatchReason> {
    match_item_with(text, item_name, MatchTables::builtin(), &Options::default())
}

pub fn match_item_with(text: &str, item_name: &str, tables: &MatchTables, options: &Options) -> Option<MatchReason> {
    let item = Item { id: 0, board_id: 0, name: item_name.to_string(), game_object_id: None };
    match_text_with(text, std::slice::from_ref(&item), tables, options).into_iter().next().map(|m| m.reason)
}
