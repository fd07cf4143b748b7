extern crate self as squarehunt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[macro_use]
mod macros;
mod api;
pub mod config;
mod engine;
pub mod error;
mod rules;
pub mod store;

pub use api::{
    DryRun, ItemMatch, MatchReason, MatchStrategies, Options, PassMetrics, PassOutcome, PassReport, TeamCredit,
    match_item, match_item_with, match_text, match_text_with,
};
pub use config::EngineConfig;
pub use engine::{Engine, PollingHandle};
pub use error::{ConfigError, EngineError, PassError, SourceError, StoreError};
pub use rules::{ExclusionRule, ExclusionSide, MatchTables, SynonymRule, TableOverrides};
pub use store::{ActivitySource, BoardStore, Fixture, FixtureTeam, InMemoryActivitySource, InMemoryBoardStore};

// --- Identifiers -------------------------------------------------------------

pub type BoardId = i64;
pub type ItemId = i64;
pub type TeamId = i64;
pub type MemberId = i64;
pub type GuestId = i64;
pub type CompletionId = i64;

// --- Board configuration -----------------------------------------------------

/// One bingo game instance with its own grid, teams and schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub title: String,
    pub active: bool,
    /// Absent start means the board is eligible immediately.
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    /// Absent end means the board is eligible up to "now".
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

/// One square on a board's grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub board_id: BoardId,
    /// Display name, possibly in the generic "Any <category>" form.
    pub name: String,
    #[serde(default)]
    pub game_object_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub board_id: BoardId,
    pub name: String,
}

/// A roster entry. Clan members and guests live in separate id namespaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Member {
    Clan {
        id: MemberId,
        display_name: String,
        #[serde(default)]
        canonical_name: Option<String>,
    },
    Guest {
        id: GuestId,
        display_name: String,
    },
}

impl Member {
    /// All names this person may appear under in an activity feed.
    pub fn names(&self) -> Vec<&str> {
        match self {
            Member::Clan { display_name, canonical_name, .. } => {
                let mut names = vec![display_name.as_str()];
                names.extend(canonical_name.as_deref());
                names
            }
            Member::Guest { display_name, .. } => vec![display_name.as_str()],
        }
    }

    pub fn credit(&self) -> Credit {
        match self {
            Member::Clan { id, .. } => Credit::Member(*id),
            Member::Guest { id, .. } => Credit::Guest(*id),
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Member::Guest { .. })
    }
}

/// A guest rostered on one of the given boards, as listed by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guest {
    pub id: GuestId,
    pub display_name: String,
}

/// Who gets credit for a completion: exactly one of a clan member or a guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Credit {
    Member(MemberId),
    Guest(GuestId),
}

impl Credit {
    pub fn member_id(&self) -> Option<MemberId> {
        match self {
            Credit::Member(id) => Some(*id),
            Credit::Guest(_) => None,
        }
    }

    pub fn guest_id(&self) -> Option<GuestId> {
        match self {
            Credit::Guest(id) => Some(*id),
            Credit::Member(_) => None,
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Credit::Guest(_))
    }
}

// --- Activity feed -----------------------------------------------------------

/// A raw activity line as reported by the game-stats feed. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub actor: String,
    pub timestamp_millis: i64,
    pub text: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub source_id: Option<String>,
}

impl Activity {
    pub fn new(actor: impl Into<String>, timestamp_millis: i64, text: impl Into<String>) -> Self {
        Activity { actor: actor.into(), timestamp_millis, text: text.into(), details: None, source_id: None }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    /// `None` when the millisecond value is outside chrono's representable range.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp_millis)
    }

    /// Text snapshot stored as completion evidence.
    pub fn evidence(&self) -> String {
        match &self.details {
            Some(details) if !details.trim().is_empty() => format!("{} | {}", self.text, details),
            _ => self.text.clone(),
        }
    }
}

// --- Completions -------------------------------------------------------------

/// Durable record that a team satisfied an item. Unique on `(item_id, team_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub id: CompletionId,
    pub item_id: ItemId,
    pub team_id: TeamId,
    pub credit: Credit,
    pub source_activity_id: Option<String>,
    pub evidence: String,
}

/// Insert payload for [`BoardStore::create_completion`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCompletion {
    pub item_id: ItemId,
    pub team_id: TeamId,
    pub credit: Credit,
    pub source_activity_id: Option<String>,
    pub evidence: String,
}

impl NewCompletion {
    pub fn key(&self) -> CompletionKey {
        CompletionKey { item_id: self.item_id, team_id: self.team_id }
    }
}

/// The unique key of a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompletionKey {
    pub item_id: ItemId,
    pub team_id: TeamId,
}
