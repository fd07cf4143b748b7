//! Actor name → teams.
//!
//! Activity feeds only carry a display name. A name resolves case-insensitively against clan
//! display names, clan canonical names and guest display names of every rostered member; the
//! credit records which namespace the id came from.

use std::collections::HashMap;

use serde::Serialize;

use crate::rules::helpers::normalize;
use crate::{BoardId, Credit, Member, Team, TeamId};

/// A team together with its roster, as loaded for one pass.
#[derive(Debug, Clone)]
pub(crate) struct TeamRoster {
    pub(crate) team: Team,
    pub(crate) members: Vec<Member>,
}

/// A team an actor plays for, with the credit a completion would carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamCredit {
    pub team_id: TeamId,
    pub board_id: BoardId,
    pub team_name: String,
    pub credit: Credit,
}

#[derive(Debug, Default)]
pub(crate) struct RosterIndex {
    by_name: HashMap<String, Vec<TeamCredit>>,
}

impl RosterIndex {
    pub(crate) fn new(rosters: &[TeamRoster]) -> Self {
        let mut index = RosterIndex::default();
        for roster in rosters {
            for member in &roster.members {
                for name in member.names() {
                    let key = normalize(name);
                    if key.is_empty() {
                        continue;
                    }
                    let entries = index.by_name.entry(key).or_default();
                    // A member listed under two names still credits the team once.
                    if entries.iter().any(|e| e.team_id == roster.team.id) {
                        continue;
                    }
                    entries.push(TeamCredit {
                        team_id: roster.team.id,
                        board_id: roster.team.board_id,
                        team_name: roster.team.name.clone(),
                        credit: member.credit(),
                    });
                }
            }
        }
        index
    }

    /// Teams on `boards` that `actor` plays for. Empty when the name is unknown.
    pub(crate) fn resolve(&self, actor: &str, boards: &[BoardId]) -> Vec<TeamCredit> {
        self.by_name
            .get(&normalize(actor))
            .map(|entries| entries.iter().filter(|e| boards.contains(&e.board_id)).cloned().collect())
            .unwrap_or_default()
    }

    /// Boards on which `actor` is rostered.
    pub(crate) fn boards_of(&self, actor: &str) -> Vec<BoardId> {
        let mut boards: Vec<BoardId> = self
            .by_name
            .get(&normalize(actor))
            .map(|entries| entries.iter().map(|e| e.board_id).collect())
            .unwrap_or_default();
        boards.sort_unstable();
        boards.dedup();
        boards
    }
}
