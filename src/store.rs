//! Boundaries to the outside world.
//!
//! The engine reads board configuration and writes completions through [`BoardStore`], and reads
//! game activity through [`ActivitySource`]. Both are async traits so a deployment can back them
//! with a database and an HTTP client; the in-memory implementations below back the tests, the
//! CLI and local replays of a [`Fixture`].

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{ConfigError, SourceError, StoreError};
use crate::{
    Activity, Board, BoardId, Completion, CompletionKey, Guest, Item, ItemId, Member, NewCompletion, Team, TeamId,
};

// ============================================================================
// Traits
// ============================================================================

/// Board configuration and completion persistence.
#[async_trait::async_trait]
pub trait BoardStore: Send + Sync {
    async fn list_boards(&self) -> Result<Vec<Board>, StoreError>;

    async fn list_items(&self, board_id: BoardId) -> Result<Vec<Item>, StoreError>;

    async fn list_teams(&self, board_id: BoardId) -> Result<Vec<Team>, StoreError>;

    async fn list_roster(&self, team_id: TeamId) -> Result<Vec<Member>, StoreError>;

    /// Guests rostered on any team of the given boards, each listed once.
    async fn list_guests(&self, board_ids: &[BoardId]) -> Result<Vec<Guest>, StoreError>;

    async fn get_completion(&self, item_id: ItemId, team_id: TeamId) -> Result<Option<Completion>, StoreError>;

    /// Insert a completion. Must fail with [`StoreError::Conflict`] when the `(item, team)` key
    /// is already taken.
    async fn create_completion(&self, completion: NewCompletion) -> Result<Completion, StoreError>;
}

/// The game-stats activity feed.
#[async_trait::async_trait]
pub trait ActivitySource: Send + Sync {
    /// The most recent clan-wide activities, at most `limit` of them.
    async fn clan_activities(&self, limit: usize) -> Result<Vec<Activity>, SourceError>;

    /// Activities of a single (non-clan) player over the last `lookback_hours`.
    async fn guest_activities(&self, display_name: &str, lookback_hours: u32) -> Result<Vec<Activity>, SourceError>;
}

// ============================================================================
// In-memory board store
// ============================================================================

#[derive(Debug, Default)]
struct BoardData {
    boards: Vec<Board>,
    items: Vec<Item>,
    teams: Vec<Team>,
    rosters: HashMap<TeamId, Vec<Member>>,
    completions: BTreeMap<CompletionKey, Completion>,
}

/// Board store kept entirely in memory.
#[derive(Debug)]
pub struct InMemoryBoardStore {
    data: RwLock<BoardData>,
    next_id: AtomicI64,
}

impl Default for InMemoryBoardStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBoardStore {
    pub fn new() -> Self {
        Self { data: RwLock::new(BoardData::default()), next_id: AtomicI64::new(1) }
    }

    pub fn from_fixture(fixture: &Fixture) -> Self {
        let data = BoardData {
            boards: fixture.boards.clone(),
            items: fixture.items.clone(),
            teams: fixture.teams.iter().map(|t| t.team.clone()).collect(),
            rosters: fixture.teams.iter().map(|t| (t.team.id, t.members.clone())).collect(),
            completions: BTreeMap::new(),
        };
        Self { data: RwLock::new(data), next_id: AtomicI64::new(1) }
    }

    pub async fn add_board(&self, board: Board) {
        self.data.write().await.boards.push(board);
    }

    pub async fn add_item(&self, item: Item) {
        self.data.write().await.items.push(item);
    }

    pub async fn add_team(&self, team: Team, members: Vec<Member>) {
        let mut data = self.data.write().await;
        data.rosters.insert(team.id, members);
        data.teams.push(team);
    }

    /// Every recorded completion, ordered by `(item, team)`.
    pub async fn completions(&self) -> Vec<Completion> {
        self.data.read().await.completions.values().cloned().collect()
    }
}

#[async_trait::async_trait]
impl BoardStore for InMemoryBoardStore {
    async fn list_boards(&self) -> Result<Vec<Board>, StoreError> {
        Ok(self.data.read().await.boards.clone())
    }

    async fn list_items(&self, board_id: BoardId) -> Result<Vec<Item>, StoreError> {
        Ok(self.data.read().await.items.iter().filter(|i| i.board_id == board_id).cloned().collect())
    }

    async fn list_teams(&self, board_id: BoardId) -> Result<Vec<Team>, StoreError> {
        Ok(self.data.read().await.teams.iter().filter(|t| t.board_id == board_id).cloned().collect())
    }

    async fn list_roster(&self, team_id: TeamId) -> Result<Vec<Member>, StoreError> {
        self.data
            .read()
            .await
            .rosters
            .get(&team_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("team {team_id}")))
    }

    async fn list_guests(&self, board_ids: &[BoardId]) -> Result<Vec<Guest>, StoreError> {
        let data = self.data.read().await;
        let mut guests: Vec<Guest> = Vec::new();
        for team in data.teams.iter().filter(|t| board_ids.contains(&t.board_id)) {
            for member in data.rosters.get(&team.id).into_iter().flatten() {
                if let Member::Guest { id, display_name } = member {
                    if !guests.iter().any(|g| g.id == *id) {
                        guests.push(Guest { id: *id, display_name: display_name.clone() });
                    }
                }
            }
        }
        Ok(guests)
    }

    async fn get_completion(&self, item_id: ItemId, team_id: TeamId) -> Result<Option<Completion>, StoreError> {
        Ok(self.data.read().await.completions.get(&CompletionKey { item_id, team_id }).cloned())
    }

    async fn create_completion(&self, completion: NewCompletion) -> Result<Completion, StoreError> {
        let key = completion.key();
        let mut data = self.data.write().await;
        if data.completions.contains_key(&key) {
            return Err(StoreError::Conflict { item_id: key.item_id, team_id: key.team_id });
        }
        let created = Completion {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            item_id: completion.item_id,
            team_id: completion.team_id,
            credit: completion.credit,
            source_activity_id: completion.source_activity_id,
            evidence: completion.evidence,
        };
        data.completions.insert(key, created.clone());
        Ok(created)
    }
}

// ============================================================================
// In-memory activity source
// ============================================================================

#[derive(Debug, Default)]
struct FeedData {
    clan: Vec<Activity>,
    guests: HashMap<String, Vec<Activity>>,
}

/// Activity source replaying canned activities.
///
/// Guest lookbacks are applied relative to `reference_time` when one is set; otherwise every
/// stored activity of the guest is returned. Requested lookbacks are recorded for inspection.
#[derive(Debug, Default)]
pub struct InMemoryActivitySource {
    feeds: RwLock<FeedData>,
    reference_time: Option<DateTime<Utc>>,
    guest_requests: RwLock<Vec<(String, u32)>>,
}

impl InMemoryActivitySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: &Fixture) -> Self {
        let mut feeds = FeedData { clan: fixture.activities.clone(), guests: HashMap::new() };
        for activity in &fixture.guest_activities {
            feeds.guests.entry(guest_key(&activity.actor)).or_default().push(activity.clone());
        }
        Self { feeds: RwLock::new(feeds), reference_time: fixture.now, guest_requests: RwLock::default() }
    }

    pub fn with_reference_time(mut self, now: DateTime<Utc>) -> Self {
        self.reference_time = Some(now);
        self
    }

    pub async fn push_clan(&self, activity: Activity) {
        self.feeds.write().await.clan.push(activity);
    }

    pub async fn push_guest(&self, activity: Activity) {
        self.feeds.write().await.guests.entry(guest_key(&activity.actor)).or_default().push(activity);
    }

    /// `(display name, lookback hours)` of every guest fetch so far.
    pub async fn guest_requests(&self) -> Vec<(String, u32)> {
        self.guest_requests.read().await.clone()
    }
}

fn guest_key(name: &str) -> String {
    name.trim().to_lowercase()
}

#[async_trait::async_trait]
impl ActivitySource for InMemoryActivitySource {
    async fn clan_activities(&self, limit: usize) -> Result<Vec<Activity>, SourceError> {
        let mut clan = self.feeds.read().await.clan.clone();
        clan.sort_by_key(|a| std::cmp::Reverse(a.timestamp_millis));
        clan.truncate(limit);
        Ok(clan)
    }

    async fn guest_activities(&self, display_name: &str, lookback_hours: u32) -> Result<Vec<Activity>, SourceError> {
        self.guest_requests.write().await.push((display_name.to_string(), lookback_hours));
        let feeds = self.feeds.read().await;
        let activities = feeds.guests.get(&guest_key(display_name)).cloned().unwrap_or_default();
        let Some(now) = self.reference_time else {
            return Ok(activities);
        };
        let since = (now - TimeDelta::hours(i64::from(lookback_hours))).timestamp_millis();
        Ok(activities.into_iter().filter(|a| a.timestamp_millis >= since).collect())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// A team entry of a [`Fixture`], roster inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureTeam {
    #[serde(flatten)]
    pub team: Team,
    #[serde(default)]
    pub members: Vec<Member>,
}

/// A self-contained world for replays and tests.
///
/// ```toml
/// now = "2025-01-15T12:00:00Z"
///
/// [[boards]]
/// id = 1
/// title = "January"
/// active = true
/// start_date = "2025-01-01T00:00:00Z"
///
/// [[items]]
/// id = 10
/// board_id = 1
/// name = "Dragon Claws"
///
/// [[teams]]
/// id = 100
/// board_id = 1
/// name = "Red"
/// members = [{ kind = "clan", id = 7, display_name = "PlayerOne" }]
///
/// [[activities]]
/// actor = "PlayerOne"
/// timestamp_millis = 1736899200000
/// text = "I found a pair of Dragon Claws"
/// ```
///
/// Timestamps in board dates and `now` are RFC 3339 strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fixture {
    /// Reference time for passes over this fixture.
    pub now: Option<DateTime<Utc>>,
    pub boards: Vec<Board>,
    pub items: Vec<Item>,
    pub teams: Vec<FixtureTeam>,
    pub activities: Vec<Activity>,
    pub guest_activities: Vec<Activity>,
}

impl Fixture {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&contents)
    }

    /// Fresh in-memory store and source seeded from this fixture.
    pub fn into_backends(self) -> (InMemoryBoardStore, InMemoryActivitySource) {
        (InMemoryBoardStore::from_fixture(&self), InMemoryActivitySource::from_fixture(&self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Credit;

    fn new_completion(item_id: ItemId, team_id: TeamId) -> NewCompletion {
        NewCompletion { item_id, team_id, credit: Credit::Member(7), source_activity_id: None, evidence: "x".into() }
    }

    #[tokio::test]
    async fn duplicate_completion_is_a_conflict() {
        let store = InMemoryBoardStore::new();
        let first = store.create_completion(new_completion(1, 2)).await.unwrap();
        assert_eq!(first.id, 1);

        let err = store.create_completion(new_completion(1, 2)).await.unwrap_err();
        assert_eq!(err, StoreError::Conflict { item_id: 1, team_id: 2 });
        assert!(store.get_completion(1, 2).await.unwrap().is_some());
        assert!(store.get_completion(1, 3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn guests_are_listed_once_per_board_set() {
        let store = InMemoryBoardStore::new();
        let guest = Member::Guest { id: 3, display_name: "Visitor".into() };
        store.add_team(Team { id: 100, board_id: 1, name: "Red".into() }, vec![guest.clone()]).await;
        store.add_team(Team { id: 200, board_id: 2, name: "Blue".into() }, vec![guest]).await;
        store
            .add_team(
                Team { id: 300, board_id: 3, name: "Green".into() },
                vec![Member::Guest { id: 4, display_name: "Other".into() }],
            )
            .await;

        let guests = store.list_guests(&[1, 2]).await.unwrap();
        assert_eq!(guests, vec![Guest { id: 3, display_name: "Visitor".into() }]);
    }

    #[tokio::test]
    async fn unknown_team_roster_is_not_found() {
        let store = InMemoryBoardStore::new();
        assert!(matches!(store.list_roster(9).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn clan_feed_returns_most_recent_first() {
        let source = InMemoryActivitySource::new();
        for ts in [1, 3, 2] {
            source.push_clan(Activity::new("PlayerOne", ts, "text")).await;
        }
        let out = source.clan_activities(2).await.unwrap();
        let ts: Vec<_> = out.iter().map(|a| a.timestamp_millis).collect();
        assert_eq!(ts, vec![3, 2]);
    }

    #[tokio::test]
    async fn guest_lookback_filters_by_reference_time() {
        let now = DateTime::from_timestamp_millis(10 * 3_600_000).unwrap();
        let source = InMemoryActivitySource::new().with_reference_time(now);
        source.push_guest(Activity::new("Visitor", 9 * 3_600_000, "recent")).await;
        source.push_guest(Activity::new("Visitor", 3_600_000, "old")).await;

        let out = source.guest_activities("visitor", 2).await.unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text, "recent");
        assert_eq!(source.guest_requests().await, vec![("visitor".to_string(), 2)]);
    }

    #[test]
    fn fixture_parses_inline_rosters() {
        let fixture = Fixture::from_toml_str(
            r#"
            now = "2025-01-15T12:00:00Z"

            [[boards]]
            id = 1
            title = "January"
            active = true
            start_date = "2025-01-01T00:00:00Z"

            [[teams]]
            id = 100
            board_id = 1
            name = "Red"
            members = [
                { kind = "clan", id = 7, display_name = "PlayerOne", canonical_name = "player_one" },
                { kind = "guest", id = 3, display_name = "Visitor" },
            ]
            "#,
        )
        .unwrap();

        assert_eq!(fixture.boards[0].end_date, None);
        assert_eq!(fixture.teams[0].team.name, "Red");
        assert_eq!(fixture.teams[0].members.len(), 2);
        assert!(fixture.teams[0].members[1].is_guest());
    }
}
