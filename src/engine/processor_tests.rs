use super::*;
use crate::error::StoreError;
use crate::store::{InMemoryActivitySource, InMemoryBoardStore};
use crate::{Board, Completion, Credit, Item, ItemId, Member, Team, TeamId};
use chrono::{TimeDelta, TimeZone};

fn at(month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, month, day, 12, 0, 0).unwrap()
}

fn board(id: BoardId, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Board {
    Board { id, title: format!("Board {id}"), active: true, start_date: start, end_date: end }
}

fn item(id: ItemId, board_id: BoardId, name: &str) -> Item {
    Item { id, board_id, name: name.into(), game_object_id: None }
}

fn team(id: TeamId, board_id: BoardId, name: &str) -> Team {
    Team { id, board_id, name: name.into() }
}

fn clan(id: i64, name: &str) -> Member {
    Member::Clan { id, display_name: name.into(), canonical_name: None }
}

fn activity(actor: &str, ts: DateTime<Utc>, text: &str) -> Activity {
    Activity::new(actor, ts.timestamp_millis(), text)
}

/// January board with one "Dragon Claws" square and a team holding PlayerOne (member 7).
async fn january() -> (InMemoryBoardStore, InMemoryActivitySource) {
    let store = InMemoryBoardStore::new();
    store.add_board(board(1, Some(at(1, 1)), Some(at(1, 31)))).await;
    store.add_item(item(10, 1, "Dragon Claws")).await;
    store.add_team(team(100, 1, "Red"), vec![clan(7, "PlayerOne")]).await;
    (store, InMemoryActivitySource::new())
}

fn engine<S: BoardStore, A: ActivitySource>(store: Arc<S>, source: Arc<A>) -> Engine<S, A> {
    Engine::new(store, source, EngineConfig::default())
}

fn completed(outcome: PassOutcome) -> PassReport {
    match outcome {
        PassOutcome::Completed(report) => report,
        other => panic!("expected a completed pass, got {other:?}"),
    }
}

fn keys(completions: &[Completion]) -> Vec<(ItemId, TeamId)> {
    completions.iter().map(|c| (c.item_id, c.team_id)).collect()
}

// --- Store / source wrappers ---------------------------------------------------

#[derive(Default)]
struct Faults {
    boards_fail: bool,
    boards_panic: bool,
    create_fails_for: Option<ItemId>,
}

struct FaultyStore {
    inner: InMemoryBoardStore,
    faults: Faults,
}

#[async_trait::async_trait]
impl BoardStore for FaultyStore {
    async fn list_boards(&self) -> Result<Vec<Board>, StoreError> {
        if self.faults.boards_panic {
            panic!("board table corrupted");
        }
        if self.faults.boards_fail {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        self.inner.list_boards().await
    }

    async fn list_items(&self, board_id: BoardId) -> Result<Vec<Item>, StoreError> {
        self.inner.list_items(board_id).await
    }

    async fn list_teams(&self, board_id: BoardId) -> Result<Vec<Team>, StoreError> {
        self.inner.list_teams(board_id).await
    }

    async fn list_roster(&self, team_id: TeamId) -> Result<Vec<Member>, StoreError> {
        self.inner.list_roster(team_id).await
    }

    async fn list_guests(&self, board_ids: &[BoardId]) -> Result<Vec<Guest>, StoreError> {
        self.inner.list_guests(board_ids).await
    }

    async fn get_completion(&self, item_id: ItemId, team_id: TeamId) -> Result<Option<Completion>, StoreError> {
        self.inner.get_completion(item_id, team_id).await
    }

    async fn create_completion(&self, completion: NewCompletion) -> Result<Completion, StoreError> {
        if self.faults.create_fails_for == Some(completion.item_id) {
            return Err(StoreError::Unavailable("write rejected".into()));
        }
        self.inner.create_completion(completion).await
    }
}

struct SlowSource {
    inner: InMemoryActivitySource,
    clan_delay: Duration,
}

#[async_trait::async_trait]
impl ActivitySource for SlowSource {
    async fn clan_activities(&self, limit: usize) -> Result<Vec<Activity>, SourceError> {
        tokio::time::sleep(self.clan_delay).await;
        self.inner.clan_activities(limit).await
    }

    async fn guest_activities(&self, display_name: &str, lookback_hours: u32) -> Result<Vec<Activity>, SourceError> {
        self.inner.guest_activities(display_name, lookback_hours).await
    }
}

// --- Passes --------------------------------------------------------------------

#[tokio::test]
async fn second_pass_over_same_activity_adds_nothing() {
    let (store, source) = january().await;
    source.push_clan(activity("PlayerOne", at(1, 15), "I found a pair of Dragon Claws").with_source_id("a-1")).await;
    let store = Arc::new(store);
    let engine = engine(store.clone(), Arc::new(source));

    let first = completed(engine.process_activities_at(at(1, 20)).await);
    assert_eq!(keys(&first.completions), vec![(10, 100)]);
    assert_eq!(first.completions[0].credit, Credit::Member(7));
    assert_eq!(first.completions[0].source_activity_id.as_deref(), Some("a-1"));
    assert_eq!(first.summary(), "1 completions found, 0 errors");

    let second = completed(engine.process_activities_at(at(1, 21)).await);
    assert!(second.completions.is_empty());
    assert_eq!(second.already_complete, 1);
    assert_eq!(store.completions().await.len(), 1);
    assert_eq!(engine.watermark().await, Some(at(1, 21)));
}

#[tokio::test]
async fn activity_outside_window_is_ignored() {
    let (store, source) = january().await;
    source.push_clan(activity("PlayerOne", at(2, 2), "I found a pair of Dragon Claws")).await;
    source.push_clan(activity("PlayerOne", Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap(), "Dragon Claws")).await;
    let store = Arc::new(store);
    let engine = engine(store.clone(), Arc::new(source));

    let report = completed(engine.process_activities_at(at(2, 5)).await);
    assert_eq!(report.activities_fetched, 2);
    assert_eq!(report.activities_considered, 0);
    assert!(store.completions().await.is_empty());
}

#[tokio::test]
async fn boards_not_yet_started_are_skipped_entirely() {
    let store = InMemoryBoardStore::new();
    store.add_board(board(1, Some(at(3, 1)), None)).await;
    store.add_item(item(10, 1, "Dragon Claws")).await;
    let source = InMemoryActivitySource::new();
    source.push_clan(activity("PlayerOne", at(2, 19), "Dragon Claws")).await;
    let engine = engine(Arc::new(store), Arc::new(source));

    assert!(matches!(engine.process_activities_at(at(2, 20)).await, PassOutcome::NoLiveBoards));
    assert_eq!(engine.watermark().await, None);
}

#[tokio::test]
async fn future_board_gets_nothing_while_live_board_is_credited() {
    let store = InMemoryBoardStore::new();
    store.add_board(board(1, Some(at(1, 1)), None)).await;
    store.add_board(board(2, Some(at(3, 1)), None)).await;
    store.add_item(item(10, 1, "Dragon Claws")).await;
    store.add_item(item(20, 2, "Dragon Claws")).await;
    store.add_team(team(100, 1, "Red"), vec![clan(7, "PlayerOne")]).await;
    store.add_team(team(200, 2, "Blue"), vec![clan(7, "PlayerOne")]).await;
    let source = InMemoryActivitySource::new();
    source.push_clan(activity("PlayerOne", at(2, 19), "I found a pair of Dragon Claws")).await;
    let store = Arc::new(store);
    let engine = engine(store.clone(), Arc::new(source));

    let report = completed(engine.process_activities_at(at(2, 20)).await);
    assert_eq!(report.live_boards, vec![1]);
    assert_eq!(keys(&report.completions), vec![(10, 100)]);
    assert_eq!(keys(&store.completions().await), vec![(10, 100)]);
}

#[tokio::test]
async fn earliest_activity_wins_the_credit() {
    let (store, source) = january().await;
    store.add_team(team(101, 1, "Green"), vec![clan(8, "PlayerTwo"), clan(9, "PlayerThree")]).await;
    source.push_clan(activity("PlayerThree", at(1, 16), "Dragon Claws")).await;
    source.push_clan(activity("PlayerTwo", at(1, 15), "Dragon Claws")).await;
    let store = Arc::new(store);
    let engine = engine(store.clone(), Arc::new(source));

    let report = completed(engine.process_activities_at(at(1, 20)).await);
    assert_eq!(keys(&report.completions), vec![(10, 101)]);
    assert_eq!(report.completions[0].credit, Credit::Member(8));
    assert_eq!(report.already_complete, 1);
    assert_eq!(store.completions().await.len(), 1);
}

#[tokio::test]
async fn same_item_on_two_boards_completes_independently() {
    let store = InMemoryBoardStore::new();
    store.add_board(board(1, Some(at(1, 1)), Some(at(1, 31)))).await;
    store.add_board(board(2, Some(at(2, 1)), Some(at(2, 28)))).await;
    store.add_item(item(10, 1, "Dragon Claws")).await;
    store.add_item(item(20, 2, "Dragon Claws")).await;
    store.add_team(team(100, 1, "Red"), vec![clan(7, "PlayerOne")]).await;
    store.add_team(team(200, 2, "Blue"), vec![clan(7, "PlayerOne")]).await;
    let source = InMemoryActivitySource::new();
    source.push_clan(activity("PlayerOne", at(1, 15), "I found a pair of Dragon Claws (january)")).await;
    source.push_clan(activity("PlayerOne", at(2, 15), "I found a pair of Dragon Claws (february)")).await;
    let store = Arc::new(store);
    let engine = engine(store.clone(), Arc::new(source));

    let report = completed(engine.process_activities_at(at(2, 20)).await);
    assert_eq!(keys(&report.completions), vec![(10, 100), (20, 200)]);
    assert!(report.completions[0].evidence.contains("january"));
    assert!(report.completions[1].evidence.contains("february"));
}

#[tokio::test]
async fn fractured_symbol_only_counts_for_kerapac() {
    let store = InMemoryBoardStore::new();
    store.add_board(board(1, Some(at(1, 1)), None)).await;
    store.add_item(item(1, 1, "Any Armadyl Item")).await;
    store.add_item(item(2, 1, "Any Kerapac Item")).await;
    store.add_team(team(100, 1, "Red"), vec![clan(7, "PlayerOne")]).await;
    let source = InMemoryActivitySource::new();
    source.push_clan(activity("playerone", at(1, 10), "I found a Fractured Armadyl Symbol")).await;
    let engine = engine(Arc::new(store), Arc::new(source));

    let report = completed(engine.process_activities_at(at(1, 11)).await);
    assert_eq!(keys(&report.completions), vec![(2, 100)]);
}

#[tokio::test]
async fn guest_activity_credits_guest_id() {
    let (store, source) = january().await;
    store.add_team(team(101, 1, "Blue"), vec![Member::Guest { id: 3, display_name: "Visitor".into() }]).await;
    source.push_guest(activity("Visitor", at(1, 10), "I found a pair of Dragon Claws")).await;
    let source = Arc::new(source);
    let engine = engine(Arc::new(store), source.clone());

    let report = completed(engine.process_activities_at(at(1, 20)).await);
    assert_eq!(keys(&report.completions), vec![(10, 101)]);
    assert_eq!(report.completions[0].credit, Credit::Guest(3));
    // Board started Jan 1 12:00, pass runs Jan 20 12:00.
    assert_eq!(source.guest_requests().await, vec![("Visitor".to_string(), 19 * 24)]);
}

#[tokio::test]
async fn unscheduled_boards_only_see_activity_after_watermark() {
    let store = InMemoryBoardStore::new();
    store.add_board(board(1, None, None)).await;
    store.add_item(item(10, 1, "Dragon Claws")).await;
    store.add_item(item(11, 1, "Abyssal Whip")).await;
    store.add_team(team(100, 1, "Red"), vec![clan(7, "PlayerOne")]).await;
    let source = Arc::new(InMemoryActivitySource::new());
    let now = at(1, 10);
    source.push_clan(activity("PlayerOne", now - TimeDelta::minutes(40), "Dragon Claws")).await;
    source.push_clan(activity("PlayerOne", now - TimeDelta::minutes(10), "aby whip")).await;
    let engine = engine(Arc::new(store), source.clone());

    let first = completed(engine.process_activities_at(now).await);
    assert_eq!(keys(&first.completions), vec![(11, 100)]);

    source.push_clan(activity("PlayerOne", now + TimeDelta::minutes(1), "Dragon Claws")).await;
    let second = completed(engine.process_activities_at(now + TimeDelta::minutes(5)).await);
    assert_eq!(second.activities_considered, 1);
    assert_eq!(keys(&second.completions), vec![(10, 100)]);
}

#[tokio::test]
async fn far_future_activity_is_rejected() {
    let (store, source) = january().await;
    source.push_clan(activity("PlayerOne", at(1, 20) + TimeDelta::hours(2), "Dragon Claws")).await;
    let engine = engine(Arc::new(store), Arc::new(source));

    let report = completed(engine.process_activities_at(at(1, 20)).await);
    assert_eq!(report.activities_considered, 0);
    assert!(report.completions.is_empty());
}

#[tokio::test]
async fn malformed_activity_is_recorded_and_skipped() {
    let (store, source) = january().await;
    source.push_clan(Activity::new("PlayerOne", i64::MAX, "Dragon Claws")).await;
    source.push_clan(activity("PlayerOne", at(1, 14), "  ")).await;
    source.push_clan(activity("PlayerOne", at(1, 15), "Dragon Claws")).await;
    let engine = engine(Arc::new(store), Arc::new(source));

    let report = completed(engine.process_activities_at(at(1, 20)).await);
    assert_eq!(report.completions.len(), 1);
    assert_eq!(report.errors.len(), 2);
    assert!(report.errors.iter().all(|e| matches!(e, PassError::Activity { .. })));
}

#[tokio::test]
async fn overlapping_trigger_is_skipped() {
    let (store, source) = january().await;
    let source = Arc::new(SlowSource { inner: source, clan_delay: Duration::from_millis(100) });
    let engine = engine(Arc::new(store), source);

    let (a, b) = tokio::join!(engine.process_activities_at(at(1, 20)), engine.process_activities_at(at(1, 20)));
    assert!(matches!(a, PassOutcome::Completed(_)));
    assert!(matches!(b, PassOutcome::Skipped));
    assert!(!engine.is_running());
}

#[tokio::test]
async fn fetch_timeout_is_scoped_to_its_feed() {
    let (store, inner) = january().await;
    store.add_team(team(101, 1, "Blue"), vec![Member::Guest { id: 3, display_name: "Visitor".into() }]).await;
    inner.push_clan(activity("PlayerOne", at(1, 15), "Dragon Claws")).await;
    inner.push_guest(activity("Visitor", at(1, 15), "Dragon Claws")).await;
    let source = Arc::new(SlowSource { inner, clan_delay: Duration::from_secs(3) });
    let config = EngineConfig { fetch_timeout_secs: 1, ..EngineConfig::default() };
    let engine = Engine::new(Arc::new(store), source, config);

    let report = completed(engine.process_activities_at(at(1, 20)).await);
    assert_eq!(
        report.errors,
        vec![PassError::Fetch {
            feed: "clan".into(),
            error: SourceError::Timeout { feed: "clan".into(), secs: 1 }
        }]
    );
    assert_eq!(keys(&report.completions), vec![(10, 101)]);
}

#[tokio::test]
async fn commit_failure_does_not_abort_the_pass() {
    let (inner, source) = january().await;
    inner.add_item(item(11, 1, "Abyssal Whip")).await;
    let store = Arc::new(FaultyStore { inner, faults: Faults { create_fails_for: Some(10), ..Faults::default() } });
    source.push_clan(activity("PlayerOne", at(1, 15), "Dragon Claws and an abyssal whip")).await;
    let engine = engine(store, Arc::new(source));

    let report = completed(engine.process_activities_at(at(1, 20)).await);
    assert_eq!(keys(&report.completions), vec![(11, 100)]);
    assert_eq!(report.errors.len(), 1);
    assert!(matches!(&report.errors[0], PassError::Commit { item_id: 10, team_id: 100, .. }));
}

#[tokio::test]
async fn config_failure_aborts_without_moving_watermark() {
    let store = Arc::new(FaultyStore {
        inner: InMemoryBoardStore::new(),
        faults: Faults { boards_fail: true, ..Faults::default() },
    });
    let engine = engine(store, Arc::new(InMemoryActivitySource::new()));

    let outcome = engine.process_activities_at(at(1, 20)).await;
    assert!(matches!(outcome, PassOutcome::Failed(EngineError::Config(StoreError::Unavailable(_)))));
    assert_eq!(engine.watermark().await, None);
}

#[tokio::test]
async fn panic_inside_pass_is_contained() {
    let store = Arc::new(FaultyStore {
        inner: InMemoryBoardStore::new(),
        faults: Faults { boards_panic: true, ..Faults::default() },
    });
    let engine = engine(store, Arc::new(InMemoryActivitySource::new()));

    let outcome = engine.process_activities_at(at(1, 20)).await;
    match outcome {
        PassOutcome::Failed(EngineError::Panicked(message)) => assert_eq!(message, "board table corrupted"),
        other => panic!("expected a caught panic, got {other:?}"),
    }
    assert!(!engine.is_running());
}

// --- Dry run and polling -------------------------------------------------------

#[tokio::test]
async fn dry_run_reports_without_committing() {
    let (store, source) = january().await;
    let store = Arc::new(store);
    let engine = engine(store.clone(), Arc::new(source));

    let dry = engine.dry_run_at(&activity("PLAYERONE", at(1, 15), "got d claws"), at(1, 20)).await.unwrap();
    assert_eq!(dry.eligible_boards, vec![1]);
    assert_eq!(dry.matches.len(), 1);
    assert_eq!(dry.teams[0].team_id, 100);
    assert_eq!(dry.pairs().len(), 1);
    assert!(store.completions().await.is_empty());
}

#[tokio::test]
async fn dry_run_rejects_invalid_timestamp() {
    let (store, source) = january().await;
    let engine = engine(Arc::new(store), Arc::new(source));
    let err = engine.dry_run_at(&Activity::new("PlayerOne", i64::MIN, "Dragon Claws"), at(1, 20)).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidActivity(_)));
}

#[tokio::test]
async fn polling_runs_until_stopped() {
    let (store, source) = january().await;
    let engine = Arc::new(engine(Arc::new(store), Arc::new(source)));
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    let handle = engine.spawn_polling_with(Duration::from_millis(20), move |outcome| {
        let _ = tx.send(outcome);
    });
    for _ in 0..2 {
        let outcome = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
        assert!(!matches!(outcome, PassOutcome::Skipped));
    }
    handle.stop().await;
    assert!(!engine.is_running());
}
