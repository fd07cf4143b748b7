//! The engine value and its pass loop.
//!
//! One pass:
//!
//! 1. load boards; stop with [`PassOutcome::NoLiveBoards`] when none is live,
//! 2. load items, teams, rosters and guests of the live boards (any failure aborts the pass),
//! 3. fetch the clan feed and every guest feed concurrently, each under the fetch timeout,
//! 4. merge, drop duplicates, sort oldest first,
//! 5. per activity: window check, text match, team resolution, commit,
//! 6. advance the watermark to the pass start.
//!
//! Passes never overlap. A trigger that arrives while a pass is running is dropped, not queued.

use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::{join_all, try_join_all};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::api::{DryRun, Options, PassOutcome};
use crate::config::EngineConfig;
use crate::engine::commit::{CommitOutcome, Committer, store_call};
use crate::engine::dedup::ActivityKey;
use crate::engine::roster::{RosterIndex, TeamRoster};
use crate::engine::window::{LiveBoard, WindowResolver, live_boards};
use crate::engine::{ActivityText, CompiledItems, Matcher, PassReport};
use crate::error::{EngineError, PassError, SourceError};
use crate::rules::MatchTables;
use crate::store::{ActivitySource, BoardStore};
use crate::{Activity, BoardId, Guest, NewCompletion};

/// Board configuration loaded for one pass.
struct PassWorld {
    items: CompiledItems,
    roster: RosterIndex,
}

/// Clears the running flag when the pass ends, however it ends.
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).ok().map(|_| RunGuard(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The matching engine: owns its tables, its re-entrancy flag and its watermark.
pub struct Engine<S, A> {
    store: Arc<S>,
    source: Arc<A>,
    config: EngineConfig,
    tables: MatchTables,
    options: Options,
    running: AtomicBool,
    watermark: Mutex<Option<DateTime<Utc>>>,
}

impl<S: BoardStore, A: ActivitySource> Engine<S, A> {
    pub fn new(store: Arc<S>, source: Arc<A>, config: EngineConfig) -> Self {
        let tables = if config.tables.is_empty() {
            MatchTables::builtin().clone()
        } else {
            MatchTables::with_overrides(&config.tables)
        };
        Engine {
            store,
            source,
            config,
            tables,
            options: Options::default(),
            running: AtomicBool::new(false),
            watermark: Mutex::new(None),
        }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tables(&self) -> &MatchTables {
        &self.tables
    }

    /// Start time of the last completed pass, if any.
    pub async fn watermark(&self) -> Option<DateTime<Utc>> {
        *self.watermark.lock().await
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run one pass with the current time.
    pub async fn process_activities(&self) -> PassOutcome {
        self.process_activities_at(Utc::now()).await
    }

    /// Run one pass treating `now` as the current time.
    pub async fn process_activities_at(&self, now: DateTime<Utc>) -> PassOutcome {
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            info!("pass already running, trigger dropped");
            return PassOutcome::Skipped;
        };

        match AssertUnwindSafe(self.run_pass(now)).catch_unwind().await {
            Ok(Ok(Some(report))) => {
                info!(
                    live_boards = report.live_boards.len(),
                    fetched = report.activities_fetched,
                    considered = report.activities_considered,
                    already_complete = report.already_complete,
                    elapsed_ms = report.metrics.total.as_millis() as u64,
                    "{}",
                    report.summary()
                );
                PassOutcome::Completed(report)
            }
            Ok(Ok(None)) => {
                debug!("no live boards");
                PassOutcome::NoLiveBoards
            }
            Ok(Err(e)) => {
                error!(error = %e, "pass aborted");
                PassOutcome::Failed(e)
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(panic = %message, "pass panicked");
                PassOutcome::Failed(EngineError::Panicked(message))
            }
        }
    }

    async fn run_pass(&self, now: DateTime<Utc>) -> Result<Option<PassReport>, EngineError> {
        let started = Instant::now();
        let timeout = self.config.fetch_timeout();

        let boards = store_call("list_boards", timeout, self.store.list_boards()).await?;
        let live = live_boards(&boards, now);
        if live.is_empty() {
            return Ok(None);
        }
        let live_ids: Vec<BoardId> = live.iter().map(LiveBoard::id).collect();
        let world = self.load_world(&live_ids).await?;
        let guests = store_call("list_guests", timeout, self.store.list_guests(&live_ids)).await?;

        let mut report = PassReport::new(now, live_ids);
        report.metrics.config = started.elapsed();

        let watermark = *self.watermark.lock().await;
        let resolver =
            WindowResolver::new(&live, now, watermark, self.config.fallback_lookback(), self.config.future_skew());
        debug!(mode = ?resolver.mode(), items = world.items.len(), guests = guests.len(), "pass configured");

        let fetch_started = Instant::now();
        let activities = self.fetch_activities(&resolver, &world, &guests, &mut report.errors).await;
        report.activities_fetched = activities.len();
        report.metrics.fetch = fetch_started.elapsed();

        let matcher = Matcher::new(&self.tables, &self.options);
        let mut committer = Committer::new(self.store.as_ref(), timeout);

        for activity in &activities {
            let ts = match validate(activity) {
                Ok(ts) => ts,
                Err(reason) => {
                    warn!(actor = %activity.actor, %reason, "skipping activity");
                    report.errors.push(PassError::Activity { actor: activity.actor.clone(), reason });
                    continue;
                }
            };
            let eligible = resolver.eligible_boards(ts);
            if eligible.is_empty() {
                continue;
            }
            report.activities_considered += 1;

            let match_started = Instant::now();
            let text = ActivityText::scan(&activity.text, activity.details.as_deref());
            let matches = matcher.match_items(&text, world.items.for_boards(&eligible));
            let teams = if matches.is_empty() { Vec::new() } else { world.roster.resolve(&activity.actor, &eligible) };
            report.metrics.matching += match_started.elapsed();

            if matches.is_empty() {
                continue;
            }
            if teams.is_empty() {
                debug!(actor = %activity.actor, matches = matches.len(), "actor is not on any eligible team");
                continue;
            }

            let commit_started = Instant::now();
            for m in &matches {
                for team in teams.iter().filter(|t| t.board_id == m.board_id) {
                    report.matched_pairs += 1;
                    debug!(
                        actor = %activity.actor,
                        item_id = m.item_id,
                        team_id = team.team_id,
                        reason = %m.reason,
                        "item matched"
                    );
                    let completion = NewCompletion {
                        item_id: m.item_id,
                        team_id: team.team_id,
                        credit: team.credit,
                        source_activity_id: activity.source_id.clone(),
                        evidence: activity.evidence(),
                    };
                    match committer.commit(completion).await {
                        Ok(CommitOutcome::Created(completion)) => {
                            info!(
                                board_id = m.board_id,
                                item = %m.item_name,
                                team = %team.team_name,
                                actor = %activity.actor,
                                "completion recorded"
                            );
                            report.completions.push(completion);
                        }
                        Ok(CommitOutcome::AlreadyComplete | CommitOutcome::ClaimedThisPass) => {
                            report.already_complete += 1;
                        }
                        Err(error) => {
                            warn!(item_id = m.item_id, team_id = team.team_id, error = %error, "commit failed");
                            report.errors.push(PassError::Commit {
                                item_id: m.item_id,
                                team_id: team.team_id,
                                actor: activity.actor.clone(),
                                error,
                            });
                        }
                    }
                }
            }
            report.metrics.commit += commit_started.elapsed();
        }

        *self.watermark.lock().await = Some(now);
        report.metrics.total = started.elapsed();
        Ok(Some(report))
    }

    async fn load_world(&self, board_ids: &[BoardId]) -> Result<PassWorld, EngineError> {
        let timeout = self.config.fetch_timeout();
        let loads: Vec<_> = board_ids
            .iter()
            .map(|&board_id| async move {
                let items = store_call("list_items", timeout, self.store.list_items(board_id)).await?;
                let teams = store_call("list_teams", timeout, self.store.list_teams(board_id)).await?;
                let mut rosters = Vec::with_capacity(teams.len());
                for team in teams {
                    let members = store_call("list_roster", timeout, self.store.list_roster(team.id)).await?;
                    rosters.push(TeamRoster { team, members });
                }
                Ok::<_, EngineError>((items, rosters))
            })
            .collect();
        let per_board = try_join_all(loads).await?;

        let (items, rosters): (Vec<_>, Vec<_>) = per_board.into_iter().unzip();
        let items: Vec<_> = items.into_iter().flatten().collect();
        let rosters: Vec<_> = rosters.into_iter().flatten().collect();
        Ok(PassWorld { items: CompiledItems::new(&items, &self.tables), roster: RosterIndex::new(&rosters) })
    }

    /// Clan and guest feeds, merged and sorted oldest first. Feed failures are recorded in
    /// `errors` and leave that feed's activities out.
    async fn fetch_activities(
        &self,
        resolver: &WindowResolver<'_>,
        world: &PassWorld,
        guests: &[Guest],
        errors: &mut Vec<PassError>,
    ) -> Vec<Activity> {
        let timeout = self.config.fetch_timeout();

        let limit = self.config.clan_activity_limit;
        let clan = fetch_feed("clan".to_string(), timeout, self.source.clan_activities(limit));
        let guest_calls: Vec<_> = guests
            .iter()
            .map(|guest| {
                let own_boards = world.roster.boards_of(&guest.display_name);
                let hours = resolver.guest_lookback_hours(&own_boards, self.config.max_guest_lookback_hours);
                debug!(guest = %guest.display_name, lookback_hours = hours, "fetching guest activity");
                fetch_feed(
                    format!("guest {}", guest.display_name),
                    timeout,
                    self.source.guest_activities(&guest.display_name, hours),
                )
            })
            .collect();
        let guest_feeds = join_all(guest_calls);
        let (clan, guest_feeds) = tokio::join!(clan, guest_feeds);

        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        for (feed, result) in std::iter::once(clan).chain(guest_feeds) {
            match result {
                Ok(activities) => {
                    merged.extend(activities.into_iter().filter(|a| seen.insert(ActivityKey::of(a))));
                }
                Err(error) => {
                    warn!(%feed, error = %error, "activity fetch failed");
                    errors.push(PassError::Fetch { feed, error });
                }
            }
        }
        merged.sort_by_key(|a| a.timestamp_millis);
        merged
    }

    /// What `activity` would complete right now, without committing anything.
    pub async fn dry_run(&self, activity: &Activity) -> Result<DryRun, EngineError> {
        self.dry_run_at(activity, Utc::now()).await
    }

    pub async fn dry_run_at(&self, activity: &Activity, now: DateTime<Utc>) -> Result<DryRun, EngineError> {
        let ts = validate(activity).map_err(EngineError::InvalidActivity)?;
        let timeout = self.config.fetch_timeout();

        let boards = store_call("list_boards", timeout, self.store.list_boards()).await?;
        let live = live_boards(&boards, now);
        let mut dry = DryRun {
            actor: activity.actor.clone(),
            eligible_boards: Vec::new(),
            matches: Vec::new(),
            teams: Vec::new(),
        };
        if live.is_empty() {
            return Ok(dry);
        }

        let live_ids: Vec<BoardId> = live.iter().map(LiveBoard::id).collect();
        let world = self.load_world(&live_ids).await?;
        let watermark = *self.watermark.lock().await;
        let resolver =
            WindowResolver::new(&live, now, watermark, self.config.fallback_lookback(), self.config.future_skew());

        dry.eligible_boards = resolver.eligible_boards(ts);
        let text = ActivityText::scan(&activity.text, activity.details.as_deref());
        let matcher = Matcher::new(&self.tables, &self.options);
        dry.matches = matcher.match_items(&text, world.items.for_boards(&dry.eligible_boards));
        dry.teams = world.roster.resolve(&activity.actor, &dry.eligible_boards);
        Ok(dry)
    }
}

impl<S, A> Engine<S, A>
where
    S: BoardStore + 'static,
    A: ActivitySource + 'static,
{
    /// Run a pass every `interval` on the tokio runtime until the handle is stopped.
    pub fn spawn_polling(self: &Arc<Self>, interval: Duration) -> PollingHandle {
        self.spawn_polling_with(interval, |_| {})
    }

    /// Like [`Engine::spawn_polling`], handing every outcome to `on_outcome`.
    pub fn spawn_polling_with<F>(self: &Arc<Self>, interval: Duration, mut on_outcome: F) -> PollingHandle
    where
        F: FnMut(PassOutcome) + Send + 'static,
    {
        let engine = Arc::clone(self);
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(interval_secs = interval.as_secs(), "polling started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        on_outcome(engine.process_activities().await);
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("polling stopped");
        });

        PollingHandle { shutdown, task }
    }
}

/// Handle to a polling task started by [`Engine::spawn_polling`].
pub struct PollingHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollingHandle {
    /// Signal shutdown and wait for the task. A pass in progress is allowed to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "polling task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

async fn fetch_feed(
    feed: String,
    timeout: Duration,
    call: impl Future<Output = Result<Vec<Activity>, SourceError>>,
) -> (String, Result<Vec<Activity>, SourceError>) {
    let result = match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(SourceError::Timeout { feed: feed.clone(), secs: timeout.as_secs() }),
    };
    (feed, result)
}

fn validate(activity: &Activity) -> Result<DateTime<Utc>, String> {
    let Some(ts) = activity.timestamp() else {
        return Err(format!("timestamp {} is out of range", activity.timestamp_millis));
    };
    let has_details = activity.details.as_deref().is_some_and(|d| !d.trim().is_empty());
    if activity.text.trim().is_empty() && !has_details {
        return Err("activity has no text".to_string());
    }
    Ok(ts)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}

#[cfg(test)]
#[path = "processor_tests.rs"]
mod tests;
