//! Board liveness and activity windows.
//!
//! A board is *live* when it is active and its start date (if any) has passed. Each live board
//! has an inclusive window `[start ?? epoch, end ?? now]`; an activity is eligible for a board
//! when its timestamp falls inside that window.
//!
//! When no live board has a start date at all, the engine falls back to *watermark* mode: only
//! activities newer than the last completed pass (or `now - fallback_lookback` on the first
//! pass) are considered. Timestamps further than `future_skew` past `now` are rejected in both
//! modes.

use chrono::{DateTime, TimeDelta, Utc};

use crate::{Board, BoardId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Window {
    pub(crate) start: DateTime<Utc>,
    pub(crate) end: DateTime<Utc>,
}

impl Window {
    pub(crate) fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts <= self.end
    }
}

#[derive(Debug, Clone)]
pub(crate) struct LiveBoard {
    pub(crate) board: Board,
    pub(crate) window: Window,
}

impl LiveBoard {
    pub(crate) fn id(&self) -> BoardId {
        self.board.id
    }
}

/// Active boards whose start date is absent or not in the future.
pub(crate) fn live_boards(boards: &[Board], now: DateTime<Utc>) -> Vec<LiveBoard> {
    boards
        .iter()
        .filter(|b| b.active && b.start_date.is_none_or(|start| start <= now))
        .map(|b| LiveBoard {
            board: b.clone(),
            window: Window { start: b.start_date.unwrap_or(DateTime::UNIX_EPOCH), end: b.end_date.unwrap_or(now) },
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WindowMode {
    /// At least one live board has a start date; each board's own window decides.
    Scheduled,
    /// No live board is scheduled; only activities after `since` count.
    Watermark { since: DateTime<Utc> },
}

#[derive(Debug, Clone)]
pub(crate) struct WindowResolver<'a> {
    boards: &'a [LiveBoard],
    mode: WindowMode,
    now: DateTime<Utc>,
    skew: TimeDelta,
}

impl<'a> WindowResolver<'a> {
    pub(crate) fn new(
        boards: &'a [LiveBoard],
        now: DateTime<Utc>,
        watermark: Option<DateTime<Utc>>,
        fallback_lookback: TimeDelta,
        skew: TimeDelta,
    ) -> Self {
        let mode = if boards.iter().any(|b| b.board.start_date.is_some()) {
            WindowMode::Scheduled
        } else {
            let fallback = now.checked_sub_signed(fallback_lookback).unwrap_or(DateTime::<Utc>::MIN_UTC);
            WindowMode::Watermark { since: watermark.unwrap_or(fallback) }
        };
        WindowResolver { boards, mode, now, skew }
    }

    pub(crate) fn mode(&self) -> WindowMode {
        self.mode
    }

    /// Live boards an activity at `ts` counts for, in board order. Empty when the timestamp is
    /// outside every window.
    pub(crate) fn eligible_boards(&self, ts: DateTime<Utc>) -> Vec<BoardId> {
        let latest = self.now.checked_add_signed(self.skew).unwrap_or(DateTime::<Utc>::MAX_UTC);
        if ts > latest {
            return Vec::new();
        }
        match self.mode {
            WindowMode::Scheduled => self.boards.iter().filter(|b| b.window.contains(ts)).map(LiveBoard::id).collect(),
            WindowMode::Watermark { since } => {
                if ts > since && ts <= self.now {
                    self.boards.iter().filter(|b| b.board.end_date.is_none_or(|end| ts <= end)).map(LiveBoard::id).collect()
                } else {
                    Vec::new()
                }
            }
        }
    }

    /// Hours of history to request for a guest rostered on `guest_boards`.
    ///
    /// Reaches back to the earliest effective start among the guest's boards, or among all live
    /// boards when the guest's boards give none. Rounded up, at least one hour, at most `cap`.
    pub(crate) fn guest_lookback_hours(&self, guest_boards: &[BoardId], cap: u32) -> u32 {
        let own = self.earliest_start(|b| guest_boards.contains(&b.id()));
        let start = own.or_else(|| self.earliest_start(|_| true));
        let Some(start) = start else {
            return 1;
        };
        let minutes = (self.now - start).num_minutes().max(0);
        let hours = (minutes + 59) / 60;
        u32::try_from(hours).unwrap_or(u32::MAX).clamp(1, cap.max(1))
    }

    fn earliest_start(&self, filter: impl Fn(&LiveBoard) -> bool) -> Option<DateTime<Utc>> {
        self.boards
            .iter()
            .filter(|b| filter(b))
            .map(|b| match self.mode {
                WindowMode::Scheduled => b.window.start,
                WindowMode::Watermark { since } => since,
            })
            .min()
    }
}
