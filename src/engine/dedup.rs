//! In-pass deduplication of completion keys.
//!
//! Within one pass several activities can satisfy the same `(item, team)` pair (two members of
//! a team both get the drop, or the same line arrives through the clan feed and a guest feed).
//! Only the first one in processing order may reach the store; the rest are dropped here
//! without a round-trip.
//!
//! The set lives for one pass. Across passes the store's unique key takes over.

use std::collections::HashSet;

use crate::CompletionKey;

#[derive(Debug, Default)]
pub(crate) struct PassDedupe {
    seen: HashSet<CompletionKey>,
}

impl PassDedupe {
    /// `true` the first time `key` is offered during this pass.
    pub(crate) fn first_attempt(&mut self, key: CompletionKey) -> bool {
        self.seen.insert(key)
    }

    pub(crate) fn forget(&mut self, key: CompletionKey) {
        self.seen.remove(&key);
    }
}

/// Identity of an activity for merging feeds: `(actor, timestamp, text)`, actor compared
/// case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct ActivityKey {
    actor: String,
    timestamp_millis: i64,
    text: String,
}

impl ActivityKey {
    pub(crate) fn of(activity: &crate::Activity) -> Self {
        ActivityKey {
            actor: activity.actor.trim().to_lowercase(),
            timestamp_millis: activity.timestamp_millis,
            text: activity.text.clone(),
        }
    }
}
