//! Error types.
//!
//! Only [`EngineError`] ever ends a pass early. Everything else is collected per pass as a
//! [`PassError`] and reported alongside the completions that did get recorded.

use std::path::PathBuf;

use crate::{ItemId, TeamId};

/// Failures reported by a [`crate::BoardStore`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The unique `(item, team)` key already holds a completion.
    #[error("completion for item {item_id} and team {team_id} already exists")]
    Conflict { item_id: ItemId, team_id: TeamId },

    #[error("{0} not found")]
    NotFound(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store call `{operation}` timed out after {secs}s")]
    Timeout { operation: &'static str, secs: u64 },
}

/// Failures reported by a [`crate::ActivitySource`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("activity fetch for {feed} timed out after {secs}s")]
    Timeout { feed: String, secs: u64 },

    #[error("activity source unavailable: {0}")]
    Unavailable(String),
}

/// A recoverable problem recorded during a pass.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PassError {
    #[error("fetching {feed} failed: {error}")]
    Fetch { feed: String, error: SourceError },

    #[error("activity from {actor} skipped: {reason}")]
    Activity { actor: String, reason: String },

    #[error("committing item {item_id} for team {team_id} (credited to {actor}) failed: {error}")]
    Commit { item_id: ItemId, team_id: TeamId, actor: String, error: StoreError },
}

/// A failure that ends a pass before anything is committed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("configuration fetch failed: {0}")]
    Config(#[from] StoreError),

    #[error("invalid activity: {0}")]
    InvalidActivity(String),

    #[error("pass panicked: {0}")]
    Panicked(String),
}

/// Failures loading an [`crate::EngineConfig`] or a [`crate::Fixture`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
}
