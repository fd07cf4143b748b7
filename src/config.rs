//! Engine configuration.
//!
//! Every field has a default, so an empty file (or no file) is a valid configuration:
//!
//! ```toml
//! poll_interval_secs = 60
//! fetch_timeout_secs = 15
//!
//! [tables.categories]
//! "zuk" = ["obsidian blade", "tzkal-zuk's armour spike"]
//! ```

use std::path::Path;
use std::time::Duration;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::rules::TableOverrides;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Cadence used by [`crate::Engine::spawn_polling`].
    pub poll_interval_secs: u64,
    /// Timeout applied to every store and activity-source call.
    pub fetch_timeout_secs: u64,
    /// Lower bound for unscheduled boards when no watermark exists yet.
    pub fallback_lookback_mins: i64,
    /// Activities further than this into the future are rejected outright.
    pub future_skew_mins: i64,
    /// Count limit passed to the clan-wide activity feed.
    pub clan_activity_limit: usize,
    /// Cap on the lookback requested for a single guest.
    pub max_guest_lookback_hours: u32,
    /// Additions to the built-in matching tables.
    pub tables: TableOverrides,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
            fetch_timeout_secs: 15,
            fallback_lookback_mins: 30,
            future_skew_mins: 60,
            clan_activity_limit: 100,
            max_guest_lookback_hours: 24 * 90,
            tables: TableOverrides::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&contents)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }

    pub fn fallback_lookback(&self) -> TimeDelta {
        minutes_saturating(self.fallback_lookback_mins)
    }

    pub fn future_skew(&self) -> TimeDelta {
        minutes_saturating(self.future_skew_mins)
    }
}

/// Negative values count as zero; values past `TimeDelta`'s range saturate.
fn minutes_saturating(mins: i64) -> TimeDelta {
    TimeDelta::try_minutes(mins.max(0)).unwrap_or(TimeDelta::MAX)
}
