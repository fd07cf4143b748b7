//! Activity-to-completion engine.
//!
//! The engine is split into focused submodules under `src/engine/`, mirroring the order in which
//! a pass touches them.
//!
//! ## How the parts work together
//!
//! ```text
//! BoardStore ── list boards ──┐
//!                             │  live_boards + WindowResolver       (window.rs)
//!                             └───────────────┬──────────────
//!                                             │
//! items ── CompiledItems::new ────────────────┤                      (compiled_items.rs)
//! rosters ── RosterIndex::new ────────────────┤                      (roster.rs)
//!                                             │
//! ActivitySource ── clan + guest feeds ───────┼─ timeouts, merge, oldest first
//!                                             v
//!                          per activity: eligible boards
//!                            ActivityText::scan                      (trigger.rs)
//!                            Matcher::match_items                    (matcher.rs)
//!                            RosterIndex::resolve
//!                                             │
//!                                             v
//!                          Committer::commit  (in-pass dedupe        (commit.rs, dedup.rs)
//!                                              + check-then-insert)
//!                                             │
//!                                             v
//!                                   PassReport + PassMetrics         (metrics.rs)
//! ```
//!
//! `processor.rs` owns the [`Engine`] value: the re-entrancy flag, the watermark, and the
//! orchestration loop above.
//!
//! ## Responsibilities by module
//!
//! - `window.rs`: which boards are live and which of them an activity timestamp is eligible for.
//! - `compiled_items.rs`: per-item precomputation (normalised name, variations, category terms).
//! - `trigger.rs`: normalises activity text once per activity.
//! - `matcher.rs`: pure text matching of one activity against compiled items.
//! - `roster.rs`: actor name → teams and credit.
//! - `dedup.rs`: the in-pass `(item, team)` set.
//! - `commit.rs`: check-then-insert against the store.
//! - `metrics.rs`: pass report and timings.
//!
//! ## Debugging
//!
//! Match decisions are emitted as `trace!` events under the `squarehunt::rules` target, so
//! `RUST_LOG=squarehunt::rules=trace` shows every term tried and every exclusion applied.

#[path = "engine/commit.rs"]
mod commit;
#[path = "engine/compiled_items.rs"]
mod compiled_items;
#[path = "engine/dedup.rs"]
mod dedup;
#[path = "engine/matcher.rs"]
mod matcher;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/processor.rs"]
mod processor;
#[path = "engine/roster.rs"]
mod roster;
#[path = "engine/trigger.rs"]
mod trigger;
#[path = "engine/window.rs"]
mod window;

pub(crate) use compiled_items::CompiledItems;
pub(crate) use matcher::Matcher;
pub use metrics::{PassMetrics, PassReport};
pub use processor::{Engine, PollingHandle};
pub use roster::TeamCredit;
pub(crate) use trigger::ActivityText;
