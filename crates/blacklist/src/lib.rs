//! Blacklist classification.
//!
//! A [`Coordinator`] owns the parsed rules of the selected [`RuleSet`]. It
//! resolves batches of post ids through the [`ItemCache`](gelo_cache::ItemCache),
//! matches them against every rule, and pushes one blacklisted/visible
//! decision per post to the [`VisibilitySink`]. Toggling rules afterwards only
//! recomputes the posts those rules hit; nothing is fetched or matched again.
//!
//! Persisted state:
//! - the rule set collection and the active rule set name (durable storage);
//! - the disabled rules of each rule set (session storage).

mod coordinator;
pub mod error;
mod rule_set;
mod session;
mod sink;

pub use crate::coordinator::{ApplyReport, BlacklistEvent, Coordinator, RuleSummary, Summary};
pub use crate::rule_set::{LEGACY_RULE_SETS_KEY, NO_BLACKLIST, RULE_SETS_KEY, RuleSet, RuleSetStore, SAFE_MODE};
pub use crate::session::{ACTIVE_KEY, SessionState, disabled_key};
pub use crate::sink::{SinkHandle, VisibilitySink};
use gelo_cache::ItemCache;
use gelo_storage::BackendHandle;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// List rules with the most hits first in [`Summary`].
    pub order_by_hit_count: bool,
}

/// Everything a [`Coordinator`] talks to. Built once at start-up.
#[derive(Clone)]
pub struct Context {
    pub cache: ItemCache,
    /// Rule sets, the active rule set name.
    pub durable: BackendHandle,
    /// Disabled rules per rule set.
    pub session: BackendHandle,
    pub sink: SinkHandle,
    pub settings: Settings,
}
