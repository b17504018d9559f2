use exn::ResultExt;
use gelo_storage::{StorageBackend, json};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{ErrorKind, Result};

/// Durable key of the rule set collection.
pub const RULE_SETS_KEY: &str = "blacklists";
/// Durable key of rule sets exported by older installs, imported once.
pub const LEGACY_RULE_SETS_KEY: &str = "legacy-blacklists";

pub const SAFE_MODE: &str = "Safe mode";
pub const NO_BLACKLIST: &str = "No blacklist";
const SAFE_MODE_TEXT: &str = "rating:q*\nrating:e*";

/// A named blacklist: the raw rule text plus a few flags.
///
/// Decoding also accepts the field names older installs stored (`value`,
/// `isReadOnly`, `isUnRemovable`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub name: String,
    #[serde(alias = "value")]
    pub text: String,
    #[serde(default, alias = "isReadOnly")]
    pub read_only: bool,
    #[serde(default, alias = "isUnRemovable")]
    pub unremovable: bool,
    /// BLAKE3 hex digest of `text`.
    #[serde(default)]
    pub hash: Option<String>,
}

impl RuleSet {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            name: name.into(),
            hash: Some(content_hash(&text)),
            text,
            read_only: false,
            unremovable: false,
        }
    }

    /// The rule sets every collection contains. Both are read-only and can't
    /// be removed.
    pub fn reserved() -> [RuleSet; 2] {
        [
            Self::new(SAFE_MODE, SAFE_MODE_TEXT).locked(),
            Self::new(NO_BLACKLIST, "").locked(),
        ]
    }

    fn locked(self) -> Self {
        Self {
            read_only: true,
            unremovable: true,
            ..self
        }
    }

    /// Replace the text, keeping the flags.
    pub fn with_text(self, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            hash: Some(content_hash(&text)),
            text,
            ..self
        }
    }
}

fn content_hash(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}

/// The stored rule set collection, in display order.
///
/// A plain value: [`load`](Self::load) a copy, change it, [`save`](Self::save)
/// it back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSetStore {
    sets: Vec<RuleSet>,
}

impl RuleSetStore {
    #[instrument(level = "debug", skip_all, fields(backend = backend.name()))]
    pub async fn load(backend: &dyn StorageBackend) -> Result<Self> {
        let store = json::load(backend, RULE_SETS_KEY).await.or_raise(|| ErrorKind::Storage)?;
        Ok(store.unwrap_or_default())
    }

    #[instrument(level = "debug", skip_all, fields(backend = backend.name(), sets = self.sets.len()))]
    pub async fn save(&self, backend: &dyn StorageBackend) -> Result<()> {
        json::save(backend, RULE_SETS_KEY, self).await.or_raise(|| ErrorKind::Storage)
    }

    /// Add missing reserved rule sets and overwrite tampered ones. Returns
    /// `true` if anything changed.
    pub fn reconcile_reserved(&mut self) -> bool {
        let mut changed = false;
        for reserved in RuleSet::reserved() {
            match self.sets.iter_mut().find(|set| set.name == reserved.name) {
                Some(existing) if *existing == reserved => {},
                Some(existing) => {
                    tracing::debug!(name = %reserved.name, "Restoring reserved rule set");
                    *existing = reserved;
                    changed = true;
                },
                None => {
                    self.sets.push(reserved);
                    changed = true;
                },
            }
        }
        changed
    }

    /// Add `set`, or replace the stored set of the same name when its hash is
    /// missing or differs. Returns `true` if anything changed.
    pub fn upsert(&mut self, set: RuleSet) -> bool {
        match self.sets.iter_mut().find(|existing| existing.name == set.name) {
            None => {
                self.sets.push(set);
                true
            },
            Some(existing) if existing.hash.is_none() || existing.hash != set.hash => {
                *existing = set;
                true
            },
            Some(_) => false,
        }
    }

    /// Remove a rule set. Unremovable sets are refused.
    pub fn remove(&mut self, name: &str) -> Result<RuleSet> {
        let Some(index) = self.sets.iter().position(|set| set.name == name) else {
            exn::bail!(ErrorKind::RuleSetNotFound(name.to_string()));
        };
        if self.sets[index].unremovable {
            exn::bail!(ErrorKind::Unremovable(name.to_string()));
        }
        Ok(self.sets.remove(index))
    }

    pub fn get(&self, name: &str) -> Option<&RuleSet> {
        self.sets.iter().find(|set| set.name == name)
    }

    pub fn first(&self) -> Option<&RuleSet> {
        self.sets.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RuleSet> {
        self.sets.iter()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

impl From<RuleSetStore> for Vec<RuleSet> {
    fn from(store: RuleSetStore) -> Self {
        store.sets
    }
}

/// Fold rule sets left under [`LEGACY_RULE_SETS_KEY`] into `store` and drop
/// the legacy value. Returns `true` if `store` changed.
///
/// An unreadable legacy value is logged and left in place.
#[instrument(skip_all, fields(backend = backend.name()))]
pub(crate) async fn import_legacy(store: &mut RuleSetStore, backend: &dyn StorageBackend) -> Result<bool> {
    let legacy: Vec<RuleSet> = match json::load(backend, LEGACY_RULE_SETS_KEY).await {
        Ok(Some(legacy)) => legacy,
        Ok(None) => return Ok(false),
        Err(err) => {
            tracing::warn!(error = %err, "Ignoring unreadable legacy rule sets");
            return Ok(false);
        },
    };
    let mut changed = false;
    for mut set in legacy {
        if set.hash.is_none() {
            set.hash = Some(content_hash(&set.text));
        }
        tracing::info!(name = %set.name, "Importing legacy rule set");
        changed |= store.upsert(set);
    }
    backend.delete(LEGACY_RULE_SETS_KEY).await.or_raise(|| ErrorKind::Storage)?;
    Ok(changed)
}
