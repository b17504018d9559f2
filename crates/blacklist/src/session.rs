use exn::ResultExt;
use gelo_rules::RuleKey;
use gelo_storage::{StorageBackend, json};

use crate::error::{ErrorKind, Result};

/// Durable key holding the name of the selected rule set.
pub const ACTIVE_KEY: &str = "active-blacklist";
const DISABLED_PREFIX: &str = "disabled/";

/// Session key holding the disabled rules of the rule set `name`.
///
/// Rule set names are free text, so characters with a meaning in storage keys
/// are percent-escaped.
///
/// ```
/// use gelo_blacklist::disabled_key;
/// assert_eq!(disabled_key("Safe mode"), "disabled/Safe mode");
/// assert_eq!(disabled_key("a/b"), "disabled/a%2Fb");
/// assert_eq!(disabled_key(".."), "disabled/%2E%2E");
/// ```
pub fn disabled_key(name: &str) -> String {
    let mut key = String::with_capacity(DISABLED_PREFIX.len() + name.len());
    key.push_str(DISABLED_PREFIX);
    if name.is_empty() || name.chars().all(|c| c == '.') {
        key.push_str(&"%2E".repeat(name.len()));
        return key;
    }
    for c in name.chars() {
        match c {
            '%' => key.push_str("%25"),
            '/' => key.push_str("%2F"),
            '\\' => key.push_str("%5C"),
            '\0' => key.push_str("%00"),
            c => key.push(c),
        }
    }
    key
}

/// Which rule set is selected, and which of its rules are disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub active: Option<String>,
    /// Disabled rules of `active`, in rule order.
    pub disabled: Vec<RuleKey>,
}

impl SessionState {
    pub async fn load(durable: &dyn StorageBackend, session: &dyn StorageBackend) -> Result<Self> {
        let active = Self::load_active(durable).await?;
        let disabled = match &active {
            Some(name) => Self::load_disabled(session, name).await?,
            None => Vec::new(),
        };
        Ok(Self { active, disabled })
    }

    pub async fn save(&self, durable: &dyn StorageBackend, session: &dyn StorageBackend) -> Result<()> {
        let Some(name) = &self.active else {
            exn::bail!(ErrorKind::NoActiveRuleSet);
        };
        json::save(durable, ACTIVE_KEY, name).await.or_raise(|| ErrorKind::Storage)?;
        Self::save_disabled(session, name, &self.disabled).await
    }

    pub async fn load_active(durable: &dyn StorageBackend) -> Result<Option<String>> {
        json::load(durable, ACTIVE_KEY).await.or_raise(|| ErrorKind::Storage)
    }

    /// Disabled rules stored for `name`. An unreadable snapshot counts as
    /// empty.
    pub async fn load_disabled(session: &dyn StorageBackend, name: &str) -> Result<Vec<RuleKey>> {
        match json::load::<Vec<RuleKey>>(session, &disabled_key(name)).await {
            Ok(disabled) => Ok(disabled.unwrap_or_default()),
            Err(err) if !err.is_retryable() => {
                tracing::warn!(rule_set = %name, error = %err, "Ignoring unreadable disabled rules");
                Ok(Vec::new())
            },
            Err(err) => Err(err).or_raise(|| ErrorKind::Storage),
        }
    }

    pub async fn save_disabled(session: &dyn StorageBackend, name: &str, disabled: &[RuleKey]) -> Result<()> {
        json::save(session, &disabled_key(name), disabled).await.or_raise(|| ErrorKind::Storage)
    }
}
