use futures::StreamExt;
use futures::stream::FuturesUnordered;
use gelo_post::PostId;
use gelo_rules::{Rule, classify};
use std::collections::{BTreeSet, HashMap, HashSet};
use tokio::sync::broadcast;
use tracing::instrument;

use crate::Context;
use crate::error::{ErrorKind, Result};
use crate::rule_set::{RuleSet, RuleSetStore, import_legacy};
use crate::session::SessionState;

const EVENT_CAPACITY: usize = 64;

/// Published to subscribers after each state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlacklistEvent {
    /// A rule set was selected and its rules parsed.
    Selected(String),
    /// An [`apply`](Coordinator::apply) pass finished.
    Applied { posts: usize, blacklisted: usize },
    /// One or more rules were enabled or disabled.
    Toggled,
}

/// Outcome of one [`apply`](Coordinator::apply) pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// `(id, blacklisted)` for every distinct id passed in, in input order.
    pub decisions: Vec<(PostId, bool)>,
    /// Ids that could not be resolved. They count as not matching anything.
    pub failed: Vec<PostId>,
}
impl ApplyReport {
    pub fn blacklisted(&self) -> impl Iterator<Item = PostId> + '_ {
        self.decisions.iter().filter(|(_, blacklisted)| *blacklisted).map(|(id, _)| *id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSummary {
    /// Position in [`Coordinator::rules`], as taken by [`Coordinator::toggle`].
    pub index: usize,
    pub label: String,
    pub hits: usize,
    pub disabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub rule_set: Option<String>,
    /// Posts currently blacklisted.
    pub blacklisted: usize,
    /// Posts classified since the rule set was selected.
    pub total: usize,
    /// Only rules that hit something.
    pub rules: Vec<RuleSummary>,
}

/// Owns the rules of the selected rule set and drives classification.
///
/// Methods that change rules take `&mut self`; there is exactly one owner of
/// the hit sets at any time.
pub struct Coordinator {
    ctx: Context,
    active: Option<RuleSet>,
    rules: Vec<Rule>,
    /// Posts hit by at least one rule, enabled or not.
    total_hits: BTreeSet<PostId>,
    seen: BTreeSet<PostId>,
    events: broadcast::Sender<BlacklistEvent>,
}

impl Coordinator {
    pub fn new(ctx: Context) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            ctx,
            active: None,
            rules: Vec::new(),
            total_hits: BTreeSet::new(),
            seen: BTreeSet::new(),
            events,
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn active(&self) -> Option<&RuleSet> {
        self.active.as_ref()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn total_hits(&self) -> &BTreeSet<PostId> {
        &self.total_hits
    }

    /// Receive [`BlacklistEvent`]s. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<BlacklistEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: BlacklistEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    /// Start-up: make sure the reserved rule sets exist, import legacy rule
    /// sets, then select the remembered rule set (or the first one).
    #[instrument(skip(self))]
    pub async fn activate(&mut self) -> Result<()> {
        let durable = &*self.ctx.durable;
        let mut store = RuleSetStore::load(durable).await?;
        let imported = import_legacy(&mut store, durable).await?;
        if store.reconcile_reserved() || imported {
            store.save(durable).await?;
        }

        let remembered = SessionState::load_active(durable).await?;
        let name = match remembered {
            Some(name) if store.get(&name).is_some() => name,
            other => {
                if let Some(missing) = other {
                    tracing::info!(rule_set = %missing, "Remembered rule set no longer exists");
                }
                let Some(first) = store.first() else {
                    exn::bail!(ErrorKind::NoActiveRuleSet);
                };
                first.name.clone()
            },
        };
        self.select_from(&store, &name).await
    }

    /// Parse the rule set `name` and make it the active one.
    ///
    /// Hits and counters start over. If `name` was already the remembered
    /// rule set, its disabled rules are restored; otherwise it becomes the
    /// remembered rule set with nothing disabled.
    #[instrument(skip(self))]
    pub async fn select_rule_set(&mut self, name: &str) -> Result<()> {
        let store = RuleSetStore::load(&*self.ctx.durable).await?;
        self.select_from(&store, name).await
    }

    async fn select_from(&mut self, store: &RuleSetStore, name: &str) -> Result<()> {
        let Some(set) = store.get(name) else {
            exn::bail!(ErrorKind::RuleSetNotFound(name.to_string()));
        };
        self.rules = gelo_rules::parse(&set.text);
        self.total_hits.clear();
        self.seen.clear();
        self.active = Some(set.clone());

        let durable = &*self.ctx.durable;
        let session = &*self.ctx.session;
        if SessionState::load_active(durable).await?.as_deref() == Some(name) {
            let disabled = SessionState::load_disabled(session, name).await?;
            let mut restored = 0;
            for key in &disabled {
                if let Some(rule) = self.rules.iter_mut().find(|rule| rule.key() == *key) {
                    rule.set_disabled(true);
                    restored += 1;
                }
            }
            tracing::debug!(rule_set = %name, restored, "Restored disabled rules");
        } else {
            let state = SessionState {
                active: Some(name.to_string()),
                disabled: Vec::new(),
            };
            state.save(durable, session).await?;
        }

        tracing::info!(rule_set = %name, rules = self.rules.len(), "Selected rule set");
        self.publish(BlacklistEvent::Selected(name.to_string()));
        Ok(())
    }

    /// Resolve every id, match it against every rule and push the decision
    /// to the sink.
    ///
    /// Resolution fans out through the cache; the admission queue bounds how
    /// much of it hits the network at once. A post that fails to resolve is
    /// logged, reported in [`ApplyReport::failed`], and classified as not
    /// matching anything during this pass.
    #[instrument(skip_all)]
    pub async fn apply(&mut self, ids: impl IntoIterator<Item = PostId>) -> Result<ApplyReport> {
        if self.active.is_none() {
            exn::bail!(ErrorKind::NoActiveRuleSet);
        }
        let mut unique = HashSet::new();
        let ids: Vec<PostId> = ids.into_iter().filter(|id| unique.insert(*id)).collect();
        let order: HashMap<PostId, usize> = ids.iter().enumerate().map(|(index, id)| (*id, index)).collect();

        let cache = self.ctx.cache.clone();
        let mut resolving: FuturesUnordered<_> = ids
            .iter()
            .map(|&id| {
                let cache = cache.clone();
                async move { (id, cache.get_or_fetch(id).await) }
            })
            .collect();

        let mut report = ApplyReport::default();
        while let Some((id, resolved)) = resolving.next().await {
            match resolved {
                Ok(post) => {
                    if classify(&post, &mut self.rules) {
                        self.total_hits.insert(id);
                    }
                },
                Err(err) => {
                    tracing::warn!(id, error = %err, "Failed to resolve post, treating as no match");
                    report.failed.push(id);
                },
            }
            self.seen.insert(id);
            let blacklisted = self.is_blacklisted(id);
            self.ctx.sink.update(id, blacklisted);
            report.decisions.push((id, blacklisted));
        }
        report.decisions.sort_by_key(|(id, _)| order.get(id).copied().unwrap_or(usize::MAX));
        report.failed.sort_by_key(|id| order.get(id).copied().unwrap_or(usize::MAX));

        let blacklisted = report.blacklisted().count();
        tracing::info!(posts = ids.len(), blacklisted, failed = report.failed.len(), "Applied blacklist");
        self.publish(BlacklistEvent::Applied {
            posts: ids.len(),
            blacklisted,
        });
        Ok(report)
    }

    /// A post is blacklisted while at least one enabled rule has hit it.
    pub fn is_blacklisted(&self, id: PostId) -> bool {
        self.rules.iter().any(|rule| !rule.is_disabled() && rule.has_hit(id))
    }

    /// Disable (`Some(true)`), enable (`Some(false)`) or flip (`None`) the
    /// rule at `index`, then push fresh decisions for the posts it hit.
    /// Returns the rule's new disabled state.
    #[instrument(skip(self))]
    pub async fn toggle(&mut self, index: usize, force: Option<bool>) -> Result<bool> {
        let Some(rule) = self.rules.get_mut(index) else {
            exn::bail!(ErrorKind::RuleNotFound(index));
        };
        let disabled = force.unwrap_or(!rule.is_disabled());
        rule.set_disabled(disabled);
        let affected: Vec<PostId> = rule.hits().iter().copied().collect();
        tracing::debug!(rule = %rule.label(), disabled, affected = affected.len(), "Toggled rule");

        self.refresh(affected);
        self.persist_disabled().await?;
        self.publish(BlacklistEvent::Toggled);
        Ok(disabled)
    }

    /// Toggle every rule that hit something, all to the same state. Without
    /// `force`, the new state is the opposite of the first such rule's.
    /// Returns the state applied, or `None` when no rule has hits.
    #[instrument(skip(self))]
    pub async fn toggle_all(&mut self, force: Option<bool>) -> Result<Option<bool>> {
        let Some(first) = self.rules.iter().find(|rule| !rule.hits().is_empty()) else {
            return Ok(None);
        };
        let disabled = force.unwrap_or(!first.is_disabled());
        let mut affected = BTreeSet::new();
        for rule in self.rules.iter_mut().filter(|rule| !rule.hits().is_empty()) {
            rule.set_disabled(disabled);
            affected.extend(rule.hits().iter().copied());
        }
        tracing::debug!(disabled, affected = affected.len(), "Toggled all rules");

        self.refresh(affected);
        self.persist_disabled().await?;
        self.publish(BlacklistEvent::Toggled);
        Ok(Some(disabled))
    }

    fn refresh(&self, ids: impl IntoIterator<Item = PostId>) {
        for id in ids {
            self.ctx.sink.update(id, self.is_blacklisted(id));
        }
    }

    async fn persist_disabled(&self) -> Result<()> {
        let Some(active) = &self.active else {
            exn::bail!(ErrorKind::NoActiveRuleSet);
        };
        let disabled: Vec<_> = self.rules.iter().filter(|rule| rule.is_disabled()).map(Rule::key).collect();
        SessionState::save_disabled(&*self.ctx.session, &active.name, &disabled).await
    }

    /// Add a rule set or replace its text, then select it.
    #[instrument(skip(self, text))]
    pub async fn save_rule_set(&mut self, name: &str, text: &str) -> Result<()> {
        if name.trim().is_empty() {
            exn::bail!(ErrorKind::InvalidName(name.to_string()));
        }
        let durable = &*self.ctx.durable;
        let mut store = RuleSetStore::load(durable).await?;
        let set = match store.get(name) {
            Some(existing) if existing.read_only => exn::bail!(ErrorKind::ReadOnly(name.to_string())),
            Some(existing) => existing.clone().with_text(text),
            None => RuleSet::new(name, text),
        };
        if store.upsert(set) {
            store.save(durable).await?;
            tracing::info!(rule_set = %name, "Saved rule set");
        }
        self.select_from(&store, name).await
    }

    /// Remove a rule set. Removing the selected one selects the first
    /// remaining rule set.
    #[instrument(skip(self))]
    pub async fn remove_rule_set(&mut self, name: &str) -> Result<RuleSet> {
        let durable = &*self.ctx.durable;
        let mut store = RuleSetStore::load(durable).await?;
        let removed = store.remove(name)?;
        store.save(durable).await?;
        tracing::info!(rule_set = %name, "Removed rule set");

        if self.active.as_ref().is_some_and(|active| active.name == name) {
            self.active = None;
            self.rules.clear();
            self.total_hits.clear();
            self.seen.clear();
            if let Some(first) = store.first().map(|set| set.name.clone()) {
                self.select_from(&store, &first).await?;
            }
        }
        Ok(removed)
    }

    pub async fn rule_sets(&self) -> Result<Vec<RuleSet>> {
        Ok(RuleSetStore::load(&*self.ctx.durable).await?.into())
    }

    pub fn summary(&self) -> Summary {
        let mut rules: Vec<RuleSummary> = self
            .rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| !rule.hits().is_empty())
            .map(|(index, rule)| RuleSummary {
                index,
                label: rule.label(),
                hits: rule.hits().len(),
                disabled: rule.is_disabled(),
            })
            .collect();
        if self.ctx.settings.order_by_hit_count {
            // Stable: ties keep rule order.
            rules.sort_by(|a, b| b.hits.cmp(&a.hits));
        }
        Summary {
            rule_set: self.active.as_ref().map(|set| set.name.clone()),
            blacklisted: self.total_hits.iter().filter(|id| self.is_blacklisted(**id)).count(),
            total: self.seen.len(),
            rules,
        }
    }
}
