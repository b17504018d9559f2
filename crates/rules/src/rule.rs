use gelo_post::PostId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::pattern::Pattern;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleKind {
    /// Hits a post carrying any tag matching the pattern.
    Single(Pattern),
    /// Hits a post when every pattern matches at least one of its tags.
    And(Vec<Pattern>),
}

/// Identity of a rule as persisted: `{"tag": ...}` or `{"tags": [...]}`.
///
/// Unknown fields are ignored when decoding, so older snapshots that stored
/// whole rules still resolve.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleKey {
    Single { tag: String },
    And { tags: Vec<String> },
}

/// One parsed blacklist line, plus the posts it hit during this session.
///
/// `hits` only ever grows; disabling a rule leaves it untouched so that the
/// rule can be re-enabled without matching again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    kind: RuleKind,
    hits: BTreeSet<PostId>,
    disabled: bool,
}

impl Rule {
    pub fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            hits: BTreeSet::new(),
            disabled: false,
        }
    }

    pub fn single(pattern: impl Into<Pattern>) -> Self {
        Self::new(RuleKind::Single(pattern.into()))
    }

    pub fn and(patterns: impl IntoIterator<Item = impl Into<Pattern>>) -> Self {
        Self::new(RuleKind::And(patterns.into_iter().map(Into::into).collect()))
    }

    pub fn kind(&self) -> &RuleKind {
        &self.kind
    }

    pub fn is_and(&self) -> bool {
        matches!(self.kind, RuleKind::And(_))
    }

    pub fn patterns(&self) -> &[Pattern] {
        match &self.kind {
            RuleKind::Single(pattern) => std::slice::from_ref(pattern),
            RuleKind::And(patterns) => patterns,
        }
    }

    pub fn key(&self) -> RuleKey {
        match &self.kind {
            RuleKind::Single(pattern) => RuleKey::Single {
                tag: pattern.as_str().to_string(),
            },
            RuleKind::And(patterns) => RuleKey::And {
                tags: patterns.iter().map(|p| p.as_str().to_string()).collect(),
            },
        }
    }

    /// Human readable form: the tag, or the tags joined with ` && `.
    pub fn label(&self) -> String {
        self.patterns().iter().map(Pattern::as_str).collect::<Vec<_>>().join(" && ")
    }

    pub fn hits(&self) -> &BTreeSet<PostId> {
        &self.hits
    }

    pub fn has_hit(&self, id: PostId) -> bool {
        self.hits.contains(&id)
    }

    pub(crate) fn record_hit(&mut self, id: PostId) {
        self.hits.insert(id);
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_and_label() {
        let single = Rule::single("red hair");
        assert_eq!(single.key(), RuleKey::Single { tag: "red hair".into() });
        assert_eq!(single.label(), "red hair");

        let and = Rule::and(["red hair", "blue eyes"]);
        assert!(and.is_and());
        assert_eq!(
            and.key(),
            RuleKey::And {
                tags: vec!["red hair".into(), "blue eyes".into()]
            }
        );
        assert_eq!(and.label(), "red hair && blue eyes");
    }

    #[test]
    fn key_serializes_to_the_stored_shape() {
        let keys = vec![Rule::single("a").key(), Rule::and(["b", "c"]).key()];
        assert_eq!(serde_json::to_string(&keys).unwrap(), r#"[{"tag":"a"},{"tags":["b","c"]}]"#);
    }

    #[test]
    fn key_decodes_from_full_rule_objects() {
        let stored = r#"[{"tag":"a","isAnd":false,"hits":[1,2],"isDisabled":true},{"tags":["b","c"],"isAnd":true,"hits":[]}]"#;
        let keys: Vec<RuleKey> = serde_json::from_str(stored).unwrap();
        assert_eq!(keys, vec![Rule::single("a").key(), Rule::and(["b", "c"]).key()]);
    }

    #[test]
    fn disabling_keeps_hits() {
        let mut rule = Rule::single("a");
        rule.record_hit(42);
        rule.set_disabled(true);
        assert!(rule.is_disabled());
        assert!(rule.has_hit(42));
    }
}
