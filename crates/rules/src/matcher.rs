use gelo_post::Post;

use crate::rule::Rule;

/// Every tag of a post across all categories, plus `rating:<rating>`.
///
/// Built once per post and reused for every rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSet {
    tags: Vec<String>,
}
impl TagSet {
    pub fn of(post: &Post) -> Self {
        let mut tags: Vec<String> = post.tags.iter().map(str::to_string).collect();
        tags.push(post.rating.as_tag());
        Self { tags }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// Whether `rule` hits these tags. Each pattern of an AND rule is checked
    /// on its own, so two patterns may be satisfied by the same tag.
    pub fn is_hit_by(&self, rule: &Rule) -> bool {
        rule.patterns().iter().all(|pattern| self.iter().any(|tag| pattern.matches(tag)))
    }
}

/// Check `post` against `rule`, recording the post in the rule's hits on a
/// match. Disabled rules are matched like any other.
pub fn matches(post: &Post, rule: &mut Rule) -> bool {
    matches_tags(&TagSet::of(post), post, rule)
}

/// Check `post` against every rule (no short-circuit, each matching rule
/// records the hit). `true` if any rule matched.
pub fn classify(post: &Post, rules: &mut [Rule]) -> bool {
    let tags = TagSet::of(post);
    rules.iter_mut().fold(false, |hit, rule| matches_tags(&tags, post, rule) || hit)
}

fn matches_tags(tags: &TagSet, post: &Post, rule: &mut Rule) -> bool {
    let hit = tags.is_hit_by(rule);
    if hit {
        rule.record_hit(post.id);
    }
    hit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use gelo_post::{Rating, Tags};

    fn post(id: u64, rating: Rating, general: &[&str]) -> Post {
        Post {
            id,
            tags: Tags {
                artist: vec!["someone".into()],
                general: general.iter().map(|t| t.to_string()).collect(),
                ..Tags::default()
            },
            rating,
            score: 0,
            md5: String::new(),
            download_url: String::new(),
            high_res_url: String::new(),
        }
    }

    #[test]
    fn tag_set_includes_rating() {
        let tags = TagSet::of(&post(1, Rating::Sensitive, &["smile"]));
        assert_eq!(tags.iter().collect::<Vec<_>>(), vec!["someone", "smile", "rating:sensitive"]);
    }

    #[test]
    fn and_rule_needs_every_pattern() {
        let mut rule = Rule::and(["red hair", "blue eyes"]);
        let miss = post(1, Rating::General, &["red hair", "green eyes"]);
        let hit = post(2, Rating::General, &["red hair", "blue eyes", "smile"]);

        assert!(!matches(&miss, &mut rule));
        assert!(matches(&hit, &mut rule));
        assert_eq!(rule.hits().iter().copied().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn and_patterns_may_share_a_tag() {
        let mut rule = Rule::and(["red*", "*hair"]);
        assert!(matches(&post(1, Rating::General, &["red hair"]), &mut rule));
    }

    #[test]
    fn single_rule_matches_across_categories() {
        let mut rule = Rule::single("someone");
        assert!(matches(&post(3, Rating::General, &[]), &mut rule));
        assert!(rule.has_hit(3));
    }

    #[test]
    fn safe_mode_rules_hit_by_rating() {
        let mut rules = parse("rating:q*\nrating:e*");
        assert!(classify(&post(1, Rating::Questionable, &[]), &mut rules));
        assert!(classify(&post(2, Rating::Explicit, &[]), &mut rules));
        assert!(!classify(&post(3, Rating::General, &[]), &mut rules));
        assert!(rules[0].has_hit(1) && !rules[0].has_hit(2));
        assert!(rules[1].has_hit(2) && !rules[1].has_hit(1));
    }

    #[test]
    fn rating_rule_uses_reported_name() {
        let mut rules = parse("rating:safe");
        assert!(classify(&post(1, Rating::Safe, &[]), &mut rules));
        assert!(!classify(&post(2, Rating::General, &[]), &mut rules));
    }

    #[test]
    fn classify_records_every_matching_rule_even_disabled() {
        let mut rules = parse("smile\nred*\nblue eyes");
        rules[0].set_disabled(true);
        assert!(classify(&post(7, Rating::General, &["smile", "red hair"]), &mut rules));
        assert!(rules[0].has_hit(7));
        assert!(rules[1].has_hit(7));
        assert!(!rules[2].has_hit(7));
    }

    #[test]
    fn no_rules_no_hit() {
        assert!(!classify(&post(1, Rating::Explicit, &["smile"]), &mut []));
    }
}
