use std::collections::HashSet;

use crate::rule::{Rule, RuleKind};

const AND_TOKEN: &str = "AND";
const RESERVED_NAMESPACE: &str = "rating";

/// Parse blacklist text into rules, one per distinct line, in first-seen
/// order. Every rule starts enabled and without hits.
pub fn parse(text: &str) -> Vec<Rule> {
    let mut seen = HashSet::new();
    text.lines()
        .filter_map(normalize_line)
        .filter(|terms| seen.insert(terms.clone()))
        .map(|mut terms| match terms.len() {
            1 => Rule::new(RuleKind::Single(terms.remove(0).into())),
            _ => Rule::new(RuleKind::And(terms.into_iter().map(Into::into).collect())),
        })
        .collect()
}

/// Normalize a single line into its terms; more than one term means an AND
/// rule. `None` for lines that are blank or comments once normalized.
///
/// ```
/// use gelo_rules::normalize_line;
///
/// assert_eq!(normalize_line("Character:Red_Hair # note"), Some(vec!["red hair".to_string()]));
/// assert_eq!(normalize_line("rating:Explicit"), Some(vec!["rating:explicit".to_string()]));
/// assert_eq!(normalize_line("// nothing here"), None);
/// ```
pub fn normalize_line(line: &str) -> Option<Vec<String>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
        return None;
    }
    let line = strip_inline_comment(line);

    let mut terms = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for token in line.split_whitespace().chain(std::iter::once(AND_TOKEN)) {
        if token != AND_TOKEN {
            current.push(token);
            continue;
        }
        let term = normalize_term(&current.join(" "));
        if !term.is_empty() {
            terms.push(term);
        }
        current.clear();
    }
    (!terms.is_empty()).then_some(terms)
}

fn strip_inline_comment(line: &str) -> &str {
    let cut = [line.find('#'), line.find("//")].into_iter().flatten().min();
    match cut {
        Some(index) => line[..index].trim(),
        None => line,
    }
}

fn normalize_term(term: &str) -> String {
    let term = strip_namespace(term.trim());
    term.replace('_', " ").to_lowercase().trim().to_string()
}

fn strip_namespace(term: &str) -> &str {
    match term.split_once(':') {
        Some((namespace, rest))
            if !namespace.is_empty()
                && !rest.is_empty()
                && !namespace.contains(char::is_whitespace)
                && !namespace.eq_ignore_ascii_case(RESERVED_NAMESPACE) =>
        {
            rest
        },
        _ => term,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RuleKey;
    use rstest::rstest;

    fn keys(text: &str) -> Vec<RuleKey> {
        parse(text).iter().map(Rule::key).collect()
    }

    fn tag(tag: &str) -> RuleKey {
        RuleKey::Single { tag: tag.into() }
    }

    fn tags(tags: &[&str]) -> RuleKey {
        RuleKey::And {
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("# comment")]
    #[case("// comment")]
    #[case("  # indented comment")]
    #[case("AND")]
    #[case("# a\n\n// b\r\n")]
    fn produces_nothing(#[case] text: &str) {
        assert!(parse(text).is_empty());
    }

    #[rstest]
    #[case("red_hair", "red hair")]
    #[case("Red_Hair", "red hair")]
    #[case("red_hair # inline", "red hair")]
    #[case("red_hair // inline", "red hair")]
    #[case("artist:Some_One", "some one")]
    #[case("rating:explicit", "rating:explicit")]
    #[case("Rating:Explicit", "rating:explicit")]
    #[case("rating:q*", "rating:q*")]
    #[case(":d", ":d")]
    #[case("weird:", "weird:")]
    #[case("1/2", "1/2")]
    fn single_rules(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(keys(text), vec![tag(expected)]);
    }

    #[rstest]
    #[case("red_hair AND blue_eyes", &["red hair", "blue eyes"])]
    #[case("character:red_hair AND artist:someone", &["red hair", "someone"])]
    #[case("a AND b AND rating:e*", &["a", "b", "rating:e*"])]
    #[case("a  AND   b # both", &["a", "b"])]
    #[case("AND a AND b AND", &["a", "b"])]
    fn and_rules(#[case] text: &str, #[case] expected: &[&str]) {
        assert_eq!(keys(text), vec![tags(expected)]);
    }

    #[test]
    fn lowercase_and_is_part_of_the_tag() {
        assert_eq!(keys("black and white"), vec![tag("black and white")]);
    }

    #[test]
    fn deduplicates_preserving_first_seen_order() {
        let text = "b\na\nB\nartist:a\na AND b\nA AND B\nc";
        assert_eq!(keys(text), vec![tag("b"), tag("a"), tags(&["a", "b"]), tag("c")]);
    }

    #[test]
    fn handles_crlf() {
        assert_eq!(keys("a\r\nb\r\n"), vec![tag("a"), tag("b")]);
    }

    #[test]
    fn parsing_is_deterministic() {
        let text = "# mine\nrating:e*\nred_hair AND blue_eyes\nartist:x\nz\ny\nrating:e*";
        assert_eq!(parse(text), parse(text));
        assert_eq!(keys(text), vec![tag("rating:e*"), tags(&["red hair", "blue eyes"]), tag("x"), tag("z"), tag("y")]);
    }

    #[test]
    fn rules_start_enabled_without_hits() {
        for rule in parse("a\nb AND c") {
            assert!(!rule.is_disabled());
            assert!(rule.hits().is_empty());
        }
    }
}
