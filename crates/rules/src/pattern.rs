use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// A single tag pattern.
///
/// `*` matches any run of characters (including none) and `?` exactly one;
/// patterns containing either compare case-insensitively. A pattern without
/// wildcards only matches the identical tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Pattern {
    Exact(String),
    Wildcard { source: String, regex: Regex },
}

impl Pattern {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        if !source.contains(['*', '?']) {
            return Self::Exact(source);
        }
        let mut expression = String::with_capacity(source.len() + 8);
        expression.push('^');
        for c in source.chars() {
            match c {
                '*' => expression.push_str(".*"),
                '?' => expression.push('.'),
                c => expression.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
            }
        }
        expression.push('$');
        match RegexBuilder::new(&expression).case_insensitive(true).build() {
            Ok(regex) => Self::Wildcard { source, regex },
            Err(err) => {
                tracing::warn!(pattern = %source, error = %err, "Wildcard pattern did not compile, matching literally");
                Self::Exact(source)
            },
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Exact(source) | Self::Wildcard { source, .. } => source,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard { .. })
    }

    pub fn matches(&self, tag: &str) -> bool {
        match self {
            Self::Exact(source) => source == tag,
            Self::Wildcard { regex, .. } => regex.is_match(tag),
        }
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}
impl Eq for Pattern {}

impl From<String> for Pattern {
    fn from(source: String) -> Self {
        Self::new(source)
    }
}
impl From<&str> for Pattern {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}
impl From<Pattern> for String {
    fn from(pattern: Pattern) -> Self {
        match pattern {
            Pattern::Exact(source) | Pattern::Wildcard { source, .. } => source,
        }
    }
}

impl Display for Pattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("a*b", "aXXb", true)]
    #[case("a*b", "ab", true)]
    #[case("a*b", "ba", false)]
    #[case("a?b", "axb", true)]
    #[case("a?b", "ab", false)]
    #[case("a?b", "axxb", false)]
    #[case("A*B", "axb", true)]
    #[case("rating:q*", "rating:questionable", true)]
    #[case("rating:e*", "rating:questionable", false)]
    #[case("*hair", "long red hair", true)]
    #[case("1.5*", "1x5 ratio", false)]
    #[case("(cosplay)*", "(cosplay) photo", true)]
    #[case("*", "", true)]
    fn wildcards(#[case] pattern: &str, #[case] tag: &str, #[case] expected: bool) {
        let pattern = Pattern::new(pattern);
        assert!(pattern.is_wildcard());
        assert_eq!(pattern.matches(tag), expected);
    }

    #[rstest]
    #[case("red hair", "red hair", true)]
    #[case("red hair", "Red Hair", false)]
    #[case("red hair", "red hair ", false)]
    #[case("red", "red hair", false)]
    fn exact(#[case] pattern: &str, #[case] tag: &str, #[case] expected: bool) {
        let pattern = Pattern::new(pattern);
        assert!(!pattern.is_wildcard());
        assert_eq!(pattern.matches(tag), expected);
    }

    #[test]
    fn equality_and_serde_use_the_source_text() {
        assert_eq!(Pattern::new("a*"), Pattern::from("a*"));
        assert_ne!(Pattern::new("a*"), Pattern::new("a?"));
        assert_eq!(serde_json::to_string(&Pattern::new("a*b")).unwrap(), r#""a*b""#);
        let back: Pattern = serde_json::from_str(r#""a?b""#).unwrap();
        assert!(back.matches("axb"));
    }
}
