//! Blacklist rules: a forgiving line-based text format, wildcard tag
//! patterns, and matching of posts against them.
//!
//! ```
//! use gelo_rules::parse;
//!
//! let rules = parse("# hide these\nartist:Some_One\nred_hair AND blue_eyes // combo\nrating:e*");
//! let labels: Vec<String> = rules.iter().map(|r| r.label()).collect();
//! assert_eq!(labels, ["some one", "red hair && blue eyes", "rating:e*"]);
//! ```
//!
//! Nothing in here fails: lines that normalize to nothing are dropped.

mod matcher;
mod parse;
mod pattern;
mod rule;

pub use crate::matcher::{TagSet, classify, matches};
pub use crate::parse::{normalize_line, parse};
pub use crate::pattern::Pattern;
pub use crate::rule::{Rule, RuleKey, RuleKind};
