use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use crate::error::{Error, ErrorKind};

/// Content rating of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    General,
    /// Older posts still report "safe". Kept apart from `General` so that the
    /// `rating:` tag reads exactly as the API reported it.
    Safe,
    Sensitive,
    Questionable,
    Explicit,
}
impl Rating {
    /// Lowercase name, as used in the `rating:` meta tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::General => "general",
            Rating::Safe => "safe",
            Rating::Sensitive => "sensitive",
            Rating::Questionable => "questionable",
            Rating::Explicit => "explicit",
        }
    }

    /// The synthetic tag every post carries for rule matching.
    pub fn as_tag(&self) -> String {
        format!("rating:{}", self.as_str())
    }
}
impl FromStr for Rating {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "g" | "general" => Self::General,
            "safe" => Self::Safe,
            "s" | "sensitive" => Self::Sensitive,
            "q" | "questionable" => Self::Questionable,
            "e" | "explicit" => Self::Explicit,
            _ => exn::bail!(ErrorKind::ParseError {
                field: "rating",
                value: format!("unknown rating: {s}"),
            }),
        })
    }
}

impl Display for Rating {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}
