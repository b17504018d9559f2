use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Tag category. The set is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Artist,
    Character,
    Copyright,
    Metadata,
    General,
}
impl Category {
    pub const ALL: [Category; 5] = [
        Category::Artist,
        Category::Character,
        Category::Copyright,
        Category::Metadata,
        Category::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Artist => "artist",
            Category::Character => "character",
            Category::Copyright => "copyright",
            Category::Metadata => "metadata",
            Category::General => "general",
        }
    }
}
impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Tags of a post, grouped by [`Category`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tags {
    #[serde(default)]
    pub artist: Vec<String>,
    #[serde(default)]
    pub character: Vec<String>,
    #[serde(default)]
    pub copyright: Vec<String>,
    #[serde(default)]
    pub metadata: Vec<String>,
    #[serde(default)]
    pub general: Vec<String>,
}
impl Tags {
    pub fn get(&self, category: Category) -> &[String] {
        match category {
            Category::Artist => &self.artist,
            Category::Character => &self.character,
            Category::Copyright => &self.copyright,
            Category::Metadata => &self.metadata,
            Category::General => &self.general,
        }
    }

    /// Every tag, in category order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        Category::ALL.into_iter().flat_map(|c| self.get(c).iter().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        Category::ALL.iter().map(|c| self.get(*c).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iterates_every_category_in_order() {
        let tags = Tags {
            artist: vec!["someone".into()],
            general: vec!["red hair".into(), "smile".into()],
            ..Tags::default()
        };
        assert_eq!(tags.iter().collect::<Vec<_>>(), vec!["someone", "red hair", "smile"]);
        assert_eq!(tags.len(), 3);
        assert!(Tags::default().is_empty());
    }
}
