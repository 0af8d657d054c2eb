//! Core records shared by every pipeline stage.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::util::article_id;

/// A single headline collected from a feed.
///
/// `id` is derived from the normalized link and is the key used for
/// deduplication across runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRecord {
    pub id: String,
    pub title: String,
    pub link: String,
    pub published_at: DateTime<Utc>,
    pub source: String,
    pub category: String,
}

impl ArticleRecord {
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        published_at: DateTime<Utc>,
        source: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        let link = link.into();
        Self {
            id: article_id(&link),
            title: title.into(),
            link,
            published_at,
            source: source.into(),
            category: category.into(),
        }
    }
}

/// Digest sections, in the order they are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Regulatory,
    Clinical,
    Deals,
    Company,
    Policy,
    Market,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Regulatory,
        Category::Clinical,
        Category::Deals,
        Category::Company,
        Category::Policy,
        Category::Market,
    ];

    /// Section used for anything that cannot be placed elsewhere.
    pub const FALLBACK: Category = Category::Company;

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Regulatory => "Regulatory & FDA",
            Category::Clinical => "Clinical & Research",
            Category::Deals => "Deals & Finance",
            Category::Company => "Company News",
            Category::Policy => "Policy & Politics",
            Category::Market => "Market Insights",
        }
    }

    /// Exact, case-insensitive match on the section name.
    pub fn from_name(name: &str) -> Option<Category> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(name))
    }

    /// Like [`Category::from_name`], but unknown names land in [`Category::FALLBACK`].
    pub fn from_name_or_fallback(name: &str) -> Category {
        Self::from_name(name).unwrap_or(Self::FALLBACK)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
