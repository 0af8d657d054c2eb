//! Digest Formatter: renders new records as a markdown document grouped by
//! section.

use std::collections::BTreeMap;

use crate::article::{ArticleRecord, Category};
use crate::util::{clean_title, escape_link_text};

pub const DIGEST_HEADING: &str = "## Daily Biotech / Pharma Headlines";

/// Body used when a run found nothing new.
pub fn empty_digest(freshness_hours: u64) -> String {
    format!("_No fresh biotech/pharma headlines in the last {freshness_hours} h._")
}

/// Groups records by section in display order, each group sorted newest
/// first and then by source name.
///
/// Records with an unknown category are placed under [`Category::FALLBACK`].
pub fn group_by_category(records: &[ArticleRecord]) -> Vec<(Category, Vec<&ArticleRecord>)> {
    let mut sections: BTreeMap<Category, Vec<&ArticleRecord>> = BTreeMap::new();
    for record in records {
        sections
            .entry(Category::from_name_or_fallback(&record.category))
            .or_default()
            .push(record);
    }

    sections
        .into_iter()
        .map(|(category, mut items)| {
            items.sort_by(|a, b| {
                b.published_at
                    .cmp(&a.published_at)
                    .then_with(|| a.source.cmp(&b.source))
            });
            (category, items)
        })
        .collect()
}

/// Renders the digest markdown.
///
/// # Examples
///
/// ```
/// use bionews::digest::to_markdown;
///
/// assert!(to_markdown(&[], 24).contains("No fresh biotech/pharma headlines"));
/// ```
pub fn to_markdown(records: &[ArticleRecord], freshness_hours: u64) -> String {
    if records.is_empty() {
        return empty_digest(freshness_hours);
    }

    let mut lines = vec![format!("{DIGEST_HEADING}\n")];
    for (category, items) in group_by_category(records) {
        lines.push(format!("### {category}"));
        for item in items {
            lines.push(format!(
                "- [{}]({}) — {}",
                escape_link_text(&clean_title(&item.title)),
                item.link.trim(),
                clean_title(&item.source)
            ));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}
