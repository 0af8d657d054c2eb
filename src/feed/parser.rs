use chrono::{DateTime, Utc};
use feed_rs::model::Entry;
use feed_rs::parser;

use crate::article::ArticleRecord;
use crate::feed::FeedConfig;

/// Limits applied while turning feed entries into records.
#[derive(Debug, Clone, Copy)]
pub struct EntryFilter {
    /// Entries published before this instant are dropped.
    pub cutoff: DateTime<Utc>,
    /// Maximum records kept per feed, newest first (0 = unlimited).
    pub max_items: usize,
}

/// Outcome of parsing one feed body.
#[derive(Debug, Default)]
pub struct ParseResult {
    /// Records that passed all filters, newest first.
    pub records: Vec<ArticleRecord>,
    /// Entries dropped for a missing date, title or link.
    pub skipped: usize,
    /// Entries dropped for being older than the cutoff.
    pub stale: usize,
}

/// Parses an RSS/Atom/JSON feed body into article records for `feed`.
pub fn parse_feed(
    bytes: &[u8],
    feed: &FeedConfig,
    filter: EntryFilter,
) -> Result<ParseResult, parser::ParseFeedError> {
    let parsed = parser::parse(bytes)?;

    let mut result = ParseResult::default();
    for entry in parsed.entries {
        let Some(published_at) = entry.published.or(entry.updated) else {
            result.skipped += 1;
            continue;
        };
        if published_at < filter.cutoff {
            result.stale += 1;
            continue;
        }

        let title = entry
            .title
            .as_ref()
            .map(|t| t.content.trim().to_string())
            .unwrap_or_default();
        let link = entry_link(&entry).unwrap_or_default();
        if title.is_empty() || link.is_empty() {
            result.skipped += 1;
            continue;
        }

        result.records.push(ArticleRecord::new(
            title,
            link,
            published_at,
            feed.source.clone(),
            feed.category.clone(),
        ));
    }

    // Stable sort keeps feed order among entries sharing a timestamp
    result
        .records
        .sort_by(|a, b| b.published_at.cmp(&a.published_at));
    if filter.max_items > 0 {
        result.records.truncate(filter.max_items);
    }

    Ok(result)
}

/// Picks the article link: the first `alternate` (or untyped) link, else the first link.
fn entry_link(entry: &Entry) -> Option<String> {
    entry
        .links
        .iter()
        .find(|l| l.rel.as_deref().map_or(true, |rel| rel == "alternate"))
        .or_else(|| entry.links.first())
        .map(|l| l.href.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn feed() -> FeedConfig {
        FeedConfig {
            url: "https://example.com/rss".into(),
            category: "Clinical & Research".into(),
            source: "Example".into(),
        }
    }

    fn filter(max_items: usize) -> EntryFilter {
        EntryFilter {
            cutoff: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            max_items,
        }
    }

    const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Example</title>
  <item><title>Older</title><link>https://example.com/1</link><pubDate>Tue, 02 Jan 2024 10:00:00 GMT</pubDate></item>
  <item><title> Newer </title><link>https://example.com/2</link><pubDate>Wed, 03 Jan 2024 10:00:00 GMT</pubDate></item>
  <item><title>Stale</title><link>https://example.com/3</link><pubDate>Sun, 31 Dec 2023 10:00:00 GMT</pubDate></item>
  <item><title>Undated</title><link>https://example.com/4</link></item>
  <item><title></title><link>https://example.com/5</link><pubDate>Wed, 03 Jan 2024 11:00:00 GMT</pubDate></item>
</channel></rss>"#;

    #[test]
    fn test_parse_filters_and_orders_entries() {
        let result = parse_feed(RSS.as_bytes(), &feed(), filter(0)).unwrap();
        let titles: Vec<_> = result.records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Newer", "Older"]);
        assert_eq!(result.stale, 1);
        assert_eq!(result.skipped, 2);
    }

    #[test]
    fn test_parse_carries_feed_metadata() {
        let result = parse_feed(RSS.as_bytes(), &feed(), filter(0)).unwrap();
        let record = &result.records[0];
        assert_eq!(record.source, "Example");
        assert_eq!(record.category, "Clinical & Research");
        assert_eq!(record.link, "https://example.com/2");
    }

    #[test]
    fn test_parse_limits_items_per_source() {
        let result = parse_feed(RSS.as_bytes(), &feed(), filter(1)).unwrap();
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].title, "Newer");
    }

    #[test]
    fn test_parse_atom_uses_updated_when_unpublished() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom</title><id>urn:feed</id><updated>2024-01-05T00:00:00Z</updated>
  <entry>
    <title>Atom entry</title><id>urn:1</id>
    <link rel="alternate" href="https://example.com/atom-1"/>
    <updated>2024-01-05T00:00:00Z</updated>
  </entry>
</feed>"#;
        let result = parse_feed(atom.as_bytes(), &feed(), filter(0)).unwrap();
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].link, "https://example.com/atom-1");
    }

    #[test]
    fn test_parse_invalid_xml_errors() {
        assert!(parse_feed(b"<not valid xml", &feed(), filter(0)).is_err());
    }
}
