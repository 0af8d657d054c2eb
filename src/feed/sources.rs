//! Loader for the feeds file: a JSON object mapping feed URL to
//! `{"category": ..., "source": ...}`.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Maximum feeds file size (1 MB).
const MAX_FILE_SIZE: u64 = 1_048_576;

#[derive(Debug, Error)]
pub enum FeedsError {
    #[error("Failed to read feeds file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON in feeds file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Feeds file must be a JSON object keyed by feed URL")]
    NotAnObject,

    #[error("Invalid entry for {url}: {reason}")]
    InvalidEntry { url: String, reason: String },

    #[error("Feeds file too large: {0} bytes (max {MAX_FILE_SIZE} bytes)")]
    TooLarge(u64),
}

/// One configured feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub url: String,
    pub category: String,
    pub source: String,
}

#[derive(Deserialize)]
struct FeedMeta {
    category: String,
    source: String,
}

/// Parses feeds JSON, keeping the order in which feeds appear in the file.
pub fn parse_feeds(content: &str) -> Result<Vec<FeedConfig>, FeedsError> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    let map = value.as_object().ok_or(FeedsError::NotAnObject)?;

    let mut feeds = Vec::with_capacity(map.len());
    for (url, meta) in map {
        let meta: FeedMeta =
            serde_json::from_value(meta.clone()).map_err(|e| FeedsError::InvalidEntry {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let parsed = url::Url::parse(url).map_err(|e| FeedsError::InvalidEntry {
            url: url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FeedsError::InvalidEntry {
                url: url.clone(),
                reason: format!("unsupported scheme: {}", parsed.scheme()),
            });
        }

        feeds.push(FeedConfig {
            url: url.clone(),
            category: meta.category.trim().to_string(),
            source: meta.source.trim().to_string(),
        });
    }

    Ok(feeds)
}

/// Reads and parses the feeds file at `path`.
pub fn load_feeds(path: &Path) -> Result<Vec<FeedConfig>, FeedsError> {
    let len = std::fs::metadata(path)?.len();
    if len > MAX_FILE_SIZE {
        return Err(FeedsError::TooLarge(len));
    }

    let content = std::fs::read_to_string(path)?;
    let feeds = parse_feeds(&content)?;
    tracing::info!(path = %path.display(), count = feeds.len(), "Loaded feeds");
    Ok(feeds)
}
