//! Publisher: posts the rendered digest to the issue tracker.
//!
//! Publishing errors are fatal for the run; nothing is retried.

use chrono::NaiveDate;
use thiserror::Error;

mod github;

pub use github::{GitHubPublisher, Target};

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Tracker request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Tracker request timed out")]
    Timeout,
    #[error("Tracker API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Publisher not configured: {0}")]
    NotConfigured(String),
}

/// A created issue or comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub url: String,
    /// Issue number for new issues, comment id for comments.
    pub id: u64,
}

#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, title: &str, body: &str) -> Result<Publication, PublishError>;
}

/// Issue title for the digest of `date`.
pub fn digest_title(prefix: &str, date: NaiveDate) -> String {
    format!("{prefix}{}", date.format("%Y-%m-%d"))
}
