//! Feed Reader: loads the configured feed list and turns each feed into
//! [`ArticleRecord`](crate::article::ArticleRecord)s.
//!
//! - [`sources`] - the JSON feeds file (URL → category/source)
//! - [`fetcher`] - sequential HTTP retrieval with per-feed failure isolation
//! - [`parser`] - RSS/Atom/JSON Feed parsing via `feed-rs`, freshness and per-source limits

mod fetcher;
mod parser;
mod sources;

pub use fetcher::{collect_all, collect_one, CollectReport, FeedFailure, FetchError};
pub use parser::{parse_feed, EntryFilter, ParseResult};
pub use sources::{load_feeds, parse_feeds, FeedConfig, FeedsError};
